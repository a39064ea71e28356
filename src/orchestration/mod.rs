//! Orchestration of cross compilation builds
//!
//! Drives a Docker-compatible container CLI:
//! - runtime checks and image pulls (`CliRuntime`)
//! - assembling the `run` command line (`invocation`)
//! - streaming the build output (`process`)

mod build;
mod cli_runtime;
mod factory;
pub mod invocation;
pub mod process;
mod runtime;

pub use build::{start_build, start_build_with_cancel, Orchestrator};
pub use cli_runtime::CliRuntime;
pub use factory::create_runtime;
pub use invocation::{contained_invocation, container_invocation, ExecutionSpec, ResolvedConfig};
pub use process::run_command;
pub use runtime::ContainerRuntime;
