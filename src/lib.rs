//! Crossgo - Go cross compilation in containers
//!
//! Builds a Go package for many OS/architecture pairs by running it through
//! a prebuilt toolchain image, mounting the sources and a dependency cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestration;
pub mod request;
pub mod workspace;

pub use error::{CrossgoError, CrossgoResult};
pub use orchestration::{start_build, start_build_with_cancel, Orchestrator};
pub use request::BuildRequest;
