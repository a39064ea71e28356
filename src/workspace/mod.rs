//! Workspace resolution for local and remote Go sources
//!
//! - `env`: host environment captured once at entry
//! - `resolve`: module vs. GOPATH mode and the source identity
//! - `mounts`: symlink-aware bind mounts for GOPATH workspaces

pub mod env;
pub mod mounts;
pub mod resolve;

pub use env::HostEnv;
pub use mounts::{plan_mounts, MountEntry, MountPlan};
pub use resolve::{discover_import_path, is_local_source, resolve_workspace, Workspace};
