//! Host environment captured once at entry
//!
//! Resolution and orchestration read these values instead of the process
//! environment, so they can be driven explicitly in tests.

use std::ffi::OsString;
use std::path::PathBuf;

/// Legacy workspace root variable
pub const GOPATH_VAR: &str = "GOPATH";

/// Set to `1` inside the build image itself
pub const IN_CONTAINER_VAR: &str = "XGO_IN_XGO";

/// Host environment inputs to a build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostEnv {
    /// Raw `GOPATH` value, if set and non-empty
    pub gopath: Option<OsString>,
    /// Home directory, used for the toolchain default `GOPATH`
    pub home: Option<PathBuf>,
    /// Whether this process already runs inside the build image
    pub in_container: bool,
}

impl HostEnv {
    /// Capture the relevant variables from the current process
    pub fn from_process() -> Self {
        Self {
            gopath: std::env::var_os(GOPATH_VAR).filter(|v| !v.is_empty()),
            home: dirs::home_dir(),
            in_container: std::env::var(IN_CONTAINER_VAR).is_ok_and(|v| v == "1"),
        }
    }

    /// `$HOME/go`, the Go toolchain default when `GOPATH` is unset
    pub fn default_gopath(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|home| home.join("go"))
    }

    /// `GOPATH` entries, falling back to the toolchain default
    pub fn search_roots(&self) -> Vec<PathBuf> {
        match &self.gopath {
            Some(raw) => std::env::split_paths(raw)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            None => self.default_gopath().into_iter().collect(),
        }
    }

    /// Host directory mounted as the module cache root (`/go`)
    pub fn module_cache_root(&self) -> Option<PathBuf> {
        self.search_roots().into_iter().next()
    }
}
