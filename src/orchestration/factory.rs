//! Runtime factory for creating the configured container runtime

use crate::config::Config;
use crate::orchestration::cli_runtime::CliRuntime;
use crate::orchestration::runtime::ContainerRuntime;

/// Create the container runtime named in the configuration
///
/// An empty binary falls back to `docker`.
pub fn create_runtime(config: &Config) -> Box<dyn ContainerRuntime> {
    let binary = config.runtime.binary.trim();
    if binary.is_empty() {
        return Box::new(CliRuntime::default());
    }
    Box::new(CliRuntime::with_global_args(
        binary,
        config.runtime.args.clone(),
    ))
}
