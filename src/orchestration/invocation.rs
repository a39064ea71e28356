//! Assembly of the build command
//!
//! [`container_invocation`] produces the `run` command for the build image;
//! [`contained_invocation`] produces the direct `xgo-build` call used when
//! already running inside that image. Both share one environment contract.

use crate::logging::Logger;
use crate::orchestration::runtime::ContainerRuntime;
use crate::request::BuildOptions;
use crate::workspace::{MountPlan, Workspace};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Output folder inside the container
pub const BUILD_DIR: &str = "/build";
/// Dependency cache inside the container
pub const DEPS_CACHE_DIR: &str = "/deps-cache";
/// Module cache root inside the container
pub const GO_DIR: &str = "/go";
/// Module source tree inside the container
pub const SOURCE_DIR: &str = "/source";
/// Build entry point shipped in the image
pub const CONTAINED_BUILDER: &str = "xgo-build";
/// `EXT_GOPATH` value telling the entry point the sources are local
pub const LOCAL_BUILD_SENTINEL: &str = "/non-existent-path-to-signal-local-build";

/// Build configuration after defaults and workspace resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Resolved source tree and its mode
    pub workspace: Workspace,
    /// Host directory holding dependency archives
    pub deps_cache: PathBuf,
    /// Absolute host directory receiving binaries
    pub out_folder: PathBuf,
    /// Image reference to run
    pub image: String,
    pub package: String,
    pub remote: String,
    pub branch: String,
    pub out_prefix: String,
    pub dependencies: String,
    pub dependency_args: String,
    pub targets: Vec<String>,
    pub go_proxy: String,
    pub build: BuildOptions,
}

/// A fully assembled command, fixed once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSpec {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl ExecutionSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>, env: Vec<(String, String)>) -> Self {
        Self {
            program: program.into(),
            args,
            env,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Variables added on top of the inherited environment
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Values following every occurrence of `flag` in the arguments
    pub fn flag_values(&self, flag: &str) -> Vec<&str> {
        self.args
            .windows(2)
            .filter(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
            .collect()
    }

    /// Value of `key`, whether passed with `-e` or as process environment
    pub fn env_value(&self, key: &str) -> Option<&str> {
        let prefix = format!("{}=", key);
        self.flag_values("-e")
            .into_iter()
            .rev()
            .find_map(|kv| kv.strip_prefix(prefix.as_str()))
            .or_else(|| {
                self.env
                    .iter()
                    .rev()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.as_str())
            })
    }

    /// Program and arguments as one line
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd
    }
}

/// Environment every build receives, in a fixed order
fn build_env(config: &ResolvedConfig) -> Vec<(String, String)> {
    let flags = &config.build;
    [
        ("REPO_REMOTE", config.remote.clone()),
        ("REPO_BRANCH", config.branch.clone()),
        ("PACK", config.package.clone()),
        ("DEPS", config.dependencies.clone()),
        ("ARGS", config.dependency_args.clone()),
        ("OUT", config.out_prefix.clone()),
        ("FLAG_V", flags.verbose.to_string()),
        ("FLAG_X", flags.steps.to_string()),
        ("FLAG_RACE", flags.race.to_string()),
        ("FLAG_TAGS", flags.tags.clone()),
        ("FLAG_LDFLAGS", flags.ldflags.clone()),
        ("FLAG_BUILDMODE", flags.mode.clone()),
        ("FLAG_BUILDVCS", flags.vcs.clone()),
        ("FLAG_TRIMPATH", flags.trim_path.to_string()),
        ("TARGETS", targets_value(&config.targets)),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// Space separated targets with `*` globs turned into `.` regex wildcards
fn targets_value(targets: &[String]) -> String {
    targets.join(" ").replace('*', ".")
}

fn volume(host: &Path, container: &str) -> String {
    format!("{}:{}", host.display(), container)
}

/// Assemble the `run` command for the build image
///
/// `mounts` is only used for GOPATH and remote workspaces; `module_cache`
/// only for module workspaces.
pub fn container_invocation(
    runtime: &dyn ContainerRuntime,
    config: &ResolvedConfig,
    mounts: &MountPlan,
    module_cache: Option<&Path>,
    log: &dyn Logger,
) -> ExecutionSpec {
    let mut args: Vec<String> = runtime.global_args().to_vec();
    args.extend(["run".to_string(), "--rm".to_string()]);
    args.extend(["-v".to_string(), volume(&config.out_folder, BUILD_DIR)]);
    args.extend([
        "-v".to_string(),
        format!("{}:ro", volume(&config.deps_cache, DEPS_CACHE_DIR)),
    ]);

    let mut env = build_env(config);

    match &config.workspace {
        Workspace::Module { source_dir, .. } => {
            env.push(("GO111MODULE".to_string(), "on".to_string()));
            match module_cache {
                Some(root) => args.extend(["-v".to_string(), volume(root, GO_DIR)]),
                None => debug!("No module cache root known, not mounting {}", GO_DIR),
            }
            if !config.go_proxy.is_empty() {
                env.push(("GOPROXY".to_string(), config.go_proxy.clone()));
            }
            args.extend(["-v".to_string(), volume(source_dir, SOURCE_DIR)]);

            if source_dir.join("vendor").is_dir() {
                env.push(("FLAG_MOD".to_string(), "vendor".to_string()));
                log.println("INFO: Using vendored Go module dependencies");
            }
        }
        Workspace::Legacy { .. } | Workspace::Remote { .. } => {
            env.push(("GO111MODULE".to_string(), "off".to_string()));
            for entry in mounts.entries() {
                args.extend(["-v".to_string(), entry.volume_spec()]);
            }
            env.push(("EXT_GOPATH".to_string(), mounts.search_path()));
        }
    }

    for (key, value) in env {
        args.extend(["-e".to_string(), format!("{}={}", key, value)]);
    }
    args.extend([
        config.image.clone(),
        config.workspace.identity().to_string(),
    ]);

    ExecutionSpec::new(runtime.program(), args, Vec::new())
}

/// Assemble the direct build entry point call used inside the image
pub fn contained_invocation(config: &ResolvedConfig) -> ExecutionSpec {
    let mut env = build_env(config);

    if let Workspace::Legacy { .. } = config.workspace {
        env.push(("GO111MODULE".to_string(), "off".to_string()));
    }
    if config.workspace.is_local() {
        env.push(("EXT_GOPATH".to_string(), LOCAL_BUILD_SENTINEL.to_string()));
    }

    ExecutionSpec::new(
        CONTAINED_BUILDER,
        vec![config.workspace.identity().to_string()],
        env,
    )
}
