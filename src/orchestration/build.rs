//! Build orchestration
//!
//! Sequences one build: check the runtime, make sure the image is present,
//! cache dependency archives, resolve the workspace, then run the build.
//! When already inside the build image the first two steps are skipped and
//! the image's entry point is called directly.

use crate::cache::DependencyCache;
use crate::config::Config;
use crate::error::{BuildStep, CrossgoError, CrossgoResult};
use crate::logging::{LogWriter, Logger};
use crate::orchestration::factory::create_runtime;
use crate::orchestration::invocation::{
    contained_invocation, container_invocation, ExecutionSpec, ResolvedConfig, DEPS_CACHE_DIR,
};
use crate::orchestration::process::{never_cancelled, run_command};
use crate::orchestration::runtime::ContainerRuntime;
use crate::request::BuildRequest;
use crate::workspace::{plan_mounts, resolve_workspace, HostEnv, MountPlan, Workspace};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::debug;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Drives build requests against one container runtime
pub struct Orchestrator {
    runtime: Box<dyn ContainerRuntime>,
    host: HostEnv,
    config: Config,
}

impl Orchestrator {
    pub fn new(runtime: Box<dyn ContainerRuntime>, host: HostEnv, config: Config) -> Self {
        Self {
            runtime,
            host,
            config,
        }
    }

    /// Orchestrator for the configured runtime and the current process environment
    pub fn from_config(config: Config) -> Self {
        Self::new(create_runtime(&config), HostEnv::from_process(), config)
    }

    /// Run one build to completion
    pub async fn build(&self, request: BuildRequest, log: &dyn Logger) -> CrossgoResult<()> {
        self.build_with_cancel(request, log, never_cancelled()).await
    }

    /// Run one build, stopping the build command when `cancel` turns `true`
    ///
    /// Only the final build command observes cancellation; earlier steps run
    /// to completion or failure.
    pub async fn build_with_cancel(
        &self,
        request: BuildRequest,
        log: &dyn Logger,
        mut cancel: watch::Receiver<bool>,
    ) -> CrossgoResult<()> {
        let request = self.seed_defaults(request).with_defaults();
        log.printf(format_args!("INFO: Starting crossgo/{}", VERSION));

        let spec = if self.host.in_container {
            self.prepare_contained(&request, log).await?
        } else {
            self.prepare_container(&request, log).await?
        };

        log.printf(format_args!(
            "INFO: Cross compiling {} package...",
            request.source
        ));
        if self.host.in_container {
            debug!("Executing: {}", spec.command_line());
        } else {
            log.printf(format_args!("INFO: Docker {}", spec.args().join(" ")));
        }

        let mut sink = LogWriter::new(log);
        run_command(spec.to_command(), &mut sink, &mut cancel)
            .await
            .map_err(|e| e.during(BuildStep::Execute))?;

        log.println("INFO: Completed!");
        Ok(())
    }

    /// Fill request fields the configuration has opinions on
    fn seed_defaults(&self, mut request: BuildRequest) -> BuildRequest {
        if request.go_proxy.is_none() && !self.config.build.goproxy.is_empty() {
            request.go_proxy = Some(self.config.build.goproxy.clone());
        }
        request
    }

    async fn prepare_container(
        &self,
        request: &BuildRequest,
        log: &dyn Logger,
    ) -> CrossgoResult<ExecutionSpec> {
        self.runtime
            .check(log)
            .await
            .map_err(|e| e.during(BuildStep::CheckEnvironment))?;

        if request.source.is_empty() {
            return Err(CrossgoError::SourceNotSet);
        }

        let image = request.image.reference(&self.config.image.repository);
        self.ensure_image(&image, log)
            .await
            .map_err(|e| e.during(BuildStep::EnsureImage))?;

        let deps_cache = request
            .deps_cache
            .clone()
            .unwrap_or_else(|| self.config.cache.dir_or_default());
        self.populate_cache(request, deps_cache.clone(), log).await?;

        let config = self
            .resolve(request, deps_cache, image, log)
            .map_err(|e| e.during(BuildStep::ResolveConfig))?;

        let mounts = match &config.workspace {
            Workspace::Legacy { search_roots, .. } => plan_mounts(search_roots, log),
            _ => MountPlan::default(),
        };
        let module_cache = self.host.module_cache_root();

        Ok(container_invocation(
            self.runtime.as_ref(),
            &config,
            &mounts,
            module_cache.as_deref(),
            log,
        ))
    }

    async fn prepare_contained(
        &self,
        request: &BuildRequest,
        log: &dyn Logger,
    ) -> CrossgoResult<ExecutionSpec> {
        debug!("Running inside the build image, calling the entry point directly");
        let deps_cache = PathBuf::from(DEPS_CACHE_DIR);
        self.populate_cache(request, deps_cache.clone(), log).await?;

        let config = self
            .resolve(request, deps_cache, String::new(), log)
            .map_err(|e| e.during(BuildStep::ResolveConfig))?;

        Ok(contained_invocation(&config))
    }

    async fn ensure_image(&self, image: &str, log: &dyn Logger) -> CrossgoResult<()> {
        log.printf(format_args!("INFO: Checking for required docker image {}... ", image));
        if self.runtime.image_exists(image).await? {
            log.println("INFO: Docker image found!");
            return Ok(());
        }
        log.println("not found!");
        self.runtime.pull(image, log).await
    }

    async fn populate_cache(
        &self,
        request: &BuildRequest,
        root: PathBuf,
        log: &dyn Logger,
    ) -> CrossgoResult<()> {
        if !request.has_dependencies() {
            return Ok(());
        }
        DependencyCache::new(root)
            .populate(&request.dependencies, log)
            .await
            .map(|summary| {
                debug!(
                    "Dependencies: {} fetched, {} reused",
                    summary.fetched.len(),
                    summary.reused.len()
                )
            })
            .map_err(|e| e.during(BuildStep::PopulateCache))
    }

    fn resolve(
        &self,
        request: &BuildRequest,
        deps_cache: PathBuf,
        image: String,
        log: &dyn Logger,
    ) -> CrossgoResult<ResolvedConfig> {
        let out_folder = match &request.out_folder {
            Some(folder) => std::path::absolute(folder).map_err(|e| {
                CrossgoError::io(
                    format!("resolving destination path ({})", folder.display()),
                    e,
                )
            })?,
            None => std::env::current_dir()
                .map_err(|e| CrossgoError::io("retrieving the working directory", e))?,
        };

        let workspace = resolve_workspace(&request.source, &self.host, log)?;

        let config = ResolvedConfig {
            workspace,
            deps_cache,
            out_folder,
            image,
            package: request.package.clone(),
            remote: request.remote.clone(),
            branch: request.branch.clone(),
            out_prefix: request.out_prefix.clone(),
            dependencies: request.dependencies.clone(),
            dependency_args: request.dependency_args.clone(),
            targets: request.targets.clone(),
            go_proxy: request.go_proxy.clone().unwrap_or_default(),
            build: request.build.clone(),
        };
        debug!("Resolved config: {:?}", config);
        Ok(config)
    }
}

/// Build `request` with the configured runtime
pub async fn start_build(
    request: BuildRequest,
    config: &Config,
    log: &dyn Logger,
) -> CrossgoResult<()> {
    Orchestrator::from_config(config.clone())
        .build(request, log)
        .await
}

/// Build `request` with the configured runtime, honoring `cancel`
pub async fn start_build_with_cancel(
    request: BuildRequest,
    config: &Config,
    log: &dyn Logger,
    cancel: watch::Receiver<bool>,
) -> CrossgoResult<()> {
    Orchestrator::from_config(config.clone())
        .build_with_cancel(request, log, cancel)
        .await
}
