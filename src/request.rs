//! Build request model
//!
//! A [`BuildRequest`] is filled in once with [`BuildRequest::with_defaults`]
//! and only read after that.

use std::path::PathBuf;

/// Target list used when none is requested: every OS and architecture
pub const ALL_TARGETS: &str = "*/*";

/// Go release used when none is requested
pub const DEFAULT_GO_VERSION: &str = "latest";

/// Module proxy chain used when none is requested
pub const DEFAULT_GOPROXY: &str = "https://proxy.golang.org,direct";

/// Build mode used when none is requested
pub const DEFAULT_BUILD_MODE: &str = "default";

/// Options forwarded to `go build` inside the image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Print the names of packages as they are compiled (`-v`)
    pub verbose: bool,
    /// Print the commands as they are executed (`-x`)
    pub steps: bool,
    /// Enable data race detection (`-race`)
    pub race: bool,
    /// Build tags to consider satisfied (`-tags`)
    pub tags: String,
    /// Arguments passed to each link invocation (`-ldflags`)
    pub ldflags: String,
    /// Kind of object file to build (`-buildmode`)
    pub mode: String,
    /// Version control stamping (`-buildvcs`)
    pub vcs: String,
    /// Remove file system paths from the executable (`-trimpath`)
    pub trim_path: bool,
}

impl BuildOptions {
    pub fn with_defaults(mut self) -> Self {
        if self.mode.is_empty() {
            self.mode = DEFAULT_BUILD_MODE.to_string();
        }
        self
    }
}

/// Which build image to run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageSelector {
    /// Go release tag of the image
    pub go_version: Option<String>,
    /// Image repository overriding the configured one
    pub repository: Option<String>,
    /// Full image reference overriding everything else
    pub image: Option<String>,
}

impl ImageSelector {
    /// Resolve the image reference, falling back to `default_repository`
    pub fn reference(&self, default_repository: &str) -> String {
        if let Some(image) = self.image.as_deref().filter(|i| !i.is_empty()) {
            return image.to_string();
        }
        let repository = self
            .repository
            .as_deref()
            .filter(|r| !r.is_empty())
            .unwrap_or(default_repository);
        let version = self.go_version.as_deref().unwrap_or(DEFAULT_GO_VERSION);
        format!("{}:{}", repository, version)
    }
}

/// Everything a caller asks for in one cross compilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildRequest {
    /// Local path (absolute or starting with `.`) or Go import path
    pub source: String,
    /// Sub-package to build if not the root import
    pub package: String,
    /// Version control remote repository to build
    pub remote: String,
    /// Version control branch to build
    pub branch: String,
    /// Prefix for output binary names (empty = package name)
    pub out_prefix: String,
    /// Destination folder for binaries (None = working directory)
    pub out_folder: Option<PathBuf>,
    /// Space separated URLs of CGO dependency archives
    pub dependencies: String,
    /// Configure arguments for the CGO dependencies
    pub dependency_args: String,
    /// Dependency cache directory on the host
    pub deps_cache: Option<PathBuf>,
    /// Target platforms, `os/arch` with `*` wildcards
    pub targets: Vec<String>,
    /// Go module proxy
    pub go_proxy: Option<String>,
    /// Image to run
    pub image: ImageSelector,
    /// Options forwarded to `go build`
    pub build: BuildOptions,
}

impl BuildRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Fill every unset field with its default
    pub fn with_defaults(mut self) -> Self {
        if self.targets.is_empty() {
            self.targets = vec![ALL_TARGETS.to_string()];
        }
        if self.image.go_version.as_deref().map_or(true, str::is_empty) {
            self.image.go_version = Some(DEFAULT_GO_VERSION.to_string());
        }
        if self.go_proxy.as_deref().map_or(true, str::is_empty) {
            self.go_proxy = Some(DEFAULT_GOPROXY.to_string());
        }
        self.build = self.build.with_defaults();
        self
    }

    /// Whether any dependency archive was requested
    pub fn has_dependencies(&self) -> bool {
        !self.dependencies.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_targets_default_to_wildcard() {
        let request = BuildRequest::new("./app").with_defaults();
        assert_eq!(request.targets, vec!["*/*"]);
    }

    #[test]
    fn explicit_targets_preserved() {
        let mut request = BuildRequest::new("./app");
        request.targets = vec!["linux/amd64".to_string(), "windows/*".to_string()];
        let request = request.with_defaults();
        assert_eq!(request.targets, vec!["linux/amd64", "windows/*"]);
    }

    #[test]
    fn defaults_fill_version_proxy_and_mode() {
        let request = BuildRequest::new("github.com/foo/bar").with_defaults();
        assert_eq!(request.image.go_version.as_deref(), Some("latest"));
        assert_eq!(request.go_proxy.as_deref(), Some(DEFAULT_GOPROXY));
        assert_eq!(request.build.mode, "default");
    }

    #[test]
    fn defaults_keep_explicit_values() {
        let mut request = BuildRequest::new("./app");
        request.go_proxy = Some("off".to_string());
        request.build.mode = "pie".to_string();
        let request = request.with_defaults();
        assert_eq!(request.go_proxy.as_deref(), Some("off"));
        assert_eq!(request.build.mode, "pie");
    }

    #[test]
    fn defaulting_is_idempotent() {
        let once = BuildRequest::new("./app").with_defaults();
        let twice = once.clone().with_defaults();
        assert_eq!(once, twice);
    }

    #[test]
    fn image_reference_precedence() {
        let mut selector = ImageSelector {
            go_version: Some("1.22".to_string()),
            ..ImageSelector::default()
        };
        assert_eq!(selector.reference("ghcr.io/crazy-max/xgo"), "ghcr.io/crazy-max/xgo:1.22");

        selector.repository = Some("registry.local/xgo".to_string());
        assert_eq!(selector.reference("ghcr.io/crazy-max/xgo"), "registry.local/xgo:1.22");

        selector.image = Some("custom/builder:v3".to_string());
        assert_eq!(selector.reference("ghcr.io/crazy-max/xgo"), "custom/builder:v3");
    }

    #[test]
    fn dependency_presence_ignores_whitespace() {
        let mut request = BuildRequest::new("./app");
        assert!(!request.has_dependencies());
        request.dependencies = "   ".to_string();
        assert!(!request.has_dependencies());
        request.dependencies = "http://x/a.tgz".to_string();
        assert!(request.has_dependencies());
    }
}
