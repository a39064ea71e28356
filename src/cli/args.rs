//! CLI argument definitions using clap derive

use crate::request::{BuildOptions, BuildRequest, ImageSelector, DEFAULT_BUILD_MODE};
use clap::{ArgAction, Args, Parser};
use std::path::PathBuf;

/// Crossgo - Go cross compilation in containers
///
/// Builds a Go package or module for every requested OS/architecture pair
/// inside a prebuilt toolchain image.
#[derive(Parser, Debug)]
#[command(name = "crossgo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CROSSGO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub build: BuildArgs,
}

/// Arguments describing one cross compilation
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Local path (absolute or starting with '.') or Go import path to build
    pub source: String,

    /// Go release to use for cross compilation
    #[arg(long = "go", value_name = "VERSION")]
    pub go_version: Option<String>,

    /// Global proxy for Go modules
    #[arg(long)]
    pub goproxy: Option<String>,

    /// Sub-package to build if not root import
    #[arg(long = "pkg", default_value = "")]
    pub package: String,

    /// Version control remote repository to build
    #[arg(long, default_value = "")]
    pub remote: String,

    /// Version control branch to build
    #[arg(long, default_value = "")]
    pub branch: String,

    /// Prefix to use for output naming (empty = package name)
    #[arg(long = "out", default_value = "")]
    pub out_prefix: String,

    /// Destination folder to put binaries in (default: current directory)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// CGO dependencies (space separated configure/make archive URLs)
    #[arg(long, default_value = "")]
    pub deps: String,

    /// CGO dependency configure arguments
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub depsargs: String,

    /// Host directory caching the CGO dependency archives
    #[arg(long)]
    pub deps_cache: Option<PathBuf>,

    /// Targets to build for (comma separated os/arch, '*' wildcards)
    #[arg(long, value_delimiter = ',')]
    pub targets: Vec<String>,

    /// Use a custom image repository instead of the configured one
    #[arg(long)]
    pub docker_repo: Option<String>,

    /// Use a custom image instead of `<repository>:<go version>`
    #[arg(long)]
    pub docker_image: Option<String>,

    /// Print the names of packages as they are compiled
    #[arg(long)]
    pub build_verbose: bool,

    /// Print the commands as the builds execute
    #[arg(long)]
    pub steps: bool,

    /// Enable data race detection (supported only on amd64)
    #[arg(long)]
    pub race: bool,

    /// List of build tags to consider satisfied during the build
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Arguments to pass on each go tool link invocation
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub ldflags: String,

    /// Kind of object file to build
    #[arg(long, default_value = DEFAULT_BUILD_MODE)]
    pub buildmode: String,

    /// Whether to stamp binaries with version control information
    #[arg(long, default_value = "")]
    pub buildvcs: String,

    /// Remove all file system paths from the resulting executable
    #[arg(long)]
    pub trimpath: bool,
}

impl BuildArgs {
    /// Convert the parsed flags into a build request
    pub fn into_request(self) -> BuildRequest {
        BuildRequest {
            source: self.source,
            package: self.package,
            remote: self.remote,
            branch: self.branch,
            out_prefix: self.out_prefix,
            out_folder: self.dest,
            dependencies: self.deps,
            dependency_args: self.depsargs,
            deps_cache: self.deps_cache,
            targets: self
                .targets
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            go_proxy: self.goproxy,
            image: ImageSelector {
                go_version: self.go_version,
                repository: self.docker_repo,
                image: self.docker_image,
            },
            build: BuildOptions {
                verbose: self.build_verbose,
                steps: self.steps,
                race: self.race,
                tags: self.tags,
                ldflags: self.ldflags,
                mode: self.buildmode,
                vcs: self.buildvcs,
                trim_path: self.trimpath,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_source_only() {
        let cli = Cli::parse_from(["crossgo", "github.com/foo/bar"]);
        let request = cli.build.into_request();
        assert_eq!(request.source, "github.com/foo/bar");
        assert!(request.targets.is_empty());
        assert!(request.image.go_version.is_none());
        assert_eq!(request.build.mode, "default");
        assert!(!request.build.trim_path);
    }

    #[test]
    fn cli_requires_source() {
        assert!(Cli::try_parse_from(["crossgo"]).is_err());
    }

    #[test]
    fn cli_parses_targets_comma_separated() {
        let cli = Cli::parse_from([
            "crossgo",
            "--targets",
            "linux/amd64, windows/*,",
            ".",
        ]);
        let request = cli.build.into_request();
        assert_eq!(request.targets, vec!["linux/amd64", "windows/*"]);
    }

    #[test]
    fn cli_parses_image_selection() {
        let cli = Cli::parse_from([
            "crossgo",
            "--go",
            "1.22.3",
            "--docker-repo",
            "registry.local/xgo",
            "./app",
        ]);
        let request = cli.build.into_request();
        assert_eq!(request.image.reference("unused"), "registry.local/xgo:1.22.3");

        let cli = Cli::parse_from(["crossgo", "--docker-image", "custom:dev", "./app"]);
        assert_eq!(
            cli.build.into_request().image.reference("unused"),
            "custom:dev"
        );
    }

    #[test]
    fn cli_parses_build_flags() {
        let cli = Cli::parse_from([
            "crossgo",
            "--build-verbose",
            "--steps",
            "--race",
            "--tags",
            "netgo",
            "--ldflags",
            "-s -w",
            "--buildmode",
            "pie",
            "--buildvcs",
            "false",
            "--trimpath",
            "./app",
        ]);
        let build = cli.build.into_request().build;
        assert!(build.verbose);
        assert!(build.steps);
        assert!(build.race);
        assert!(build.trim_path);
        assert_eq!(build.tags, "netgo");
        assert_eq!(build.ldflags, "-s -w");
        assert_eq!(build.mode, "pie");
        assert_eq!(build.vcs, "false");
    }

    #[test]
    fn cli_parses_source_control_and_output() {
        let cli = Cli::parse_from([
            "crossgo",
            "--remote",
            "https://github.com/foo/bar.git",
            "--branch",
            "develop",
            "--pkg",
            "cmd/bar",
            "--out",
            "bar",
            "--dest",
            "dist",
            "--deps",
            "https://example.com/a.tar.gz",
            "--depsargs",
            "--static",
            "--deps-cache",
            "/var/cache/xgo",
            "github.com/foo/bar",
        ]);
        let request = cli.build.into_request();
        assert_eq!(request.remote, "https://github.com/foo/bar.git");
        assert_eq!(request.branch, "develop");
        assert_eq!(request.package, "cmd/bar");
        assert_eq!(request.out_prefix, "bar");
        assert_eq!(request.out_folder, Some(PathBuf::from("dist")));
        assert_eq!(request.dependencies, "https://example.com/a.tar.gz");
        assert_eq!(request.dependency_args, "--static");
        assert_eq!(request.deps_cache, Some(PathBuf::from("/var/cache/xgo")));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["crossgo", "./app"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["crossgo", "-v", "./app"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["crossgo", "-vv", "./app"]);
        assert_eq!(cli.verbose, 2);
    }
}
