//! Source tree identity and dependency resolution mode
//!
//! A local source is either a Go module (has `go.mod`) or a legacy GOPATH
//! package whose import path is derived from its position under a search
//! root. Anything that is not a local path is an import path the image
//! fetches itself.

use crate::error::{CrossgoError, CrossgoResult};
use crate::logging::Logger;
use crate::workspace::env::HostEnv;
use std::fs;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};
use tracing::debug;

/// Dependency manifest marking a module-based workspace
pub const MANIFEST_FILE: &str = "go.mod";

/// Resolved source tree, decided once per build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workspace {
    /// Import path handed to the image unchanged
    Remote { import_path: String },
    /// Local module; dependencies resolved through `go.mod`
    Module {
        /// Source location as requested
        identity: String,
        /// Absolute host path of the module root
        source_dir: PathBuf,
    },
    /// Local GOPATH package
    Legacy {
        /// Import path derived from the search roots
        import_path: String,
        /// GOPATH entries in order
        search_roots: Vec<PathBuf>,
    },
}

impl Workspace {
    /// Identity passed to the build as its positional argument
    pub fn identity(&self) -> &str {
        match self {
            Self::Remote { import_path } | Self::Legacy { import_path, .. } => import_path,
            Self::Module { identity, .. } => identity,
        }
    }

    pub fn is_module(&self) -> bool {
        matches!(self, Self::Module { .. })
    }

    /// Whether the source came from the host filesystem
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Remote { .. })
    }
}

/// Whether `source` names a host path rather than an import path
pub fn is_local_source(source: &str) -> bool {
    source.starts_with(MAIN_SEPARATOR) || source.starts_with('/') || source.starts_with('.')
}

/// Resolve a requested source location into a [`Workspace`]
pub fn resolve_workspace(
    source: &str,
    host: &HostEnv,
    log: &dyn Logger,
) -> CrossgoResult<Workspace> {
    if !is_local_source(source) {
        debug!("Treating {} as an import path", source);
        return Ok(Workspace::Remote {
            import_path: source.to_string(),
        });
    }

    let local = Path::new(source);
    if has_manifest(local) {
        return module_workspace(source);
    }

    if host.gopath.is_none() {
        if let Some(default) = host.default_gopath() {
            log.printf(format_args!(
                "INFO: No $GOPATH is set - defaulting to {}",
                default.display()
            ));
        }
    }
    let search_roots = host.search_roots();
    let import_path = discover_import_path(local, &search_roots)?;

    // The manifest check uses the requested path, never the import path.
    if has_manifest(local) {
        return module_workspace(source);
    }
    log.println("INFO: go.mod not found. Skipping go modules");

    Ok(Workspace::Legacy {
        import_path,
        search_roots,
    })
}

fn module_workspace(source: &str) -> CrossgoResult<Workspace> {
    let source_dir = absolute_clean(Path::new(source))?;
    Ok(Workspace::Module {
        identity: source.to_string(),
        source_dir,
    })
}

fn has_manifest(dir: &Path) -> bool {
    dir.join(MANIFEST_FILE).exists()
}

/// Absolute form of `path` with `.` and `..` removed lexically
fn absolute_clean(path: &Path) -> CrossgoResult<PathBuf> {
    let abs = std::path::absolute(path).map_err(|e| CrossgoError::PathInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(clean_path(&abs))
}

/// Lexical cleanup: `..` drops the previous normal component, `.` is dropped
fn clean_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    cleaned.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                ) {
                    cleaned.pop();
                }
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// Derive the Go import path of a local directory from the search roots
pub fn discover_import_path(path: &Path, search_roots: &[PathBuf]) -> CrossgoResult<String> {
    let abs = absolute_clean(path)?;
    let meta = fs::metadata(&abs).map_err(|e| CrossgoError::PathInvalid {
        path: abs.clone(),
        reason: e.to_string(),
    })?;
    if !meta.is_dir() {
        return Err(CrossgoError::PathInvalid {
            path: abs,
            reason: "not a directory".to_string(),
        });
    }
    if search_roots.is_empty() {
        return Err(CrossgoError::NoSearchRoot);
    }

    for root in search_roots {
        if let Some(import_path) = import_path_under(&abs, &root.join("src")) {
            return Ok(import_path);
        }
    }

    // Retry with symlinks resolved on both sides
    if let Ok(canonical) = fs::canonicalize(&abs) {
        for root in search_roots {
            if let Ok(src) = fs::canonicalize(root.join("src")) {
                if let Some(import_path) = import_path_under(&canonical, &src) {
                    return Ok(import_path);
                }
            }
        }
    }

    Err(CrossgoError::ImportPath {
        path: abs,
        reason: "directory is not inside any $GOPATH/src".to_string(),
    })
}

fn import_path_under(dir: &Path, src: &Path) -> Option<String> {
    let rel = dir.strip_prefix(src).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
