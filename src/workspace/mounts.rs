//! Bind mounts for legacy GOPATH workspaces
//!
//! Containers cannot follow host symlinks that leave a mounted directory,
//! so every symlinked directory under `$GOPATH/src` that points outside it
//! gets its own read-only mount slot at `/ext-go/<slot>/src/<relative path>`.
//! Each search root is then mounted as one more slot. Slots are numbered
//! from 1 in discovery order across all roots.

use crate::logging::Logger;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Container directory holding the mount slots
pub const EXT_GOPATH_ROOT: &str = "/ext-go";

/// Separator for the in-container search path (the image is Linux)
const CONTAINER_PATH_SEPARATOR: &str = ":";

/// One host directory mounted into a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Slot number, unique within a plan
    pub slot: usize,
    /// Host directory to mount
    pub host: PathBuf,
    /// Mount destination inside the container
    pub container: String,
    /// GOPATH entry inside the container covering this slot
    pub search_prefix: String,
}

impl MountEntry {
    /// `-v` value for a read-only bind mount
    pub fn volume_spec(&self) -> String {
        format!("{}:{}:ro", self.host.display(), self.container)
    }
}

/// Ordered set of mounts for one build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountPlan {
    entries: Vec<MountEntry>,
}

impl MountPlan {
    pub fn entries(&self) -> &[MountEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// In-container search path joining every slot prefix (`EXT_GOPATH`)
    pub fn search_path(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.search_prefix.as_str())
            .collect::<Vec<_>>()
            .join(CONTAINER_PATH_SEPARATOR)
    }

    fn push(&mut self, host: PathBuf, relative: Option<&str>) {
        let slot = self.entries.len() + 1;
        let search_prefix = format!("{}/{}", EXT_GOPATH_ROOT, slot);
        let container = match relative {
            Some(rel) => format!("{}/src/{}", search_prefix, rel),
            None => format!("{}/src", search_prefix),
        };
        self.entries.push(MountEntry {
            slot,
            host,
            container,
            search_prefix,
        });
    }
}

/// Compute the mounts needed for `search_roots`, in order
pub fn plan_mounts(search_roots: &[PathBuf], log: &dyn Logger) -> MountPlan {
    let mut plan = MountPlan::default();

    for root in search_roots {
        let sources = root.join("src");
        let canonical_sources = fs::canonicalize(&sources).ok();

        let walker = WalkDir::new(&sources)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(&sources).display().to_string();
                    log.printf(format_args!(
                        "WARNING: Failed to access GOPATH element {}: {}",
                        path, e
                    ));
                    continue;
                }
            };
            if !entry.path_is_symlink() {
                continue;
            }

            let Some(target) = escaping_dir_target(entry.path(), &sources, canonical_sources.as_deref())
            else {
                continue;
            };
            let Ok(relative) = entry.path().strip_prefix(&sources) else {
                continue;
            };

            debug!(
                "Mounting symlink {} -> {}",
                entry.path().display(),
                target.display()
            );
            plan.push(target, Some(&slash_path(relative)));
        }

        plan.push(sources, None);
    }

    plan
}

/// Resolved target of a symlink that points to a directory outside `sources`
fn escaping_dir_target(link: &Path, sources: &Path, canonical_sources: Option<&Path>) -> Option<PathBuf> {
    let target = fs::canonicalize(link).ok()?;
    if !fs::metadata(&target).ok()?.is_dir() {
        return None;
    }
    let inside = target.starts_with(sources)
        || canonical_sources.is_some_and(|canonical| target.starts_with(canonical));
    if inside {
        debug!("Symlink {} stays inside {}", link.display(), sources.display());
        return None;
    }
    Some(target)
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
