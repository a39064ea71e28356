//! Download-once store for CGO dependency archives
//!
//! Entries are keyed by the last path segment of their URL. A file that
//! exists under the cache root is a hit; nothing else is recorded.

use crate::error::{CrossgoError, CrossgoResult};
use crate::logging::Logger;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of one [`DependencyCache::populate`] pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    /// Archives downloaded during this pass
    pub fetched: Vec<PathBuf>,
    /// Archives already present
    pub reused: Vec<PathBuf>,
}

/// Local directory of downloaded dependency archives
#[derive(Debug, Clone)]
pub struct DependencyCache {
    root: PathBuf,
}

impl DependencyCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a dependency URL is cached under
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.root.join(entry_name(url))
    }

    /// Make sure every whitespace separated URL in `dependencies` is cached
    ///
    /// The first failing download aborts the pass. The destination file is
    /// created before the fetch and is not removed on failure.
    pub async fn populate(
        &self,
        dependencies: &str,
        log: &dyn Logger,
    ) -> CrossgoResult<PopulateSummary> {
        self.ensure_root().await?;

        let mut summary = PopulateSummary::default();
        for url in dependencies.split_whitespace() {
            let path = self.entry_path(url);

            let exists = tokio::fs::try_exists(&path)
                .await
                .map_err(|e| CrossgoError::io(format!("checking {}", path.display()), e))?;
            if exists {
                log.printf(format_args!("INFO: Dependency already cached: {}", path.display()));
                summary.reused.push(path);
                continue;
            }

            log.printf(format_args!("INFO: Downloading new dependency: {}...", url));
            let (fetch_url, fetch_path) = (url.to_string(), path.clone());
            tokio::task::spawn_blocking(move || download(&fetch_url, &fetch_path))
                .await
                .map_err(|e| CrossgoError::io(format!("downloading {}", url), io::Error::other(e)))??;

            log.printf(format_args!("INFO: New dependency cached: {}", path.display()));
            summary.fetched.push(path);
        }

        Ok(summary)
    }

    async fn ensure_root(&self) -> CrossgoResult<()> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o751);

        builder
            .create(&self.root)
            .await
            .map_err(|e| CrossgoError::CacheDirCreate {
                path: self.root.clone(),
                source: e,
            })
    }
}

/// Last path segment of a URL, used as the cache file name
fn entry_name(url: &str) -> &str {
    let trimmed = url.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Fetch `url` into a freshly created file at `path`
fn download(url: &str, path: &Path) -> CrossgoResult<()> {
    let mut out = File::create(path).map_err(|e| CrossgoError::DependencyWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!("GET {}", url);
    let response = ureq::get(url)
        .call()
        .map_err(|e| CrossgoError::DependencyFetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let mut body = response.into_body().into_reader();
    let written = io::copy(&mut body, &mut out).map_err(|e| CrossgoError::DependencyFetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    debug!("Wrote {} bytes to {}", written, path.display());

    out.sync_all().map_err(|e| CrossgoError::DependencyWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::logging::testing::RecordingLogger;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn entry_name_is_last_segment() {
        assert_eq!(entry_name("http://x/a.tgz"), "a.tgz");
        assert_eq!(entry_name("https://example.org/libs/openssl-3.0.tar.gz"), "openssl-3.0.tar.gz");
        assert_eq!(entry_name("https://example.org/libs/"), "libs");
    }

    #[tokio::test]
    async fn existing_entry_is_not_fetched() {
        let temp = TempDir::new().unwrap();
        let cache = DependencyCache::new(temp.path());
        fs::write(temp.path().join("a.tgz"), b"cached").unwrap();
        let log = RecordingLogger::default();

        // Nothing listens on the discard port; a fetch attempt would fail.
        let summary = cache.populate("http://127.0.0.1:9/a.tgz", &log).await.unwrap();

        assert!(summary.fetched.is_empty());
        assert_eq!(summary.reused, vec![temp.path().join("a.tgz")]);
        assert!(log.contains("Dependency already cached"));
    }

    #[tokio::test]
    async fn creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("xgo-cache");
        let cache = DependencyCache::new(&root);

        let summary = cache.populate("", &RecordingLogger::default()).await.unwrap();

        assert!(root.is_dir());
        assert_eq!(summary, PopulateSummary::default());
    }

    #[tokio::test]
    async fn duplicate_url_downloads_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/a.tgz")
            .with_body("archive-bytes")
            .expect(1)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let cache = DependencyCache::new(temp.path());
        let url = format!("{}/a.tgz", server.url());
        let deps = format!("{} {}", url, url);

        let summary = cache.populate(&deps, &RecordingLogger::default()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(summary.fetched.len(), 1);
        assert_eq!(summary.reused.len(), 1);
        assert_eq!(fs::read(temp.path().join("a.tgz")).unwrap(), b"archive-bytes");
    }

    #[tokio::test]
    async fn second_pass_reuses_everything() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/b.tar.xz")
            .with_body("xz")
            .expect(1)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let cache = DependencyCache::new(temp.path());
        let deps = format!("  {}/b.tar.xz  ", server.url());
        let log = RecordingLogger::default();

        cache.populate(&deps, &log).await.unwrap();
        let again = cache.populate(&deps, &log).await.unwrap();

        mock.assert_async().await;
        assert!(again.fetched.is_empty());
        assert_eq!(again.reused.len(), 1);
    }

    // Known gap: a failed fetch leaves the created file behind, and the
    // next pass treats it as a cache hit.
    #[tokio::test]
    async fn failed_fetch_leaves_partial_file_behind() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/broken.tgz")
            .with_status(500)
            .create_async()
            .await;

        let temp = TempDir::new().unwrap();
        let cache = DependencyCache::new(temp.path());
        let deps = format!("{}/broken.tgz", server.url());
        let log = RecordingLogger::default();

        let err = cache.populate(&deps, &log).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cache);
        assert!(temp.path().join("broken.tgz").exists());

        let again = cache.populate(&deps, &log).await.unwrap();
        assert_eq!(again.reused, vec![temp.path().join("broken.tgz")]);
    }
}
