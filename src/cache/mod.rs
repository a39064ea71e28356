//! Dependency cache for CGO archives
//!
//! Archives listed in a build request are downloaded once into a host
//! directory, which is then mounted read-only into the build container.
//!
//! # Cache Model
//!
//! | Property | Behavior |
//! |----------|----------|
//! | Key | Last path segment of the archive URL |
//! | Hit | A file with that name exists under the root |
//! | Miss | File created, body streamed into it |
//! | Failure | Build aborts; the created file stays |
//!
//! There is no locking: concurrent builds sharing a root may race on the
//! same file name.

pub mod deps;

pub use deps::{DependencyCache, PopulateSummary};
