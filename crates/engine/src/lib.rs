//! Engine of the Mosaic collection index
//!
//! The components that derive, maintain, and serve the projection:
//! - score codec and summary projector (pure)
//! - index writer and reader
//! - rebuild orchestrator and consistency verifier
//! - thumbnail and dashboard aggregate caches
//! - configuration and the `CollectionIndex` facade

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod dashboard;
pub mod index;
pub mod projector;
pub mod reader;
pub mod rebuild;
pub mod thumbs;
pub mod verify;
pub mod writer;

pub use codec::score_key;
pub use config::{IndexConfig, CONFIG_FILE_NAME};
pub use dashboard::{DashboardCache, DashboardPatch};
pub use index::CollectionIndex;
pub use projector::project;
pub use reader::{IndexReader, Navigation, Page, SiblingsPage};
pub use rebuild::{CancellationToken, RebuildOrchestrator};
pub use thumbs::ThumbnailCache;
pub use verify::{ConsistencyVerifier, VerifyOptions};
pub use writer::IndexWriter;
