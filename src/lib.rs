//! # DICOM-grid library
//!
//! This crate turns a batch of DICOM files into series and lays those
//! series out on a grid of viewports.
//!
//! It builds on the dicom-rs ecosystem for reading files. Pixel decoding and
//! drawing are left to an external rendering engine that is plugged in
//! through the [`RenderingEngine`] trait. The crate covers:
//!  - parsing each file into an [`ImageRecord`] (per-file failures are
//!    collected, never fatal for the batch)
//!  - grouping records by Series Instance UID into ordered [`SeriesGroup`]s
//!  - loading with bounded concurrency where only the latest load may
//!    update the viewer state
//!  - assigning series to the slots of a [`Layout`] (1x1, 2x2, 3x3, 4x3)
//!  - binding viewports to their series, rebinding only what changed
//!
//! Everything is meant to run on a single-threaded event loop; futures
//! are not `Send`.
//!
//! # Examples
//!
//! ## Loading a directory and showing it on a 2x2 grid
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use async_trait::async_trait;
//! # use dicom_grid::{
//! #     InitError, Layout, LoadCoordinator, LoaderConfig, RenderError, RenderingEngine,
//! #     SeriesGroup, SlotId,
//! # };
//! # struct Engine;
//! # #[async_trait(?Send)]
//! # impl RenderingEngine for Engine {
//! #     async fn initialize(&self) -> Result<(), InitError> { Ok(()) }
//! #     async fn bind(&self, _: SlotId, _: &Arc<SeriesGroup>) -> Result<(), RenderError> { Ok(()) }
//! #     async fn unbind(&self, _: SlotId) {}
//! # }
//! # async fn run() {
//! let coordinator = LoadCoordinator::new(Engine, LoaderConfig::default());
//! coordinator.initialize().await.expect("engine should initialize");
//! let report = coordinator
//!     .load_directory("dicom")
//!     .await
//!     .expect("at least one file should parse");
//! println!("{} series, {} bad files", report.series_count, report.errors.len());
//!
//! coordinator.set_layout(Layout::TwoByTwo);
//! coordinator.sync_viewports().await.expect("engine is ready");
//! # }
//! ```

pub mod config;
pub mod enums;
pub mod error;
pub mod grid;
pub mod record;
pub mod route;
pub mod series;
pub mod series_loader;
pub mod source;
pub mod state;
pub mod viewport;

#[cfg(test)]
mod test_support;

pub use config::LoaderConfig;
pub use enums::{Layout, OverflowPolicy, Readiness};
pub use error::{BindingError, InitError, LoadError, LoadFailure, ParseFailureReason, RenderError};
pub use grid::{GridAssignment, SlotId, compute_assignment};
pub use record::{ImageRecord, RecordParser};
pub use route::{Route, View};
pub use series::{SeriesGroup, SeriesGrouper};
pub use series_loader::{LoadCoordinator, LoadReport, LoadStatus};
pub use source::{FileSource, MemorySource, PathSource};
pub use state::{Generation, ViewerSnapshot};
pub use viewport::{EngineGate, RenderingEngine, SyncReport, ViewportBinder};
