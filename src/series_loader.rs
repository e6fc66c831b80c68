use std::{cell::RefCell, path::Path};

use futures::{StreamExt, lock::Mutex, stream};
use web_time::Instant;

use crate::config::LoaderConfig;
use crate::enums::{Layout, Readiness};
use crate::error::{BindingError, InitError, LoadError, LoadFailure};
use crate::grid::GridAssignment;
use crate::record::{ImageRecord, RecordParser};
use crate::route::{Route, View, resolve_view};
use crate::series::SeriesGrouper;
use crate::source::{FileSource, sources_from_directory, sources_from_paths};
use crate::state::{Generation, Transition, ViewerEvent, ViewerSnapshot, ViewerState};
use crate::viewport::{EngineGate, RenderingEngine, SyncReport, ViewportBinder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The result replaced the current series list.
    Applied,
    /// A newer load was started meanwhile; the result was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub generation: Generation,
    pub status: LoadStatus,
    pub series_count: usize,
    pub record_count: usize,
    pub errors: Vec<LoadError>,
}

/// Runs loads, owns the current series list and drives the viewports.
///
/// Everything runs on one event loop: state sits in a `RefCell` that is
/// never borrowed across an `.await`.
pub struct LoadCoordinator<E> {
    config: LoaderConfig,
    gate: EngineGate<E>,
    state: RefCell<ViewerState>,
    binder: Mutex<ViewportBinder>,
}

impl<E: RenderingEngine> LoadCoordinator<E> {
    pub fn new(engine: E, config: LoaderConfig) -> Self {
        let state = ViewerState::new(config.initial_layout, config.overflow_policy);
        Self {
            config,
            gate: EngineGate::new(engine),
            state: RefCell::new(state),
            binder: Mutex::new(ViewportBinder::new()),
        }
    }

    pub async fn initialize(&self) -> Result<(), InitError> {
        self.gate.initialize().await
    }

    pub fn readiness(&self) -> Readiness {
        self.gate.readiness()
    }

    pub fn gate(&self) -> &EngineGate<E> {
        &self.gate
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        self.state.borrow().snapshot()
    }

    /// Parse and group a batch of files, then replace the current series.
    ///
    /// Files are read with bounded concurrency and regrouped in input
    /// order. Only the most recently started call may change the state;
    /// results of older calls come back as [`LoadStatus::Stale`].
    ///
    /// # Errors
    ///
    /// `NotReady` before the engine is initialized, `EmptyResult` when no
    /// file could be parsed. In both cases the current series are kept.
    /// A superseded load never fails: it reports [`LoadStatus::Stale`]
    /// with whatever per-file errors it collected.
    pub async fn load_files(
        &self,
        files: Vec<Box<dyn FileSource>>,
    ) -> Result<LoadReport, LoadFailure> {
        self.ensure_ready()?;

        let generation = self.state.borrow_mut().start_load();
        let started = Instant::now();
        let attempted = files.len();
        log::info!("Loading {attempted} files (generation {})", generation.0);

        let (records, errors) = Self::parse_all(&files, self.config.read_concurrency()).await;

        if records.is_empty() {
            let failure = LoadFailure::EmptyResult {
                attempted,
                errors: errors.clone(),
            };
            let transition = self.state.borrow_mut().apply(ViewerEvent::LoadFailed {
                generation,
                failure: failure.clone(),
            });
            if let Transition::Stale { latest, .. } = transition {
                log::warn!(
                    "Dropping failed generation {}, generation {} is newer",
                    generation.0,
                    latest.0
                );
                return Ok(LoadReport {
                    generation,
                    status: LoadStatus::Stale,
                    series_count: 0,
                    record_count: 0,
                    errors,
                });
            }
            log::error!("{failure}");
            return Err(failure);
        }

        let record_count = records.len();
        let series = SeriesGrouper::group(records);
        let series_count = series.len();
        let transition = self.state.borrow_mut().apply(ViewerEvent::LoadSucceeded {
            generation,
            series,
            errors: errors.clone(),
        });

        let status = match transition {
            Transition::Stale { latest, .. } => {
                log::warn!(
                    "Dropping result of generation {}, generation {} is newer",
                    generation.0,
                    latest.0
                );
                LoadStatus::Stale
            }
            _ => {
                log::info!(
                    "Loaded {} series from {} of {} files in {:?}",
                    series_count,
                    record_count,
                    attempted,
                    started.elapsed()
                );
                LoadStatus::Applied
            }
        };

        Ok(LoadReport {
            generation,
            status,
            series_count,
            record_count,
            errors,
        })
    }

    pub async fn load_paths(&self, paths: &[impl AsRef<Path>]) -> Result<LoadReport, LoadFailure> {
        self.load_files(sources_from_paths(paths)).await
    }

    /// Load every `.dcm` file of a directory
    pub async fn load_directory(&self, path: impl AsRef<Path>) -> Result<LoadReport, LoadFailure> {
        self.ensure_ready()?;
        let sources = sources_from_directory(path)?;
        self.load_files(sources).await
    }

    /// Switch the grid layout. Series are neither re-parsed nor regrouped.
    ///
    /// Only the state changes; viewports follow on the next
    /// [`sync_viewports`](Self::sync_viewports). Use
    /// [`switch_layout`](Self::switch_layout) to do both.
    pub fn set_layout(&self, layout: Layout) -> GridAssignment {
        let mut state = self.state.borrow_mut();
        state.apply(ViewerEvent::LayoutChanged(layout));
        state.assignment().clone()
    }

    /// Switch the layout and rebind the viewports whose series changed.
    pub async fn switch_layout(&self, layout: Layout) -> Result<SyncReport, BindingError> {
        self.set_layout(layout);
        self.sync_viewports().await
    }

    /// Follow a route: a valid `/grid/:layout` also switches the layout.
    ///
    /// Like [`set_layout`](Self::set_layout), this does not touch the
    /// viewports.
    pub fn navigate(&self, path: &str) -> View {
        let route = Route::parse(path);
        if let Route::Grid(layout) = route {
            self.set_layout(layout);
        }
        resolve_view(&route, &self.snapshot())
    }

    /// Bind the engine's viewports to the current assignment.
    pub async fn sync_viewports(&self) -> Result<SyncReport, BindingError> {
        let mut binder = self.binder.lock().await;
        let assignment = self.state.borrow().assignment().clone();
        binder.sync(&self.gate, &assignment).await
    }

    fn ensure_ready(&self) -> Result<(), LoadFailure> {
        match self.gate.readiness() {
            Readiness::Ready => Ok(()),
            other => Err(LoadFailure::NotReady(other)),
        }
    }

    async fn parse_all(
        files: &[Box<dyn FileSource>],
        concurrency: usize,
    ) -> (Vec<ImageRecord>, Vec<LoadError>) {
        let mut results: Vec<_> = stream::iter(files.iter().enumerate())
            .map(|(index, file)| async move {
                (index, RecordParser::read_and_parse(index, file.as_ref()).await)
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // completion order is arbitrary, grouping needs input order
        results.sort_by_key(|(index, _)| *index);

        let mut records = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for (_, result) in results {
            match result {
                Ok(record) => records.push(record),
                Err(err) => {
                    log::warn!("{err}");
                    errors.push(err);
                }
            }
        }
        (records, errors)
    }
}
