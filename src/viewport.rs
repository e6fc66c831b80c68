use std::cell::Cell;
use std::sync::Arc;

use async_trait::async_trait;
use futures::lock::Mutex;

use crate::enums::Readiness;
use crate::error::{BindingError, InitError, RenderError};
use crate::grid::{GridAssignment, SlotId, same_series};
use crate::series::SeriesGroup;

/// The external engine that draws a series into a viewport.
///
/// `initialize` must succeed before any `bind` or `unbind` is issued;
/// [`EngineGate`] enforces that.
#[async_trait(?Send)]
pub trait RenderingEngine {
    async fn initialize(&self) -> Result<(), InitError>;

    async fn bind(&self, slot: SlotId, series: &Arc<SeriesGroup>) -> Result<(), RenderError>;

    async fn unbind(&self, slot: SlotId);
}

/// Owns the engine and tracks whether it may be used.
pub struct EngineGate<E> {
    engine: E,
    readiness: Cell<Readiness>,
    init_lock: Mutex<()>,
}

impl<E: RenderingEngine> EngineGate<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            readiness: Cell::new(Readiness::Uninitialized),
            init_lock: Mutex::new(()),
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.get()
    }

    /// Run the engine's initialization once.
    ///
    /// A failure is terminal: the gate stays `Failed` and every later call
    /// returns an error without touching the engine again. A call made while
    /// another one is running waits for it and shares its outcome.
    pub async fn initialize(&self) -> Result<(), InitError> {
        let _guard = self.init_lock.lock().await;
        match self.readiness.get() {
            // Initializing is only ever seen while the lock is held
            Readiness::Uninitialized | Readiness::Initializing => {}
            Readiness::Ready => return Ok(()),
            Readiness::Failed => {
                return Err(InitError(
                    "rendering engine failed to initialize earlier".to_string(),
                ));
            }
        }

        self.readiness.set(Readiness::Initializing);
        match self.engine.initialize().await {
            Ok(()) => {
                self.readiness.set(Readiness::Ready);
                log::info!("Rendering engine initialized");
                Ok(())
            }
            Err(err) => {
                self.readiness.set(Readiness::Failed);
                log::error!("Rendering engine failed to initialize: {err}");
                Err(err)
            }
        }
    }

    /// The engine, if it is ready to take calls
    pub fn engine(&self) -> Result<&E, Readiness> {
        match self.readiness.get() {
            Readiness::Ready => Ok(&self.engine),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub bound: Vec<SlotId>,
    pub unbound: Vec<SlotId>,
    pub unchanged: Vec<SlotId>,
    pub failures: Vec<(SlotId, RenderError)>,
}

/// Remembers which series each viewport is bound to.
#[derive(Debug, Default)]
pub struct ViewportBinder {
    bound: Vec<Option<Arc<SeriesGroup>>>,
}

impl ViewportBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self, slot: SlotId) -> Option<&Arc<SeriesGroup>> {
        self.bound.get(slot.0).and_then(Option::as_ref)
    }

    /// Bring the engine's viewports in line with `assignment`.
    ///
    /// Slots that already show the same series are left alone. Changed
    /// slots are unbound, then bound to their new series. A failed bind
    /// leaves only that slot empty; it is retried on the next sync.
    pub async fn sync<E: RenderingEngine>(
        &mut self,
        gate: &EngineGate<E>,
        assignment: &GridAssignment,
    ) -> Result<SyncReport, BindingError> {
        let engine = gate.engine().map_err(BindingError::NotReady)?;
        let wanted_slots = assignment.slots();
        let slot_count = self.bound.len().max(wanted_slots.len());
        self.bound.resize(slot_count, None);

        let mut report = SyncReport::default();
        for index in 0..slot_count {
            let slot = SlotId(index);
            let wanted = wanted_slots.get(index).and_then(Option::as_ref);

            if same_series(self.bound[index].as_ref(), wanted) {
                if wanted.is_some() {
                    report.unchanged.push(slot);
                }
                continue;
            }

            if self.bound[index].take().is_some() {
                engine.unbind(slot).await;
                report.unbound.push(slot);
            }

            if let Some(series) = wanted {
                match engine.bind(slot, series).await {
                    Ok(()) => {
                        log::debug!("Bound slot {} to series {}", index, series.label());
                        self.bound[index] = Some(Arc::clone(series));
                        report.bound.push(slot);
                    }
                    Err(err) => {
                        log::warn!("Could not bind slot {index}: {err}");
                        report.failures.push((slot, err));
                    }
                }
            }
        }

        self.bound.truncate(wanted_slots.len());
        Ok(report)
    }
}
