use std::sync::Arc;

use crate::enums::{Layout, OverflowPolicy};
use crate::error::{LoadError, LoadFailure};
use crate::grid::{GridAssignment, compute_assignment};
use crate::series::SeriesGroup;

/// Sequence number of a load call. Later calls get larger numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

#[derive(Debug)]
pub enum ViewerEvent {
    LoadStarted,
    LoadSucceeded {
        generation: Generation,
        series: Vec<SeriesGroup>,
        errors: Vec<LoadError>,
    },
    LoadFailed {
        generation: Generation,
        failure: LoadFailure,
    },
    LayoutChanged(Layout),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Started(Generation),
    SeriesReplaced {
        generation: Generation,
        series_count: usize,
    },
    FailureRecorded(Generation),
    /// A result from a generation that is no longer the latest; dropped.
    Stale {
        generation: Generation,
        latest: Generation,
    },
    Relaid(Layout),
}

/// Series that the active layout cannot show, reported under
/// [`OverflowPolicy::Warn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverflowNotice {
    pub layout: Layout,
    pub hidden: usize,
}

/// Consistent copy of the viewer state.
#[derive(Debug, Clone)]
pub struct ViewerSnapshot {
    pub generation: Generation,
    pub loading: bool,
    pub series: Arc<[Arc<SeriesGroup>]>,
    pub layout: Layout,
    pub assignment: GridAssignment,
    /// Per-file errors of the last applied load
    pub errors: Vec<LoadError>,
    /// Batch failure of the latest load, if it failed
    pub failure: Option<LoadFailure>,
    pub notice: Option<OverflowNotice>,
}

/// The only mutable state shared between loads and layout changes.
///
/// Every change goes through [`ViewerState::apply`], which replaces the
/// series list and the derived assignment together.
#[derive(Debug)]
pub struct ViewerState {
    overflow_policy: OverflowPolicy,
    latest: Generation,
    pending: Option<Generation>,
    series: Arc<[Arc<SeriesGroup>]>,
    layout: Layout,
    assignment: GridAssignment,
    errors: Vec<LoadError>,
    failure: Option<LoadFailure>,
    notice: Option<OverflowNotice>,
}

impl ViewerState {
    pub fn new(layout: Layout, overflow_policy: OverflowPolicy) -> Self {
        Self {
            overflow_policy,
            latest: Generation::default(),
            pending: None,
            series: Arc::from(Vec::new()),
            layout,
            assignment: compute_assignment(&[], layout),
            errors: Vec::new(),
            failure: None,
            notice: None,
        }
    }

    pub fn apply(&mut self, event: ViewerEvent) -> Transition {
        match event {
            ViewerEvent::LoadStarted => Transition::Started(self.start_load()),
            ViewerEvent::LoadSucceeded {
                generation,
                series,
                errors,
            } => {
                if let Some(stale) = self.reject_stale(generation) {
                    return stale;
                }
                self.series = series.into_iter().map(Arc::new).collect();
                self.errors = errors;
                self.failure = None;
                self.pending = None;
                self.refresh_assignment();
                Transition::SeriesReplaced {
                    generation,
                    series_count: self.series.len(),
                }
            }
            ViewerEvent::LoadFailed {
                generation,
                failure,
            } => {
                if let Some(stale) = self.reject_stale(generation) {
                    return stale;
                }
                self.failure = Some(failure);
                self.pending = None;
                Transition::FailureRecorded(generation)
            }
            ViewerEvent::LayoutChanged(layout) => {
                self.layout = layout;
                self.refresh_assignment();
                Transition::Relaid(layout)
            }
        }
    }

    /// Open a new generation; results of all older ones become stale.
    pub fn start_load(&mut self) -> Generation {
        self.latest = self.latest.next();
        self.pending = Some(self.latest);
        self.latest
    }

    fn reject_stale(&self, generation: Generation) -> Option<Transition> {
        (generation != self.latest).then_some(Transition::Stale {
            generation,
            latest: self.latest,
        })
    }

    fn refresh_assignment(&mut self) {
        self.assignment = compute_assignment(&self.series, self.layout);

        let hidden = self.assignment.hidden_count();
        self.notice = match self.overflow_policy {
            OverflowPolicy::Warn if hidden > 0 => {
                log::warn!(
                    "{} series do not fit into layout {} and are hidden",
                    hidden,
                    self.layout
                );
                Some(OverflowNotice {
                    layout: self.layout,
                    hidden,
                })
            }
            _ => None,
        };
    }

    pub fn assignment(&self) -> &GridAssignment {
        &self.assignment
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        ViewerSnapshot {
            generation: self.latest,
            loading: self.is_loading(),
            series: Arc::clone(&self.series),
            layout: self.layout,
            assignment: self.assignment.clone(),
            errors: self.errors.clone(),
            failure: self.failure.clone(),
            notice: self.notice,
        }
    }
}
