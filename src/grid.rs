use std::sync::Arc;

use crate::enums::Layout;
use crate::series::SeriesGroup;

/// Row-major index of a viewport slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub usize);

/// Which series each slot of a layout shows.
#[derive(Debug, Clone)]
pub struct GridAssignment {
    layout: Layout,
    slots: Vec<Option<Arc<SeriesGroup>>>,
    hidden_count: usize,
}

impl GridAssignment {
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// One entry per slot, `None` for an empty placeholder
    pub fn slots(&self) -> &[Option<Arc<SeriesGroup>>] {
        &self.slots
    }

    pub fn slot(&self, slot: SlotId) -> Option<&Arc<SeriesGroup>> {
        self.slots.get(slot.0).and_then(Option::as_ref)
    }

    /// Series that exist but do not fit into this layout
    pub fn hidden_count(&self) -> usize {
        self.hidden_count
    }

    pub fn assigned_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// (row, col) of a slot in this layout
    pub fn slot_position(&self, slot: SlotId) -> Option<(usize, usize)> {
        let cols = self.layout.cols();
        (slot.0 < self.slots.len()).then(|| (slot.0 / cols, slot.0 % cols))
    }
}

/// Slots are equal when they hold the very same series group.
impl PartialEq for GridAssignment {
    fn eq(&self, other: &Self) -> bool {
        self.layout == other.layout
            && self.hidden_count == other.hidden_count
            && self.slots.len() == other.slots.len()
            && self
                .slots
                .iter()
                .zip(&other.slots)
                .all(|(a, b)| same_series(a.as_ref(), b.as_ref()))
    }
}

pub(crate) fn same_series(a: Option<&Arc<SeriesGroup>>, b: Option<&Arc<SeriesGroup>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Map series onto the slots of `layout` in row-major order.
///
/// The first `capacity` series are assigned, the rest stay hidden, and
/// trailing slots are left empty when there are fewer series than slots.
pub fn compute_assignment(series: &[Arc<SeriesGroup>], layout: Layout) -> GridAssignment {
    let capacity = layout.capacity();
    let mut slots: Vec<_> = series.iter().take(capacity).cloned().map(Some).collect();
    slots.resize(capacity, None);

    GridAssignment {
        layout,
        slots,
        hidden_count: series.len().saturating_sub(capacity),
    }
}
