//! Side-panel waypoint list: drag-to-reorder state machine.
//!
//! The panel is a read-only mirror of the path coordinates. It tracks which
//! row a pointer drag started on and, on drop, computes the full reordered
//! sequence for [`WaypointEditSession::reorder_waypoints`]. It never mutates
//! the path itself.
//!
//! [`WaypointEditSession::reorder_waypoints`]: crate::session::WaypointEditSession::reorder_waypoints

use log::debug;

use crate::Position;

/// Drag-reorder state for the ordered waypoint list.
#[derive(Debug, Default)]
pub struct WaypointListPanel {
    dragging: Option<usize>,
}

impl WaypointListPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row index currently being dragged, if any.
    pub fn dragging(&self) -> Option<usize> {
        self.dragging
    }

    /// Pointer drag started on the row at `index`.
    pub fn drag_start(&mut self, index: usize) {
        self.dragging = Some(index);
    }

    /// Drag ended without a drop (left the list, released elsewhere).
    pub fn drag_end(&mut self) {
        self.dragging = None;
    }

    /// Drop onto the row at `target`. Returns the reordered sequence to hand
    /// to the edit session, or `None` when nothing changes: no drag in
    /// progress, a drop on the source row, or an index outside `points`.
    /// The drag state is consumed either way.
    pub fn drop_on(&mut self, points: &[Position], target: usize) -> Option<Vec<Position>> {
        let from = self.dragging.take()?;
        if target == from {
            return None;
        }
        if from >= points.len() || target >= points.len() {
            debug!(
                "[panel] drop {from} -> {target} ignored: list has {} rows",
                points.len()
            );
            return None;
        }

        let mut reordered = points.to_vec();
        let moved = reordered.remove(from);
        reordered.insert(target, moved);
        Some(reordered)
    }
}
