//! Waypoint edit session.
//!
//! Wraps the currently displayed trail while its view is active and turns
//! user gestures (marker drag, context-menu insert, list reorder) into path
//! mutations. Every successful mutation round-trips through the trail
//! service immediately; there is no client-side persistence beyond the
//! session. Permission is re-checked inside every operation — the UI never
//! invokes these without an edit affordance, but the session does not trust
//! its callers.
//!
//! Concurrent writes are not sequenced or debounced: whichever persistence
//! response is processed last overwrites local state (last response wins).
//! That limitation is documented by the integration tests, not guaranteed
//! away.

use log::{debug, warn};

use crate::error::{Result, SentierMapError};
use crate::geometry::nearest_insertion_index;
use crate::model::{Trail, TrailPath};
use crate::policy::ViewerState;
use crate::services::{OccurrenceService, TrailService};
use crate::Position;

/// Change notification emitted after session state settles.
///
/// `TrailChanged` fires on every trail mutation attempt, including failed
/// persistence: the map must redraw from the last confirmed trail rather
/// than keep showing a dragged marker that was never saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    TrailChanged,
    OccurrenceChanged(i64),
}

type Listener = Box<dyn Fn(&SessionEvent)>;

/// In-memory model of the displayed trail with persistence-backed mutation.
pub struct WaypointEditSession<T: TrailService, O: OccurrenceService> {
    trail: Option<Trail>,
    viewer: ViewerState,
    trail_service: T,
    occurrence_service: O,
    listeners: Vec<Listener>,
}

impl<T: TrailService, O: OccurrenceService> WaypointEditSession<T, O> {
    pub fn new(trail_service: T, occurrence_service: O) -> Self {
        Self {
            trail: None,
            viewer: ViewerState::anonymous(),
            trail_service,
            occurrence_service,
            listeners: Vec::new(),
        }
    }

    /// Fetch a trail from the service and make it the session's subject.
    pub fn load(&mut self, id: i64) -> Result<()> {
        let trail = self.trail_service.fetch(id)?;
        debug!("[session] loaded trail {} ({})", trail.id, trail.display_title());
        self.set_trail(Some(trail));
        Ok(())
    }

    /// Replace the session's trail wholesale (e.g. after navigation).
    pub fn set_trail(&mut self, trail: Option<Trail>) {
        self.trail = trail;
        self.notify(&SessionEvent::TrailChanged);
    }

    /// Update the viewer identity; the cookie decode can complete well after
    /// the session was created.
    pub fn set_viewer(&mut self, viewer: ViewerState) {
        self.viewer = viewer;
    }

    pub fn trail(&self) -> Option<&Trail> {
        self.trail.as_ref()
    }

    /// Current path coordinates, empty when no trail or no path is loaded.
    pub fn coordinates(&self) -> &[Position] {
        self.trail.as_ref().map(Trail::coordinates).unwrap_or(&[])
    }

    /// Whether the current viewer may mutate the current trail.
    pub fn can_edit(&self) -> bool {
        self.trail
            .as_ref()
            .is_some_and(|trail| self.viewer.can_edit(trail))
    }

    /// Register a change listener.
    pub fn on_change(&mut self, listener: impl Fn(&SessionEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self, event: &SessionEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    /// Permission gate shared by all mutations.
    fn editable_trail(&self, operation: &'static str) -> Result<&Trail> {
        let trail = self.trail.as_ref().ok_or(SentierMapError::NoTrail)?;
        if !self.viewer.can_edit(trail) {
            warn!("[session] {operation} rejected: not permitted");
            return Err(SentierMapError::NotPermitted { operation });
        }
        Ok(trail)
    }

    // ========================================================================
    // Path Mutations
    // ========================================================================

    /// Replace the waypoint at `index` with `position`.
    pub fn move_waypoint(&mut self, index: usize, position: Position) -> Result<()> {
        let trail = self.editable_trail("move_waypoint")?;
        let len = trail.coordinates().len();
        if index >= len {
            return Err(SentierMapError::IndexOutOfRange { index, len });
        }

        let mut updated = trail.clone();
        if let Some(path) = updated.path.as_mut() {
            path.coordinates[index] = position;
        }
        updated.sync_endpoints();
        self.persist_trail(updated, "move_waypoint")
    }

    /// Splice `position` into the path at the nearest-segment insertion
    /// index. Returns the index the point ended up at.
    pub fn insert_waypoint(&mut self, position: Position) -> Result<usize> {
        let trail = self.editable_trail("insert_waypoint")?;

        let mut updated = trail.clone();
        let path = updated
            .path
            .get_or_insert_with(|| TrailPath::line_string(0, Vec::new()));
        let index = nearest_insertion_index(&path.coordinates, position);
        path.coordinates.insert(index, position);
        updated.sync_endpoints();
        self.persist_trail(updated, "insert_waypoint")?;
        Ok(index)
    }

    /// Remove the waypoint at `index`. Out-of-range indices are a logged
    /// no-op: nothing is mutated and nothing is persisted.
    pub fn remove_waypoint(&mut self, index: usize) -> Result<()> {
        let trail = self.editable_trail("remove_waypoint")?;
        let len = trail.coordinates().len();
        if index >= len {
            debug!("[session] remove_waypoint({index}) ignored: path has {len} points");
            return Ok(());
        }

        let mut updated = trail.clone();
        if let Some(path) = updated.path.as_mut() {
            path.coordinates.remove(index);
        }
        updated.sync_endpoints();
        self.persist_trail(updated, "remove_waypoint")
    }

    /// Replace the path wholesale with a caller-supplied order (side-panel
    /// drag reorder computes the sequence itself).
    pub fn reorder_waypoints(&mut self, new_order: Vec<Position>) -> Result<()> {
        let trail = self.editable_trail("reorder_waypoints")?;

        let mut updated = trail.clone();
        let path = updated
            .path
            .get_or_insert_with(|| TrailPath::line_string(0, Vec::new()));
        path.coordinates = new_order;
        updated.sync_endpoints();
        self.persist_trail(updated, "reorder_waypoints")
    }

    /// Reposition an occurrence pin. Persists through the occurrence
    /// service, not the trail service.
    pub fn move_occurrence(&mut self, occurrence_id: i64, position: Position) -> Result<()> {
        let trail = self.editable_trail("move_occurrence")?;
        let trail_id = trail.id;

        let mut occurrence = trail
            .occurrence(occurrence_id)
            .cloned()
            .ok_or(SentierMapError::OccurrenceNotFound {
                trail_id,
                occurrence_id,
            })?;
        occurrence.position = Some(position);

        match self.occurrence_service.update(&occurrence) {
            Ok(echoed) => {
                if let Some(trail) = self.trail.as_mut() {
                    if let Some(local) = trail
                        .occurrences
                        .iter_mut()
                        .find(|o| o.id == occurrence_id)
                    {
                        *local = echoed;
                    }
                }
                self.notify(&SessionEvent::OccurrenceChanged(occurrence_id));
                Ok(())
            }
            Err(err) => {
                warn!(
                    "[session] move_occurrence({occurrence_id}) not persisted: {err}; keeping last confirmed position"
                );
                self.notify(&SessionEvent::OccurrenceChanged(occurrence_id));
                Err(err)
            }
        }
    }

    /// Push the updated trail to the service and adopt its echo. On failure
    /// the last confirmed trail stays in place, and listeners are still told
    /// to redraw from it.
    fn persist_trail(&mut self, updated: Trail, operation: &'static str) -> Result<()> {
        match self.trail_service.update(&updated) {
            Ok(echoed) => {
                debug!("[session] {operation} persisted for trail {}", echoed.id);
                self.trail = Some(echoed);
                self.notify(&SessionEvent::TrailChanged);
                Ok(())
            }
            Err(err) => {
                warn!("[session] {operation} not persisted: {err}; keeping last confirmed trail");
                self.notify(&SessionEvent::TrailChanged);
                Err(err)
            }
        }
    }
}
