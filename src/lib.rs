//! # Sentier Map
//!
//! Trail map rendering and waypoint editing for a botanical trails client.
//!
//! This library provides:
//! - An in-memory edit session for a trail's path and occurrence pins, with
//!   every mutation round-tripped through the remote trail service
//! - A map renderer that translates trails into marker/polyline layer state
//!   behind a narrow [`MapBackend`](render::MapBackend) adapter
//! - Pure geometry helpers for inserting a waypoint into an existing path
//!
//! ## Features
//!
//! - **`http`** (default) - REST client for the trail/occurrence backend
//!
//! ## Quick Start
//!
//! ```rust
//! use sentier_map::geometry::nearest_insertion_index;
//! use sentier_map::Position;
//!
//! let coords = vec![
//!     Position::new(43.61, 3.87),
//!     Position::new(43.62, 3.88),
//!     Position::new(43.63, 3.89),
//! ];
//!
//! let idx = nearest_insertion_index(&coords, Position::new(43.615, 3.875));
//! assert_eq!(idx, 1);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, SentierMapError};

// Pure geometry (segment projection, insertion index, path length)
pub mod geometry;

// Trail, path and occurrence data model
pub mod model;
pub use model::{Occurrence, StartEnd, TaxonRef, Trail, TrailPath};

// Edit permission policy
pub mod policy;
pub use policy::{Viewer, ViewerState};

// Service trait seams (trail + occurrence persistence)
pub mod services;
pub use services::{OccurrenceService, TrailService};

// REST client for the trail backend
#[cfg(feature = "http")]
pub mod rest;
#[cfg(feature = "http")]
pub use rest::RestClient;

// Waypoint edit session (gesture -> mutation -> persistence)
pub mod session;
pub use session::{SessionEvent, WaypointEditSession};

// Map rendering over the MapBackend adapter
pub mod render;
pub use render::{
    ContextMenuItem, GeolocationProvider, MapBackend, MapConfig, MapRenderer, MarkerKind,
    MarkerSpec, PathEndpoint, PolylineStyle, RenderStats,
};

// Side-panel drag-reorder state machine
pub mod panel;
pub use panel::WaypointListPanel;

// ============================================================================
// Core Types
// ============================================================================

/// A map coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use sentier_map::Position;
/// let p = Position::new(43.611, 3.876); // Montpellier
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    /// Create a new position.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check if the position has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lng >= -180.0
            && self.lng <= 180.0
    }
}

/// Bounding box over a set of positions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl LatLngBounds {
    /// Create bounds from positions. Returns `None` for an empty slice.
    pub fn from_positions(positions: &[Position]) -> Option<Self> {
        if positions.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in positions {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lng = min_lng.min(p.lng);
            max_lng = max_lng.max(p.lng);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> Position {
        Position::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
