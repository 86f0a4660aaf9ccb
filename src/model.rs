//! Trail, path and occurrence data model.
//!
//! These types mirror the backend's JSON shapes; almost everything beyond the
//! id is optional because the service omits fields freely depending on the
//! trail's lifecycle state. Field names stay snake_case on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::path_length_meters;
use crate::Position;

/// Trail path geometry ("LineString" in practice).
///
/// Coordinates are ordered front-to-back along the trail: the first element
/// is the start waypoint and the last is the end waypoint once two or more
/// points exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailPath {
    pub id: i64,
    /// Geometry kind, e.g. "LineString"
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Position>,
}

impl TrailPath {
    /// Create an empty LineString path.
    pub fn line_string(id: i64, coordinates: Vec<Position>) -> Self {
        Self {
            id,
            kind: "LineString".to_string(),
            coordinates,
        }
    }
}

/// Cached start/end convenience positions. May lag path edits; the editor
/// re-syncs them from the path on every write-back.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StartEnd {
    pub start: Option<Position>,
    pub end: Option<Position>,
}

/// Reference to a taxon in one of the backing repositories (bdtfx etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonRef {
    pub scientific_name: String,
    pub name_id: i64,
    pub taxon_repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vernacular_names: Vec<String>,
}

/// A point of interest attached to a trail. Positioned independently of the
/// path line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anecdotes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxon: Option<TaxonRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<i64>,
}

/// A trail (sentier) aggregate as served by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trail {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<TrailPath>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<StartEnd>,
    /// Path length in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// One flag per season, spring first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_season: Option<[bool; 4]>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub occurrences: Vec<Occurrence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrences_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_creation: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modification: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_publication: Option<DateTime<Utc>>,
}

impl Trail {
    /// The trail's path coordinates, empty when no path exists yet.
    pub fn coordinates(&self) -> &[Position] {
        self.path.as_ref().map(|p| p.coordinates.as_slice()).unwrap_or(&[])
    }

    /// Start position for display. The path is authoritative when non-empty;
    /// the cached `position.start` is only a fallback for path-less trails.
    pub fn start_position(&self) -> Option<Position> {
        self.coordinates()
            .first()
            .copied()
            .or_else(|| self.position.and_then(|p| p.start))
    }

    /// End position for display, with the same precedence as
    /// [`start_position`](Self::start_position).
    pub fn end_position(&self) -> Option<Position> {
        self.coordinates()
            .last()
            .copied()
            .or_else(|| self.position.and_then(|p| p.end))
    }

    /// Re-derive the cached `position` and `path_length` from the path.
    /// Called after every path mutation so the convenience fields never lag
    /// an edit on write-back.
    pub fn sync_endpoints(&mut self) {
        let length = path_length_meters(self.coordinates());
        let start = self.coordinates().first().copied();
        let end = self.coordinates().last().copied();
        self.path_length = Some(length);
        self.position = Some(StartEnd { start, end });
    }

    /// Human-readable title for popups and marker tooltips.
    pub fn display_title(&self) -> String {
        self.display_name
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_else(|| format!("Sentier #{}", self.id))
    }

    /// Find an occurrence by id.
    pub fn occurrence(&self, occurrence_id: i64) -> Option<&Occurrence> {
        self.occurrences.iter().find(|o| o.id == occurrence_id)
    }
}
