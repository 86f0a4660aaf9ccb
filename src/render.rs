//! Map rendering over a narrow backend adapter.
//!
//! [`MapRenderer`] translates a trail (or a trail list in overview mode) into
//! marker and polyline layer state. The actual mapping library sits behind
//! [`MapBackend`], which only knows how to clear, add layers, fit bounds and
//! move the viewport, so the renderer logic runs headless in tests.
//!
//! Every render pass clears and rebuilds all layers. At the data volumes of a
//! trail (tens of points), correctness beats incremental diffing. A failed
//! layer add is logged and skipped; partial maps are acceptable and the rest
//! of the pass continues.

use std::time::Duration;

use log::{debug, warn};

use crate::error::Result;
use crate::model::{Occurrence, Trail};
use crate::{LatLngBounds, Position};

/// Default map constants. These match the production map: centered on the
/// Montpellier region, OSM tiles, a fixed fit padding, and a zoomed-in view
/// when jumping to the viewer's own position.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    /// Initial viewport center.
    pub center: Position,
    /// Initial zoom level.
    pub zoom: u8,
    /// Maximum tile zoom.
    pub max_zoom: u8,
    /// Tile layer URL template.
    pub tile_url: String,
    /// Padding in pixels when fitting the viewport to rendered points.
    pub fit_padding: u32,
    /// Zoom applied when centering on the viewer's geolocation.
    pub user_location_zoom: u8,
    /// Overview pins are clustered while the current zoom is below this;
    /// at or above it they revert to individual markers.
    pub cluster_max_zoom: u8,
    /// Platform geolocation timeout.
    pub geolocation_timeout: Duration,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: Position::new(43.611, 3.876),
            zoom: 7,
            max_zoom: 19,
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            fit_padding: 20,
            user_location_zoom: 14,
            cluster_max_zoom: 12,
            geolocation_timeout: Duration::from_secs(10),
        }
    }
}

/// Which icon a path point marker gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathEndpoint {
    Start,
    Intermediate,
    End,
}

/// What a marker represents. The embedded ids let the page route backend
/// gestures (click, drag end) back to the edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// Overview pin at a trail's start position
    TrailPin { trail_id: i64 },
    /// One waypoint of the displayed trail's path
    PathPoint {
        index: usize,
        endpoint: PathEndpoint,
    },
    /// An occurrence pin of the displayed trail
    Occurrence { occurrence_id: i64 },
    /// The viewer's own geolocated position
    UserLocation,
}

/// A marker to place on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: Position,
    pub kind: MarkerKind,
    pub title: Option<String>,
    pub draggable: bool,
    /// Whether the backend should route this marker through its cluster layer
    pub clustered: bool,
}

/// Styling for the route polyline, distinct from the base tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct PolylineStyle {
    pub color: String,
    pub weight: u8,
    pub opacity: f64,
}

impl Default for PolylineStyle {
    fn default() -> Self {
        Self {
            color: "#059669".to_string(),
            weight: 4,
            opacity: 0.9,
        }
    }
}

/// Typed adapter over the external mapping library.
pub trait MapBackend {
    /// Remove every layer previously added by the renderer.
    fn clear_layers(&mut self);
    fn add_marker(&mut self, marker: &MarkerSpec) -> Result<()>;
    fn add_polyline(&mut self, points: &[Position], style: &PolylineStyle) -> Result<()>;
    fn fit_bounds(&mut self, bounds: LatLngBounds, padding: u32);
    fn set_view(&mut self, center: Position, zoom: u8);
    /// Current viewport zoom level.
    fn zoom(&self) -> u8;
}

/// Platform geolocation. One in-flight request with a platform timeout; no
/// retry, no de-duplication of concurrent invocations.
pub trait GeolocationProvider {
    fn current_position(&self, timeout: Duration) -> Result<Position>;
}

/// Contextual map actions offered on a right-click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMenuItem {
    AddWaypointHere,
}

/// What a render pass did. Failed layer adds are counted, not fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub markers_added: usize,
    pub markers_failed: usize,
    pub polylines_added: usize,
    pub bounds_fitted: bool,
}

/// Translates trails into backend layer state.
pub struct MapRenderer<B: MapBackend> {
    backend: B,
    config: MapConfig,
    user_position: Option<Position>,
    editable_trail_shown: bool,
}

impl<B: MapBackend> MapRenderer<B> {
    pub fn new(backend: B, config: MapConfig) -> Self {
        Self {
            backend,
            config,
            user_position: None,
            editable_trail_shown: false,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Overview mode: one pin per trail at its start position, clustered at
    /// low zoom. With zero renderable trails the viewport is left untouched.
    pub fn render_overview(&mut self, trails: &[Trail]) -> RenderStats {
        self.backend.clear_layers();
        self.editable_trail_shown = false;

        let clustered = self.backend.zoom() < self.config.cluster_max_zoom;
        let mut stats = RenderStats::default();
        let mut rendered = Vec::new();

        for trail in trails {
            let Some(position) = trail.start_position() else {
                debug!("[render] trail {} has no position, skipping pin", trail.id);
                continue;
            };
            let marker = MarkerSpec {
                position,
                kind: MarkerKind::TrailPin { trail_id: trail.id },
                title: Some(trail.display_title()),
                draggable: false,
                clustered,
            };
            if self.try_add_marker(&marker, &mut stats) {
                rendered.push(position);
            }
        }

        self.readd_user_marker(&mut stats);
        self.fit_to(&rendered, &mut stats);
        stats
    }

    /// Single-trail mode: path waypoint markers, the connecting polyline,
    /// then occurrence pins. Markers are draggable iff `can_edit`.
    pub fn render_trail(&mut self, trail: &Trail, can_edit: bool) -> RenderStats {
        self.backend.clear_layers();
        self.editable_trail_shown = can_edit;

        let mut stats = RenderStats::default();
        let coords = trail.coordinates();
        let mut rendered: Vec<Position> = coords.to_vec();

        for (index, position) in coords.iter().enumerate() {
            let endpoint = if index == 0 {
                PathEndpoint::Start
            } else if index == coords.len() - 1 {
                PathEndpoint::End
            } else {
                PathEndpoint::Intermediate
            };
            let marker = MarkerSpec {
                position: *position,
                kind: MarkerKind::PathPoint { index, endpoint },
                title: None,
                draggable: can_edit,
                clustered: false,
            };
            self.try_add_marker(&marker, &mut stats);
        }

        if coords.len() >= 2 {
            match self.backend.add_polyline(coords, &PolylineStyle::default()) {
                Ok(()) => stats.polylines_added += 1,
                Err(err) => warn!("[render] polyline for trail {} skipped: {err}", trail.id),
            }
        }

        for occurrence in &trail.occurrences {
            let Some(position) = occurrence.position else {
                continue;
            };
            let marker = MarkerSpec {
                position,
                kind: MarkerKind::Occurrence {
                    occurrence_id: occurrence.id,
                },
                title: occurrence_title(occurrence),
                draggable: can_edit,
                clustered: false,
            };
            if self.try_add_marker(&marker, &mut stats) {
                rendered.push(position);
            }
        }

        self.readd_user_marker(&mut stats);
        self.fit_to(&rendered, &mut stats);
        stats
    }

    /// Context actions for a right-click on empty map area. Only an editable
    /// single-trail view offers anything.
    pub fn context_menu(&self) -> Vec<ContextMenuItem> {
        if self.editable_trail_shown {
            vec![ContextMenuItem::AddWaypointHere]
        } else {
            Vec::new()
        }
    }

    /// Ask the platform for the viewer's position; on success place or move
    /// the "you are here" marker and center on it. Failures are logged and
    /// otherwise ignored.
    pub fn locate_viewer(&mut self, provider: &dyn GeolocationProvider) {
        match provider.current_position(self.config.geolocation_timeout) {
            Ok(position) => {
                self.user_position = Some(position);
                let mut stats = RenderStats::default();
                self.readd_user_marker(&mut stats);
                self.backend
                    .set_view(position, self.config.user_location_zoom);
            }
            Err(err) => {
                warn!("[render] geolocation failed: {err}");
            }
        }
    }

    fn try_add_marker(&mut self, marker: &MarkerSpec, stats: &mut RenderStats) -> bool {
        match self.backend.add_marker(marker) {
            Ok(()) => {
                stats.markers_added += 1;
                true
            }
            Err(err) => {
                warn!("[render] marker {:?} skipped: {err}", marker.kind);
                stats.markers_failed += 1;
                false
            }
        }
    }

    /// The user marker survives full layer rebuilds once geolocation has
    /// succeeded. It never participates in bounds fitting.
    fn readd_user_marker(&mut self, stats: &mut RenderStats) {
        if let Some(position) = self.user_position {
            let marker = MarkerSpec {
                position,
                kind: MarkerKind::UserLocation,
                title: Some("Vous êtes ici".to_string()),
                draggable: false,
                clustered: false,
            };
            self.try_add_marker(&marker, stats);
        }
    }

    fn fit_to(&mut self, rendered: &[Position], stats: &mut RenderStats) {
        if let Some(bounds) = LatLngBounds::from_positions(rendered) {
            self.backend.fit_bounds(bounds, self.config.fit_padding);
            stats.bounds_fitted = true;
        }
    }
}

fn occurrence_title(occurrence: &Occurrence) -> Option<String> {
    occurrence
        .taxon
        .as_ref()
        .map(|t| t.scientific_name.clone())
        .or_else(|| occurrence.card_tag.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SentierMapError;
    use crate::model::{TaxonRef, TrailPath};

    // ------------------------------------------------------------------
    // Recording fake backend
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct FakeBackend {
        markers: Vec<MarkerSpec>,
        polylines: Vec<Vec<Position>>,
        fit_calls: Vec<(LatLngBounds, u32)>,
        views: Vec<(Position, u8)>,
        clears: usize,
        current_zoom: u8,
        fail_occurrence_markers: bool,
    }

    impl MapBackend for FakeBackend {
        fn clear_layers(&mut self) {
            self.clears += 1;
            self.markers.clear();
            self.polylines.clear();
        }

        fn add_marker(&mut self, marker: &MarkerSpec) -> crate::Result<()> {
            if self.fail_occurrence_markers
                && matches!(marker.kind, MarkerKind::Occurrence { .. })
            {
                return Err(SentierMapError::service_unavailable("icon load failed"));
            }
            self.markers.push(marker.clone());
            Ok(())
        }

        fn add_polyline(
            &mut self,
            points: &[Position],
            _style: &PolylineStyle,
        ) -> crate::Result<()> {
            self.polylines.push(points.to_vec());
            Ok(())
        }

        fn fit_bounds(&mut self, bounds: LatLngBounds, padding: u32) {
            self.fit_calls.push((bounds, padding));
        }

        fn set_view(&mut self, center: Position, zoom: u8) {
            self.views.push((center, zoom));
        }

        fn zoom(&self) -> u8 {
            self.current_zoom
        }
    }

    struct FixedGeolocation(crate::Result<Position>);

    impl GeolocationProvider for FixedGeolocation {
        fn current_position(&self, _timeout: Duration) -> crate::Result<Position> {
            self.0.clone()
        }
    }

    fn trail(id: i64, coords: Vec<Position>) -> Trail {
        Trail {
            id,
            display_name: Some(format!("Sentier {id}")),
            path: Some(TrailPath::line_string(id * 10, coords)),
            ..Trail::default()
        }
    }

    fn trail_with_occurrence(id: i64, coords: Vec<Position>) -> Trail {
        let mut t = trail(id, coords);
        t.occurrences = vec![Occurrence {
            id: 900,
            position: Some(Position::new(43.65, 3.85)),
            card_tag: Some("A12".to_string()),
            anecdotes: None,
            user_id: None,
            taxon: Some(TaxonRef {
                scientific_name: "Ophrys apifera".to_string(),
                name_id: 4600,
                taxon_repository: "bdtfx".to_string(),
                family: None,
                vernacular_names: vec![],
            }),
            image_id: None,
        }];
        t
    }

    fn renderer() -> MapRenderer<FakeBackend> {
        MapRenderer::new(FakeBackend::default(), MapConfig::default())
    }

    // ------------------------------------------------------------------
    // Overview mode
    // ------------------------------------------------------------------

    #[test]
    fn test_empty_overview_leaves_viewport_alone() {
        // Spec scenario 10
        let mut renderer = renderer();
        let stats = renderer.render_overview(&[]);

        assert_eq!(stats.markers_added, 0);
        assert!(!stats.bounds_fitted);
        assert!(renderer.backend().fit_calls.is_empty());
    }

    #[test]
    fn test_overview_renders_one_pin_per_trail_and_fits() {
        let mut renderer = renderer();
        let trails = vec![
            trail(1, vec![Position::new(43.6, 3.8)]),
            trail(2, vec![Position::new(43.7, 3.9)]),
            trail(3, vec![]), // no position at all, skipped
        ];
        let stats = renderer.render_overview(&trails);

        assert_eq!(stats.markers_added, 2);
        assert!(stats.bounds_fitted);

        let backend = renderer.backend();
        assert_eq!(backend.markers.len(), 2);
        assert!(backend
            .markers
            .iter()
            .all(|m| matches!(m.kind, MarkerKind::TrailPin { .. }) && !m.draggable));
        assert_eq!(backend.markers[0].title.as_deref(), Some("Sentier 1"));
        assert_eq!(backend.fit_calls[0].1, 20);
    }

    #[test]
    fn test_overview_falls_back_to_cached_position() {
        let mut t = trail(5, vec![]);
        t.position = Some(crate::StartEnd {
            start: Some(Position::new(43.5, 3.7)),
            end: None,
        });

        let mut renderer = renderer();
        let stats = renderer.render_overview(&[t]);
        assert_eq!(stats.markers_added, 1);
    }

    #[test]
    fn test_overview_clusters_only_at_low_zoom() {
        let trails = vec![trail(1, vec![Position::new(43.6, 3.8)])];

        let mut backend = FakeBackend::default();
        backend.current_zoom = 8; // below cluster_max_zoom (12)
        let mut renderer = MapRenderer::new(backend, MapConfig::default());
        renderer.render_overview(&trails);
        assert!(renderer.backend().markers[0].clustered);

        let mut backend = FakeBackend::default();
        backend.current_zoom = 13;
        let mut renderer = MapRenderer::new(backend, MapConfig::default());
        renderer.render_overview(&trails);
        assert!(!renderer.backend().markers[0].clustered);
    }

    // ------------------------------------------------------------------
    // Single-trail mode
    // ------------------------------------------------------------------

    #[test]
    fn test_trail_render_layers_and_endpoint_kinds() {
        let coords = vec![
            Position::new(43.60, 3.80),
            Position::new(43.61, 3.81),
            Position::new(43.62, 3.82),
        ];
        let mut renderer = renderer();
        let stats = renderer.render_trail(&trail_with_occurrence(1, coords.clone()), false);

        // 3 path markers + 1 occurrence pin
        assert_eq!(stats.markers_added, 4);
        assert_eq!(stats.polylines_added, 1);
        assert!(stats.bounds_fitted);

        let backend = renderer.backend();
        assert_eq!(backend.clears, 1);
        let endpoints: Vec<_> = backend
            .markers
            .iter()
            .filter_map(|m| match m.kind {
                MarkerKind::PathPoint { endpoint, .. } => Some(endpoint),
                _ => None,
            })
            .collect();
        assert_eq!(
            endpoints,
            vec![
                PathEndpoint::Start,
                PathEndpoint::Intermediate,
                PathEndpoint::End
            ]
        );
        assert_eq!(backend.polylines[0], coords);
    }

    #[test]
    fn test_draggable_mirrors_edit_rights() {
        let coords = vec![Position::new(43.6, 3.8), Position::new(43.7, 3.9)];
        let t = trail_with_occurrence(1, coords);

        let mut renderer = renderer();
        renderer.render_trail(&t, true);
        assert!(renderer.backend().markers.iter().all(|m| m.draggable));
        assert_eq!(
            renderer.context_menu(),
            vec![ContextMenuItem::AddWaypointHere]
        );

        renderer.render_trail(&t, false);
        assert!(renderer.backend().markers.iter().all(|m| !m.draggable));
        assert!(renderer.context_menu().is_empty());
    }

    #[test]
    fn test_overview_never_offers_context_menu() {
        let mut renderer = renderer();
        renderer.render_trail(&trail(1, vec![Position::new(43.6, 3.8)]), true);
        renderer.render_overview(&[trail(1, vec![Position::new(43.6, 3.8)])]);
        assert!(renderer.context_menu().is_empty());
    }

    #[test]
    fn test_single_point_trail_has_no_polyline() {
        let mut renderer = renderer();
        let stats = renderer.render_trail(&trail(1, vec![Position::new(43.6, 3.8)]), false);
        assert_eq!(stats.polylines_added, 0);
        assert_eq!(stats.markers_added, 1);
    }

    #[test]
    fn test_failed_marker_does_not_abort_render() {
        // Spec property: icon failures are logged and skipped
        let coords = vec![Position::new(43.6, 3.8), Position::new(43.7, 3.9)];
        let mut backend = FakeBackend::default();
        backend.fail_occurrence_markers = true;
        let mut renderer = MapRenderer::new(backend, MapConfig::default());

        let stats = renderer.render_trail(&trail_with_occurrence(1, coords), false);
        assert_eq!(stats.markers_failed, 1);
        assert_eq!(stats.markers_added, 2);
        assert_eq!(stats.polylines_added, 1);
        assert!(stats.bounds_fitted);
    }

    #[test]
    fn test_occurrence_title_prefers_taxon_name() {
        let t = trail_with_occurrence(1, vec![Position::new(43.6, 3.8)]);
        assert_eq!(
            occurrence_title(&t.occurrences[0]).as_deref(),
            Some("Ophrys apifera")
        );

        let mut occurrence = t.occurrences[0].clone();
        occurrence.taxon = None;
        assert_eq!(occurrence_title(&occurrence).as_deref(), Some("A12"));
    }

    // ------------------------------------------------------------------
    // Geolocation
    // ------------------------------------------------------------------

    #[test]
    fn test_locate_viewer_places_marker_and_centers() {
        let here = Position::new(43.62, 3.88);
        let mut renderer = renderer();
        renderer.locate_viewer(&FixedGeolocation(Ok(here)));

        let backend = renderer.backend();
        assert_eq!(backend.views, vec![(here, 14)]);
        assert!(matches!(
            backend.markers.last().unwrap().kind,
            MarkerKind::UserLocation
        ));
    }

    #[test]
    fn test_locate_viewer_failure_is_silent() {
        let mut renderer = renderer();
        renderer.locate_viewer(&FixedGeolocation(Err(SentierMapError::Geolocation {
            message: "permission denied".to_string(),
        })));

        let backend = renderer.backend();
        assert!(backend.views.is_empty());
        assert!(backend.markers.is_empty());
    }

    #[test]
    fn test_user_marker_survives_rerender() {
        let here = Position::new(43.62, 3.88);
        let mut renderer = renderer();
        renderer.locate_viewer(&FixedGeolocation(Ok(here)));

        renderer.render_overview(&[trail(1, vec![Position::new(43.6, 3.8)])]);
        let backend = renderer.backend();
        assert!(backend
            .markers
            .iter()
            .any(|m| m.kind == MarkerKind::UserLocation && m.position == here));

        // The user marker never drives bounds fitting
        let (bounds, _) = backend.fit_calls.last().unwrap();
        assert_eq!(bounds.max_lat, 43.6);
    }
}
