//! Edit permission policy.
//!
//! Ownership or admin override, nothing else. The check is pure and cheap on
//! purpose: viewer identity and the admin flag can change asynchronously
//! (the session cookie is decoded after the first render), so callers
//! re-evaluate on every render and every mutation instead of caching the
//! verdict.

use serde::{Deserialize, Serialize};

use crate::Trail;

/// The authenticated viewer, as decoded from the session cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub name: String,
    /// Raw token forwarded as the Authorization header on writes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Current viewer state: who is looking at the map, and whether they hold
/// the admin override.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewerState {
    pub viewer: Option<Viewer>,
    pub is_admin: bool,
}

impl ViewerState {
    /// An unauthenticated viewer.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A logged-in viewer without admin rights.
    pub fn logged_in(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            viewer: Some(Viewer {
                id: id.into(),
                name: name.into(),
                token: None,
            }),
            is_admin: false,
        }
    }

    /// Whether this viewer may mutate the given trail: requires a viewer at
    /// all, then either the admin override or ownership
    /// (`viewer.id == trail.author_id`).
    pub fn can_edit(&self, trail: &Trail) -> bool {
        match &self.viewer {
            None => false,
            Some(viewer) => {
                self.is_admin || trail.author_id.as_deref() == Some(viewer.id.as_str())
            }
        }
    }
}
