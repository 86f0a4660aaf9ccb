//! Service trait seams for trail and occurrence persistence.
//!
//! The edit session takes these as explicit dependencies rather than reaching
//! for ambient singletons, so it can be unit-tested against in-memory fakes.
//! The REST implementation lives in [`crate::rest`] behind the `http`
//! feature.

use std::rc::Rc;

use crate::error::Result;
use crate::model::{Occurrence, Trail};

/// Remote trail persistence.
///
/// `update` has full-replace PUT semantics and echoes the server's
/// representation of the trail, which callers adopt as the new local state.
pub trait TrailService {
    fn fetch(&self, id: i64) -> Result<Trail>;
    fn update(&self, trail: &Trail) -> Result<Trail>;
    fn delete(&self, id: i64) -> Result<()>;
}

/// Remote occurrence persistence, distinct from the trail service.
pub trait OccurrenceService {
    fn update(&self, occurrence: &Occurrence) -> Result<Occurrence>;
}

// The session and the page often hold the same service instance; forwarding
// through Rc lets them share one handle without wrapper types.

impl<T: TrailService + ?Sized> TrailService for Rc<T> {
    fn fetch(&self, id: i64) -> Result<Trail> {
        (**self).fetch(id)
    }

    fn update(&self, trail: &Trail) -> Result<Trail> {
        (**self).update(trail)
    }

    fn delete(&self, id: i64) -> Result<()> {
        (**self).delete(id)
    }
}

impl<T: OccurrenceService + ?Sized> OccurrenceService for Rc<T> {
    fn update(&self, occurrence: &Occurrence) -> Result<Occurrence> {
        (**self).update(occurrence)
    }
}
