use indexmap::IndexMap;
use model::{profile::Profile, spot::PrayerSpot, WithId};
use utility::id::Id;

use crate::auth::Identity;

/// Capability set a map SDK binding has to provide. One implementation per
/// provider; everything above this trait is provider-agnostic.
pub trait MarkerSurface {
    /// Provider-side handle for a placed marker.
    type Handle;

    fn place_marker(
        &mut self,
        latitude: f64,
        longitude: f64,
        popup: Popup,
    ) -> Self::Handle;

    fn remove_marker(&mut self, handle: Self::Handle);

    fn show_popup(&mut self, handle: &Self::Handle);
}

/// Moderation action offered in a popup, depending on the spot's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Delete,
    Restore,
}

impl ModerationAction {
    pub fn label(&self) -> &'static str {
        match self {
            ModerationAction::Delete => "Delete",
            ModerationAction::Restore => "Restore",
        }
    }
}

/// Detail surface attached to one marker. Carries the record id so action
/// dispatch stays bound to the marker instance instead of going through any
/// shared handler table.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub spot: Id<PrayerSpot>,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    /// Target of the "View Details" action, `/{slug}`.
    pub detail_path: String,
    /// Only present when the viewer is the creator or an admin.
    pub moderation: Option<ModerationAction>,
}

/// Builds the popup for a spot as seen by `viewer` (identity plus optionally
/// their profile). Signed-out viewers never get a moderation action.
pub fn popup_for(
    spot: &WithId<PrayerSpot>,
    viewer: Option<(&Identity, Option<&Profile>)>,
) -> Popup {
    let moderation = viewer.and_then(|(identity, profile)| {
        spot.content
            .moderated_by(&identity.user_id, profile)
            .then(|| {
                if spot.content.is_deleted() {
                    ModerationAction::Restore
                } else {
                    ModerationAction::Delete
                }
            })
    });
    Popup {
        spot: spot.id.clone(),
        name: spot.content.name.clone(),
        address: spot.content.address.clone(),
        description: spot.content.description.clone(),
        detail_path: spot.content.detail_path(),
        moderation,
    }
}

/// Keeps the surface's marker set equal to the visible record set. Every sync
/// tears down all bound markers and rebuilds them, so no marker from an
/// earlier filter state stays clickable.
pub struct MarkerBinder<S: MarkerSurface> {
    surface: S,
    bound: IndexMap<Id<PrayerSpot>, S::Handle>,
}

impl<S: MarkerSurface> MarkerBinder<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            bound: IndexMap::new(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    pub fn bound_ids(&self) -> impl Iterator<Item = &Id<PrayerSpot>> {
        self.bound.keys()
    }

    /// Rebinds the surface to `visible`, recomputing each popup for `viewer`.
    pub fn sync(
        &mut self,
        visible: &[&WithId<PrayerSpot>],
        viewer: Option<(&Identity, Option<&Profile>)>,
    ) {
        let Self { surface, bound } = self;
        for (_, handle) in bound.drain(..) {
            surface.remove_marker(handle);
        }
        for spot in visible {
            let popup = popup_for(spot, viewer);
            let handle = surface.place_marker(
                spot.content.latitude,
                spot.content.longitude,
                popup,
            );
            bound.insert(spot.id.clone(), handle);
        }
    }

    /// Opens the popup of a bound marker. Returns false when the record is
    /// not in the visible set.
    pub fn open_popup(&mut self, id: &Id<PrayerSpot>) -> bool {
        match self.bound.get(id) {
            Some(handle) => {
                self.surface.show_popup(handle);
                true
            }
            None => false,
        }
    }
}
