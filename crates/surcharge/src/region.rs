use common::Place;
use tracing::{debug, info};

/// Neighbourhood-level change counter used by fun mode.
///
/// The first non-empty label becomes the start region; every later label that
/// differs from the current one counts as a change.
#[derive(Debug, Clone, Default)]
pub struct RegionChangeCounter {
    start_region: Option<String>,
    current_region: Option<String>,
    change_count: u32,
}

impl RegionChangeCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a resolved place and returns `true` when the region changed.
    pub fn observe(&mut self, place: &Place) -> bool {
        let label = region_label(place);
        if label.is_empty() || self.current_region.as_deref() == Some(label.as_str()) {
            return false;
        }

        if self.current_region.is_some() {
            self.change_count += 1;
            info!(region = %label, changes = self.change_count, "region changed");
        } else {
            debug!(region = %label, "start region recorded");
        }

        if self.start_region.is_none() {
            self.start_region = Some(label.clone());
        }
        self.current_region = Some(label);
        true
    }

    #[must_use]
    pub const fn change_count(&self) -> u32 {
        self.change_count
    }

    #[must_use]
    pub fn start_region(&self) -> Option<&str> {
        self.start_region.as_deref()
    }

    #[must_use]
    pub fn current_region(&self) -> Option<&str> {
        self.current_region.as_deref()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Display label for a place.
///
/// Locality and sub-locality when both are known, else the thoroughfare
/// (suffixed with the locality when known), else whichever single name is
/// left. Empty when nothing was resolved.
#[must_use]
pub fn region_label(place: &Place) -> String {
    let locality = place.locality_name();
    if let (Some(locality), Some(sub_locality)) = (locality, place.sub_locality_name()) {
        return format!("{locality} {sub_locality}");
    }

    if let Some(road) = place.thoroughfare_name() {
        return locality.map_or_else(|| road.to_string(), |locality| format!("{road} · {locality}"));
    }

    locality.or_else(|| place.sub_locality_name()).unwrap_or_else(|| place.business_zone()).to_string()
}
