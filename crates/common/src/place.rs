use serde::{Deserialize, Serialize};

/// Reverse-geocoding result for a coordinate.
///
/// `area` is the province/metro level name (e.g. "Seoul", "Gyeonggi-do"),
/// `locality` the city or district and `sub_locality` the neighbourhood.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub sub_locality: Option<String>,
    #[serde(default)]
    pub thoroughfare: Option<String>,
}

impl Place {
    #[must_use]
    pub fn area(area: impl Into<String>) -> Self {
        Self { area: Some(area.into()), ..Self::default() }
    }

    #[must_use]
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    #[must_use]
    pub fn with_sub_locality(mut self, sub_locality: impl Into<String>) -> Self {
        self.sub_locality = Some(sub_locality.into());
        self
    }

    #[must_use]
    pub fn with_thoroughfare(mut self, thoroughfare: impl Into<String>) -> Self {
        self.thoroughfare = Some(thoroughfare.into());
        self
    }

    /// Business zone name, empty when the geocoder returned no area.
    #[must_use]
    pub fn business_zone(&self) -> &str {
        non_empty(self.area.as_deref()).unwrap_or("")
    }

    #[must_use]
    pub fn locality_name(&self) -> Option<&str> {
        non_empty(self.locality.as_deref())
    }

    #[must_use]
    pub fn sub_locality_name(&self) -> Option<&str> {
        non_empty(self.sub_locality.as_deref())
    }

    #[must_use]
    pub fn thoroughfare_name(&self) -> Option<&str> {
        non_empty(self.thoroughfare.as_deref())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.business_zone().is_empty()
            && self.locality_name().is_none()
            && self.sub_locality_name().is_none()
            && self.thoroughfare_name().is_none()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
