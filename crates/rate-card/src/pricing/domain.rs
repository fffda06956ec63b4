use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Sourcing category with its own cost basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Onshore,
    Offshore,
    Nearshore,
}

impl Location {
    pub const fn ordered() -> [Self; 3] {
        [Self::Onshore, Self::Offshore, Self::Nearshore]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Onshore => "Onshore",
            Self::Offshore => "Offshore",
            Self::Nearshore => "Nearshore",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Onshore => "onshore",
            Self::Offshore => "offshore",
            Self::Nearshore => "nearshore",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown location '{0}': expected onshore, offshore, or nearshore")]
pub struct UnknownLocation(pub String);

impl FromStr for Location {
    type Err = UnknownLocation;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "onshore" => Ok(Self::Onshore),
            "offshore" => Ok(Self::Offshore),
            "nearshore" => Ok(Self::Nearshore),
            _ => Err(UnknownLocation(value.trim().to_string())),
        }
    }
}

/// One value per location, always iterated onshore, offshore, nearshore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationMap<T> {
    pub onshore: T,
    pub offshore: T,
    pub nearshore: T,
}

impl<T> LocationMap<T> {
    pub fn from_fn(mut f: impl FnMut(Location) -> T) -> Self {
        Self {
            onshore: f(Location::Onshore),
            offshore: f(Location::Offshore),
            nearshore: f(Location::Nearshore),
        }
    }

    pub fn get(&self, location: Location) -> &T {
        match location {
            Location::Onshore => &self.onshore,
            Location::Offshore => &self.offshore,
            Location::Nearshore => &self.nearshore,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Location, &T)> + '_ {
        Location::ordered()
            .into_iter()
            .map(move |location| (location, self.get(location)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Location, &T) -> U) -> LocationMap<U> {
        LocationMap::from_fn(|location| f(location, self.get(location)))
    }
}

/// Clamp a raw cost or rate into the table's domain: finite and non-negative,
/// with everything else collapsing to the zero sentinel.
pub fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A role and its hourly cost per location. A zero cost marks a location the
/// role is not offered in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub role: String,
    pub costs: LocationMap<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_rate: Option<f64>,
}

impl RoleRecord {
    pub fn new(role: impl Into<String>, onshore: f64, offshore: f64, nearshore: f64) -> Self {
        Self {
            role: role.into(),
            costs: LocationMap {
                onshore: sanitize_amount(onshore),
                offshore: sanitize_amount(offshore),
                nearshore: sanitize_amount(nearshore),
            },
            client_rate: None,
        }
    }

    pub fn with_client_rate(mut self, client_rate: f64) -> Self {
        let rate = sanitize_amount(client_rate);
        self.client_rate = (rate > 0.0).then_some(rate);
        self
    }

    pub fn cost(&self, location: Location) -> f64 {
        *self.costs.get(location)
    }

    pub fn offers(&self, location: Location) -> bool {
        self.cost(location) > 0.0
    }
}

/// Ordered, read-only collection of role records keyed by role name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateTable {
    records: Vec<RoleRecord>,
}

impl RateTable {
    /// Builds a table, dropping unnamed rows and keeping the first record for
    /// any repeated role name.
    pub fn new(records: Vec<RoleRecord>) -> Self {
        let mut seen = HashSet::new();
        let records = records
            .into_iter()
            .filter(|record| !record.role.trim().is_empty())
            .filter(|record| {
                let fresh = seen.insert(record.role.clone());
                if !fresh {
                    warn!(role = %record.role, "duplicate role in rate table; keeping first entry");
                }
                fresh
            })
            .collect();

        Self { records }
    }

    pub fn find(&self, role: &str) -> Option<&RoleRecord> {
        let role = role.trim();
        self.records.iter().find(|record| record.role == role)
    }

    pub fn records(&self) -> &[RoleRecord] {
        &self.records
    }

    pub fn role_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(|record| record.role.as_str())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
