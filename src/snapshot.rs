//! The normalized list of active buses for one polling cycle.

use serde::Serialize;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One tracked vehicle as reported by a single feed fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusRecord {
    pub route_description: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Hex colour code without the leading `#`.
    pub route_color: String,
}

impl BusRecord {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Active buses in feed document order.
///
/// There is no stable bus identifier in the feed, so the index of a record is
/// what ties it to its marker pair on the display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusSnapshot {
    buses: Vec<BusRecord>,
    /// `Bus` elements dropped by the inactive-bus filter.
    inactive: usize,
}

impl BusSnapshot {
    pub fn new(buses: Vec<BusRecord>, inactive: usize) -> Self {
        Self { buses, inactive }
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }

    pub fn inactive(&self) -> usize {
        self.inactive
    }

    pub fn get(&self, index: usize) -> Option<&BusRecord> {
        self.buses.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BusRecord> {
        self.buses.iter()
    }
}

impl FromIterator<BusRecord> for BusSnapshot {
    fn from_iter<I: IntoIterator<Item = BusRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect(), 0)
    }
}
