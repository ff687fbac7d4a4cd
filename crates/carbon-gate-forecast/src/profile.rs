//! Static hour-of-day intensity profiles used when the history is too short to fit.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Length of a daily profile.
pub const HOURS_PER_DAY: usize = 24;

/// Typical carbon intensity in g/kWh for each hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProfile([f64; HOURS_PER_DAY]);

impl DailyProfile {
    /// Creates a profile whose index 0 is midnight.
    pub fn new(values: [f64; HOURS_PER_DAY]) -> Self {
        Self(values)
    }

    /// Builds a profile from a slice, which must hold exactly 24 values.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        values.try_into().ok().map(Self)
    }

    /// Returns the intensity at the given hour, wrapping around midnight.
    pub fn at(&self, hour: usize) -> f64 {
        self.0[hour % HOURS_PER_DAY]
    }

    /// Returns all 24 hourly values.
    pub fn values(&self) -> &[f64; HOURS_PER_DAY] {
        &self.0
    }

    /// Returns `(offset, intensity)` of the first minimum within `lookahead` hours starting from
    /// `start_hour`, wrapping at 24h. Offset 0 is the start hour itself.
    pub fn min_within(&self, start_hour: usize, lookahead: usize) -> (usize, f64) {
        let mut best = (0, self.at(start_hour));
        for offset in 1..lookahead {
            let value = self.at(start_hour + offset);
            if value < best.1 {
                best = (offset, value);
            }
        }
        best
    }
}

/// Registry of static profiles keyed by region identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticProfiles {
    profiles: FxHashMap<String, DailyProfile>,
}

impl StaticProfiles {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the profile of a region, returning the one it replaces.
    pub fn insert(&mut self, region: &str, profile: DailyProfile) -> Option<DailyProfile> {
        self.profiles.insert(region.to_string(), profile)
    }

    /// Returns the profile of a region.
    pub fn get(&self, region: &str) -> Option<&DailyProfile> {
        self.profiles.get(region)
    }

    /// Number of regions with a profile.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether no region has a profile.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
