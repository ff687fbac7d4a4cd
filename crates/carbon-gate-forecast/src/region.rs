//! Static regional carbon-intensity estimates for when no live figure is supplied.

use serde::Serialize;

/// Observed intensity band of a cloud region's grid in g/kWh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionGrid {
    /// Cloud region identifier, e.g. `us-east-1`.
    pub region: &'static str,
    /// Approximate p5 of observed intensity.
    pub baseline: f64,
    /// Approximate p95 - p5 spread.
    pub range: f64,
}

const fn grid(region: &'static str, baseline: f64, range: f64) -> RegionGrid {
    RegionGrid {
        region,
        baseline,
        range,
    }
}

static REGION_GRIDS: [RegionGrid; 10] = [
    grid("us-east-1", 150., 350.),
    grid("us-east-2", 130., 320.),
    grid("us-west-1", 80., 180.),
    grid("us-west-2", 50., 100.),
    grid("eu-west-1", 80., 250.),
    grid("eu-west-2", 100., 220.),
    grid("eu-central-1", 150., 250.),
    grid("eu-north-1", 10., 40.),
    grid("ap-southeast-1", 350., 150.),
    grid("ap-northeast-1", 300., 200.),
];

/// Band assumed for regions missing from the table.
pub const UNKNOWN_REGION: RegionGrid = grid("unknown", 200., 250.);

/// Position of the static estimate inside the band.
const FALLBACK_BAND_POSITION: f64 = 0.4;
/// σ of the static estimate as a share of the band.
const FALLBACK_SIGMA_SHARE: f64 = 0.15;

impl RegionGrid {
    /// Returns every known region.
    pub fn all() -> &'static [RegionGrid] {
        &REGION_GRIDS
    }

    /// Returns the band of a known region.
    pub fn find(region: &str) -> Option<&'static RegionGrid> {
        REGION_GRIDS.iter().find(|g| g.region == region)
    }

    /// Returns the band of the region, or [`UNKNOWN_REGION`].
    pub fn lookup(region: &str) -> RegionGrid {
        Self::find(region).copied().unwrap_or(UNKNOWN_REGION)
    }

    /// Returns the static intensity estimate and its σ.
    pub fn fallback_intensity(&self) -> (f64, f64) {
        (
            self.baseline + self.range * FALLBACK_BAND_POSITION,
            self.range * FALLBACK_SIGMA_SHARE,
        )
    }
}
