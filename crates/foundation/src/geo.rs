use serde::{Deserialize, Serialize};

/// Side length of a Web Mercator tile in pixels (vector-tile convention).
pub const TILE_SIZE_PX: f64 = 512.0;

/// Latitude limit of the Web Mercator projection (degrees).
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Geographic coordinate in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Both components are finite (no NaN, no infinities).
    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }
}

/// Size of the whole Mercator world in pixels at `zoom`.
pub fn world_size_px(zoom: f64) -> f64 {
    TILE_SIZE_PX * zoom.exp2()
}

/// Projects a coordinate to absolute Web Mercator pixels at `zoom`.
///
/// Latitudes are clamped to the projection limit so the poles stay finite.
pub fn mercator_px(at: LngLat, zoom: f64) -> [f64; 2] {
    let size = world_size_px(zoom);
    let lat = at.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (at.lng + 180.0) / 360.0 * size;
    let y_norm = 0.5 - (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln() / std::f64::consts::TAU;
    [x, y_norm * size]
}
