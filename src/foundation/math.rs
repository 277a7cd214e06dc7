use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::foundation::core::{Point, VideoDims};

/// Minimal 3D vector for viewport rays.
#[derive(Clone, Copy, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    /// X (right).
    pub x: f64,
    /// Y (up).
    pub y: f64,
    /// Z (forward).
    pub z: f64,
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Build a vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    pub fn dot(self, o: Self) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction; the zero vector stays zero.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f64::EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / len)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

/// Longitude/latitude on the viewing sphere in radians.
///
/// `lon` is the azimuth in `[-π, π]` with 0 straight ahead; `lat` is the elevation in
/// `[-π/2, π/2]` with 0 on the horizon. The center of the equirectangular frame is `(0, 0)`.
#[derive(Clone, Copy, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct LonLat {
    /// Azimuth in radians.
    pub lon: f64,
    /// Elevation in radians.
    pub lat: f64,
}

impl LonLat {
    /// Build a lon/lat pair.
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Convert a direction in a y-up, z-forward frame to lon/lat.
pub fn direction_to_lonlat(dir: Vec3) -> LonLat {
    // Reorient to a z-up frame: x' = forward, y' = right, z' = up.
    let x = dir.z;
    let y = dir.x;
    let z = dir.y;
    let r = (x * x + y * y + z * z).sqrt();
    if r <= f64::EPSILON {
        return LonLat::default();
    }
    let azimuth = y.atan2(x);
    let zenith = (z / r).clamp(-1.0, 1.0).acos();
    LonLat::new(azimuth, FRAC_PI_2 - zenith)
}

/// Shortest angular distance between two azimuths, accounting for wraparound at ±π.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    (a - b).abs().min((a + TAU - b).abs()).min((a - TAU - b).abs())
}

/// Equirectangular pixel position for a lon/lat pair.
pub fn lonlat_to_pixel(ll: LonLat, dims: VideoDims) -> Point {
    let half_w = f64::from(dims.width) / 2.0;
    let half_h = f64::from(dims.height) / 2.0;
    Point::new(
        ll.lon / PI * half_w + half_w,
        half_h - ll.lat / FRAC_PI_2 * half_h,
    )
}

/// Lon/lat for an equirectangular pixel position.
pub fn pixel_to_lonlat(p: Point, dims: VideoDims) -> LonLat {
    let half_w = f64::from(dims.width) / 2.0;
    let half_h = f64::from(dims.height) / 2.0;
    LonLat::new(
        (p.x - half_w) / half_w * PI,
        (half_h - p.y) / half_h * FRAC_PI_2,
    )
}

/// Relative float comparison used for media timestamps.
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < (1e-6 * a.abs().max(b.abs())).max(1e-9)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
