use crate::foundation::{
    core::{Point, Rect, VideoDims},
    error::{GazeloopError, GazeloopResult},
    math::{LonLat, pixel_to_lonlat},
};

// Bounds the sample grid at (2^10 + 1)^2 points per region.
const MAX_SUBDIVISIONS: u32 = 10;

/// Authored region of interest, as a rectangle in equirectangular pixels.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TargetRegion {
    /// Top-left origin, width and height in source pixels.
    pub rect: Rect,
}

impl TargetRegion {
    /// Region from top-left pixel position and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> GazeloopResult<Self> {
        for (name, v) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !v.is_finite() {
                return Err(GazeloopError::validation(format!(
                    "target region {name} must be finite"
                )));
            }
        }
        if width < 0.0 || height < 0.0 {
            return Err(GazeloopError::validation(
                "target region width/height must be >= 0",
            ));
        }
        Ok(Self {
            rect: Rect::new(x, y, x + width, y + height),
        })
    }

    /// The unset placeholder region (one pixel at the origin).
    pub fn is_placeholder(&self) -> bool {
        self.rect == Rect::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Sample points covering the region on the sphere.
    ///
    /// Each axis is halved until the sample spacing drops to `max_lon_step` / `max_lat_step`.
    /// When either axis is subdivided, the other is subdivided at least once. The result is the
    /// full `(2^nx + 1) × (2^ny + 1)` grid, corners included, in row-major order.
    pub fn lonlat_samples(
        &self,
        dims: VideoDims,
        max_lon_step: f64,
        max_lat_step: f64,
    ) -> GazeloopResult<Vec<LonLat>> {
        if !(max_lon_step > 0.0 && max_lat_step > 0.0) {
            return Err(GazeloopError::geometry(
                "region sample spacing limits must be > 0",
            ));
        }
        let top_left = pixel_to_lonlat(Point::new(self.rect.x0, self.rect.y0), dims);
        let bottom_right = pixel_to_lonlat(Point::new(self.rect.x1, self.rect.y1), dims);
        let lon_span = bottom_right.lon - top_left.lon;
        let lat_span = top_left.lat - bottom_right.lat;

        let mut nx = subdivisions(lon_span, max_lon_step);
        let mut ny = subdivisions(lat_span, max_lat_step);
        if nx > 0 && ny == 0 {
            ny = 1;
        }
        if ny > 0 && nx == 0 {
            nx = 1;
        }

        let steps_x = 1usize << nx;
        let steps_y = 1usize << ny;
        let dx = lon_span / steps_x as f64;
        let dy = lat_span / steps_y as f64;

        let mut out = Vec::with_capacity((steps_x + 1) * (steps_y + 1));
        for i in 0..=steps_x {
            for j in 0..=steps_y {
                out.push(LonLat::new(
                    top_left.lon + dx * i as f64,
                    bottom_right.lat + dy * j as f64,
                ));
            }
        }
        Ok(out)
    }
}

fn subdivisions(span: f64, max_step: f64) -> u32 {
    let mut span = span.abs();
    let mut n = 0;
    while span > max_step && n < MAX_SUBDIVISIONS {
        n += 1;
        span /= 2.0;
    }
    n
}

#[cfg(test)]
#[path = "../../tests/unit/view/region.rs"]
mod tests;
