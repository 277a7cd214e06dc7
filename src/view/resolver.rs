use std::collections::BTreeSet;

use crate::{
    foundation::{
        config::EngineConfig,
        core::{Point, VideoDims},
        error::GazeloopResult,
        math::{LonLat, Vec3, direction_to_lonlat, lonlat_to_pixel},
    },
    view::{region::TargetRegion, sector::ViewSectors},
};

/// Ray cast from the viewer through a viewport position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin in world space.
    pub origin: Vec3,
    /// Ray direction (need not be normalized).
    pub direction: Vec3,
}

/// The sphere the 360° video is projected onto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    /// Sphere center in world space.
    pub center: Vec3,
    /// Sphere radius.
    pub radius: f64,
}

impl Sphere {
    /// Unit sphere at the origin.
    pub const UNIT: Self = Self {
        center: Vec3::ZERO,
        radius: 1.0,
    };

    /// Unit direction from the center to where `ray` meets the sphere.
    ///
    /// The positive root is preferred and the negative root is used when the positive one lies
    /// behind the origin. Returns `None` when the ray misses (negative discriminant).
    pub fn hit_direction(&self, ray: &Ray) -> Option<Vec3> {
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(ray.direction);
        if a <= f64::EPSILON {
            return None;
        }
        let b = 2.0 * ray.direction.dot(oc);
        let c = oc.dot(oc) - self.radius * self.radius;
        let d = b * b - 4.0 * a * c;
        if d < 0.0 {
            return None;
        }
        let sqrt_d = d.sqrt();
        let mut t = (-b + sqrt_d) / (2.0 * a);
        if t < 0.0 {
            t = (-b - sqrt_d) / (2.0 * a);
        }
        let hit = ray.origin + ray.direction * t;
        Some((hit - self.center).normalized())
    }
}

/// Source of viewport rays (the head-mounted or desktop camera).
///
/// Viewport coordinates are normalized: `(0, 0)` is the bottom-left corner and `(1, 1)` the
/// top-right corner.
pub trait Camera {
    /// Ray through a normalized viewport position.
    fn viewport_ray(&self, viewport: Point) -> Ray;

    /// Sphere the video is projected onto.
    fn projection_sphere(&self) -> Sphere;
}

/// Yaw/pitch pinhole camera in a y-up, z-forward frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinholeCamera {
    /// Camera position.
    pub position: Vec3,
    /// Rotation about +y in radians; positive turns toward +x.
    pub yaw: f64,
    /// Rotation above the horizon in radians.
    pub pitch: f64,
    /// Vertical field of view in degrees.
    pub vfov_deg: f64,
    /// Width divided by height.
    pub aspect: f64,
    /// Projection sphere.
    pub sphere: Sphere,
}

impl PinholeCamera {
    /// Camera at the sphere center looking along azimuth `yaw` on the horizon.
    pub fn looking_at(yaw: f64) -> Self {
        Self {
            position: Vec3::ZERO,
            yaw,
            pitch: 0.0,
            vfov_deg: 60.0,
            aspect: 16.0 / 9.0,
            sphere: Sphere::UNIT,
        }
    }

    fn basis(&self) -> (Vec3, Vec3, Vec3) {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        let forward = Vec3::new(sy * cp, sp, cy * cp);
        let right = Vec3::new(cy, 0.0, -sy);
        let up = Vec3::new(-sy * sp, cp, -cy * sp);
        (forward, right, up)
    }
}

impl Camera for PinholeCamera {
    fn viewport_ray(&self, viewport: Point) -> Ray {
        let (forward, right, up) = self.basis();
        let tan_v = (self.vfov_deg.to_radians() / 2.0).tan();
        let tan_h = tan_v * self.aspect;
        let x = (2.0 * viewport.x - 1.0) * tan_h;
        let y = (2.0 * viewport.y - 1.0) * tan_v;
        Ray {
            origin: self.position,
            direction: (forward + right * x + up * y).normalized(),
        }
    }

    fn projection_sphere(&self) -> Sphere {
        self.sphere
    }
}

const VIEWPORT_CENTER: Point = Point::new(0.5, 0.5);

/// Maps gaze to view sectors and reports viewport geometry.
#[derive(Clone, Debug)]
pub struct ViewResolver {
    sectors: ViewSectors,
    lon_step: f64,
    lat_step: f64,
    boundary_samples: usize,
    last_view: Option<usize>,
    latched: Option<usize>,
    geometry_faults: u64,
}

impl ViewResolver {
    /// Resolver over the sectors described by `cfg`.
    pub fn new(cfg: &EngineConfig) -> GazeloopResult<Self> {
        Ok(Self {
            sectors: ViewSectors::from_config(cfg)?,
            lon_step: cfg.view_hfov_deg.to_radians(),
            lat_step: cfg.view_vfov_deg.to_radians(),
            boundary_samples: cfg.boundary_samples,
            last_view: None,
            latched: None,
            geometry_faults: 0,
        })
    }

    /// The sector table.
    pub fn sectors(&self) -> &ViewSectors {
        &self.sectors
    }

    /// Number of ray/sphere misses observed so far.
    pub fn geometry_faults(&self) -> u64 {
        self.geometry_faults
    }

    /// Lon/lat under the viewport center, or `None` on a ray miss.
    pub fn gaze_lonlat(&mut self, camera: &dyn Camera) -> Option<LonLat> {
        self.hit_lonlat(camera, VIEWPORT_CENTER)
    }

    /// Sector currently under the viewport center.
    ///
    /// A ray miss is logged and the last known sector (or 0 before any hit) is reused.
    pub fn visible_view(&mut self, camera: &dyn Camera) -> usize {
        match self.gaze_lonlat(camera) {
            Some(ll) => {
                let view = self.sectors.nearest(ll.lon);
                self.last_view = Some(view);
                view
            }
            None => self.last_view.unwrap_or(0),
        }
    }

    /// Resolve the sector once for this tick and remember it.
    pub fn latch(&mut self, camera: &dyn Camera) -> usize {
        let view = self.visible_view(camera);
        self.latched = Some(view);
        view
    }

    /// The tick-stable sector while playing, the live sector otherwise.
    pub fn visible_view_status(&mut self, camera: &dyn Camera, playing: bool) -> usize {
        if !playing {
            return self.visible_view(camera);
        }
        self.latched.unwrap_or(0)
    }

    /// The sector latched by the last [`ViewResolver::latch`].
    pub fn latched_view(&self) -> Option<usize> {
        self.latched
    }

    /// Every sector whose half FOV contains at least one of `samples`, ascending.
    pub fn views_containing_lonlat(&self, samples: &[LonLat]) -> Vec<usize> {
        let mut views = BTreeSet::new();
        for s in samples {
            for sector in self.sectors.iter() {
                if self.sectors.contains(sector.index, s.lon) {
                    views.insert(sector.index);
                }
            }
        }
        views.into_iter().collect()
    }

    /// Every sector overlapping an authored region.
    pub fn views_containing_region(
        &self,
        region: &TargetRegion,
        dims: VideoDims,
    ) -> GazeloopResult<Vec<usize>> {
        let samples = region.lonlat_samples(dims, self.lon_step, self.lat_step)?;
        Ok(self.views_containing_lonlat(&samples))
    }

    /// Viewport border projected to equirectangular pixels, clockwise from the top-left
    /// corner and closed. Samples whose ray misses the sphere are dropped.
    pub fn viewport_boundary(&mut self, camera: &dyn Camera, dims: VideoDims) -> Vec<Point> {
        boundary_viewport_points(self.boundary_samples)
            .into_iter()
            .filter_map(|vp| self.hit_lonlat(camera, vp))
            .map(|ll| lonlat_to_pixel(ll, dims))
            .collect()
    }

    fn hit_lonlat(&mut self, camera: &dyn Camera, viewport: Point) -> Option<LonLat> {
        let ray = camera.viewport_ray(viewport);
        match camera.projection_sphere().hit_direction(&ray) {
            Some(dir) => Some(direction_to_lonlat(dir)),
            None => {
                self.geometry_faults += 1;
                tracing::error!(
                    viewport_x = viewport.x,
                    viewport_y = viewport.y,
                    last_view = ?self.last_view,
                    "viewport ray missed the projection sphere (negative discriminant)"
                );
                None
            }
        }
    }
}

/// Normalized viewport positions along the border: top edge left to right, right edge top to
/// bottom, bottom edge right to left, left edge bottom to top, then the starting corner again.
pub fn boundary_viewport_points(samples: usize) -> Vec<Point> {
    let per_side = (samples.saturating_sub(1) / 4).max(1);
    let step = 1.0 / per_side as f64;
    let mut out = Vec::with_capacity(per_side * 4 + 1);
    for i in 0..per_side {
        out.push(Point::new(step * i as f64, 1.0));
    }
    for i in 0..per_side {
        out.push(Point::new(1.0, 1.0 - step * i as f64));
    }
    for i in 0..per_side {
        out.push(Point::new(1.0 - step * i as f64, 0.0));
    }
    for i in 0..per_side {
        out.push(Point::new(0.0, step * i as f64));
    }
    out.push(Point::new(0.0, 1.0));
    out
}

#[cfg(test)]
#[path = "../../tests/unit/view/resolver.rs"]
mod tests;
