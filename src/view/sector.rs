use std::f64::consts::{PI, TAU};

use crate::foundation::{
    config::EngineConfig,
    error::{GazeloopError, GazeloopResult},
    math::angular_distance,
};

/// One azimuthal partition of the viewing sphere.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ViewSector {
    /// Sector index in `0..N`.
    pub index: usize,
    /// Azimuth of the sector center, radians.
    pub center: f64,
    /// Half of the horizontal field of view, radians.
    pub half_fov: f64,
}

/// The fixed set of view sectors, computed once from [`EngineConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct ViewSectors {
    sectors: Vec<ViewSector>,
}

impl ViewSectors {
    /// Uniform sectors with centers at `-π + i·2π/N`.
    pub fn uniform(count: usize, half_fov: f64) -> GazeloopResult<Self> {
        if count == 0 {
            return Err(GazeloopError::validation("view sector count must be > 0"));
        }
        if !half_fov.is_finite() || half_fov <= 0.0 {
            return Err(GazeloopError::validation(
                "view sector half FOV must be finite and > 0",
            ));
        }
        let spacing = TAU / count as f64;
        let sectors = (0..count)
            .map(|index| ViewSector {
                index,
                center: -PI + index as f64 * spacing,
                half_fov,
            })
            .collect();
        Ok(Self { sectors })
    }

    /// Sectors described by an engine config.
    pub fn from_config(cfg: &EngineConfig) -> GazeloopResult<Self> {
        Self::uniform(cfg.num_views, cfg.view_half_hfov_rad())
    }

    /// Number of sectors.
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    /// Always false; construction rejects an empty set.
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    /// Sector by index.
    pub fn get(&self, index: usize) -> Option<&ViewSector> {
        self.sectors.get(index)
    }

    /// All sectors in index order.
    pub fn iter(&self) -> impl Iterator<Item = &ViewSector> {
        self.sectors.iter()
    }

    /// Sector whose center is angularly closest to `azimuth`; ties go to the lower index.
    pub fn nearest(&self, azimuth: f64) -> usize {
        let mut best = 0;
        let mut best_dist = f64::MAX;
        for s in &self.sectors {
            let d = angular_distance(azimuth, s.center);
            if d < best_dist {
                best_dist = d;
                best = s.index;
            }
        }
        best
    }

    /// True when `azimuth` falls within the half FOV of sector `index`.
    pub fn contains(&self, index: usize, azimuth: f64) -> bool {
        self.sectors
            .get(index)
            .is_some_and(|s| angular_distance(azimuth, s.center) <= s.half_fov)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/sector.rs"]
mod tests;
