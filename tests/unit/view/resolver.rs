use std::f64::consts::PI;

use super::*;

struct MissingCamera;

impl Camera for MissingCamera {
    fn viewport_ray(&self, _viewport: Point) -> Ray {
        Ray {
            origin: Vec3::new(5.0, 0.0, 0.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
        }
    }

    fn projection_sphere(&self) -> Sphere {
        Sphere::UNIT
    }
}

fn resolver() -> ViewResolver {
    ViewResolver::new(&EngineConfig::default()).unwrap()
}

#[test]
fn looking_at_sector_center_resolves_that_sector() {
    let mut r = resolver();
    let centers: Vec<_> = r.sectors().iter().map(|s| (s.index, s.center)).collect();
    for (index, center) in centers {
        assert_eq!(r.visible_view(&PinholeCamera::looking_at(center)), index);
    }
}

#[test]
fn gaze_behind_the_seam_wraps_to_edge_sectors() {
    let mut r = resolver();
    assert_eq!(r.visible_view(&PinholeCamera::looking_at(PI - 1e-4)), 0);
    assert_eq!(r.visible_view(&PinholeCamera::looking_at(-PI + 1e-4)), 0);
    let last_center = r.sectors().get(39).unwrap().center;
    assert_eq!(r.visible_view(&PinholeCamera::looking_at(last_center + 0.01)), 39);
}

#[test]
fn ray_miss_reuses_last_known_view_and_counts_fault() {
    let mut r = resolver();
    assert_eq!(r.visible_view(&MissingCamera), 0);
    let center = r.sectors().get(7).unwrap().center;
    assert_eq!(r.visible_view(&PinholeCamera::looking_at(center)), 7);
    assert_eq!(r.visible_view(&MissingCamera), 7);
    assert_eq!(r.geometry_faults(), 2);
}

#[test]
fn hit_prefers_forward_root_from_inside() {
    let ray = Ray {
        origin: Vec3::ZERO,
        direction: Vec3::new(0.0, 0.0, 2.0),
    };
    let dir = Sphere::UNIT.hit_direction(&ray).unwrap();
    assert!((dir.z - 1.0).abs() < 1e-12);
}

#[test]
fn latched_view_is_stable_while_playing() {
    let mut r = resolver();
    let c3 = r.sectors().get(3).unwrap().center;
    let c9 = r.sectors().get(9).unwrap().center;
    assert_eq!(r.latch(&PinholeCamera::looking_at(c3)), 3);
    let moved = PinholeCamera::looking_at(c9);
    assert_eq!(r.visible_view_status(&moved, true), 3);
    assert_eq!(r.visible_view_status(&moved, false), 9);
    assert_eq!(r.latched_view(), Some(3));
}

#[test]
fn lonlat_membership_is_sorted_and_deduplicated() {
    let r = resolver();
    let c = r.sectors().get(20).unwrap().center;
    let views = r.views_containing_lonlat(&[LonLat::new(c, 0.0), LonLat::new(c, 0.3)]);
    assert!(views.windows(2).all(|w| w[0] < w[1]));
    assert!(views.contains(&20));
    // An 80.65° sector spans about 9 neighbors at 9° spacing.
    assert_eq!(views.len(), 9);
}

#[test]
fn region_membership_covers_centered_region() {
    let r = resolver();
    let dims = VideoDims::new(3600, 1800).unwrap();
    let region = TargetRegion::new(1790.0, 890.0, 20.0, 20.0).unwrap();
    let views = r.views_containing_region(&region, dims).unwrap();
    assert!(views.contains(&20));
    assert!(!views.contains(&0));
}

#[test]
fn viewport_boundary_is_closed_and_oriented() {
    let mut r = resolver();
    let dims = VideoDims::new(3600, 1800).unwrap();
    let pts = r.viewport_boundary(&PinholeCamera::looking_at(0.0), dims);
    assert_eq!(pts.len(), 41);
    let first = pts[0];
    let last = pts[pts.len() - 1];
    assert!((first.x - last.x).abs() < 1e-9 && (first.y - last.y).abs() < 1e-9);
    // Top-left viewport corner lands left of and above the gaze point.
    assert!(first.x < 1800.0);
    assert!(first.y < 900.0);
}

#[test]
fn boundary_points_walk_four_edges() {
    let pts = boundary_viewport_points(9);
    assert_eq!(pts.len(), 9);
    assert_eq!(pts[0], Point::new(0.0, 1.0));
    assert_eq!(pts[2], Point::new(1.0, 1.0));
    assert_eq!(pts[4], Point::new(1.0, 0.0));
    assert_eq!(pts[6], Point::new(0.0, 0.0));
    assert_eq!(pts[8], Point::new(0.0, 1.0));
}
