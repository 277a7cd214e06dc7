use super::*;

const EPS: f64 = 1e-9;

#[test]
fn forward_is_lon_zero_and_right_is_positive() {
    let ahead = direction_to_lonlat(Vec3::new(0.0, 0.0, 1.0));
    assert!(ahead.lon.abs() < EPS);
    assert!(ahead.lat.abs() < EPS);

    let right = direction_to_lonlat(Vec3::new(1.0, 0.0, 0.0));
    assert!((right.lon - FRAC_PI_2).abs() < EPS);

    let up = direction_to_lonlat(Vec3::new(0.0, 1.0, 0.0));
    assert!((up.lat - FRAC_PI_2).abs() < EPS);
}

#[test]
fn angular_distance_wraps() {
    let a = -PI + 0.01;
    let b = PI - 0.01;
    assert!((angular_distance(a, b) - 0.02).abs() < EPS);
    assert!((angular_distance(0.3, -0.2) - 0.5).abs() < EPS);
}

#[test]
fn pixel_lonlat_inverse() {
    let dims = VideoDims::new(3840, 1920).unwrap();
    let p = Point::new(1000.0, 400.0);
    let back = lonlat_to_pixel(pixel_to_lonlat(p, dims), dims);
    assert!((back.x - p.x).abs() < 1e-6);
    assert!((back.y - p.y).abs() < 1e-6);

    let center = pixel_to_lonlat(Point::new(1920.0, 960.0), dims);
    assert!(center.lon.abs() < EPS && center.lat.abs() < EPS);
}

#[test]
fn vec3_normalizes() {
    let v = Vec3::new(3.0, 0.0, 4.0).normalized();
    assert!((v.length() - 1.0).abs() < EPS);
    assert_eq!(Vec3::ZERO.normalized(), Vec3::ZERO);
}

#[test]
fn approx_eq_tracks_relative_error() {
    assert!(approx_eq(5.666_666_7, 5.666_666_7 + 1e-9));
    assert!(!approx_eq(5.0, 5.001));
}
