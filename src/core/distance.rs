use crate::models::{BoundingBox, GeoPoint};

/// Earth's radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the Haversine distance between two points in kilometers
///
/// # Arguments
/// * `lat1` - Latitude of first point in degrees
/// * `lon1` - Longitude of first point in degrees
/// * `lat2` - Latitude of second point in degrees
/// * `lon2` - Longitude of second point in degrees
///
/// # Returns
/// Distance in kilometers
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Great-circle distance between two points, `None` unless it is a finite number
#[inline]
pub fn point_distance(a: GeoPoint, b: GeoPoint) -> Option<f64> {
    let km = haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude);
    km.is_finite().then_some(km)
}

/// Distance between two optional points, `None` if either is missing or invalid
pub fn optional_distance(a: Option<GeoPoint>, b: Option<GeoPoint>) -> Option<f64> {
    match (a.filter(GeoPoint::is_valid), b.filter(GeoPoint::is_valid)) {
        (Some(a), Some(b)) => point_distance(a, b),
        _ => None,
    }
}

/// Calculate a bounding box around a center point
///
/// Much cheaper than Haversine, so the candidate query uses it as a
/// pre-filter before the exact distance check.
/// 1° latitude ≈ 111km, 1° longitude ≈ 111km * cos(latitude)
///
/// Longitudes may run past ±180°; `longitude_ranges` splits them at the
/// antimeridian.
pub fn calculate_bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / 111.0;

    // A box reaching over a pole covers every longitude
    let cos_lat = lat.to_radians().cos().abs();
    let lon_delta = if cos_lat < 1e-6 || lat + lat_delta >= 90.0 || lat - lat_delta <= -90.0 {
        180.0
    } else {
        radius_km / (111.0 * cos_lat)
    };

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Inclusive longitude ranges covered by the box, all within [-180, 180]
///
/// A box crossing the antimeridian yields two ranges, one on each side.
pub fn longitude_ranges(bbox: &BoundingBox) -> Vec<(f64, f64)> {
    if bbox.max_lon - bbox.min_lon >= 360.0 {
        return vec![(-180.0, 180.0)];
    }

    if bbox.min_lon < -180.0 {
        vec![(bbox.min_lon + 360.0, 180.0), (-180.0, bbox.max_lon)]
    } else if bbox.max_lon > 180.0 {
        vec![(bbox.min_lon, 180.0), (-180.0, bbox.max_lon - 360.0)]
    } else {
        vec![(bbox.min_lon, bbox.max_lon)]
    }
}

/// Check if a point is within a bounding box
#[inline]
pub fn is_within_bounding_box(
    lat: f64,
    lon: f64,
    bbox: &BoundingBox,
) -> bool {
    lat >= bbox.min_lat
        && lat <= bbox.max_lat
        && longitude_ranges(bbox)
            .iter()
            .any(|(min, max)| lon >= *min && lon <= *max)
}
