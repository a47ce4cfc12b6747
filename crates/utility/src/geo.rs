pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Bounding box around a center point, returned as
/// `((min_lat, min_lon), (max_lat, max_lon))` in degrees. Used to prefilter
/// rows before the exact distance check.
pub fn calculate_bounding_box(
    lat: f64,
    lon: f64,
    radius_km: f64,
) -> ((f64, f64), (f64, f64)) {
    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();

    // Latitude bounds
    let min_lat = lat_rad - radius_km / EARTH_RADIUS_KM;
    let max_lat = lat_rad + radius_km / EARTH_RADIUS_KM;

    // Longitude bounds (adjusted by latitude)
    let min_lon = lon_rad - radius_km / (EARTH_RADIUS_KM * lat_rad.cos());
    let max_lon = lon_rad + radius_km / (EARTH_RADIUS_KM * lat_rad.cos());

    (
        (min_lat.to_degrees(), min_lon.to_degrees()),
        (max_lat.to_degrees(), max_lon.to_degrees()),
    )
}

pub fn haversine_distance(
    latitude_1: f64,
    longitude_1: f64,
    latitude_2: f64,
    longitude_2: f64,
) -> f64 {
    let lat1_rad = latitude_1.to_radians();
    let lat2_rad = latitude_2.to_radians();

    let dlat = lat2_rad - lat1_rad;
    let dlon = (longitude_2 - longitude_1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
