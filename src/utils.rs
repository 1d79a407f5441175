//! Great-circle helpers for consumers that want distances and bearings
//! between decoded positions.

/// Great-circle distance in kilometres between two points given in
/// decimal degrees.
pub fn distance(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let lat0r = lat0.to_radians();
    let lon0r = lon0.to_radians();
    let lat1r = lat1.to_radians();
    let lon1r = lon1.to_radians();

    let dlon = lon1r - lon0r;
    let dlat = lat1r - lat0r;

    let a = (dlat / 2.0).sin().powi(2) + lat0r.cos() * lat1r.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    6366.71 * c
}

/// Initial bearing in degrees from point 0 to point 1, both in decimal
/// degrees.
pub fn direction(lat0: f64, lon0: f64, lat1: f64, lon1: f64) -> f64 {
    let lat0r = lat0.to_radians();
    let lon0r = lon0.to_radians();
    let lat1r = lat1.to_radians();
    let lon1r = lon1.to_radians();

    let dlon = lon1r - lon0r;

    let mut direction = (dlon.sin() * lat1r.cos())
        .atan2(lat0r.cos() * lat1r.sin() - lat0r.sin() * lat1r.cos() * dlon.cos())
        .to_degrees();

    if direction < 0.0 {
        direction += 360.0;
    }

    direction
}
