//! EPSG:3857 (spherical Web Mercator) forward and inverse transforms.

use std::f64::consts::PI;

/// Half the Web-Mercator world width in meters: π · 6378137.
pub const ORIGIN_SHIFT: f64 = PI * 6_378_137.0;

/// Latitude bound of the square Web-Mercator world.
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Latitude in degrees from a Web-Mercator Y in meters.
pub fn lat_from_merc_y(y: f64) -> f64 {
    (2.0 * (y / ORIGIN_SHIFT * PI).exp().atan() - PI / 2.0) * 180.0 / PI
}

/// Longitude in degrees from a Web-Mercator X in meters.
pub fn lon_from_merc_x(x: f64) -> f64 {
    x / ORIGIN_SHIFT * 180.0
}

/// Web-Mercator X in meters from a longitude in degrees.
pub fn merc_x_from_lon(lon: f64) -> f64 {
    lon * ORIGIN_SHIFT / 180.0
}

/// Web-Mercator Y in meters from a latitude in degrees.
pub fn merc_y_from_lat(lat: f64) -> f64 {
    ((90.0 + lat) * PI / 360.0).tan().ln() / (PI / 180.0) * ORIGIN_SHIFT / 180.0
}
