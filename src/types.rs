use geo::{HaversineBearing, HaversineDestination, HaversineDistance, HaversineIntermediate};
use geo_types::{Coord, Point as GeoPoint};
use serde::{Deserialize, Serialize};

pub const KM_PER_NM: f64 = 1.852;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Point {
  pub lat: f64,
  pub lng: f64,
}

impl From<Point> for GeoPoint {
  fn from(val: Point) -> Self {
    Self(Coord {
      x: val.lng,
      y: val.lat,
    })
  }
}

impl From<GeoPoint> for Point {
  fn from(value: GeoPoint) -> Self {
    Self {
      lat: value.y(),
      lng: value.x(),
    }
  }
}

impl Point {
  /// longitude first, like GeoJSON coordinates
  pub fn new(lng: f64, lat: f64) -> Self {
    Self { lat, lng }
  }

  pub fn clamp(&self) -> Self {
    Self {
      lat: self.lat.clamp(-90.0, 90.0), // don't wrap lat, just clamp
      lng: (self.lng + 180.0).rem_euclid(360.0) - 180.0, // make sure lng is wrapped to stay within -180..180
    }
  }

  /// Great-circle distance in kilometers
  pub fn distance_km(&self, other: &Point) -> f64 {
    let a: GeoPoint = (*self).into();
    let b: GeoPoint = (*other).into();
    a.haversine_distance(&b) / 1000.0
  }

  /// Initial great-circle bearing towards `other`, normalized to [0, 360)
  pub fn bearing_to(&self, other: &Point) -> f64 {
    let a: GeoPoint = (*self).into();
    let b: GeoPoint = (*other).into();
    normalize_heading(a.haversine_bearing(b))
  }

  pub fn destination(&self, bearing: f64, distance_km: f64) -> Point {
    let a: GeoPoint = (*self).into();
    let p: Point = a.haversine_destination(bearing, distance_km * 1000.0).into();
    p.clamp()
  }

  /// Point at fraction `f` of the great-circle path towards `other`
  pub fn intermediate(&self, other: &Point, f: f64) -> Point {
    // the interpolation formula divides by the angular distance
    if f <= 0.0 || self == other {
      return *self;
    }
    let a: GeoPoint = (*self).into();
    let b: GeoPoint = (*other).into();
    let p: Point = a.haversine_intermediate(&b, f).into();
    p.clamp()
  }
}

pub fn normalize_heading(deg: f64) -> f64 {
  let h = deg.rem_euclid(360.0);
  // rem_euclid may round up to exactly 360.0 for tiny negative inputs
  if h >= 360.0 {
    0.0
  } else {
    h
  }
}

/// Knots to kilometers covered over `secs` seconds
pub fn knots_to_km(speed: i32, secs: f64) -> f64 {
  speed as f64 * KM_PER_NM / 3600.0 * secs
}
