use crate::types::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
  pub id: String,
  pub name: String,
  pub position: Point,
  pub runways: u32,
  /// Display-only traffic level, 1 to 10
  pub traffic: u8,
}

impl Airport {
  pub fn new(id: &str, name: &str, lng: f64, lat: f64, runways: u32, traffic: u8) -> Self {
    Self {
      id: id.to_owned(),
      name: name.to_owned(),
      position: Point::new(lng, lat),
      runways,
      traffic,
    }
  }
}
