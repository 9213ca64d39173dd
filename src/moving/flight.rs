use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::{
  errors::SimError,
  fixed::types::Airport,
  types::{knots_to_km, normalize_heading, Point, KM_PER_NM},
};

pub const ALTITUDE_MIN: i32 = 10;
pub const ALTITUDE_MAX: i32 = 350;
pub const SPEED_MIN: i32 = 180;
pub const SPEED_MAX: i32 = 700;

/// Climbing flights become enroute at this level
pub const CRUISE_ALTITUDE: i32 = 300;
/// Flights at or below this level don't start a descent
pub const APPROACH_ALTITUDE: i32 = 100;

/// A leg is complete once the flight gets this close to its destination
pub const ARRIVAL_RADIUS_KM: f64 = 50.0;
pub const APPROACH_RADIUS_KM: f64 = 200.0;

pub fn clamp_altitude(altitude: i32) -> i32 {
  altitude.clamp(ALTITUDE_MIN, ALTITUDE_MAX)
}

pub fn clamp_speed(speed: i32) -> i32 {
  speed.clamp(SPEED_MIN, SPEED_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
  /// Pre-departure, never produced by the simulation. Inserted scheduled
  /// flights are left in place by the tick.
  Scheduled,
  Takeoff,
  Enroute,
  Landing,
}

impl FlightStatus {
  pub const ALL: [FlightStatus; 4] = [
    FlightStatus::Scheduled,
    FlightStatus::Takeoff,
    FlightStatus::Enroute,
    FlightStatus::Landing,
  ];

  pub fn from_progress(t: f64) -> Self {
    if t < 0.1 {
      Self::Takeoff
    } else if t > 0.9 {
      Self::Landing
    } else {
      Self::Enroute
    }
  }

  /// Takeoff and landing flights occupy runways
  pub fn is_active(&self) -> bool {
    matches!(self, Self::Takeoff | Self::Landing)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Scheduled => "scheduled",
      Self::Takeoff => "takeoff",
      Self::Enroute => "enroute",
      Self::Landing => "landing",
    }
  }
}

impl Display for FlightStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
  pub id: String,
  pub callsign: String,
  pub origin: String,
  pub destination: String,
  pub aircraft: String,
  pub position: Point,
  pub altitude: i32,
  pub speed: i32,
  pub heading: f64,
  pub status: FlightStatus,
  pub eta: DateTime<Utc>,
  /// origin, current position, destination
  pub route: [Point; 3],
}

impl Flight {
  /// Builds a flight placed at fraction `progress` of the great-circle path
  /// from `origin` to `destination`.
  #[allow(clippy::too_many_arguments)]
  pub fn on_leg(
    id: &str,
    callsign: &str,
    aircraft: &str,
    origin: &Airport,
    destination: &Airport,
    progress: f64,
    altitude: i32,
    speed: i32,
    now: DateTime<Utc>,
  ) -> Result<Self, SimError> {
    if origin.id == destination.id {
      return Err(SimError::SameEndpoints(origin.id.clone()));
    }
    if !(0.0..=1.0).contains(&progress) {
      return Err(SimError::InvalidProgress(progress));
    }
    Ok(Self::place(
      id,
      callsign.to_owned(),
      aircraft.to_owned(),
      origin,
      destination,
      progress,
      altitude,
      speed,
      now,
    ))
  }

  /// Same as `on_leg` for callers that already guarantee distinct endpoints
  /// and a progress within [0, 1].
  #[allow(clippy::too_many_arguments)]
  pub(crate) fn place(
    id: &str,
    callsign: String,
    aircraft: String,
    origin: &Airport,
    destination: &Airport,
    progress: f64,
    altitude: i32,
    speed: i32,
    now: DateTime<Utc>,
  ) -> Self {
    let position = origin.position.intermediate(&destination.position, progress);
    let mut flight = Self {
      id: id.to_owned(),
      callsign,
      origin: origin.id.clone(),
      destination: destination.id.clone(),
      aircraft,
      position,
      altitude: clamp_altitude(altitude),
      speed: clamp_speed(speed),
      heading: origin.position.bearing_to(&destination.position),
      status: FlightStatus::from_progress(progress),
      eta: now,
      route: [origin.position, position, destination.position],
    };
    flight.update_eta(flight.remaining_km(destination), now);
    flight
  }

  pub fn remaining_km(&self, destination: &Airport) -> f64 {
    self.position.distance_km(&destination.position)
  }

  /// Moves the flight along its heading by the distance covered in `secs`
  pub fn advance(&mut self, secs: f64) {
    let distance = knots_to_km(self.speed, secs);
    self.position = self.position.destination(self.heading, distance);
  }

  /// Applies the climb/descent rules. `remaining_km` is the distance to
  /// destination measured before the flight was advanced this tick.
  pub fn update_phase<R: Rng + ?Sized>(&mut self, remaining_km: f64, rng: &mut R) {
    if self.status == FlightStatus::Takeoff {
      let climb = rng.gen_range(10..30);
      let accel = rng.gen_range(5..15);
      self.altitude = clamp_altitude(self.altitude + climb);
      self.speed = clamp_speed(self.speed + accel);
      if self.altitude >= CRUISE_ALTITUDE {
        self.status = FlightStatus::Enroute;
      }
    } else if remaining_km < APPROACH_RADIUS_KM && self.altitude > APPROACH_ALTITUDE {
      let descent = rng.gen_range(5..15);
      let decel = rng.gen_range(2..7);
      self.status = FlightStatus::Landing;
      self.altitude = clamp_altitude(self.altitude - descent);
      self.speed = clamp_speed(self.speed - decel);
    }
  }

  pub fn update_eta(&mut self, remaining_km: f64, now: DateTime<Utc>) {
    let hours = remaining_km / (self.speed as f64 * KM_PER_NM);
    let millis = (hours * 3_600_000.0).round().max(0.0) as i64;
    self.eta = now + Duration::milliseconds(millis);
  }

  pub fn sync_route(&mut self) {
    self.route[1] = self.position;
  }

  /// Starts a new leg from `origin` to `destination` under the same id
  pub fn start_leg(
    &mut self,
    origin: &Airport,
    destination: &Airport,
    altitude: i32,
    callsign: String,
    now: DateTime<Utc>,
  ) {
    self.origin = origin.id.clone();
    self.destination = destination.id.clone();
    self.callsign = callsign;
    self.position = origin.position;
    self.status = FlightStatus::Takeoff;
    self.altitude = clamp_altitude(altitude);
    self.heading = origin.position.bearing_to(&destination.position);
    self.route = [origin.position, self.position, destination.position];
    self.update_eta(self.remaining_km(destination), now);
  }

  /// Re-derives the route endpoints and clamps numeric fields
  pub fn normalize(&mut self, origin: &Airport, destination: &Airport) {
    self.altitude = clamp_altitude(self.altitude);
    self.speed = clamp_speed(self.speed);
    self.heading = normalize_heading(self.heading);
    self.route = [origin.position, self.position, destination.position];
  }
}
