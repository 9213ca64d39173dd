use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
  NotEnoughAirports(usize),
  DuplicateAirport(String),
  InvalidAirport(String, &'static str),
  UnknownAirport(String),
  SameEndpoints(String),
  DuplicateFlight(String),
  InvalidProgress(f64),
  InvalidConfig(String),
}

impl Display for SimError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SimError::NotEnoughAirports(n) => {
        write!(f, "at least 2 airports are required, catalog has {n}")
      }
      SimError::DuplicateAirport(id) => write!(f, "airport {id} is defined more than once"),
      SimError::InvalidAirport(id, reason) => write!(f, "invalid airport {id}: {reason}"),
      SimError::UnknownAirport(id) => write!(f, "unknown airport {id}"),
      SimError::SameEndpoints(id) => {
        write!(f, "origin and destination are the same airport {id}")
      }
      SimError::DuplicateFlight(id) => write!(f, "flight {id} already exists"),
      SimError::InvalidProgress(t) => write!(f, "leg progress {t} is outside of [0, 1]"),
      SimError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
    }
  }
}

impl std::error::Error for SimError {}
