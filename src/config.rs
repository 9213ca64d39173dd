use crate::{errors::SimError, fixed::types::Airport};
use duration_str::deserialize_duration;
use log::LevelFilter;
use serde::Deserialize;
use std::{fs::File, io::Read, path::Path, time::Duration};

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Simulation {
  pub initial_flights: usize,
  pub min_flights: usize,
  #[serde(deserialize_with = "deserialize_duration")]
  pub tick_period: Duration,
  pub reassign_probability: f64,
  pub seed: Option<u64>,
  pub recompute_heading: bool,
}

impl Default for Simulation {
  fn default() -> Self {
    Self {
      initial_flights: 50,
      min_flights: 50,
      tick_period: Duration::from_secs(5),
      reassign_probability: 0.1,
      seed: None,
      recompute_heading: false,
    }
  }
}

impl Simulation {
  pub fn validate(&self) -> Result<(), SimError> {
    if self.tick_period.is_zero() {
      return Err(SimError::InvalidConfig(
        "tick_period must be positive".into(),
      ));
    }
    if !(0.0..=1.0).contains(&self.reassign_probability) {
      return Err(SimError::InvalidConfig(format!(
        "reassign_probability {} is outside of [0, 1]",
        self.reassign_probability
      )));
    }
    Ok(())
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Log {
  pub level: LevelFilter,
}

impl Default for Log {
  fn default() -> Self {
    Self {
      level: LevelFilter::Info,
    }
  }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Report {
  #[serde(deserialize_with = "deserialize_duration")]
  pub period: Duration,
}

impl Default for Report {
  fn default() -> Self {
    Self {
      period: Duration::from_secs(5),
    }
  }
}

impl Report {
  pub fn validate(&self) -> Result<(), SimError> {
    if self.period.is_zero() {
      return Err(SimError::InvalidConfig("report period must be positive".into()));
    }
    Ok(())
  }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
  pub log: Log,
  pub simulation: Simulation,
  pub report: Report,
  /// Overrides the built-in airport catalog when not empty
  pub airports: Vec<Airport>,
}

impl Config {
  pub fn validate(&self) -> Result<(), SimError> {
    self.simulation.validate()?;
    self.report.validate()
  }
}

fn load_file(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
  let mut f = File::open(path)?;
  let mut config_raw = String::new();
  f.read_to_string(&mut config_raw)?;
  Ok(toml::from_str(&config_raw)?)
}

pub fn read_config(filename: Option<&str>) -> Config {
  let mut filenames = vec!["./flightsim.toml", "/etc/flightsim.toml"];
  if let Some(filename) = filename {
    filenames.insert(0, filename);
  }

  // the logger is configured from this file so nothing is set up yet
  for fname in filenames {
    let path = Path::new(fname);
    println!("Trying config file {}...", fname);
    if path.is_file() {
      match load_file(path) {
        Ok(config) => return config,
        Err(err) => {
          println!("Error loading config file {}: {}", fname, err);
          continue;
        }
      }
    }
    println!("Config file {} does not exist", fname);
  }
  println!("No config files can be read, using default settings");
  Default::default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let cfg = Config::default();
    assert_eq!(cfg.simulation.initial_flights, 50);
    assert_eq!(cfg.simulation.min_flights, 50);
    assert_eq!(cfg.simulation.tick_period, Duration::from_secs(5));
    assert_eq!(cfg.simulation.reassign_probability, 0.1);
    assert!(!cfg.simulation.recompute_heading);
    assert!(cfg.airports.is_empty());
    assert!(cfg.simulation.validate().is_ok());
  }

  #[test]
  fn test_parse() {
    let raw = r#"
      [log]
      level = "debug"

      [simulation]
      min_flights = 10
      tick_period = "2s"
      reassign_probability = 1.0
      seed = 42

      [[airports]]
      id = "AAA"
      name = "Alpha"
      position = { lat = 0.0, lng = 0.0 }
      runways = 2
      traffic = 3

      [[airports]]
      id = "BBB"
      name = "Bravo"
      position = { lat = 0.0, lng = 10.0 }
      runways = 1
      traffic = 1
    "#;
    let cfg: Config = toml::from_str(raw).unwrap();
    assert_eq!(cfg.log.level, LevelFilter::Debug);
    assert_eq!(cfg.simulation.initial_flights, 50);
    assert_eq!(cfg.simulation.min_flights, 10);
    assert_eq!(cfg.simulation.tick_period, Duration::from_secs(2));
    assert_eq!(cfg.simulation.seed, Some(42));
    assert_eq!(cfg.report.period, Duration::from_secs(5));
    assert_eq!(cfg.airports.len(), 2);
    assert_eq!(cfg.airports[1].position.lng, 10.0);
  }

  #[test]
  fn test_validate() {
    let mut sim = Simulation {
      reassign_probability: 1.5,
      ..Default::default()
    };
    assert!(matches!(sim.validate(), Err(SimError::InvalidConfig(_))));
    sim.reassign_probability = 0.0;
    sim.tick_period = Duration::ZERO;
    assert!(matches!(sim.validate(), Err(SimError::InvalidConfig(_))));
  }

  #[test]
  fn test_validate_report_period() {
    let raw = r#"
      [report]
      period = "0s"
    "#;
    let mut cfg: Config = toml::from_str(raw).unwrap();
    assert!(matches!(cfg.validate(), Err(SimError::InvalidConfig(_))));
    cfg.report.period = Duration::from_secs(1);
    assert!(cfg.validate().is_ok());
  }

  #[test]
  fn test_read_config_fallback() {
    let cfg = read_config(Some("/nonexistent/flightsim.toml"));
    assert_eq!(cfg.simulation.min_flights, 50);
  }
}
