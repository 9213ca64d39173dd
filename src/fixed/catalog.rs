use super::types::Airport;
use crate::errors::SimError;
use rand::Rng;
use std::collections::HashMap;

pub fn default_airports() -> Vec<Airport> {
  vec![
    Airport::new("MAD", "Adolfo Suárez Madrid-Barajas", -3.5667, 40.4667, 4, 8),
    Airport::new("BCN", "Barcelona-El Prat", 2.0833, 41.2969, 3, 7),
    Airport::new("LHR", "London Heathrow", -0.4614, 51.4700, 2, 10),
    Airport::new("CDG", "Paris Charles de Gaulle", 2.5478, 49.0097, 4, 9),
    Airport::new("JFK", "New York John F. Kennedy", -73.7781, 40.6413, 4, 8),
    Airport::new("DXB", "Dubai International", 55.3644, 25.2528, 2, 9),
    Airport::new("HND", "Tokyo Haneda", 139.7798, 35.5494, 4, 8),
    Airport::new("SYD", "Sydney Kingsford Smith", 151.1772, -33.9399, 3, 6),
    Airport::new("GRU", "São Paulo-Guarulhos", -46.4728, -23.4356, 2, 7),
    Airport::new("CPT", "Cape Town International", 18.6021, -33.9648, 2, 5),
  ]
}

#[derive(Debug, Clone)]
pub struct AirportCatalog {
  airports: Vec<Airport>,
  idx: HashMap<String, usize>,
}

impl AirportCatalog {
  pub fn new(airports: Vec<Airport>) -> Result<Self, SimError> {
    if airports.len() < 2 {
      return Err(SimError::NotEnoughAirports(airports.len()));
    }

    let mut idx = HashMap::new();
    for (i, arpt) in airports.iter().enumerate() {
      validate_airport(arpt)?;
      if idx.insert(arpt.id.clone(), i).is_some() {
        return Err(SimError::DuplicateAirport(arpt.id.clone()));
      }
    }
    Ok(Self { airports, idx })
  }

  pub fn airports(&self) -> &[Airport] {
    &self.airports
  }

  pub fn find(&self, id: &str) -> Option<&Airport> {
    self.idx.get(id).map(|i| &self.airports[*i])
  }

  pub fn len(&self) -> usize {
    self.airports.len()
  }

  pub fn is_empty(&self) -> bool {
    self.airports.is_empty()
  }

  /// Two distinct airports picked uniformly at random
  pub fn random_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> (&Airport, &Airport) {
    let origin = rng.gen_range(0..self.airports.len());
    let origin = &self.airports[origin];
    (origin, self.random_other(rng, &origin.id))
  }

  /// A uniformly random airport other than `exclude`
  pub fn random_other<R: Rng + ?Sized>(&self, rng: &mut R, exclude: &str) -> &Airport {
    // the catalog holds at least 2 unique ids, so the candidate list is never empty
    let candidates: Vec<&Airport> = self.airports.iter().filter(|a| a.id != exclude).collect();
    candidates[rng.gen_range(0..candidates.len())]
  }
}

fn validate_airport(arpt: &Airport) -> Result<(), SimError> {
  if arpt.id.is_empty() {
    return Err(SimError::InvalidAirport(arpt.name.clone(), "empty id"));
  }
  if arpt.runways == 0 {
    return Err(SimError::InvalidAirport(
      arpt.id.clone(),
      "runway count must be positive",
    ));
  }
  if !(1..=10).contains(&arpt.traffic) {
    return Err(SimError::InvalidAirport(
      arpt.id.clone(),
      "traffic level must be within 1..10",
    ));
  }
  let pos = arpt.position;
  if !(-90.0..=90.0).contains(&pos.lat) || !(-180.0..=180.0).contains(&pos.lng) {
    return Err(SimError::InvalidAirport(
      arpt.id.clone(),
      "position is out of range",
    ));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{rngs::StdRng, SeedableRng};

  #[test]
  fn test_default_catalog() {
    let catalog = AirportCatalog::new(default_airports()).unwrap();
    assert_eq!(catalog.len(), 10);
    let lhr = catalog.find("LHR").unwrap();
    assert_eq!(lhr.runways, 2);
    assert_eq!(lhr.traffic, 10);
    assert!(catalog.find("ZZZ").is_none());
  }

  #[test]
  fn test_not_enough_airports() {
    let res = AirportCatalog::new(vec![Airport::new("AAA", "A", 0.0, 0.0, 1, 1)]);
    assert_eq!(res.unwrap_err(), SimError::NotEnoughAirports(1));
    let res = AirportCatalog::new(vec![]);
    assert_eq!(res.unwrap_err(), SimError::NotEnoughAirports(0));
  }

  #[test]
  fn test_duplicate_airport() {
    let res = AirportCatalog::new(vec![
      Airport::new("AAA", "A", 0.0, 0.0, 1, 1),
      Airport::new("AAA", "A2", 1.0, 0.0, 1, 1),
    ]);
    assert_eq!(res.unwrap_err(), SimError::DuplicateAirport("AAA".into()));
  }

  #[test]
  fn test_invalid_airports() {
    let ok = Airport::new("BBB", "B", 1.0, 1.0, 1, 1);
    let cases = vec![
      Airport::new("AAA", "A", 0.0, 0.0, 0, 1),
      Airport::new("AAA", "A", 0.0, 0.0, 1, 0),
      Airport::new("AAA", "A", 0.0, 0.0, 1, 11),
      Airport::new("AAA", "A", 0.0, 95.0, 1, 1),
      Airport::new("", "A", 0.0, 0.0, 1, 1),
    ];
    for arpt in cases {
      let res = AirportCatalog::new(vec![arpt, ok.clone()]);
      assert!(matches!(res, Err(SimError::InvalidAirport(_, _))));
    }
  }

  #[test]
  fn test_random_pair_is_distinct() {
    let catalog = AirportCatalog::new(vec![
      Airport::new("AAA", "A", 0.0, 0.0, 1, 1),
      Airport::new("BBB", "B", 10.0, 0.0, 1, 1),
    ])
    .unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
      let (a, b) = catalog.random_pair(&mut rng);
      assert_ne!(a.id, b.id);
    }
    assert_eq!(catalog.random_other(&mut rng, "AAA").id, "BBB");
  }
}
