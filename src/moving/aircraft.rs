use lazy_static::lazy_static;
use rand::Rng;
use std::collections::HashMap;

pub const AIRLINES: &[(&str, &str)] = &[
  ("IBE", "Iberia"),
  ("RYR", "Ryanair"),
  ("BAW", "British Airways"),
  ("AFR", "Air France"),
  ("DLH", "Lufthansa"),
  ("UAE", "Emirates"),
  ("AAL", "American Airlines"),
  ("DAL", "Delta Air Lines"),
  ("UAL", "United Airlines"),
  ("THY", "Turkish Airlines"),
];

pub const AIRCRAFT_TYPES: &[&str] = &[
  "A320", "A330", "A350", "A380", "B737", "B747", "B777", "B787", "E190", "CRJ9", "DH8D", "AT76",
];

lazy_static! {
  static ref AIRLINE_NAMES: HashMap<&'static str, &'static str> = AIRLINES.iter().copied().collect();
}

/// Airline code followed by a 4-digit flight number, e.g. IBE1234
pub fn random_callsign<R: Rng + ?Sized>(rng: &mut R) -> String {
  let (code, _) = AIRLINES[rng.gen_range(0..AIRLINES.len())];
  let number: u16 = rng.gen_range(1000..10000);
  format!("{code}{number}")
}

pub fn random_aircraft<R: Rng + ?Sized>(rng: &mut R) -> String {
  AIRCRAFT_TYPES[rng.gen_range(0..AIRCRAFT_TYPES.len())].to_owned()
}

pub fn airline_name(callsign: &str) -> Option<&'static str> {
  let code = callsign.get(..3)?;
  AIRLINE_NAMES.get(code).copied()
}
