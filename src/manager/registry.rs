use crate::{
  config::Simulation,
  errors::SimError,
  fixed::{catalog::AirportCatalog, types::Airport},
  moving::{
    aircraft::{random_aircraft, random_callsign},
    flight::{Flight, FlightStatus, ALTITUDE_MAX, ARRIVAL_RADIUS_KM},
  },
};
use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
  pub advanced: usize,
  pub reassigned: usize,
  pub retired: usize,
  pub spawned: usize,
}

/// Owns every airport and flight record and advances them one tick at a time.
///
/// The registry is plain synchronous data, callers serialize access to it.
#[derive(Debug)]
pub struct Registry {
  settings: Simulation,
  catalog: AirportCatalog,
  // ordered so that a seeded rng yields the same run every time
  flights: BTreeMap<String, Flight>,
  rng: StdRng,
  next_id: u64,
  ticks: u64,
}

fn lookup<'a>(catalog: &'a AirportCatalog, airport_id: &str, flight: &Flight) -> &'a Airport {
  // the catalog is immutable and every inserted flight is checked against it
  catalog.find(airport_id).unwrap_or_else(|| {
    panic!(
      "flight {} refers to airport {} missing from the catalog",
      flight.id, airport_id
    )
  })
}

impl Registry {
  pub fn new(
    settings: Simulation,
    airports: Vec<Airport>,
    now: DateTime<Utc>,
  ) -> Result<Self, SimError> {
    settings.validate()?;
    let catalog = AirportCatalog::new(airports)?;
    let rng = match settings.seed {
      Some(seed) => StdRng::seed_from_u64(seed),
      None => StdRng::from_entropy(),
    };

    let mut registry = Self {
      settings,
      catalog,
      flights: BTreeMap::new(),
      rng,
      next_id: 0,
      ticks: 0,
    };
    let count = registry.settings.initial_flights;
    registry.spawn_many(count, now);
    info!(
      "registry set up with {} airports and {} flights",
      registry.catalog.len(),
      registry.flights.len()
    );
    Ok(registry)
  }

  pub fn airports(&self) -> &[Airport] {
    self.catalog.airports()
  }

  pub fn airport(&self, id: &str) -> Option<&Airport> {
    self.catalog.find(id)
  }

  pub fn flights(&self) -> impl Iterator<Item = &Flight> {
    self.flights.values()
  }

  pub fn flight(&self, id: &str) -> Option<&Flight> {
    self.flights.get(id)
  }

  pub fn len(&self) -> usize {
    self.flights.len()
  }

  pub fn is_empty(&self) -> bool {
    self.flights.is_empty()
  }

  pub fn ticks(&self) -> u64 {
    self.ticks
  }

  fn next_flight_id(&mut self) -> String {
    loop {
      let id = format!("FL{}", self.next_id);
      self.next_id += 1;
      if !self.flights.contains_key(&id) {
        return id;
      }
    }
  }

  /// Creates a flight somewhere along a random leg, without registering it
  fn spawn(&mut self, now: DateTime<Utc>) -> Flight {
    let id = self.next_flight_id();
    let (origin, destination) = self.catalog.random_pair(&mut self.rng);
    let progress: f64 = self.rng.gen();
    let altitude = self.rng.gen_range(150..=ALTITUDE_MAX);
    let speed = self.rng.gen_range(400..700);
    let callsign = random_callsign(&mut self.rng);
    let aircraft = random_aircraft(&mut self.rng);
    Flight::place(
      &id,
      callsign,
      aircraft,
      origin,
      destination,
      progress,
      altitude,
      speed,
      now,
    )
  }

  fn spawn_many(&mut self, count: usize, now: DateTime<Utc>) {
    for _ in 0..count {
      let flight = self.spawn(now);
      debug!(
        "spawned {} {} {}->{} ({})",
        flight.id, flight.callsign, flight.origin, flight.destination, flight.status
      );
      self.flights.insert(flight.id.clone(), flight);
    }
  }

  /// Registers an externally built flight. The route is re-derived from the
  /// flight's endpoints and position, altitude and speed are clamped and the
  /// heading is wrapped into [0, 360).
  pub fn insert_flight(&mut self, mut flight: Flight) -> Result<(), SimError> {
    if self.flights.contains_key(&flight.id) {
      return Err(SimError::DuplicateFlight(flight.id));
    }
    if flight.origin == flight.destination {
      return Err(SimError::SameEndpoints(flight.origin));
    }
    let origin = self
      .catalog
      .find(&flight.origin)
      .ok_or_else(|| SimError::UnknownAirport(flight.origin.clone()))?;
    let destination = self
      .catalog
      .find(&flight.destination)
      .ok_or_else(|| SimError::UnknownAirport(flight.destination.clone()))?;
    flight.normalize(origin, destination);
    self.flights.insert(flight.id.clone(), flight);
    Ok(())
  }

  /// Advances every flight by one tick period.
  ///
  /// The next generation of flights is built into a fresh map and swapped in
  /// once all flights were processed, then the registry is replenished up to
  /// the configured floor.
  pub fn tick(&mut self, now: DateTime<Utc>) -> TickReport {
    let secs = self.settings.tick_period.as_secs_f64();
    let current = std::mem::take(&mut self.flights);
    let mut next = BTreeMap::new();
    let mut report = TickReport::default();

    for (id, mut flight) in current {
      let destination = lookup(&self.catalog, &flight.destination, &flight);
      let remaining = flight.remaining_km(destination);

      // not departed yet, stays put until something starts its leg
      if flight.status == FlightStatus::Scheduled {
        flight.update_eta(remaining, now);
        flight.sync_route();
        next.insert(id, flight);
        continue;
      }

      if remaining < ARRIVAL_RADIUS_KM {
        if self.rng.gen_bool(self.settings.reassign_probability) {
          let origin = destination;
          let destination = self.catalog.random_other(&mut self.rng, &origin.id);
          let altitude = self.rng.gen_range(50..150);
          let callsign = random_callsign(&mut self.rng);
          flight.start_leg(origin, destination, altitude, callsign, now);
          debug!(
            "{id} reassigned as {} {}->{}",
            flight.callsign, flight.origin, flight.destination
          );
          next.insert(id, flight);
          report.reassigned += 1;
        } else {
          debug!("{id} ({}) arrived at {}, retired", flight.callsign, flight.destination);
          report.retired += 1;
        }
        continue;
      }

      if self.settings.recompute_heading {
        flight.heading = flight.position.bearing_to(&destination.position);
      }
      flight.advance(secs);
      flight.update_phase(remaining, &mut self.rng);
      flight.update_eta(flight.remaining_km(destination), now);
      flight.sync_route();
      next.insert(id, flight);
      report.advanced += 1;
    }

    self.flights = next;

    let floor = self.settings.min_flights;
    if self.flights.len() < floor {
      let count = self.rng.gen_range(1..=3).max(floor - self.flights.len());
      self.spawn_many(count, now);
      report.spawned = count;
    }

    self.ticks += 1;
    report
  }
}
