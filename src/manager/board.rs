//! Derived views the control tower panels render from a flight snapshot.

use crate::{
  fixed::types::Airport,
  moving::flight::{Flight, FlightStatus},
  util::Counter,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunwaySlot {
  pub name: String,
  pub number: u32,
  pub landing: Option<Flight>,
  pub takeoff: Option<Flight>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub flights: usize,
  pub scheduled: usize,
  pub takeoff: usize,
  pub enroute: usize,
  pub landing: usize,
  pub ticks: u64,
}

impl Summary {
  pub fn new<'a>(flights: impl Iterator<Item = &'a Flight>, ticks: u64) -> Self {
    let counter: Counter<FlightStatus> = flights.map(|f| f.status).collect();
    Self {
      flights: counter.values().sum(),
      scheduled: counter.count(&FlightStatus::Scheduled),
      takeoff: counter.count(&FlightStatus::Takeoff),
      enroute: counter.count(&FlightStatus::Enroute),
      landing: counter.count(&FlightStatus::Landing),
      ticks,
    }
  }

  pub fn count(&self, status: FlightStatus) -> usize {
    match status {
      FlightStatus::Scheduled => self.scheduled,
      FlightStatus::Takeoff => self.takeoff,
      FlightStatus::Enroute => self.enroute,
      FlightStatus::Landing => self.landing,
    }
  }
}

pub fn sort_by_eta(mut flights: Vec<Flight>) -> Vec<Flight> {
  flights.sort_by_key(|f| f.eta);
  flights
}

/// Flights on the runway phases first, each group by ascending ETA
pub fn traffic_board(arrivals: Vec<Flight>, departures: Vec<Flight>) -> Vec<Flight> {
  let mut flights = arrivals;
  flights.extend(departures);
  flights.sort_by_key(|f| (!f.status.is_active(), f.eta));
  flights
}

/// Pairs each runway with the next landing and the next departing flight
pub fn runway_view(airport: &Airport, arrivals: &[Flight], departures: &[Flight]) -> Vec<RunwaySlot> {
  let mut landing = arrivals
    .iter()
    .filter(|f| f.status == FlightStatus::Landing)
    .cloned()
    .collect::<Vec<_>>();
  landing.sort_by_key(|f| f.eta);
  let mut takeoff = departures
    .iter()
    .filter(|f| f.status == FlightStatus::Takeoff)
    .cloned()
    .collect::<Vec<_>>();
  takeoff.sort_by_key(|f| f.eta);

  let mut landing = landing.into_iter();
  let mut takeoff = takeoff.into_iter();
  (1..=airport.runways)
    .map(|number| RunwaySlot {
      name: format!("{}-R{}", airport.id, number),
      number,
      landing: landing.next(),
      takeoff: takeoff.next(),
    })
    .collect()
}
