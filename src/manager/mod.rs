pub mod board;
pub mod metrics;
pub mod registry;

use self::{
  board::{runway_view, sort_by_eta, traffic_board, RunwaySlot, Summary},
  metrics::{inc_single, Metrics},
  registry::{Registry, TickReport},
};

use crate::{
  config::{Config, Simulation},
  errors::SimError,
  fixed::{catalog::default_airports, types::Airport},
  moving::flight::{Flight, FlightStatus},
  util::{seconds_since, Clock, SystemClock},
};

use chrono::Utc;
use log::{debug, info};
use std::{
  sync::{Arc, Mutex},
  time::Duration,
};
use tokio::{
  sync::RwLock,
  task::JoinHandle,
  time::{interval_at, Instant, MissedTickBehavior},
};

/// Handle to one running flight simulation.
///
/// Every tick takes the registry write lock for its whole duration, queries
/// take the read lock and hand out owned copies.
#[derive(Debug)]
pub struct Simulator {
  period: Duration,
  registry: Arc<RwLock<Registry>>,
  metrics: Arc<RwLock<Metrics>>,
  clock: Arc<dyn Clock>,
  ticker: Mutex<Option<JoinHandle<()>>>,
}

async fn run_tick(
  registry: &RwLock<Registry>,
  metrics: &RwLock<Metrics>,
  clock: &dyn Clock,
) -> TickReport {
  // no await point between the tick and its metrics update, an aborted
  // ticker either applies both or neither
  let mut registry = registry.write().await;
  let mut metrics = metrics.write().await;

  let t = Utc::now();
  let report = registry.tick(clock.now());
  let summary = Summary::new(registry.flights(), registry.ticks());
  let process_time = seconds_since(t);

  metrics.ticks_total.set_single(summary.ticks);
  metrics.tick_processing_time_sec.set_single(process_time);
  inc_single(&mut metrics.flights_spawned_total, report.spawned);
  inc_single(&mut metrics.flights_reassigned_total, report.reassigned);
  inc_single(&mut metrics.flights_retired_total, report.retired);
  for status in FlightStatus::ALL {
    metrics.set_flights_active(status, summary.count(status));
  }
  drop(metrics);
  drop(registry);

  debug!(
    "tick {} processed in {}s: {} flights, {} advanced, {} reassigned, {} retired, {} spawned",
    summary.ticks,
    process_time,
    summary.flights,
    report.advanced,
    report.reassigned,
    report.retired,
    report.spawned
  );
  report
}

impl Simulator {
  pub fn new(cfg: &Config) -> Result<Self, SimError> {
    let airports = if cfg.airports.is_empty() {
      default_airports()
    } else {
      cfg.airports.clone()
    };
    Self::with_clock(cfg.simulation.clone(), airports, Arc::new(SystemClock))
  }

  pub fn with_clock(
    settings: Simulation,
    airports: Vec<Airport>,
    clock: Arc<dyn Clock>,
  ) -> Result<Self, SimError> {
    info!("setting flight simulation up");
    let period = settings.tick_period;
    let registry = Registry::new(settings, airports, clock.now())?;

    let mut metrics = Metrics::new();
    let summary = Summary::new(registry.flights(), registry.ticks());
    for status in FlightStatus::ALL {
      metrics.set_flights_active(status, summary.count(status));
    }

    Ok(Self {
      period,
      registry: Arc::new(RwLock::new(registry)),
      metrics: Arc::new(RwLock::new(metrics)),
      clock,
      ticker: Mutex::new(None),
    })
  }

  pub fn tick_period(&self) -> Duration {
    self.period
  }

  /// Starts ticking every period, the first tick fires one period from now.
  /// Does nothing if the simulation is already running.
  ///
  /// Must be called from within a tokio runtime.
  pub fn start(&self) {
    let mut ticker = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(handle) = ticker.as_ref() {
      if !handle.is_finished() {
        debug!("simulation is already running");
        return;
      }
    }

    let registry = self.registry.clone();
    let metrics = self.metrics.clone();
    let clock = self.clock.clone();
    let period = self.period;

    info!("starting simulation, tick period {:?}", period);
    let handle = tokio::spawn(async move {
      let mut interval = interval_at(Instant::now() + period, period);
      interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        interval.tick().await;
        run_tick(&registry, &metrics, clock.as_ref()).await;
      }
    });
    *ticker = Some(handle);
  }

  /// Stops ticking and leaves the current state as is. Does nothing if the
  /// simulation isn't running.
  pub fn stop(&self) {
    let handle = self
      .ticker
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .take();
    if let Some(handle) = handle {
      handle.abort();
      info!("simulation stopped");
    }
  }

  pub fn is_running(&self) -> bool {
    self
      .ticker
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .as_ref()
      .map(|h| !h.is_finished())
      .unwrap_or(false)
  }

  /// Runs a single tick right away, regardless of the ticker
  pub async fn step(&self) -> TickReport {
    run_tick(&self.registry, &self.metrics, self.clock.as_ref()).await
  }

  pub async fn tick_count(&self) -> u64 {
    self.registry.read().await.ticks()
  }

  pub async fn insert_flight(&self, flight: Flight) -> Result<(), SimError> {
    self.registry.write().await.insert_flight(flight)
  }

  pub async fn list_flights(&self) -> Vec<Flight> {
    self.registry.read().await.flights().cloned().collect()
  }

  pub async fn get_flight(&self, id: &str) -> Option<Flight> {
    self.registry.read().await.flight(id).cloned()
  }

  pub async fn list_airports(&self) -> Vec<Airport> {
    self.registry.read().await.airports().to_vec()
  }

  pub async fn get_airport(&self, id: &str) -> Option<Airport> {
    self.registry.read().await.airport(id).cloned()
  }

  /// Every flight bound to `airport_id`, whatever its status
  pub async fn flights_arriving_at(&self, airport_id: &str) -> Vec<Flight> {
    self
      .registry
      .read()
      .await
      .flights()
      .filter(|f| f.destination == airport_id)
      .cloned()
      .collect()
  }

  /// Flights out of `airport_id` that are still in their takeoff phase
  pub async fn flights_departing_from(&self, airport_id: &str) -> Vec<Flight> {
    self
      .registry
      .read()
      .await
      .flights()
      .filter(|f| f.origin == airport_id && f.status == FlightStatus::Takeoff)
      .cloned()
      .collect()
  }

  pub async fn arrivals_board(&self, airport_id: &str) -> Vec<Flight> {
    sort_by_eta(self.flights_arriving_at(airport_id).await)
  }

  pub async fn traffic_board(&self, airport_id: &str) -> Vec<Flight> {
    let (arrivals, departures) = self.airport_traffic(airport_id).await;
    traffic_board(arrivals, departures)
  }

  pub async fn runway_view(&self, airport_id: &str) -> Option<Vec<RunwaySlot>> {
    let airport = self.get_airport(airport_id).await?;
    let (arrivals, departures) = self.airport_traffic(airport_id).await;
    Some(runway_view(&airport, &arrivals, &departures))
  }

  async fn airport_traffic(&self, airport_id: &str) -> (Vec<Flight>, Vec<Flight>) {
    // one read lock so both lists come from the same generation
    let registry = self.registry.read().await;
    let arrivals = registry
      .flights()
      .filter(|f| f.destination == airport_id)
      .cloned()
      .collect();
    let departures = registry
      .flights()
      .filter(|f| f.origin == airport_id && f.status == FlightStatus::Takeoff)
      .cloned()
      .collect();
    (arrivals, departures)
  }

  pub async fn summary(&self) -> Summary {
    let registry = self.registry.read().await;
    Summary::new(registry.flights(), registry.ticks())
  }

  pub async fn render_metrics(&self) -> String {
    self.metrics.read().await.render()
  }
}

impl Drop for Simulator {
  fn drop(&mut self) {
    self.stop();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::ManualClock;
  use chrono::Duration as CDuration;

  fn settings(initial: usize, floor: usize, p: f64) -> Simulation {
    Simulation {
      initial_flights: initial,
      min_flights: floor,
      reassign_probability: p,
      seed: Some(99),
      ..Default::default()
    }
  }

  fn airports() -> Vec<Airport> {
    vec![
      Airport::new("AAA", "Alpha", 0.0, 0.0, 2, 5),
      Airport::new("BBB", "Bravo", 10.0, 0.0, 1, 5),
      Airport::new("CCC", "Charlie", 10.0, 10.0, 3, 5),
    ]
  }

  fn simulator(initial: usize, floor: usize, p: f64) -> Simulator {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    Simulator::with_clock(settings(initial, floor, p), airports(), clock).unwrap()
  }

  async fn insert(sim: &Simulator, id: &str, from: &str, to: &str, progress: f64) {
    let a = sim.get_airport(from).await.unwrap();
    let b = sim.get_airport(to).await.unwrap();
    let now = Utc::now();
    let flight = Flight::on_leg(id, "IBE1000", "A320", &a, &b, progress, 100, 500, now).unwrap();
    sim.insert_flight(flight).await.unwrap();
  }

  #[tokio::test]
  async fn test_default_construction() {
    let sim = Simulator::new(&Config::default()).unwrap();
    assert_eq!(sim.list_flights().await.len(), 50);
    assert_eq!(sim.list_airports().await.len(), 10);
    assert_eq!(sim.tick_period(), Duration::from_secs(5));
    assert!(!sim.is_running());
  }

  #[tokio::test]
  async fn test_construction_errors() {
    let cfg = Config {
      airports: vec![Airport::new("AAA", "Alpha", 0.0, 0.0, 2, 5)],
      ..Default::default()
    };
    assert_eq!(
      Simulator::new(&cfg).unwrap_err(),
      SimError::NotEnoughAirports(1)
    );
  }

  #[tokio::test]
  async fn test_unknown_airport() {
    let sim = simulator(5, 5, 0.1);
    assert!(sim.get_airport("ZZZ").await.is_none());
    assert!(sim.get_flight("nope").await.is_none());
    assert!(sim.flights_arriving_at("ZZZ").await.is_empty());
    assert!(sim.flights_departing_from("ZZZ").await.is_empty());
    assert!(sim.runway_view("ZZZ").await.is_none());
    // lookups don't change anything
    assert_eq!(sim.list_flights().await.len(), 5);
    assert_eq!(sim.list_airports().await.len(), 3);
  }

  #[tokio::test]
  async fn test_snapshot_is_detached() {
    let sim = simulator(5, 5, 0.1);
    let mut flights = sim.list_flights().await;
    let id = flights[0].id.clone();
    flights[0].altitude = -1;
    flights.clear();
    assert_eq!(sim.list_flights().await.len(), 5);
    assert_ne!(sim.get_flight(&id).await.unwrap().altitude, -1);
  }

  #[tokio::test]
  async fn test_arriving_and_departing() {
    let sim = simulator(0, 0, 0.1);
    insert(&sim, "X1", "AAA", "BBB", 0.0).await;
    insert(&sim, "X2", "AAA", "BBB", 0.5).await;
    insert(&sim, "X3", "CCC", "AAA", 0.5).await;

    let arriving = sim.flights_arriving_at("BBB").await;
    assert_eq!(arriving.len(), 2);

    // only the flight still in takeoff counts as departing
    let departing = sim.flights_departing_from("AAA").await;
    assert_eq!(departing.len(), 1);
    assert_eq!(departing[0].id, "X1");

    let board = sim.traffic_board("AAA").await;
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].id, "X1");

    let slots = sim.runway_view("AAA").await.unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].takeoff.as_ref().unwrap().id, "X1");
  }

  #[tokio::test]
  async fn test_reassign_keeps_id() {
    let sim = simulator(0, 0, 1.0);
    insert(&sim, "X1", "AAA", "BBB", 0.99).await;
    let report = sim.step().await;
    assert_eq!(report.reassigned, 1);
    let f = sim.get_flight("X1").await.unwrap();
    assert_eq!(f.origin, "BBB");
    assert_eq!(f.status, FlightStatus::Takeoff);
  }

  #[tokio::test]
  async fn test_retire_removes() {
    let sim = simulator(0, 0, 0.0);
    insert(&sim, "X1", "AAA", "BBB", 0.99).await;
    sim.step().await;
    let ids: Vec<String> = sim.list_flights().await.into_iter().map(|f| f.id).collect();
    assert!(!ids.contains(&"X1".to_owned()));
    assert!(sim.render_metrics().await.contains("flights_retired_total 1\n"));
  }

  #[tokio::test]
  async fn test_eta_uses_clock() {
    let start = Utc::now() + CDuration::days(1);
    let clock = Arc::new(ManualClock::new(start));
    let sim = Simulator::with_clock(settings(10, 10, 0.1), airports(), clock.clone()).unwrap();
    clock.advance(CDuration::seconds(5));
    sim.step().await;
    for f in sim.list_flights().await {
      assert!(f.eta >= start + CDuration::seconds(5));
    }
  }

  #[tokio::test]
  async fn test_stop_before_start() {
    let sim = simulator(5, 5, 0.1);
    sim.stop();
    sim.stop();
    assert!(!sim.is_running());
    assert_eq!(sim.tick_count().await, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_start_is_idempotent() {
    let sim = simulator(5, 5, 0.1);
    sim.start();
    sim.start();
    assert!(sim.is_running());
    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!(sim.tick_count().await, 3);
    sim.stop();
    assert!(!sim.is_running());
  }

  #[tokio::test(start_paused = true)]
  async fn test_stop_keeps_state() {
    let sim = simulator(5, 5, 0.1);
    sim.start();
    tokio::time::sleep(Duration::from_secs(11)).await;
    sim.stop();
    let flights = sim.list_flights().await;
    assert_eq!(sim.tick_count().await, 2);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(sim.tick_count().await, 2);
    assert_eq!(sim.list_flights().await, flights);

    // restarting after a stop resumes ticking
    sim.start();
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(sim.tick_count().await, 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_metrics_follow_ticks_across_stop() {
    let sim = simulator(5, 5, 0.5);
    for _ in 0..4 {
      sim.start();
      tokio::time::sleep(Duration::from_millis(7500)).await;
      sim.stop();
      let ticks = sim.tick_count().await;
      assert!(sim
        .render_metrics()
        .await
        .contains(&format!("ticks_total {ticks}\n")));
    }
    assert_eq!(sim.tick_count().await, 4);
  }

  #[tokio::test]
  async fn test_arrivals_board_by_eta() {
    let sim = simulator(0, 0, 0.1);
    insert(&sim, "X1", "AAA", "BBB", 0.2).await;
    insert(&sim, "X2", "AAA", "BBB", 0.8).await;
    insert(&sim, "X3", "CCC", "BBB", 0.5).await;
    insert(&sim, "X4", "BBB", "AAA", 0.5).await;

    let board = sim.arrivals_board("BBB").await;
    let ids: Vec<&str> = board.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["X2", "X3", "X1"]);
    assert!(board.windows(2).all(|w| w[0].eta <= w[1].eta));
    assert!(sim.arrivals_board("ZZZ").await.is_empty());
  }

  #[tokio::test]
  async fn test_summary_and_metrics() {
    let sim = simulator(8, 8, 0.1);
    sim.step().await;
    let summary = sim.summary().await;
    assert_eq!(summary.ticks, 1);
    assert!(summary.flights >= 8);
    assert_eq!(summary.scheduled, 0);
    assert_eq!(
      summary.takeoff + summary.enroute + summary.landing,
      summary.flights
    );
    let out = sim.render_metrics().await;
    assert!(out.contains("ticks_total 1\n"));
    assert!(out.contains("flights_active{status=\"enroute\"}"));
  }
}
