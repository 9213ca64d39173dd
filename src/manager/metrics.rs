use crate::{moving::flight::FlightStatus, util::seconds_since};
use chrono::{DateTime, Utc};
use std::{collections::HashMap, fmt::Display};

#[macro_export]
macro_rules! labels {
  ($($label:literal = $value:expr),+) => {
    {
      let mut c: std::collections::HashMap<&'static str, String> = std::collections::HashMap::new();
      $(c.insert(($label).into(), ($value).into());)+
      c
    }
  };
}

#[derive(Debug, Clone)]
pub enum MetricType {
  Counter,
  Gauge,
}

impl Display for MetricType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      MetricType::Counter => write!(f, "counter"),
      MetricType::Gauge => write!(f, "gauge"),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Metric<T: Display + Clone + Default> {
  name: String,
  help: String,
  metric_type: MetricType,
  single: bool,
  values: HashMap<String, T>,
}

impl<T: Display + Clone + Default> Metric<T> {
  pub fn new(name: &str, help: &str, mtype: MetricType) -> Self {
    Self {
      name: name.into(),
      help: help.into(),
      metric_type: mtype,
      single: false,
      values: HashMap::new(),
    }
  }

  pub fn reset(&mut self) {
    self.values.clear();
  }

  pub fn set(&mut self, labels: HashMap<&'static str, String>, value: T) {
    self.single = false;
    let mut labels = labels
      .iter()
      .map(|(k, v)| format!("{}=\"{}\"", k, v))
      .collect::<Vec<String>>();
    labels.sort();
    let label_str = labels.join(",");
    self.values.insert(label_str, value);
  }

  pub fn set_single(&mut self, value: T) {
    self.reset();
    self.single = true;
    self.values.insert("_".into(), value);
  }

  pub fn get_single(&self) -> Option<&T> {
    if self.single {
      self.values.get("_")
    } else {
      None
    }
  }

  pub fn render(&self) -> String {
    if self.values.is_empty() {
      return "".into();
    }

    let comment = format!(
      "# HELP {} {}\n# TYPE {} {}\n",
      self.name, self.help, self.name, self.metric_type
    );

    if self.single {
      let value = self.values.get("_").cloned().unwrap_or_default();
      comment + &format!("{} {}", self.name, value) + "\n"
    } else {
      let mut values = self
        .values
        .iter()
        .map(|(k, v)| format!("{}{{{}}} {}", self.name, k, v))
        .collect::<Vec<String>>();
      values.sort();
      comment + &values.join("\n") + "\n"
    }
  }
}

#[derive(Debug, Clone)]
pub struct Metrics {
  pub ticks_total: Metric<u64>,
  pub tick_processing_time_sec: Metric<f32>,
  pub flights_active: Metric<usize>,
  pub flights_spawned_total: Metric<usize>,
  pub flights_reassigned_total: Metric<usize>,
  pub flights_retired_total: Metric<usize>,
  pub process_started_at: DateTime<Utc>,
}

impl Metrics {
  pub fn new() -> Self {
    let mut metrics = Self {
      ticks_total: Metric::new(
        "ticks_total",
        "Simulation ticks processed",
        MetricType::Counter,
      ),
      tick_processing_time_sec: Metric::new(
        "tick_processing_time_sec",
        "Time spent processing the latest tick",
        MetricType::Gauge,
      ),
      flights_active: Metric::new(
        "flights_active",
        "Flights currently in the registry",
        MetricType::Gauge,
      ),
      flights_spawned_total: Metric::new(
        "flights_spawned_total",
        "Flights spawned to keep the registry at its floor",
        MetricType::Counter,
      ),
      flights_reassigned_total: Metric::new(
        "flights_reassigned_total",
        "Flights that started a new leg after arriving",
        MetricType::Counter,
      ),
      flights_retired_total: Metric::new(
        "flights_retired_total",
        "Flights removed after arriving",
        MetricType::Counter,
      ),
      process_started_at: Utc::now(),
    };
    metrics.ticks_total.set_single(0);
    metrics.flights_spawned_total.set_single(0);
    metrics.flights_reassigned_total.set_single(0);
    metrics.flights_retired_total.set_single(0);
    metrics
  }

  pub fn set_flights_active(&mut self, status: FlightStatus, count: usize) {
    self
      .flights_active
      .set(crate::labels!("status" = status.as_str()), count);
  }

  pub fn render(&self) -> String {
    let mut metrics = vec![
      self.ticks_total.render(),
      self.tick_processing_time_sec.render(),
      self.flights_active.render(),
      self.flights_spawned_total.render(),
      self.flights_reassigned_total.render(),
      self.flights_retired_total.render(),
    ];

    let mut metric = Metric::new("uptime", "Process uptime in sec", MetricType::Counter);
    let sec = seconds_since(self.process_started_at).ceil() as u64;
    metric.set_single(sec);
    metrics.push(metric.render());

    metrics.join("")
  }
}

impl Default for Metrics {
  fn default() -> Self {
    Self::new()
  }
}

/// Adds `by` to a single-valued counter
pub fn inc_single<T>(metric: &mut Metric<T>, by: T)
where
  T: Display + Clone + Default + std::ops::Add<Output = T>,
{
  let current = metric.get_single().cloned().unwrap_or_default();
  metric.set_single(current + by);
}
