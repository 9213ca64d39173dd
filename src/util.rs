use std::{
  collections::HashMap,
  fmt::Debug,
  hash::Hash,
  ops::Deref,
  sync::Mutex,
};

use chrono::{DateTime, Duration, Utc};

pub struct Counter<T: Hash + Eq> {
  inner: HashMap<T, usize>,
}

impl<T: Hash + Eq> Counter<T> {
  pub fn new() -> Self {
    Self {
      inner: HashMap::new(),
    }
  }

  pub fn inc(&mut self, key: T) {
    let value = self.inner.entry(key).or_insert(0);
    *value += 1;
  }

  pub fn count(&self, key: &T) -> usize {
    self.inner.get(key).copied().unwrap_or(0)
  }
}

impl<T: Hash + Eq> Deref for Counter<T> {
  type Target = HashMap<T, usize>;

  fn deref(&self) -> &Self::Target {
    &self.inner
  }
}

impl<T: Hash + Eq> Default for Counter<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Hash + Eq> FromIterator<T> for Counter<T> {
  fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
    let mut counter = Self::new();
    for key in iter {
      counter.inc(key);
    }
    counter
  }
}

pub fn seconds_since(t: DateTime<Utc>) -> f32 {
  let t2 = Utc::now();
  let d = (t2 - t).to_std();
  if let Ok(d) = d {
    d.as_secs_f32()
  } else {
    0.0
  }
}

/// Source of "now" for ETA computation
pub trait Clock: Debug + Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self {
      now: Mutex::new(start),
    }
  }

  pub fn advance(&self, by: Duration) {
    let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
    *now += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().unwrap_or_else(|e| e.into_inner())
  }
}
