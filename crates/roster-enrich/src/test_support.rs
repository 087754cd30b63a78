//! Test doubles shared by this crate's unit tests.

use std::{
  collections::VecDeque,
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use crate::{
  Result,
  client::{EmployerSearch, LookupQuery, PeopleSearch, Profile, StatusResponse},
  pace::Sleeper,
};

/// Records every requested wait and returns immediately.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
  waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
  pub fn waits(&self) -> Vec<Duration> { self.waits.lock().unwrap().clone() }
}

impl Sleeper for RecordingSleeper {
  async fn sleep(&self, duration: Duration) { self.waits.lock().unwrap().push(duration) }
}

pub fn profile(id: i64, status: &str) -> Profile {
  Profile { id: Some(id), status: Some(status.into()), ..Profile::default() }
}

type LookupFn = dyn Fn(&LookupQuery) -> Result<Profile> + Send + Sync;

/// A [`PeopleSearch`] whose lookups are computed by a closure and whose
/// status answers are played back in order. An exhausted status script
/// answers with an empty list.
pub struct ScriptedSearch {
  lookup:       Box<LookupFn>,
  statuses:     Mutex<VecDeque<Result<StatusResponse>>>,
  status_calls: AtomicUsize,
  employer:     Vec<Profile>,
}

impl ScriptedSearch {
  pub fn new(lookup: impl Fn(&LookupQuery) -> Result<Profile> + Send + Sync + 'static) -> Self {
    Self {
      lookup:       Box::new(lookup),
      statuses:     Mutex::new(VecDeque::new()),
      status_calls: AtomicUsize::new(0),
      employer:     Vec::new(),
    }
  }

  pub fn with_status(self, response: Result<StatusResponse>) -> Self {
    self.statuses.lock().unwrap().push_back(response);
    self
  }

  pub fn with_employer(mut self, profiles: Vec<Profile>) -> Self {
    self.employer = profiles;
    self
  }

  pub fn status_calls(&self) -> usize { self.status_calls.load(Ordering::SeqCst) }
}

impl PeopleSearch for ScriptedSearch {
  async fn lookup(&self, query: &LookupQuery) -> Result<Profile> { (self.lookup)(query) }

  async fn check_status(&self, _ids: &[i64]) -> Result<StatusResponse> {
    self.status_calls.fetch_add(1, Ordering::SeqCst);
    self
      .statuses
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or(Ok(StatusResponse::Many(Vec::new())))
  }

  async fn search_employer(&self, _search: &EmployerSearch) -> Result<Vec<Profile>> {
    Ok(self.employer.clone())
  }
}
