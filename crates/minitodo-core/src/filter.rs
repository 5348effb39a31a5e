use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::datastore::{KeyValueStore, PRIORITY_FILTER_KEY, STATUS_FILTER_KEY};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::task::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
  #[default]
  All,
  Open,
  Done
}

impl StatusFilter {
  pub const ALL: [StatusFilter; 3] = [
    StatusFilter::All,
    StatusFilter::Open,
    StatusFilter::Done
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | StatusFilter::All => "all",
      | StatusFilter::Open => "open",
      | StatusFilter::Done => "done"
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | StatusFilter::All => "Alle",
      | StatusFilter::Open => "Offen",
      | StatusFilter::Done => "Erledigt"
    }
  }

  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | StatusFilter::All => true,
      | StatusFilter::Open => !task.done,
      | StatusFilter::Done => task.done
    }
  }
}

impl fmt::Display for StatusFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for StatusFilter {
  type Err = ValidationError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s {
      | "all" => Ok(StatusFilter::All),
      | "open" => Ok(StatusFilter::Open),
      | "done" => Ok(StatusFilter::Done),
      | other => Err(
        ValidationError::InvalidStatusFilter(
          other.to_string()
        )
      )
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityFilter {
  #[default]
  All,
  Only(Priority)
}

impl PriorityFilter {
  pub const ALL: [PriorityFilter; 4] = [
    PriorityFilter::All,
    PriorityFilter::Only(Priority::Low),
    PriorityFilter::Only(Priority::Medium),
    PriorityFilter::Only(Priority::High)
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      | PriorityFilter::All => "all",
      | PriorityFilter::Only(p) => p.as_str()
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      | PriorityFilter::All => "Alle",
      | PriorityFilter::Only(p) => p.label()
    }
  }

  /// Tasks without a recognised priority count as medium.
  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | PriorityFilter::All => true,
      | PriorityFilter::Only(p) => {
        task.effective_priority() == p
      }
    }
  }
}

impl fmt::Display for PriorityFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PriorityFilter {
  type Err = ValidationError;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    if s == "all" {
      return Ok(PriorityFilter::All);
    }
    s.parse::<Priority>()
      .map(PriorityFilter::Only)
      .map_err(|_| {
        ValidationError::InvalidPriorityFilter(
          s.to_string()
        )
      })
  }
}

/// The two list filters. They combine conjunctively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterState {
  pub status:   StatusFilter,
  pub priority: PriorityFilter
}

impl FilterState {
  #[tracing::instrument(skip(kv))]
  pub fn load(
    kv: &dyn KeyValueStore
  ) -> Self {
    let state = Self {
      status:   load_or_default(
        kv,
        STATUS_FILTER_KEY
      ),
      priority: load_or_default(
        kv,
        PRIORITY_FILTER_KEY
      )
    };
    debug!(
      status = %state.status,
      priority = %state.priority,
      "loaded filters"
    );
    state
  }

  #[tracing::instrument(skip(self, kv))]
  pub fn set_status(
    &mut self,
    kv: &mut dyn KeyValueStore,
    value: &str
  ) -> CoreResult<()> {
    let status: StatusFilter =
      value.parse()?;
    self.status = status;
    persist(
      kv,
      STATUS_FILTER_KEY,
      status.as_str()
    )
  }

  #[tracing::instrument(skip(self, kv))]
  pub fn set_priority(
    &mut self,
    kv: &mut dyn KeyValueStore,
    value: &str
  ) -> CoreResult<()> {
    let priority: PriorityFilter =
      value.parse()?;
    self.priority = priority;
    persist(
      kv,
      PRIORITY_FILTER_KEY,
      priority.as_str()
    )
  }

  pub fn matches(
    &self,
    task: &Task
  ) -> bool {
    self.status.matches(task)
      && self.priority.matches(task)
  }
}

fn load_or_default<T>(
  kv: &dyn KeyValueStore,
  key: &str
) -> T
where
  T: FromStr + Default
{
  match kv.get(key) {
    | Ok(Some(raw)) => {
      raw.parse().unwrap_or_else(|_| {
        debug!(key, raw = %raw, "unknown stored filter; using default");
        T::default()
      })
    }
    | Ok(None) => T::default(),
    | Err(err) => {
      warn!(key, error = %err, "could not read filter; using default");
      T::default()
    }
  }
}

fn persist(
  kv: &mut dyn KeyValueStore,
  key: &str,
  value: &str
) -> CoreResult<()> {
  kv.set(key, value).map_err(|source| {
    CoreError::Persistence {
      key: key.to_string(),
      source
    }
  })
}
