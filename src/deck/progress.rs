//! Generation progress shared with status requests.
//!
//! Overlapping runs are summed into one status; it returns to idle only when
//! the last run ends.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Idle,
    InProgress { done: usize, total: usize },
}

/// Slides done and total for every run still in flight
#[derive(Debug, Default)]
struct Runs {
    next_id: u64,
    active: HashMap<u64, (usize, usize)>,
}

impl Runs {
    fn status(&self) -> GenerationStatus {
        if self.active.is_empty() {
            return GenerationStatus::Idle;
        }
        let (done, total) = self
            .active
            .values()
            .fold((0, 0), |(done, total), (d, t)| (done + d, total + t));
        GenerationStatus::InProgress { done, total }
    }
}

#[derive(Debug)]
struct Shared {
    tx: watch::Sender<GenerationStatus>,
    runs: Mutex<Runs>,
}

impl Shared {
    /// Apply `update` and publish the resulting status while still locked,
    /// so concurrent runs never publish out of order.
    fn update<R>(&self, update: impl FnOnce(&mut Runs) -> R) -> R {
        let mut runs = self.lock();
        let out = update(&mut runs);
        self.tx.send_replace(runs.status());
        out
    }

    fn lock(&self) -> MutexGuard<'_, Runs> {
        // counters stay consistent even if a holder panicked
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Latest generation status, observable from any task
#[derive(Debug, Clone)]
pub struct GenerationProgress {
    shared: Arc<Shared>,
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationProgress {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(GenerationStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                tx,
                runs: Mutex::new(Runs::default()),
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationStatus> {
        self.shared.tx.subscribe()
    }

    pub fn current(&self) -> GenerationStatus {
        *self.shared.tx.borrow()
    }

    /// Mark a run of `total` slides as started.
    ///
    /// The run's share of the status is removed when the guard drops,
    /// whether the run finished or failed.
    pub fn begin(&self, total: usize) -> ProgressGuard {
        let id = self.shared.update(|runs| {
            let id = runs.next_id;
            runs.next_id += 1;
            runs.active.insert(id, (0, total));
            id
        });
        ProgressGuard {
            shared: self.shared.clone(),
            id,
        }
    }
}

pub struct ProgressGuard {
    shared: Arc<Shared>,
    id: u64,
}

impl ProgressGuard {
    pub fn advance(&self, done: usize) {
        self.shared.update(|runs| {
            if let Some((d, _)) = runs.active.get_mut(&self.id) {
                *d = done;
            }
        });
    }
}

impl Drop for ProgressGuard {
    fn drop(&mut self) {
        let id = self.id;
        self.shared.update(|runs| {
            runs.active.remove(&id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_resets_to_idle() {
        let progress = GenerationProgress::new();
        assert_eq!(progress.current(), GenerationStatus::Idle);

        {
            let guard = progress.begin(3);
            assert_eq!(progress.current(), GenerationStatus::InProgress { done: 0, total: 3 });
            guard.advance(2);
            assert_eq!(progress.current(), GenerationStatus::InProgress { done: 2, total: 3 });
        }

        assert_eq!(progress.current(), GenerationStatus::Idle);
    }

    #[test]
    fn test_overlapping_runs_stay_in_progress_until_last_ends() {
        let progress = GenerationProgress::new();

        let first = progress.begin(10);
        let second = progress.begin(3);
        second.advance(1);
        first.advance(7);
        assert_eq!(progress.current(), GenerationStatus::InProgress { done: 8, total: 13 });

        drop(first);
        assert_eq!(progress.current(), GenerationStatus::InProgress { done: 1, total: 3 });

        second.advance(3);
        drop(second);
        assert_eq!(progress.current(), GenerationStatus::Idle);
    }

    #[test]
    fn test_status_serializes_tagged() {
        let json = serde_json::to_value(GenerationStatus::InProgress { done: 1, total: 4 }).unwrap();
        assert_eq!(json["state"], "in_progress");
        assert_eq!(json["total"], 4);
        assert_eq!(serde_json::to_value(GenerationStatus::Idle).unwrap()["state"], "idle");
    }
}
