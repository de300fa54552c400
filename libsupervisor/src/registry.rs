use std::collections::{HashMap, HashSet};

use common::JobClass;

use crate::handler::HandlerRecord;

/// Active handlers keyed by job id, plus the compositing exclusivity flag.
///
/// A job id is claimed in `pending` from the moment its launch starts until
/// its record is inserted, so an id maps to at most one worker.
///
/// Always accessed behind the manager's `RwLock`; callers only ever get
/// copies of what is inside.
#[derive(Default)]
pub(crate) struct Registry {
    handling_compositing: bool,
    pending: HashSet<String>,
    active: HashMap<String, HandlerRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admission policy. A compositing job must run alone, and nothing is
    /// admitted next to one.
    pub fn can_accept(&self, class: JobClass) -> bool {
        if self.handling_compositing {
            return false;
        }
        match class {
            JobClass::Other => true,
            JobClass::Compositing => self.active.is_empty(),
        }
    }

    /// Admits a compositing job and raises the exclusivity flag in one step,
    /// so a concurrent compositing admission observes the flag.
    pub fn reserve_compositing(&mut self) -> bool {
        if !self.can_accept(JobClass::Compositing) {
            return false;
        }
        self.handling_compositing = true;
        true
    }

    /// Drops a reservation whose launch never produced a worker.
    pub fn release_compositing(&mut self) {
        self.handling_compositing = false;
    }

    /// Claims a job id for a launch in progress. Fails if the id is already
    /// active or being launched.
    pub fn reserve_job(&mut self, job_id: &str) -> bool {
        if self.active.contains_key(job_id) {
            return false;
        }
        self.pending.insert(job_id.to_string())
    }

    pub fn release_job(&mut self, job_id: &str) {
        self.pending.remove(job_id);
    }

    pub fn insert(&mut self, record: HandlerRecord) {
        if record.request.class() == JobClass::Compositing {
            self.handling_compositing = true;
        }
        self.pending.remove(&record.request.job_id);
        self.active.insert(record.request.job_id.clone(), record);
    }

    /// Removes the record of `job_id` only if it still belongs to `handler_id`.
    pub fn remove(&mut self, job_id: &str, handler_id: &str) -> Option<HandlerRecord> {
        if self.active.get(job_id)?.handler_id != handler_id {
            return None;
        }
        let record = self.active.remove(job_id)?;
        if record.request.class() == JobClass::Compositing {
            self.handling_compositing = false;
        }
        Some(record)
    }

    pub fn get(&self, job_id: &str) -> Option<&HandlerRecord> {
        self.active.get(job_id)
    }

    pub fn contains(&self, job_id: &str) -> bool {
        self.active.contains_key(job_id) || self.pending.contains(job_id)
    }

    pub fn records(&self) -> impl Iterator<Item = &HandlerRecord> {
        self.active.values()
    }

    pub fn job_ids(&self) -> Vec<String> {
        self.active.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn handling_compositing(&self) -> bool {
        self.handling_compositing
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::{JobKind, JobRequest, TrackRequest, WebRequest};

    use super::*;
    use crate::handler::{WorkerHandle, completion};

    fn record(job_id: &str, class: JobClass) -> HandlerRecord {
        let request = match class {
            JobClass::Compositing => JobKind::Web(WebRequest::default()),
            JobClass::Other => JobKind::Track(TrackRequest::default()),
        };
        let (_tx, done) = completion();
        HandlerRecord {
            handler_id: format!("EGH_{job_id}"),
            request: Arc::new(JobRequest {
                job_id: job_id.to_string(),
                room_id: String::new(),
                token: String::new(),
                ws_url: String::new(),
                request,
            }),
            worker: WorkerHandle::new(None),
            done,
        }
    }

    #[test]
    fn test_empty_registry_accepts_everything() {
        let registry = Registry::new();
        assert!(registry.can_accept(JobClass::Other));
        assert!(registry.can_accept(JobClass::Compositing));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_compositing_rejected_when_not_empty() {
        let mut registry = Registry::new();
        registry.insert(record("EG_other", JobClass::Other));
        assert!(registry.can_accept(JobClass::Other));
        assert!(!registry.can_accept(JobClass::Compositing));
        assert!(!registry.reserve_compositing());
        assert!(!registry.handling_compositing());
    }

    #[test]
    fn test_everything_rejected_while_compositing() {
        let mut registry = Registry::new();
        registry.insert(record("EG_web", JobClass::Compositing));
        assert!(registry.handling_compositing());
        assert!(!registry.can_accept(JobClass::Other));
        assert!(!registry.can_accept(JobClass::Compositing));

        assert!(registry.remove("EG_web", "EGH_EG_web").is_some());
        assert!(!registry.handling_compositing());
        assert!(registry.is_empty());
        assert!(registry.can_accept(JobClass::Compositing));
    }

    #[test]
    fn test_reservation_blocks_until_released() {
        let mut registry = Registry::new();
        assert!(registry.reserve_compositing());
        assert!(registry.is_empty());
        assert!(!registry.can_accept(JobClass::Other));
        assert!(!registry.reserve_compositing());

        registry.release_compositing();
        assert!(registry.can_accept(JobClass::Other));
        assert!(registry.can_accept(JobClass::Compositing));
    }

    #[test]
    fn test_job_id_claimed_until_released_or_inserted() {
        let mut registry = Registry::new();
        assert!(registry.reserve_job("EG_dup"));
        assert!(!registry.reserve_job("EG_dup"));
        assert!(registry.contains("EG_dup"));
        assert!(registry.is_empty());

        registry.release_job("EG_dup");
        assert!(!registry.contains("EG_dup"));
        assert!(registry.reserve_job("EG_dup"));

        registry.insert(record("EG_dup", JobClass::Other));
        assert!(!registry.reserve_job("EG_dup"));
        registry.release_job("EG_dup");
        assert!(registry.contains("EG_dup"));
    }

    #[test]
    fn test_remove_ignores_other_handler() {
        let mut registry = Registry::new();
        registry.insert(record("EG_web", JobClass::Compositing));

        assert!(registry.remove("EG_web", "EGH_stale").is_none());
        assert!(registry.contains("EG_web"));
        assert!(registry.handling_compositing());

        assert!(registry.remove("EG_web", "EGH_EG_web").is_some());
        assert!(!registry.handling_compositing());
        assert!(registry.remove("EG_web", "EGH_EG_web").is_none());
    }

    #[test]
    fn test_job_ids() {
        let mut registry = Registry::new();
        registry.insert(record("EG_a", JobClass::Other));
        registry.insert(record("EG_b", JobClass::Other));
        let mut ids = registry.job_ids();
        ids.sort();
        assert_eq!(ids, vec!["EG_a", "EG_b"]);
        assert!(registry.contains("EG_a"));
        assert_eq!(registry.get("EG_b").unwrap().handler_id, "EGH_EG_b");
    }
}
