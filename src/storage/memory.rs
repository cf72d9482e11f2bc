//! In-memory job store for tests and embedding

use crate::jobs::ScanJob;
use crate::storage::traits::{JobStore, JobUpdate, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<String, ScanJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, HashMap<String, ScanJob>>> {
        self.jobs.lock().map_err(|_| StorageError::Lock)
    }
}

impl JobStore for MemoryJobStore {
    fn create(&self, job: &ScanJob) -> StorageResult<String> {
        let mut jobs = self.lock()?;
        if jobs.contains_key(&job.id) {
            return Err(StorageError::AlreadyExists(job.id.clone()));
        }
        jobs.insert(job.id.clone(), job.clone());
        Ok(job.id.clone())
    }

    fn update(&self, id: &str, update: JobUpdate) -> StorageResult<ScanJob> {
        let mut jobs = self.lock()?;
        let stored = jobs
            .get_mut(id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        // Apply to a copy so a rejected update leaves the stored job untouched
        let mut job = stored.clone();
        update.apply_to(&mut job)?;
        *stored = job.clone();
        Ok(job)
    }

    fn get(&self, id: &str) -> StorageResult<ScanJob> {
        self.lock()?
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> StorageResult<()> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn list_recent(&self, limit: usize) -> StorageResult<Vec<ScanJob>> {
        let mut jobs: Vec<ScanJob> = self.lock()?.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(limit);
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::ScanRequest;
    use crate::state::ScanStatus;

    #[test]
    fn test_lifecycle() {
        let store = MemoryJobStore::new();
        let id = store
            .create(&ScanJob::new(ScanRequest::new("https://example.com", "us-east-1")))
            .unwrap();

        store.update(&id, JobUpdate::status(ScanStatus::Visiting)).unwrap();
        store.update(&id, JobUpdate::status(ScanStatus::Analyzing)).unwrap();
        let job = store.update(&id, JobUpdate::status(ScanStatus::Completed)).unwrap();
        assert_eq!(job.status, ScanStatus::Completed);

        assert!(store.update(&id, JobUpdate::failed("late")).is_err());
        assert!(store.get(&id).unwrap().error_message.is_none());

        store.delete(&id).unwrap();
        assert!(matches!(store.get(&id), Err(StorageError::NotFound(_))));
    }
}
