//! Task lifecycle service: the API the CLI layer consumes.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::Value;

use crate::error::{ServiceError, ValidationError};
use crate::store::FileTaskStore;
use crate::task::{Priority, Task};
use crate::token::TokenAuthority;

pub struct TaskService {
    store: FileTaskStore,
    tokens: TokenAuthority,
}

impl TaskService {
    pub fn new(store: FileTaskStore, tokens: TokenAuthority) -> Self {
        Self { store, tokens }
    }

    /// All tasks, ascending by creation time.
    pub fn list(&self) -> Result<Vec<Task>, ServiceError> {
        let mut tasks = self.store.list()?;
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }

    pub fn create(
        &self,
        title: &str,
        owner: &str,
        priority: &str,
        description: &str,
    ) -> Result<Task, ServiceError> {
        ensure_non_empty("title", title)?;
        ensure_non_empty("owner", owner)?;
        let priority: Priority = priority.parse()?;

        let task =
            Task::new(title.trim(), owner.trim(), priority).with_description(description.trim());
        Ok(self.store.save(task)?)
    }

    /// Marks the task completed and returns its token. Idempotent: an
    /// already-completed task yields the stored token, untouched.
    pub fn complete(&self, identifier: &str) -> Result<String, ServiceError> {
        let mut task = self.store.get(identifier)?;
        if task.is_completed() {
            if let Some(token) = &task.completion_token {
                return Ok(token.clone());
            }
        }

        let mut payload = BTreeMap::new();
        payload.insert("task_id".to_string(), Value::String(identifier.to_string()));
        let token = self.tokens.issue(&payload)?;

        task.mark_completed(token.clone(), Utc::now());
        self.store.save(task)?;
        Ok(token)
    }

    /// Empties the store; returns how many records were removed.
    pub fn purge(&self) -> Result<usize, ServiceError> {
        let count = self.store.list()?.len();
        self.store.purge()?;
        Ok(count)
    }

    /// Validates every record, then replaces the whole collection.
    pub fn import(&self, tasks: &[Task]) -> Result<(), ServiceError> {
        for task in tasks {
            ensure_non_empty("title", &task.title)?;
            ensure_non_empty("owner", &task.owner)?;
        }
        self.store.replace_all(tasks)?;
        Ok(())
    }

    /// The authority minting completion tokens, for callers that need to
    /// verify one.
    pub fn token_authority(&self) -> &TokenAuthority {
        &self.tokens
    }
}

fn ensure_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    fn service_in(dir: &tempfile::TempDir) -> TaskService {
        let store = FileTaskStore::open(dir.path().join("tasks.json")).unwrap();
        TaskService::new(store, TokenAuthority::new(900))
    }

    #[test]
    fn test_create_trims_and_stores() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        let task = service
            .create("  Demo  ", " QA ", "HIGH", " notes ")
            .unwrap();
        assert_eq!(task.title, "Demo");
        assert_eq!(task.owner, "QA");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.description, "notes");
    }

    #[test]
    fn test_create_rejects_blank_title() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        for title in ["", "   "] {
            let err = service.create(title, "QA", "low", "").unwrap_err();
            assert!(matches!(
                err,
                ServiceError::Validation(ValidationError::Blank { field: "title" })
            ));
        }
    }

    #[test]
    fn test_create_rejects_blank_owner_and_bad_priority() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        let err = service.create("Demo", "  ", "low", "").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::Blank { field: "owner" })
        ));

        let err = service.create("Demo", "QA", "urgent", "").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::Priority { .. })
        ));
    }

    #[test]
    fn test_list_sorts_by_created_at() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        // Insert out of order via the store-facing import path.
        let mut older = Task::new("old", "QA", Priority::Low);
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let newer = Task::new("new", "QA", Priority::Low);
        service.import(&[newer.clone(), older.clone()]).unwrap();

        let tasks = service.list().unwrap();
        assert_eq!(tasks[0].identifier, older.identifier);
        assert_eq!(tasks[1].identifier, newer.identifier);
    }

    #[test]
    fn test_complete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        let task = service.create("Demo", "QA", "high", "").unwrap();
        let first = service.complete(&task.identifier).unwrap();
        let completed_at = service.list().unwrap()[0].completed_at;

        let second = service.complete(&task.identifier).unwrap();
        assert_eq!(first, second);
        assert_eq!(service.list().unwrap()[0].completed_at, completed_at);
    }

    #[test]
    fn test_complete_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);
        assert!(matches!(
            service.complete("ghost"),
            Err(ServiceError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn test_purge_reports_prior_count() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        service.create("A", "QA", "low", "").unwrap();
        service.create("B", "QA", "low", "").unwrap();

        assert_eq!(service.purge().unwrap(), 2);
        assert!(service.list().unwrap().is_empty());
        assert_eq!(service.purge().unwrap(), 0);
    }

    #[test]
    fn test_import_validates_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);
        service.create("Existing", "QA", "low", "").unwrap();

        let mut bad = Task::new("ok", "QA", Priority::Low);
        bad.owner = "  ".to_string();
        let err = service
            .import(&[Task::new("fine", "QA", Priority::Low), bad])
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::Blank { field: "owner" })
        ));
        // Rejected import leaves the collection alone.
        assert_eq!(service.list().unwrap().len(), 1);
    }

    #[test]
    fn test_import_replaces_the_collection() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);
        service.create("Old", "QA", "low", "").unwrap();

        let replacement = vec![Task::new("New", "Ops", Priority::High)];
        service.import(&replacement).unwrap();

        let tasks = service.list().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "New");
    }
}
