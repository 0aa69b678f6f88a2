//! Storage contract for student records and its two variants.
//!
//! [`StudentRepository`] owns identity assignment and CRUD over [`Student`] values. The process
//! picks one variant at startup and holds it as `Arc<dyn StudentRepository>`:
//!
//! - [`InMemoryStudentRepository`] keeps records in a lock-guarded map. Volatile: nothing
//!   survives a restart.
//! - [`PostgresStudentRepository`] issues one SQL statement per operation and relies on the
//!   engine for atomicity and the `email` uniqueness constraint.
//!
//! Both variants reject duplicate emails with [`RepositoryError::Conflict`] and never reuse an
//! identifier after deletion.

mod memory;
mod postgres;

pub use memory::InMemoryStudentRepository;
pub use postgres::PostgresStudentRepository;

use crate::student::{Student, StudentId, StudentPayload};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The targeted record does not exist.
    #[error("student {0} not found")]
    NotFound(StudentId),
    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The backend failed or was unreachable.
    #[error("storage failure: {0}")]
    Storage(String),
}

/// CRUD contract shared by every storage backend.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    /// Short backend label used in logs and metrics.
    fn backend_name(&self) -> &'static str;

    /// Assign an identifier, store the record, and return the stored copy.
    async fn create(&self, payload: StudentPayload) -> Result<Student, RepositoryError>;

    /// Return a snapshot of every stored record, ordered by identifier.
    async fn get_all(&self) -> Result<Vec<Student>, RepositoryError>;

    /// Fetch a single record.
    ///
    /// Returns `Err(RepositoryError::NotFound)` when the identifier is absent.
    async fn get_by_id(&self, id: StudentId) -> Result<Student, RepositoryError>;

    /// Replace every field of an existing record except its identifier.
    ///
    /// The returned record always carries `id`.
    async fn update(
        &self,
        id: StudentId,
        payload: StudentPayload,
    ) -> Result<Student, RepositoryError>;

    /// Remove a record. A second delete of the same identifier fails with `NotFound`.
    async fn delete(&self, id: StudentId) -> Result<(), RepositoryError>;

    /// Remove every listed record that exists, silently skipping the rest.
    ///
    /// Returns the removed identifiers in request order, each at most once.
    async fn delete_many(&self, ids: &[StudentId]) -> Result<Vec<StudentId>, RepositoryError>;
}

#[cfg(test)]
pub(crate) mod contract {
    //! Behavior every variant must satisfy, run against a fresh repository.

    use super::*;

    pub(crate) fn john() -> StudentPayload {
        StudentPayload::new("John Doe", 20, "john@example.com")
    }

    pub(crate) async fn create_then_get_round_trips(repo: &dyn StudentRepository) {
        let created = repo.create(john()).await.expect("create");
        assert!(created.id > 0);
        assert_eq!(created.name, "John Doe");
        let fetched = repo.get_by_id(created.id).await.expect("get");
        assert_eq!(fetched, created);
    }

    pub(crate) async fn update_replaces_all_fields(repo: &dyn StudentRepository) {
        let created = repo.create(john()).await.expect("create");
        let updated = repo
            .update(
                created.id,
                StudentPayload::new("Jane Roe", 31, "jane@example.com"),
            )
            .await
            .expect("update");
        assert_eq!(updated.id, created.id);
        let fetched = repo.get_by_id(created.id).await.expect("get");
        assert_eq!(fetched.name, "Jane Roe");
        assert_eq!(fetched.age, 31);
        assert_eq!(fetched.email, "jane@example.com");
    }

    pub(crate) async fn delete_is_not_idempotent(repo: &dyn StudentRepository) {
        let created = repo.create(john()).await.expect("create");
        repo.delete(created.id).await.expect("first delete");
        assert!(matches!(
            repo.delete(created.id).await,
            Err(RepositoryError::NotFound(id)) if id == created.id
        ));
        assert!(matches!(
            repo.get_by_id(created.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    pub(crate) async fn missing_ids_are_not_found(repo: &dyn StudentRepository) {
        assert!(matches!(
            repo.get_by_id(999_999).await,
            Err(RepositoryError::NotFound(999_999))
        ));
        assert!(matches!(
            repo.update(999_999, john()).await,
            Err(RepositoryError::NotFound(999_999))
        ));
    }

    pub(crate) async fn delete_many_skips_missing(repo: &dyn StudentRepository) {
        let first = repo.create(john()).await.expect("create");
        let second = repo
            .create(StudentPayload::new("Jane Roe", 31, "jane@example.com"))
            .await
            .expect("create");
        let deleted = repo
            .delete_many(&[second.id, 999_999, first.id, second.id])
            .await
            .expect("delete many");
        assert_eq!(deleted, vec![second.id, first.id]);
        assert!(repo.get_all().await.expect("list").is_empty());
    }

    pub(crate) async fn duplicate_email_conflicts(repo: &dyn StudentRepository) {
        let first = repo.create(john()).await.expect("create");
        assert!(matches!(
            repo.create(StudentPayload::new("Other", 40, "john@example.com"))
                .await,
            Err(RepositoryError::Conflict(_))
        ));
        let second = repo
            .create(StudentPayload::new("Jane Roe", 31, "jane@example.com"))
            .await
            .expect("create");
        assert!(matches!(
            repo.update(second.id, StudentPayload::new("Jane Roe", 31, "john@example.com"))
                .await,
            Err(RepositoryError::Conflict(_))
        ));
        // Keeping one's own email is not a conflict.
        repo.update(first.id, StudentPayload::new("John D.", 21, "john@example.com"))
            .await
            .expect("self update");
    }
}
