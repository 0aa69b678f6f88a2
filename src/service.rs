//! Student service coordinating validation, storage, and summaries.

use crate::{
    metrics::{MetricsSnapshot, ServiceMetrics},
    repository::{RepositoryError, StudentRepository},
    student::{Student, StudentId, StudentPayload},
    summary::{SummaryClient, SummaryError},
    validation::{ValidationError, validate},
};
use std::sync::Arc;
use thiserror::Error;

/// Errors emitted by the student service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Payload failed field validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// Repository rejected or failed the operation.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// Summary provider failed.
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

/// Owns the repository and summary client shared by every request handler.
///
/// Construct once near process start and share through an `Arc`. Validation always runs before
/// the repository is touched, so a rejected payload never mutates state.
pub struct StudentService {
    repository: Arc<dyn StudentRepository>,
    summarizer: Arc<dyn SummaryClient>,
    metrics: ServiceMetrics,
}

impl StudentService {
    /// Assemble a service from its collaborators.
    pub fn new(
        repository: Arc<dyn StudentRepository>,
        summarizer: Arc<dyn SummaryClient>,
    ) -> Self {
        Self {
            repository,
            summarizer,
            metrics: ServiceMetrics::new(),
        }
    }

    /// Label of the repository variant in use.
    pub fn backend_name(&self) -> &'static str {
        self.repository.backend_name()
    }

    /// Validate and store a new student.
    pub async fn create(&self, payload: StudentPayload) -> Result<Student, ServiceError> {
        validate(&payload)?;
        let student = self.repository.create(payload).await?;
        self.metrics.record_created();
        tracing::info!(student_id = student.id, "Student created");
        Ok(student)
    }

    /// List every stored student.
    pub async fn list(&self) -> Result<Vec<Student>, ServiceError> {
        Ok(self.repository.get_all().await?)
    }

    /// Fetch one student.
    pub async fn get(&self, id: StudentId) -> Result<Student, ServiceError> {
        Ok(self.repository.get_by_id(id).await?)
    }

    /// Validate and fully replace an existing student.
    pub async fn update(
        &self,
        id: StudentId,
        payload: StudentPayload,
    ) -> Result<Student, ServiceError> {
        validate(&payload)?;
        let student = self.repository.update(id, payload).await?;
        self.metrics.record_updated();
        tracing::info!(student_id = id, "Student updated");
        Ok(student)
    }

    /// Delete one student.
    pub async fn delete(&self, id: StudentId) -> Result<(), ServiceError> {
        self.repository.delete(id).await?;
        self.metrics.record_deleted(1);
        tracing::info!(student_id = id, "Student deleted");
        Ok(())
    }

    /// Delete every listed student that exists and report which were removed.
    pub async fn delete_many(&self, ids: &[StudentId]) -> Result<Vec<StudentId>, ServiceError> {
        let deleted = self.repository.delete_many(ids).await?;
        self.metrics.record_deleted(deleted.len() as u64);
        tracing::info!(
            requested = ids.len(),
            deleted = deleted.len(),
            "Batch delete completed"
        );
        Ok(deleted)
    }

    /// Look up a student and ask the provider for a summary of it.
    pub async fn summarize(&self, id: StudentId) -> Result<String, ServiceError> {
        let student = self.repository.get_by_id(id).await?;
        match self.summarizer.summarize(&student).await {
            Ok(summary) => {
                self.metrics.record_summary(true);
                tracing::info!(student_id = id, "Summary generated");
                Ok(summary)
            }
            Err(error) => {
                self.metrics.record_summary(false);
                tracing::warn!(student_id = id, error = %error, "Summary generation failed");
                Err(error.into())
            }
        }
    }

    /// Return the current request metrics.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
