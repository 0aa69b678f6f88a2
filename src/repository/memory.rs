//! Volatile repository backed by a lock-guarded map.
//!
//! All state lives behind one `RwLock`: reads take the shared guard, every mutation takes the
//! exclusive guard for its whole check-then-write sequence. Identifiers come from a monotonic
//! counter that is only advanced by a successful insert and is never rewound, so deleted
//! identifiers are not handed out again. Callers always receive clones.

use super::{RepositoryError, StudentRepository};
use crate::student::{Student, StudentId, StudentPayload};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

/// In-process repository used when no database is configured.
pub struct InMemoryStudentRepository {
    state: RwLock<MemoryState>,
}

struct MemoryState {
    students: BTreeMap<StudentId, Student>,
    next_id: StudentId,
}

impl MemoryState {
    fn email_taken(&self, email: &str, except: Option<StudentId>) -> bool {
        self.students
            .values()
            .any(|student| student.email == email && Some(student.id) != except)
    }
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            students: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl InMemoryStudentRepository {
    /// Create an empty repository whose first identifier is `1`.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
        }
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.state.read().await.students.len()
    }

    /// Whether the repository holds no records.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryStudentRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn email_conflict(email: &str) -> RepositoryError {
    RepositoryError::Conflict(format!("email '{email}' is already registered"))
}

#[async_trait]
impl StudentRepository for InMemoryStudentRepository {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, payload: StudentPayload) -> Result<Student, RepositoryError> {
        let mut state = self.state.write().await;
        if state.email_taken(&payload.email, None) {
            return Err(email_conflict(&payload.email));
        }
        let id = state.next_id;
        state.next_id += 1;
        let student = payload.into_student(id);
        state.students.insert(id, student.clone());
        tracing::debug!(student_id = id, "Stored student in memory");
        Ok(student)
    }

    async fn get_all(&self) -> Result<Vec<Student>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.students.values().cloned().collect())
    }

    async fn get_by_id(&self, id: StudentId) -> Result<Student, RepositoryError> {
        let state = self.state.read().await;
        state
            .students
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn update(
        &self,
        id: StudentId,
        payload: StudentPayload,
    ) -> Result<Student, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.students.contains_key(&id) {
            return Err(RepositoryError::NotFound(id));
        }
        if state.email_taken(&payload.email, Some(id)) {
            return Err(email_conflict(&payload.email));
        }
        let student = payload.into_student(id);
        state.students.insert(id, student.clone());
        tracing::debug!(student_id = id, "Replaced student in memory");
        Ok(student)
    }

    async fn delete(&self, id: StudentId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        match state.students.remove(&id) {
            Some(_) => {
                tracing::debug!(student_id = id, "Removed student from memory");
                Ok(())
            }
            None => Err(RepositoryError::NotFound(id)),
        }
    }

    async fn delete_many(&self, ids: &[StudentId]) -> Result<Vec<StudentId>, RepositoryError> {
        let mut state = self.state.write().await;
        let mut seen = HashSet::with_capacity(ids.len());
        let deleted: Vec<StudentId> = ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| state.students.remove(id).is_some())
            .collect();
        tracing::debug!(
            requested = ids.len(),
            deleted = deleted.len(),
            "Batch removed students from memory"
        );
        Ok(deleted)
    }
}
