//! Student entity and the request payload used to create or replace one.

use serde::{Deserialize, Serialize};

/// Identifier assigned by a repository when a student is created.
pub type StudentId = i64;

/// A stored student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    /// Repository-assigned identifier, immutable after creation.
    pub id: StudentId,
    /// Display name of the student.
    pub name: String,
    /// Age in years.
    pub age: i32,
    /// Contact email address.
    pub email: String,
}

/// Fields supplied by clients on create and update.
///
/// Any `id` present in the request body is ignored; identity always comes from the repository
/// (create) or the request path (update). Missing fields deserialize to their zero values so
/// that the validator, rather than the JSON decoder, reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StudentPayload {
    /// Display name of the student.
    #[serde(default)]
    pub name: String,
    /// Age in years.
    #[serde(default)]
    pub age: i32,
    /// Contact email address.
    #[serde(default)]
    pub email: String,
}

impl StudentPayload {
    /// Convenience constructor used by tests and internal callers.
    pub fn new(name: impl Into<String>, age: i32, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            email: email.into(),
        }
    }

    /// Attach an identifier, producing the stored form of the record.
    pub fn into_student(self, id: StudentId) -> Student {
        Student {
            id,
            name: self.name,
            age: self.age,
            email: self.email,
        }
    }
}
