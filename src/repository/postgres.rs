//! Postgres-backed repository built on a `sqlx` connection pool.
//!
//! Every operation is a single statement, so each one is atomic on its own and no explicit
//! transaction is opened. Email uniqueness is enforced by the table's `UNIQUE` constraint and
//! surfaced as [`RepositoryError::Conflict`].

use super::{RepositoryError, StudentRepository};
use crate::student::{Student, StudentId, StudentPayload};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    age INTEGER NOT NULL,
    email TEXT NOT NULL UNIQUE
)
"#;

/// Repository that stores students in a Postgres `students` table.
pub struct PostgresStudentRepository {
    pool: PgPool,
}

impl PostgresStudentRepository {
    /// Connect to `database_url`, verify the connection, and ensure the schema exists.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(storage_error)?;
        tracing::debug!(max_connections, "Connected to Postgres");
        let repository = Self::from_pool(pool);
        repository.ensure_schema().await?;
        Ok(repository)
    }

    /// Wrap an existing pool without touching the schema.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `students` table when it is missing.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        tracing::debug!("Ensured students table");
        Ok(())
    }
}

/// Map any driver error that is not a constraint violation to a storage failure.
fn storage_error(error: sqlx::Error) -> RepositoryError {
    tracing::error!(error = %error, "Postgres request failed");
    RepositoryError::Storage(error.to_string())
}

/// Map a write error, turning unique violations into conflicts.
fn write_error(error: sqlx::Error, email: &str) -> RepositoryError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            RepositoryError::Conflict(format!("email '{email}' is already registered"))
        }
        _ => storage_error(error),
    }
}

#[async_trait]
impl StudentRepository for PostgresStudentRepository {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, payload: StudentPayload) -> Result<Student, RepositoryError> {
        let student = sqlx::query_as::<_, Student>(
            "INSERT INTO students (name, age, email) VALUES ($1, $2, $3) \
             RETURNING id, name, age, email",
        )
        .bind(&payload.name)
        .bind(payload.age)
        .bind(&payload.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| write_error(error, &payload.email))?;
        tracing::debug!(student_id = student.id, "Inserted student row");
        Ok(student)
    }

    async fn get_all(&self) -> Result<Vec<Student>, RepositoryError> {
        sqlx::query_as::<_, Student>("SELECT id, name, age, email FROM students ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_error)
    }

    async fn get_by_id(&self, id: StudentId) -> Result<Student, RepositoryError> {
        sqlx::query_as::<_, Student>("SELECT id, name, age, email FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?
            .ok_or(RepositoryError::NotFound(id))
    }

    async fn update(
        &self,
        id: StudentId,
        payload: StudentPayload,
    ) -> Result<Student, RepositoryError> {
        let student = sqlx::query_as::<_, Student>(
            "UPDATE students SET name = $1, age = $2, email = $3 WHERE id = $4 \
             RETURNING id, name, age, email",
        )
        .bind(&payload.name)
        .bind(payload.age)
        .bind(&payload.email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| write_error(error, &payload.email))?
        .ok_or(RepositoryError::NotFound(id))?;
        tracing::debug!(student_id = id, "Updated student row");
        Ok(student)
    }

    async fn delete(&self, id: StudentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        tracing::debug!(student_id = id, "Deleted student row");
        Ok(())
    }

    async fn delete_many(&self, ids: &[StudentId]) -> Result<Vec<StudentId>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let removed: Vec<StudentId> =
            sqlx::query_scalar("DELETE FROM students WHERE id = ANY($1) RETURNING id")
                .bind(ids)
                .fetch_all(&self.pool)
                .await
                .map_err(storage_error)?;

        // RETURNING order is unspecified; report in request order without duplicates.
        let mut pending: std::collections::HashSet<StudentId> = removed.into_iter().collect();
        let deleted: Vec<StudentId> = ids.iter().copied().filter(|id| pending.remove(id)).collect();
        tracing::debug!(
            requested = ids.len(),
            deleted = deleted.len(),
            "Batch deleted student rows"
        );
        Ok(deleted)
    }
}
