//! HTTP surface for the student records service.
//!
//! - `POST /students` – Validate and create a student. Returns `201` with the stored record.
//! - `GET /students` – List every student.
//! - `DELETE /students?ids=1,2,3` – Batch delete. Missing ids are skipped and the response lists
//!   only the ids actually removed as `{ "deleted_ids": [...] }`.
//! - `GET /students/:id` – Fetch one student.
//! - `PUT /students/:id` – Replace every field of a student. The path id always wins over any
//!   `id` in the body.
//! - `DELETE /students/:id` – Delete one student (`204`). A missing id is a `404`.
//! - `GET /students/:id/summary` – Ask the text-generation service for `{ "summary": "..." }`.
//! - `GET /metrics` – Request counters and the active storage backend.
//! - `GET /commands` – Machine-readable catalog of the endpoints above.
//!
//! Every failure is resolved here into one status code with a plain-text message.

use crate::repository::RepositoryError;
use crate::service::{ServiceError, StudentService};
use crate::student::{Student, StudentId, StudentPayload};
use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the student API surface.
pub fn create_router(service: Arc<StudentService>) -> Router {
    Router::new()
        .route(
            "/students",
            get(list_students)
                .post(create_student)
                .delete(delete_students),
        )
        .route(
            "/students/:id",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/students/:id/summary", get(get_summary))
        .route("/metrics", get(get_metrics))
        .route("/commands", get(get_commands))
        .with_state(service)
}

type ApiState = State<Arc<StudentService>>;

/// Create a student from the request body.
async fn create_student(
    State(service): ApiState,
    body: Result<Json<StudentPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    let Json(payload) = body?;
    let student = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// List all students.
async fn list_students(State(service): ApiState) -> Result<Json<Vec<Student>>, AppError> {
    Ok(Json(service.list().await?))
}

async fn get_student(
    State(service): ApiState,
    Path(raw_id): Path<String>,
) -> Result<Json<Student>, AppError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(service.get(id).await?))
}

/// Replace a student. Body `id` fields are ignored.
async fn update_student(
    State(service): ApiState,
    Path(raw_id): Path<String>,
    body: Result<Json<StudentPayload>, JsonRejection>,
) -> Result<Json<Student>, AppError> {
    let id = parse_id(&raw_id)?;
    let Json(payload) = body?;
    Ok(Json(service.update(id, payload).await?))
}

async fn delete_student(
    State(service): ApiState,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&raw_id)?;
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Query string for `DELETE /students`.
#[derive(Deserialize)]
struct BatchDeleteQuery {
    /// Comma-separated list of student ids.
    #[serde(default)]
    ids: Option<String>,
}

/// Response body for `DELETE /students`.
#[derive(Serialize)]
struct BatchDeleteResponse {
    deleted_ids: Vec<StudentId>,
}

/// Delete every listed student that exists.
async fn delete_students(
    State(service): ApiState,
    Query(query): Query<BatchDeleteQuery>,
) -> Result<Json<BatchDeleteResponse>, AppError> {
    let ids = parse_id_list(query.ids.as_deref().unwrap_or_default())?;
    let deleted_ids = service.delete_many(&ids).await?;
    Ok(Json(BatchDeleteResponse { deleted_ids }))
}

/// Response body for `GET /students/:id/summary`.
#[derive(Serialize)]
struct SummaryResponse {
    summary: String,
}

async fn get_summary(
    State(service): ApiState,
    Path(raw_id): Path<String>,
) -> Result<Json<SummaryResponse>, AppError> {
    let id = parse_id(&raw_id)?;
    let summary = service.summarize(id).await?;
    Ok(Json(SummaryResponse { summary }))
}

/// Response body for `GET /metrics`.
#[derive(Serialize)]
struct MetricsResponse {
    backend: &'static str,
    #[serde(flatten)]
    counters: crate::metrics::MetricsSnapshot,
}

async fn get_metrics(State(service): ApiState) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        backend: service.backend_name(),
        counters: service.metrics_snapshot(),
    })
}

fn parse_id(raw: &str) -> Result<StudentId, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid student ID: {raw}")))
}

/// Parse `1, 2,3` into ids. An empty list or any unparsable entry rejects the whole request.
fn parse_id_list(raw: &str) -> Result<Vec<StudentId>, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::BadRequest("No IDs provided".into()));
    }
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse()
                .map_err(|_| AppError::BadRequest(format!("Invalid ID format: {part}")))
        })
        .collect()
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery by clients and tools.
async fn get_commands() -> Json<CommandsResponse> {
    let student_example = json!({
        "name": "John Doe",
        "age": 20,
        "email": "john@example.com"
    });
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "create_student",
                method: "POST",
                path: "/students",
                description: "Validate and store a student. Returns 201 with the record and its assigned id.",
                request_example: Some(student_example.clone()),
            },
            CommandDescriptor {
                name: "list_students",
                method: "GET",
                path: "/students",
                description: "Return every stored student.",
                request_example: None,
            },
            CommandDescriptor {
                name: "get_student",
                method: "GET",
                path: "/students/{id}",
                description: "Return one student or 404.",
                request_example: None,
            },
            CommandDescriptor {
                name: "update_student",
                method: "PUT",
                path: "/students/{id}",
                description: "Replace every field of a student. The path id overrides any id in the body.",
                request_example: Some(student_example),
            },
            CommandDescriptor {
                name: "delete_student",
                method: "DELETE",
                path: "/students/{id}",
                description: "Delete one student. Returns 204, or 404 when absent.",
                request_example: None,
            },
            CommandDescriptor {
                name: "delete_students",
                method: "DELETE",
                path: "/students?ids=1,2,3",
                description: "Delete several students. Returns { \"deleted_ids\": [...] } listing only ids that existed.",
                request_example: None,
            },
            CommandDescriptor {
                name: "summarize_student",
                method: "GET",
                path: "/students/{id}/summary",
                description: "Generate a natural-language summary of a student. Returns { \"summary\": string }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return request counters and the active storage backend.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    BadRequest(String),
    Service(ServiceError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Service(ServiceError::Validation(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Service(ServiceError::Repository(RepositoryError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            Self::Service(ServiceError::Repository(RepositoryError::Conflict(_))) => {
                StatusCode::CONFLICT
            }
            Self::Service(ServiceError::Repository(RepositoryError::Storage(_)))
            | Self::Service(ServiceError::Summary(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(message) => message.clone(),
            Self::Service(error) => error.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %message, "Request rejected");
        }
        (status, message).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(inner: ServiceError) -> Self {
        Self::Service(inner)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands, parse_id_list};
    use crate::repository::InMemoryStudentRepository;
    use crate::service::StudentService;
    use crate::student::Student;
    use crate::summary::{SummaryClient, SummaryError};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Clone, Default)]
    struct StubSummaryClient {
        calls: Arc<Mutex<Vec<Student>>>,
        fail: bool,
    }

    #[async_trait]
    impl SummaryClient for StubSummaryClient {
        async fn summarize(&self, student: &Student) -> Result<String, SummaryError> {
            self.calls.lock().await.push(student.clone());
            if self.fail {
                return Err(SummaryError::ProviderUnavailable("stub offline".into()));
            }
            Ok(format!("{} is {} years old.", student.name, student.age))
        }
    }

    fn app_with(summarizer: StubSummaryClient) -> Router {
        let service = StudentService::new(
            Arc::new(InMemoryStudentRepository::new()),
            Arc::new(summarizer),
        );
        create_router(Arc::new(service))
    }

    fn app() -> Router {
        app_with(StubSummaryClient::default())
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, bytes.to_vec())
    }

    fn json_body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).expect("json body")
    }

    fn john() -> Value {
        json!({ "name": "John Doe", "age": 20, "email": "john@example.com" })
    }

    #[tokio::test]
    async fn create_returns_created_record_with_positive_id() {
        let app = app();
        let (status, body) = send(&app, Method::POST, "/students", Some(john())).await;

        assert_eq!(status, StatusCode::CREATED);
        let created = json_body(&body);
        assert!(created["id"].as_i64().expect("id") > 0);
        assert_eq!(created["name"], "John Doe");
        assert_eq!(created["age"], 20);
        assert_eq!(created["email"], "john@example.com");

        let uri = format!("/students/{}", created["id"]);
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), created);
    }

    #[tokio::test]
    async fn create_rejects_invalid_payloads() {
        let app = app();
        for payload in [
            json!({ "name": "", "age": 20, "email": "john@example.com" }),
            json!({ "name": "John", "age": 0, "email": "john@example.com" }),
            json!({ "name": "John", "age": 151, "email": "john@example.com" }),
            json!({ "name": "John", "age": 20, "email": "" }),
            json!({ "name": "John", "age": 20, "email": "not-an-email" }),
            json!({ "name": "John", "age": "twenty", "email": "john@example.com" }),
        ] {
            let (status, _) = send(&app, Method::POST, "/students", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        let (_, body) = send(&app, Method::GET, "/students", None).await;
        assert_eq!(json_body(&body), json!([]));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/students")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let app = app();
        send(&app, Method::POST, "/students", Some(john())).await;
        let (status, _) = send(&app, Method::POST, "/students", Some(john())).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn update_uses_path_id_and_replaces_fields() {
        let app = app();
        let (_, body) = send(&app, Method::POST, "/students", Some(john())).await;
        let id = json_body(&body)["id"].as_i64().expect("id");

        let replacement = json!({ "id": 999, "name": "Jane Roe", "age": 31, "email": "jane@example.com" });
        let uri = format!("/students/{id}");
        let (status, body) = send(&app, Method::PUT, &uri, Some(replacement)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(&body),
            json!({ "id": id, "name": "Jane Roe", "age": 31, "email": "jane@example.com" })
        );

        let (_, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(json_body(&body)["name"], "Jane Roe");
    }

    #[tokio::test]
    async fn update_of_missing_student_is_not_found() {
        let app = app();
        let (status, _) = send(&app, Method::PUT, "/students/42", Some(john())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_path_ids_are_rejected() {
        let app = app();
        for (method, uri) in [
            (Method::GET, "/students/abc"),
            (Method::DELETE, "/students/abc"),
            (Method::GET, "/students/1.5/summary"),
        ] {
            let (status, _) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
        let (status, _) = send(&app, Method::PUT, "/students/abc", Some(john())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let app = app();
        let (_, body) = send(&app, Method::POST, "/students", Some(john())).await;
        let uri = format!("/students/{}", json_body(&body)["id"]);

        let (status, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn batch_delete_reports_only_removed_ids() {
        let app = app();
        send(&app, Method::POST, "/students", Some(john())).await;
        send(
            &app,
            Method::POST,
            "/students",
            Some(json!({ "name": "Jane", "age": 30, "email": "jane@example.com" })),
        )
        .await;

        let (status, body) = send(&app, Method::DELETE, "/students?ids=1,2,999", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(&body), json!({ "deleted_ids": [1, 2] }));

        let (_, body) = send(&app, Method::DELETE, "/students?ids=1", None).await;
        assert_eq!(json_body(&body), json!({ "deleted_ids": [] }));
    }

    #[tokio::test]
    async fn batch_delete_rejects_malformed_lists() {
        let app = app();
        for uri in ["/students", "/students?ids=", "/students?ids=1,x,3", "/students?ids=1,,2"] {
            let (status, _) = send(&app, Method::DELETE, uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn summary_route_returns_provider_text() {
        let summarizer = StubSummaryClient::default();
        let app = app_with(summarizer.clone());
        send(&app, Method::POST, "/students", Some(john())).await;

        let (status, body) = send(&app, Method::GET, "/students/1/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(&body),
            json!({ "summary": "John Doe is 20 years old." })
        );

        send(&app, Method::GET, "/students/1/summary", None).await;
        assert_eq!(summarizer.calls.lock().await.len(), 2, "summaries are never cached");
    }

    #[tokio::test]
    async fn summary_errors_map_to_statuses() {
        let app = app_with(StubSummaryClient {
            fail: true,
            ..Default::default()
        });
        let (status, _) = send(&app, Method::GET, "/students/1/summary", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, Method::POST, "/students", Some(john())).await;
        let (status, _) = send(&app, Method::GET, "/students/1/summary", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn metrics_report_backend_and_counters() {
        let app = app();
        send(&app, Method::POST, "/students", Some(john())).await;
        send(&app, Method::DELETE, "/students/1", None).await;

        let (status, body) = send(&app, Method::GET, "/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        let metrics = json_body(&body);
        assert_eq!(metrics["backend"], "memory");
        assert_eq!(metrics["students_created"], 1);
        assert_eq!(metrics["students_deleted"], 1);
    }

    #[tokio::test]
    async fn commands_catalog_exposes_student_endpoints() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let create = commands
            .iter()
            .find(|cmd| cmd.name == "create_student")
            .expect("create command present");

        assert_eq!(create.method, "POST");
        assert_eq!(create.path, "/students");
        assert!(commands.iter().any(|cmd| cmd.path.ends_with("/summary")));
    }

    #[test]
    fn id_list_parsing_trims_whitespace() {
        assert_eq!(parse_id_list(" 1, 2 ,3").ok(), Some(vec![1, 2, 3]));
        assert!(parse_id_list("").is_err());
    }
}
