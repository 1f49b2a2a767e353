//! HTTP API server for the course assistant.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::{CourseAnalytics, RagSystem};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Shared application state.
struct AppState {
    rag: RagSystem,
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'coursemate doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let rag = RagSystem::from_settings(&settings)?;

    let docs_dir = settings.docs_dir();
    if docs_dir.is_dir() {
        match rag.add_course_folder(&docs_dir, false).await {
            Ok(summary) => info!(
                "Loaded {} courses with {} chunks from {:?}",
                summary.courses_added, summary.chunks_added, docs_dir
            ),
            Err(e) => warn!("Could not load documents from {:?}: {}", docs_dir, e),
        }
    }

    let app = router(Arc::new(AppState { rag }));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Coursemate API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Query", "POST /api/query");
    Output::kv("Courses", "GET  /api/courses");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/courses", get(courses))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
struct QueryResponse {
    answer: String,
    sources: Vec<String>,
    session_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Coursemate API" }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    let session_id = request
        .session_id
        .unwrap_or_else(|| state.rag.sessions().create_session());

    let (answer, sources) = state.rag.query(&request.query, Some(&session_id)).await;

    Json(QueryResponse {
        answer,
        sources,
        session_id,
    })
}

async fn courses(State(state): State<Arc<AppState>>) -> axum::response::Response {
    match state.rag.course_analytics().await {
        Ok(analytics) => Json::<CourseAnalytics>(analytics).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::generation::AiGenerator;
    use crate::session::SessionManager;
    use crate::testing::{sample_course, text_response, ScriptedProvider, StubCourseStore};

    fn state(answers: &[&str]) -> Arc<AppState> {
        let provider = Arc::new(ScriptedProvider::new(
            answers.iter().map(|a| Ok(text_response(a))).collect(),
        ));
        let store = Arc::new(StubCourseStore::default().with_course(sample_course()));
        let rag = RagSystem::new(
            store,
            AiGenerator::new(provider, "test-model"),
            SessionManager::new(2),
            Prompts::default(),
        );
        Arc::new(AppState { rag })
    }

    #[tokio::test]
    async fn test_query_creates_session_when_absent() {
        let state = state(&["Hello there"]);

        let Json(response) = query(
            State(state.clone()),
            Json(QueryRequest {
                query: "What is AI?".to_string(),
                session_id: None,
            }),
        )
        .await;

        assert_eq!(
            response,
            QueryResponse {
                answer: "Hello there".to_string(),
                sources: vec![],
                session_id: "session_1".to_string(),
            }
        );
        assert!(state.rag.sessions().get_conversation_history("session_1").is_some());
    }

    #[tokio::test]
    async fn test_query_keeps_given_session() {
        let state = state(&["first", "second"]);

        for (q, _) in [("one", "first"), ("two", "second")] {
            let Json(response) = query(
                State(state.clone()),
                Json(QueryRequest {
                    query: q.to_string(),
                    session_id: Some("abc".to_string()),
                }),
            )
            .await;
            assert_eq!(response.session_id, "abc");
        }

        assert_eq!(
            state.rag.sessions().get_conversation_history("abc").as_deref(),
            Some("User: one\nAssistant: first\nUser: two\nAssistant: second")
        );
    }

    #[test]
    fn test_query_request_requires_query() {
        assert!(serde_json::from_str::<QueryRequest>(r#"{"session_id": "x"}"#).is_err());
        let request: QueryRequest = serde_json::from_str(r#"{"query": ""}"#).unwrap();
        assert!(request.session_id.is_none());
    }

    #[tokio::test]
    async fn test_courses_returns_analytics() {
        let response = courses(State(state(&[]))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let analytics: CourseAnalytics = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            analytics,
            CourseAnalytics {
                total_courses: 1,
                course_titles: vec!["AI Fundamentals".to_string()],
            }
        );
    }
}
