//! HTTP surface of the daemon.
//!
//! Routes map one-to-one onto control operations, and status codes carry
//! the verdict: 201 for a created pom, 202 for an accepted control
//! request, 400 for a refused start/cancel, 409 for pause/resume in the
//! wrong state and for status while a pom is active, 204 for a clear.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pomd_core::{App, OutcomeCounts, StatusView, Transition};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub fn build_router(app: App) -> Router {
    Router::new()
        .route("/start", post(start))
        .route("/start/:name", post(start_named))
        .route("/cancel", post(cancel))
        .route("/pause", post(pause))
        .route("/resume", post(resume))
        .route("/status", get(status))
        .route("/clear", post(clear))
        .with_state(app)
}

/// Counts body returned by `/status` when no pom is active.
#[derive(Debug, Serialize, Deserialize)]
struct CountsBody {
    #[serde(flatten)]
    counts: OutcomeCounts,
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    error: String,
}

async fn start(State(app): State<App>) -> Response {
    respond(app.start(None), StatusCode::CREATED, StatusCode::BAD_REQUEST)
}

async fn start_named(State(app): State<App>, Path(name): Path<String>) -> Response {
    respond(
        app.start(Some(name)),
        StatusCode::CREATED,
        StatusCode::BAD_REQUEST,
    )
}

async fn cancel(State(app): State<App>) -> Response {
    respond(app.cancel(), StatusCode::ACCEPTED, StatusCode::BAD_REQUEST)
}

async fn pause(State(app): State<App>) -> Response {
    respond(app.pause(), StatusCode::ACCEPTED, StatusCode::CONFLICT)
}

async fn resume(State(app): State<App>) -> Response {
    respond(app.resume(), StatusCode::ACCEPTED, StatusCode::CONFLICT)
}

async fn status(State(app): State<App>) -> Response {
    match app.status() {
        Ok(StatusView::Counts(counts)) => {
            let body = CountsBody {
                message: counts.summary(),
                counts,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(StatusView::Active(snapshot)) => {
            (StatusCode::CONFLICT, Json(snapshot)).into_response()
        }
        Err(e) => {
            warn!("status counts unavailable: {e}");
            error_response(StatusCode::BAD_REQUEST, "Failed to read outcome counts")
        }
    }
}

async fn clear(State(app): State<App>) -> Response {
    match app.clear() {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            warn!("clear failed: {e}");
            error_response(StatusCode::BAD_REQUEST, "Failed to clear the outcome store")
        }
    }
}

fn respond(transition: Transition, applied: StatusCode, rejected: StatusCode) -> Response {
    let code = if transition.is_applied() {
        applied
    } else {
        rejected
    };
    let snapshot = match transition {
        Transition::Applied(snap) | Transition::Rejected(snap) => snap,
    };
    (code, Json(snapshot)).into_response()
}

fn error_response(code: StatusCode, message: &str) -> Response {
    (
        code,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;

    fn test_router() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = pomd_core::OutcomeStore::open(dir.path().join("outcomes.db")).unwrap();
        let (app, _events) = App::new(store, std::time::Duration::from_secs(1500));
        (build_router(app), dir)
    }

    async fn send(router: &Router, method: &str, path: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(path)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let code = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (code, value)
    }

    async fn settle() {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn start_creates_then_refuses() {
        let (router, _dir) = test_router();
        let (code, body) = send(&router, "POST", "/start/writing").await;
        assert_eq!(code, StatusCode::CREATED);
        assert_eq!(body["state"], "running");
        assert_eq!(body["name"], "writing");
        assert_eq!(body["message"], "Pom started");

        let (code, body) = send(&router, "POST", "/start").await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Pom already running, pause or cancel first");
    }

    #[tokio::test]
    async fn pause_and_resume_conflict_in_the_wrong_state() {
        let (router, _dir) = test_router();
        let (code, _) = send(&router, "POST", "/pause").await;
        assert_eq!(code, StatusCode::CONFLICT);
        let (code, _) = send(&router, "POST", "/resume").await;
        assert_eq!(code, StatusCode::CONFLICT);

        send(&router, "POST", "/start").await;
        let (code, body) = send(&router, "POST", "/pause").await;
        assert_eq!(code, StatusCode::ACCEPTED);
        assert_eq!(body["state"], "paused");

        let (code, _) = send(&router, "POST", "/pause").await;
        assert_eq!(code, StatusCode::CONFLICT);

        let (code, body) = send(&router, "POST", "/resume").await;
        assert_eq!(code, StatusCode::ACCEPTED);
        assert_eq!(body["state"], "running");

        let (code, _) = send(&router, "POST", "/resume").await;
        assert_eq!(code, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn cancel_accepts_active_and_refuses_idle() {
        let (router, _dir) = test_router();
        let (code, body) = send(&router, "POST", "/cancel").await;
        assert_eq!(code, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "No current pom to cancel");

        send(&router, "POST", "/start").await;
        let (code, body) = send(&router, "POST", "/cancel").await;
        assert_eq!(code, StatusCode::ACCEPTED);
        assert_eq!(body["message"], "Pom has been cancelled");
        assert_eq!(body["state"], "idle");
    }

    #[tokio::test]
    async fn status_summarizes_when_idle_and_conflicts_when_active() {
        let (router, _dir) = test_router();
        let (code, body) = send(&router, "GET", "/status").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["completed"], 0);
        assert_eq!(body["message"], "Success: 0, Cancelled: 0, Paused: 0");

        send(&router, "POST", "/start/deep%20work").await;
        let (code, body) = send(&router, "GET", "/status").await;
        assert_eq!(code, StatusCode::CONFLICT);
        assert_eq!(body["name"], "deep work");
        assert_eq!(body["message"], "Currently in a pom");
    }

    #[tokio::test]
    async fn outcomes_show_up_in_the_idle_summary() {
        let (router, _dir) = test_router();
        send(&router, "POST", "/start").await;
        send(&router, "POST", "/pause").await;
        send(&router, "POST", "/cancel").await;
        settle().await;

        let (code, body) = send(&router, "GET", "/status").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["paused"], 1);
        assert_eq!(body["cancelled"], 1);
        assert_eq!(body["message"], "Success: 0, Cancelled: 1, Paused: 1");
    }

    #[tokio::test]
    async fn clear_returns_no_content_and_zeroes_the_summary() {
        let (router, _dir) = test_router();
        send(&router, "POST", "/start").await;
        send(&router, "POST", "/pause").await;
        let (code, body) = send(&router, "POST", "/clear").await;
        assert_eq!(code, StatusCode::NO_CONTENT);
        assert_eq!(body, serde_json::Value::Null);

        send(&router, "POST", "/resume").await;
        send(&router, "POST", "/cancel").await;
        settle().await;
        let (code, body) = send(&router, "GET", "/status").await;
        assert_eq!(code, StatusCode::OK);
        assert_eq!(body["paused"], 0);
        assert_eq!(body["cancelled"], 1);
    }
}
