//! Mock prediction API served by axum on an ephemeral port.
//!
//! Every request is recorded so tests can assert on headers, bodies and,
//! just as often, on the absence of any request at all. Canned responses
//! can be overridden per `(method, path)`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use super::fixtures::HIGH_RISK_RESULT;

/// PNG signature, enough for the client to treat the body as an image.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.to_string().into_bytes(),
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn html(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body: body.as_bytes().to_vec(),
        }
    }
}

impl IntoResponse for CannedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

#[derive(Default)]
struct MockState {
    requests: Mutex<Vec<RecordedRequest>>,
    overrides: Mutex<HashMap<(String, String), CannedResponse>>,
}

/// A running mock backend. Shuts down when dropped.
pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("bind mock backend");
        let port = listener.local_addr().expect("local addr").port();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            base_url: format!("http://127.0.0.1:{port}"),
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Replace the canned response for one route.
    pub fn respond(&self, method: &str, path: &str, response: CannedResponse) {
        self.state
            .overrides
            .lock()
            .unwrap()
            .insert((method.to_uppercase(), path.to_string()), response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.state.requests.lock().unwrap().last().cloned()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn handle(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        body: body.to_vec(),
    };
    state.requests.lock().unwrap().push(recorded.clone());

    let key = (recorded.method.clone(), recorded.path.clone());
    if let Some(canned) = state.overrides.lock().unwrap().get(&key).cloned() {
        return canned.into_response();
    }
    default_response(&recorded).into_response()
}

fn unauthorized() -> CannedResponse {
    CannedResponse::json(401, json!({"detail": "Not authenticated"}))
}

fn bearer_user(req: &RecordedRequest) -> Option<String> {
    req.authorization
        .as_deref()
        .and_then(|h| h.strip_prefix("Bearer tok-"))
        .map(str::to_string)
}

fn auth_response(username: &str, role: &str) -> CannedResponse {
    let id = if role == "admin" { 1 } else { 7 };
    CannedResponse::json(
        200,
        json!({
            "access_token": format!("tok-{username}"),
            "token_type": "bearer",
            "user": {"id": id, "username": username, "role": role}
        }),
    )
}

fn history_record(id: i64, user_id: Option<i64>) -> Value {
    let result: Value = serde_json::from_str(HIGH_RISK_RESULT).unwrap_or(Value::Null);
    let mut record = json!({
        "id": id,
        "patient_name": "Patient 78y/M",
        "risk_score": 0.87,
        "risk_category": "High",
        "created_at": format!("2026-05-0{id}T10:00:00Z"),
        "patient_data": {"anchor_age": 78, "selected_drugs": ["Cisplatin"]},
        "prediction_result": result,
        "clinical_recommendations": "Reassess Cisplatin given eGFR 10"
    });
    if let Some(uid) = user_id {
        record["user_id"] = json!(uid);
    }
    record
}

fn default_response(req: &RecordedRequest) -> CannedResponse {
    let body = req.json();
    match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/api/auth/login") => {
            let username = body["username"].as_str().unwrap_or_default();
            if body["password"] == "wrong-password" {
                CannedResponse::json(401, json!({"detail": "Invalid username or password"}))
            } else {
                let role = if username == "admin" { "admin" } else { "clinician" };
                auth_response(username, role)
            }
        }
        ("POST", "/api/auth/signup") => {
            let username = body["username"].as_str().unwrap_or_default();
            if username == "taken" {
                CannedResponse::json(400, json!({"detail": "Username already exists"}))
            } else {
                let role = if body["admin_code"] == "LET-ME-IN" { "admin" } else { "clinician" };
                auth_response(username, role)
            }
        }
        ("POST", "/api/predictions/predict") | ("POST", "/api/predictions/upload") => {
            if bearer_user(req).is_none() {
                return unauthorized();
            }
            CannedResponse {
                status: 200,
                content_type: "application/json",
                body: HIGH_RISK_RESULT.as_bytes().to_vec(),
            }
        }
        ("POST", "/api/predictions/history") => {
            if bearer_user(req).is_none() {
                return unauthorized();
            }
            let mut record = history_record(3, None);
            record["patient_name"] = body["patient_name"].clone();
            record["patient_data"] = body["patient_data"].clone();
            record["clinical_recommendations"] = body["clinical_recommendations"].clone();
            CannedResponse::json(200, record)
        }
        ("GET", "/api/predictions/history") => {
            if bearer_user(req).is_none() {
                return unauthorized();
            }
            CannedResponse::json(200, json!([history_record(1, None), history_record(2, None)]))
        }
        ("GET", "/api/predictions/feature-importance") => CannedResponse::json(
            200,
            json!({"features": [
                {"feature": "lab_creatinine", "importance": 0.21},
                {"feature": "num_admissions", "importance": 0.12}
            ]}),
        ),
        ("GET", "/api/admin/records") => match bearer_user(req).as_deref() {
            None => unauthorized(),
            Some("admin") => CannedResponse::json(
                200,
                json!([history_record(1, Some(7)), history_record(2, Some(9))]),
            ),
            Some(_) => CannedResponse::json(403, json!({"detail": "Admin access required"})),
        },
        ("GET", "/api/metrics/performance") => CannedResponse::json(200, performance_metrics()),
        ("POST", "/api/metrics/feedback") => {
            CannedResponse::json(200, json!({"message": "Feedback recorded"}))
        }
        ("GET", "/reports/roc_curve.png") => CannedResponse {
            status: 200,
            content_type: "image/png",
            body: PNG_BYTES.to_vec(),
        },
        ("GET", "/drugs.json") => CannedResponse::json(
            200,
            json!({"drugs": ["Acetaminophen", "Cisplatin", "Warfarin"], "total": 3,
                   "generated_at": "2026-05-01T00:00:00Z"}),
        ),
        ("GET", "/metrics.json") => CannedResponse::json(200, performance_metrics()),
        _ => CannedResponse::json(404, json!({"detail": "Not Found"})),
    }
}

fn performance_metrics() -> Value {
    json!({
        "overall": {"Group": "Overall", "auc_roc": 0.8123, "precision": 0.41, "recall": 0.66,
                    "f1": 0.51, "accuracy": 0.79, "balanced_accuracy": 0.74,
                    "auc_pr": 0.47, "matthews_corrcoef": 0.39},
        "groups": [
            {"Group": "Male", "auc_roc": 0.80, "recall": 0.64},
            {"Group": "Female", "auc_roc": 0.82, "recall": 0.68}
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_requests_and_serves_defaults() {
        let backend = MockBackend::start().await;
        let resp = reqwest::get(format!("{}/api/predictions/feature-importance", backend.base_url))
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(backend.request_count(), 1);
        assert_eq!(
            backend.last_request().unwrap().path,
            "/api/predictions/feature-importance"
        );
    }

    #[tokio::test]
    async fn overrides_replace_defaults() {
        let backend = MockBackend::start().await;
        backend.respond("get", "/drugs.json", CannedResponse::text(500, "boom"));
        let resp = reqwest::get(format!("{}/drugs.json", backend.base_url))
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 500);
        assert_eq!(resp.text().await.unwrap(), "boom");
    }
}
