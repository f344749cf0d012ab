//! HTTP client for the prediction API.
//!
//! One `reqwest::Client`, one attempt per call, no timeouts or retries.
//! The session store is injected, so the bearer token is read fresh on
//! every request and never cached here.

use std::path::Path;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::error::{ApiError, ClientError};
use crate::assets::DrugList;
use crate::config::ClientConfig;
use crate::models::{
    AuthResponse, FeatureImportance, FeatureImportanceResponse, Feedback, HistoryRecord,
    LoginRequest, Metrics, PredictionResult, SaveHistoryRequest, SignupRequest, UploadKind,
    ValidatedPatient,
};
use crate::session::SessionStore;

/// Request payload. Only `Json` sets `Content-Type: application/json`;
/// multipart bodies carry their own boundary header.
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(Form),
}

impl RequestBody {
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ClientError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| ClientError::ResponseParsing(format!("cannot encode request: {e}")))
    }
}

/// Body of `POST /api/predictions/predict`.
#[derive(Serialize)]
struct PredictRequest<'a> {
    patient_data: &'a ValidatedPatient,
}

// ═══════════════════════════════════════════════════════════
// Report images
// ═══════════════════════════════════════════════════════════

/// Evaluation plots served under `/reports/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportImage {
    ConfusionMatrix,
    RocCurve,
    FairnessAuc,
    CalibrationCurve,
}

impl ReportImage {
    pub const ALL: [ReportImage; 4] = [
        Self::ConfusionMatrix,
        Self::RocCurve,
        Self::FairnessAuc,
        Self::CalibrationCurve,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::ConfusionMatrix => "confusion_matrix",
            Self::RocCurve => "roc_curve",
            Self::FairnessAuc => "fairness_auc",
            Self::CalibrationCurve => "calibration_curve",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::ConfusionMatrix => "Confusion Matrix",
            Self::RocCurve => "ROC Curve",
            Self::FairnessAuc => "Fairness AUC by Group",
            Self::CalibrationCurve => "Calibration Curve",
        }
    }

    pub fn path(&self) -> String {
        format!("/reports/{}.png", self.slug())
    }
}

impl std::str::FromStr for ReportImage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_end_matches(".png").replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|r| r.slug().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|r| r.slug()).collect();
                format!("unknown report '{s}', expected one of {}", known.join(", "))
            })
    }
}

/// Result of loading a report image. Failures degrade to `Unavailable`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportImageState {
    Available(Vec<u8>),
    Unavailable,
}

// ═══════════════════════════════════════════════════════════
// ApiClient
// ═══════════════════════════════════════════════════════════

pub struct ApiClient {
    config: ClientConfig,
    session: Arc<dyn SessionStore>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: Arc<dyn SessionStore>) -> Self {
        Self {
            config,
            session,
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    fn map_send_error(&self, e: reqwest::Error, base: &str) -> ClientError {
        if e.is_connect() {
            ClientError::Connection(base.to_string())
        } else {
            ClientError::Http(e.to_string())
        }
    }

    /// Issue one request and return the successful response.
    ///
    /// Non-2xx responses are decoded into [`ApiError`]; the session is
    /// never touched on failure.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<reqwest::Response, ClientError> {
        let request_id = Uuid::new_v4();
        let url = format!("{}{}", self.config.api_base_url, path);

        let mut builder = self.http.request(method.clone(), &url);
        let token = self.session.get_token().map(Zeroizing::new);
        if let Some(token) = &token {
            builder = builder.bearer_auth(token.as_str());
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        tracing::debug!(%request_id, %method, path, authenticated = token.is_some(), "API request");

        let response = builder
            .send()
            .await
            .map_err(|e| self.map_send_error(e, &self.config.api_base_url))?;

        let status = response.status();
        tracing::debug!(%request_id, status = status.as_u16(), "API response");

        if !status.is_success() {
            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let text = response.text().await.unwrap_or_default();
            let err = ApiError::from_response(status.as_u16(), content_type.as_deref(), &text);
            tracing::debug!(%request_id, status = err.status, "API error response");
            return Err(err.into());
        }

        Ok(response)
    }

    /// Send a request and decode the JSON response as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<T, ClientError> {
        let response = self.send(method, path, body).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::ResponseParsing(e.to_string()))
    }

    // ── Auth ─────────────────────────────────────────────

    pub async fn login(&self, req: &LoginRequest) -> Result<AuthResponse, ClientError> {
        self.request(Method::POST, "/api/auth/login", RequestBody::json(req)?)
            .await
    }

    pub async fn signup(&self, req: &SignupRequest) -> Result<AuthResponse, ClientError> {
        self.request(Method::POST, "/api/auth/signup", RequestBody::json(req)?)
            .await
    }

    // ── Predictions ──────────────────────────────────────

    /// Manual-entry prediction: `{"patient_data": ...}`.
    pub async fn predict(&self, patient: &ValidatedPatient) -> Result<PredictionResult, ClientError> {
        let body = RequestBody::json(&PredictRequest { patient_data: patient })?;
        let result: PredictionResult = self
            .request(Method::POST, "/api/predictions/predict", body)
            .await?;
        tracing::info!(
            category = %result.risk_category,
            contributors = result.shap_contributors().len(),
            "Prediction received"
        );
        Ok(result)
    }

    /// Upload a JSON or CSV patient file as multipart part `file`.
    pub async fn upload_prediction(
        &self,
        kind: UploadKind,
        path: &Path,
    ) -> Result<PredictionResult, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("patient.{}", kind.as_str()));
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.as_ref())
            .map_err(|e| ClientError::Http(e.to_string()))?;
        let form = Form::new().part("file", part);

        let route = format!("/api/predictions/upload?kind={}", kind.as_str());
        let result: PredictionResult = self
            .request(Method::POST, &route, RequestBody::Multipart(form))
            .await?;
        tracing::info!(kind = kind.as_str(), category = %result.risk_category, "Upload prediction received");
        Ok(result)
    }

    // ── History ──────────────────────────────────────────

    pub async fn save_history(&self, req: &SaveHistoryRequest) -> Result<HistoryRecord, ClientError> {
        let record: HistoryRecord = self
            .request(Method::POST, "/api/predictions/history", RequestBody::json(req)?)
            .await?;
        tracing::info!(record_id = record.id, "Prediction saved to history");
        Ok(record)
    }

    pub async fn list_history(&self) -> Result<Vec<HistoryRecord>, ClientError> {
        self.request(Method::GET, "/api/predictions/history", RequestBody::Empty)
            .await
    }

    /// All users' records. The server enforces the admin role.
    pub async fn admin_records(&self) -> Result<Vec<HistoryRecord>, ClientError> {
        self.request(Method::GET, "/api/admin/records", RequestBody::Empty)
            .await
    }

    // ── Explainability & metrics ─────────────────────────

    /// Global feature importance. Optional data: failures yield an empty list.
    pub async fn feature_importance(&self) -> Vec<FeatureImportance> {
        match self
            .request::<FeatureImportanceResponse>(
                Method::GET,
                "/api/predictions/feature-importance",
                RequestBody::Empty,
            )
            .await
        {
            Ok(resp) => resp.features,
            Err(e) => {
                tracing::warn!(error = %e, "Feature importance unavailable");
                Vec::new()
            }
        }
    }

    pub async fn performance_metrics(&self) -> Result<Metrics, ClientError> {
        self.request(Method::GET, "/api/metrics/performance", RequestBody::Empty)
            .await
    }

    /// Submit workflow feedback. The response body is ignored.
    pub async fn submit_feedback(&self, feedback: &Feedback) -> Result<(), ClientError> {
        self.send(Method::POST, "/api/metrics/feedback", RequestBody::json(feedback)?)
            .await?;
        tracing::info!(category = %feedback.category, "Feedback submitted");
        Ok(())
    }

    /// Fetch an evaluation plot. Never fails; errors become `Unavailable`.
    pub async fn report_image(&self, report: ReportImage) -> ReportImageState {
        let response = match self.send(Method::GET, &report.path(), RequestBody::Empty).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(report = report.slug(), error = %e, "Report image unavailable");
                return ReportImageState::Unavailable;
            }
        };

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(false);

        match response.bytes().await {
            Ok(bytes) if !bytes.is_empty() && !is_html => ReportImageState::Available(bytes.to_vec()),
            Ok(_) => {
                tracing::warn!(report = report.slug(), "Report image empty or not an image");
                ReportImageState::Unavailable
            }
            Err(e) => {
                tracing::warn!(report = report.slug(), error = %e, "Report image download failed");
                ReportImageState::Unavailable
            }
        }
    }

    // ── Static assets ────────────────────────────────────

    async fn get_asset<T: DeserializeOwned>(&self, name: &str) -> Result<T, ClientError> {
        let url = format!("{}/{}", self.config.assets_base_url, name);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, &self.config.assets_base_url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::from_response(status.as_u16(), None, &text).into());
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::ResponseParsing(e.to_string()))
    }

    /// Generated `drugs.json`. Falls back to an empty list.
    pub async fn fetch_drug_list(&self) -> Vec<String> {
        match self.get_asset::<DrugList>("drugs.json").await {
            Ok(list) => list.drugs,
            Err(e) => {
                tracing::warn!(error = %e, "Drug list unavailable");
                Vec::new()
            }
        }
    }

    /// Generated `metrics.json`. Falls back to `None`.
    pub async fn fetch_static_metrics(&self) -> Option<Metrics> {
        match self.get_asset::<Metrics>("metrics.json").await {
            Ok(metrics) => Some(metrics),
            Err(e) => {
                tracing::warn!(error = %e, "Static metrics unavailable");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::models::{PatientData, RiskCategory};
    use crate::session::MemorySessionStore;
    use crate::testing::fixtures::{clinician, risky_patient};
    use crate::testing::mock_backend::{CannedResponse, MockBackend, PNG_BYTES};

    fn signed_in(backend: &MockBackend) -> ApiClient {
        let store = MemorySessionStore::with_auth("tok-dr_lee", &clinician()).unwrap();
        ApiClient::new(ClientConfig::new(&backend.base_url), Arc::new(store))
    }

    fn signed_out(backend: &MockBackend) -> ApiClient {
        ApiClient::new(
            ClientConfig::new(&backend.base_url),
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[tokio::test]
    async fn high_risk_patient_end_to_end() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);

        let patient = ValidatedPatient::try_from(risky_patient()).unwrap();
        let result = client.predict(&patient).await.unwrap();

        assert_eq!(result.risk_category, RiskCategory::High);
        assert!(!result.shap_contributors().is_empty());

        let req = backend.last_request().unwrap();
        assert_eq!(req.path, "/api/predictions/predict");
        let body = req.json();
        assert_eq!(
            body["patient_data"]["selected_drugs"],
            json!(["Acetaminophen", "Cisplatin"])
        );
        assert_eq!(body["patient_data"]["vital_spo2"], 85.0);
        assert_eq!(body["patient_data"]["lab_creatinine"], 5.2);
    }

    #[tokio::test]
    async fn bearer_and_json_headers_attached() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);
        let patient = ValidatedPatient::try_from(PatientData::default()).unwrap();
        client.predict(&patient).await.unwrap();

        let req = backend.last_request().unwrap();
        assert_eq!(req.authorization.as_deref(), Some("Bearer tok-dr_lee"));
        assert_eq!(req.content_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn get_requests_carry_no_content_type() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);
        let history = client.list_history().await.unwrap();
        assert_eq!(history.len(), 2);

        let req = backend.last_request().unwrap();
        assert!(req.content_type.is_none());
        assert!(req.authorization.is_some());
    }

    #[tokio::test]
    async fn no_token_means_no_authorization_header() {
        let backend = MockBackend::start().await;
        let client = signed_out(&backend);
        let patient = ValidatedPatient::try_from(PatientData::default()).unwrap();

        let err = client.predict(&patient).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Not authenticated");
        assert!(backend.last_request().unwrap().authorization.is_none());
    }

    #[tokio::test]
    async fn failure_leaves_session_untouched() {
        let backend = MockBackend::start().await;
        backend.respond(
            "GET",
            "/api/predictions/history",
            CannedResponse::json(401, json!({"detail": "Token expired"})),
        );
        let client = signed_in(&backend);
        let err = client.list_history().await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(client.session().get_token().as_deref(), Some("tok-dr_lee"));
    }

    #[tokio::test]
    async fn validation_error_formats_first_entry() {
        let backend = MockBackend::start().await;
        backend.respond(
            "POST",
            "/api/predictions/predict",
            CannedResponse::json(
                422,
                json!({"detail": [{"loc": ["body", "age"], "msg": "field required"}]}),
            ),
        );
        let client = signed_in(&backend);
        let patient = ValidatedPatient::try_from(PatientData::default()).unwrap();
        let err = client.predict(&patient).await.unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.to_string(), "field required (body.age)");
    }

    #[tokio::test]
    async fn html_error_page_is_opaque() {
        let backend = MockBackend::start().await;
        backend.respond(
            "GET",
            "/api/metrics/performance",
            CannedResponse::html(502, "<!DOCTYPE html><html><body>Bad Gateway</body></html>"),
        );
        let client = signed_in(&backend);
        let err = client.performance_metrics().await.unwrap_err();
        let msg = err.to_string();
        assert_eq!(msg, "Request failed (502)");
        assert!(!msg.contains("<!DOCTYPE"));
        assert!(!msg.contains('<'));
    }

    #[tokio::test]
    async fn upload_sends_multipart_file_part() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patient.json");
        std::fs::write(&path, serde_json::to_vec(&risky_patient()).unwrap()).unwrap();

        let result = client.upload_prediction(UploadKind::Json, &path).await.unwrap();
        assert_eq!(result.risk_category, RiskCategory::High);

        let req = backend.last_request().unwrap();
        assert_eq!(req.path, "/api/predictions/upload");
        assert_eq!(req.query.as_deref(), Some("kind=json"));
        assert!(req
            .content_type
            .as_deref()
            .unwrap()
            .starts_with("multipart/form-data; boundary="));
        let body = req.body_text().to_ascii_lowercase();
        assert!(body.contains(r#"name="file""#));
        assert!(body.contains(r#"filename="patient.json""#));
        assert!(body.contains("content-type: application/json"));
        assert_eq!(req.authorization.as_deref(), Some("Bearer tok-dr_lee"));
    }

    #[tokio::test]
    async fn csv_upload_uses_csv_kind_and_mime() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.csv");
        std::fs::write(&path, "anchor_age,gender\n78,M\n").unwrap();

        client.upload_prediction(UploadKind::Csv, &path).await.unwrap();
        let req = backend.last_request().unwrap();
        assert_eq!(req.query.as_deref(), Some("kind=csv"));
        assert!(req.body_text().to_ascii_lowercase().contains("content-type: text/csv"));
    }

    #[tokio::test]
    async fn missing_upload_file_never_hits_network() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);
        let err = client
            .upload_prediction(UploadKind::Json, Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Io(_)));
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn save_history_posts_bundle() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);

        let result = client
            .predict(&ValidatedPatient::try_from(risky_patient()).unwrap())
            .await
            .unwrap();
        let req = SaveHistoryRequest::new(risky_patient(), result);
        let record = client.save_history(&req).await.unwrap();
        assert_eq!(record.patient_name.as_deref(), Some("Patient 78y/M"));

        let sent = backend.last_request().unwrap().json();
        assert_eq!(sent["patient_name"], "Patient 78y/M");
        assert_eq!(
            sent["clinical_recommendations"],
            "Reassess Cisplatin given eGFR 10; Monitor potassium every 6 hours"
        );
        assert_eq!(sent["prediction_result"]["risk_category"], "High");
    }

    #[tokio::test]
    async fn feature_importance_falls_back_to_empty() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);
        assert_eq!(client.feature_importance().await.len(), 2);

        backend.respond(
            "GET",
            "/api/predictions/feature-importance",
            CannedResponse::text(500, "model not loaded"),
        );
        assert!(client.feature_importance().await.is_empty());
    }

    #[tokio::test]
    async fn admin_records_forbidden_for_clinician() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);
        let err = client.admin_records().await.unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), "Admin access required");
    }

    #[tokio::test]
    async fn feedback_is_posted() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);
        let feedback = Feedback {
            usefulness: 5,
            accuracy: 4,
            response_time: 4,
            workload_reduction: 3,
            comments: "Helpful".into(),
            category: "general".into(),
        };
        client.submit_feedback(&feedback).await.unwrap();
        let sent = backend.last_request().unwrap().json();
        assert_eq!(sent["usefulness"], 5);
        assert_eq!(sent["category"], "general");
    }

    #[tokio::test]
    async fn report_images_degrade_gracefully() {
        let backend = MockBackend::start().await;
        let client = signed_in(&backend);
        assert_eq!(
            client.report_image(ReportImage::RocCurve).await,
            ReportImageState::Available(PNG_BYTES.to_vec())
        );
        assert_eq!(
            client.report_image(ReportImage::ConfusionMatrix).await,
            ReportImageState::Unavailable
        );
        assert_eq!(backend.last_request().unwrap().path, "/reports/confusion_matrix.png");
    }

    #[tokio::test]
    async fn html_fallback_page_is_not_an_image() {
        let backend = MockBackend::start().await;
        backend.respond(
            "GET",
            "/reports/fairness_auc.png",
            CannedResponse::html(200, "<html>app shell</html>"),
        );
        let client = signed_in(&backend);
        assert_eq!(
            client.report_image(ReportImage::FairnessAuc).await,
            ReportImageState::Unavailable
        );
    }

    #[tokio::test]
    async fn static_assets_load_and_fall_back() {
        let backend = MockBackend::start().await;
        let client = signed_out(&backend);
        assert_eq!(client.fetch_drug_list().await.len(), 3);
        assert!(client.fetch_static_metrics().await.unwrap().overall.is_some());
        assert!(backend.last_request().unwrap().authorization.is_none());

        backend.respond("GET", "/drugs.json", CannedResponse::text(404, "missing"));
        backend.respond("GET", "/metrics.json", CannedResponse::text(200, "not json"));
        assert!(client.fetch_drug_list().await.is_empty());
        assert!(client.fetch_static_metrics().await.is_none());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_connection_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ApiClient::new(
            ClientConfig::new(&format!("http://127.0.0.1:{port}")),
            Arc::new(MemorySessionStore::new()),
        );
        let err = client.list_history().await.unwrap_err();
        assert!(matches!(err, ClientError::Connection(_)), "{err:?}");
    }

    #[test]
    fn report_image_names_parse() {
        assert_eq!("roc_curve".parse::<ReportImage>(), Ok(ReportImage::RocCurve));
        assert_eq!(
            "calibration-curve.png".parse::<ReportImage>(),
            Ok(ReportImage::CalibrationCurve)
        );
        assert!("heatmap".parse::<ReportImage>().is_err());
        assert_eq!(ReportImage::FairnessAuc.path(), "/reports/fairness_auc.png");
    }
}
