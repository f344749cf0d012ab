//! Dashboard orchestration: patient form, prediction paths, history,
//! admin records, metrics and feedback.
//!
//! All state lives on [`Dashboard`]; every network call goes through the
//! injected [`ApiClient`]. Lists are replaced wholesale on each load.

pub mod form;
pub mod prediction;

use std::path::Path;

use crate::api::{ApiClient, ClientError};
use crate::auth::{self, Route};
use crate::models::{
    FeatureImportance, Feedback, FeedbackError, HistoryRecord, Metrics, PatientDataError,
    PredictionResult, SaveHistoryRequest, UploadKind, User, ValidatedPatient,
};
use crate::session::SessionError;

pub use form::PatientForm;
pub use prediction::{
    Completion, Navigation, PredictionSource, PredictionState, PredictionTracker, Ticket,
};

/// Sidebar navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    History,
    Admin,
}

/// Tabs inside the dashboard view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Patients,
    AdrPredictions,
    Explainability,
    BiasAudit,
    WorkflowEfficiency,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Patients,
        Tab::AdrPredictions,
        Tab::Explainability,
        Tab::BiasAudit,
        Tab::WorkflowEfficiency,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Patients => "Patients",
            Self::AdrPredictions => "ADR Predictions",
            Self::Explainability => "Explainability",
            Self::BiasAudit => "Bias Audit",
            Self::WorkflowEfficiency => "Workflow Efficiency",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("A prediction is already running")]
    Busy,
    #[error("Invalid patient data: {0}")]
    InvalidPatient(#[from] PatientDataError),
    #[error("No prediction to save; run a prediction first")]
    NoPrediction,
    #[error("No history record at position {0}")]
    NoSuchRecord(usize),
    #[error("Access Denied.")]
    AccessDenied,
    #[error("Prediction response arrived after the request was superseded")]
    Superseded,
    #[error(transparent)]
    Feedback(#[from] FeedbackError),
    #[error(transparent)]
    Api(#[from] ClientError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl DashboardError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_unauthorized())
    }
}

/// Summary counters shown above the tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub patients: usize,
    pub medications: usize,
    pub predictions: usize,
    pub labs: usize,
}

pub struct Dashboard {
    client: ApiClient,
    user: Option<User>,
    view: View,
    tab: Tab,
    form: PatientForm,
    prediction: PredictionTracker,
    history: Vec<HistoryRecord>,
    admin_records: Vec<HistoryRecord>,
    metrics: Option<Metrics>,
    feature_importance: Vec<FeatureImportance>,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn new(client: ApiClient) -> Self {
        let user = client.session().get_user();
        Self {
            client,
            user,
            view: View::default(),
            tab: Tab::default(),
            form: PatientForm::new(),
            prediction: PredictionTracker::new(),
            history: Vec::new(),
            admin_records: Vec::new(),
            metrics: None,
            feature_importance: Vec::new(),
            last_error: None,
        }
    }

    /// Where opening the dashboard actually lands.
    pub fn route(&self) -> Route {
        auth::gate(self.client.session().as_ref(), Route::Dashboard)
    }

    // ── Accessors ────────────────────────────────────────

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn form(&self) -> &PatientForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PatientForm {
        &mut self.form
    }

    pub fn prediction(&self) -> &PredictionTracker {
        &self.prediction
    }

    pub fn prediction_mut(&mut self) -> &mut PredictionTracker {
        &mut self.prediction
    }

    pub fn current_prediction(&self) -> Option<&PredictionResult> {
        self.prediction.current()
    }

    pub fn is_predicting(&self) -> bool {
        self.prediction.is_busy()
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.history
    }

    pub fn admin_records(&self) -> &[HistoryRecord] {
        &self.admin_records
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    pub fn feature_importance(&self) -> &[FeatureImportance] {
        &self.feature_importance
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn record_error<E: std::fmt::Display>(&mut self, err: E) -> E {
        self.last_error = Some(err.to_string());
        err
    }

    fn apply(&mut self, navigation: Navigation) -> Navigation {
        self.view = View::Dashboard;
        self.tab = navigation.tab;
        navigation
    }

    // ── Prediction paths ─────────────────────────────────

    /// Manual entry: validate the form, then post it as JSON.
    pub async fn predict_manual(&mut self) -> Result<Navigation, DashboardError> {
        if self.prediction.is_busy() {
            return Err(DashboardError::Busy);
        }
        let patient = match ValidatedPatient::try_from(self.form.assemble()) {
            Ok(patient) => patient,
            Err(e) => return Err(DashboardError::from(self.record_error(e))),
        };

        let ticket = self.prediction.begin(PredictionSource::Manual)?;
        self.last_error = None;
        let outcome = self.client.predict(&patient).await;
        self.complete(ticket, outcome)
    }

    /// JSON or CSV file upload.
    pub async fn predict_upload(
        &mut self,
        kind: UploadKind,
        path: &Path,
    ) -> Result<Navigation, DashboardError> {
        let ticket = self.prediction.begin(PredictionSource::Upload(kind))?;
        self.last_error = None;
        let outcome = self.client.upload_prediction(kind, path).await;
        self.complete(ticket, outcome)
    }

    /// Apply a prediction response for `ticket`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<PredictionResult, ClientError>,
    ) -> Result<Navigation, DashboardError> {
        match outcome {
            Ok(result) => match self.prediction.finish(ticket, Ok(result)) {
                Completion::Ready(navigation) => Ok(self.apply(navigation)),
                _ => Err(DashboardError::Superseded),
            },
            Err(e) => {
                let message = e.to_string();
                if self.prediction.finish(ticket, Err(message.clone())) != Completion::Stale {
                    self.last_error = Some(message);
                }
                Err(e.into())
            }
        }
    }

    pub fn clear_prediction(&mut self) {
        self.prediction.clear();
        self.last_error = None;
    }

    // ── History ──────────────────────────────────────────

    /// Save the current prediction together with the current form.
    pub async fn save_to_history(&mut self) -> Result<HistoryRecord, DashboardError> {
        let result = self
            .prediction
            .current()
            .cloned()
            .ok_or(DashboardError::NoPrediction)?;
        let request = SaveHistoryRequest::new(self.form.assemble(), result);
        match self.client.save_history(&request).await {
            Ok(record) => Ok(record),
            Err(e) => Err(self.record_error(e).into()),
        }
    }

    pub async fn load_history(&mut self) -> Result<&[HistoryRecord], DashboardError> {
        self.view = View::History;
        match self.client.list_history().await {
            Ok(records) => {
                self.history = records;
                Ok(self.history.as_slice())
            }
            Err(e) => Err(self.record_error(e).into()),
        }
    }

    /// "Load to Dashboard": restore a saved record's patient and result.
    pub fn load_record(&mut self, index: usize) -> Result<Navigation, DashboardError> {
        let record = self
            .history
            .get(index)
            .cloned()
            .ok_or(DashboardError::NoSuchRecord(index))?;
        let navigation = self.prediction.show(record.prediction_result)?;
        self.form.load(record.patient_data);
        Ok(self.apply(navigation))
    }

    /// Every user's records. Non-admins are refused without a request.
    pub async fn load_admin_records(&mut self) -> Result<&[HistoryRecord], DashboardError> {
        self.view = View::Admin;
        if !self.is_admin() {
            return Err(self.record_error(DashboardError::AccessDenied));
        }
        match self.client.admin_records().await {
            Ok(records) => {
                self.admin_records = records;
                Ok(self.admin_records.as_slice())
            }
            Err(e) => Err(self.record_error(e).into()),
        }
    }

    // ── Metrics, explainability, feedback ────────────────

    /// Performance metrics from the API, falling back to `metrics.json`.
    pub async fn load_metrics(&mut self) -> Result<&Metrics, DashboardError> {
        let metrics = match self.client.performance_metrics().await {
            Ok(metrics) => metrics,
            Err(e) => match self.client.fetch_static_metrics().await {
                Some(metrics) => {
                    tracing::warn!(error = %e, "Performance endpoint failed, using static metrics");
                    metrics
                }
                None => return Err(self.record_error(e).into()),
            },
        };
        Ok(&*self.metrics.insert(metrics))
    }

    pub async fn load_feature_importance(&mut self) -> &[FeatureImportance] {
        self.feature_importance = self.client.feature_importance().await;
        &self.feature_importance
    }

    pub async fn submit_feedback(&mut self, feedback: &Feedback) -> Result<(), DashboardError> {
        if let Err(e) = feedback.validate() {
            return Err(self.record_error(e).into());
        }
        match self.client.submit_feedback(feedback).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.record_error(e).into()),
        }
    }

    // ── Misc ─────────────────────────────────────────────

    pub fn stats(&self) -> DashboardStats {
        let data = self.form.assemble();
        let predictions = usize::from(self.prediction.current().is_some());
        DashboardStats {
            patients: predictions,
            medications: data.selected_drugs.len(),
            predictions,
            labs: usize::from(data.lab_creatinine.is_finite()),
        }
    }

    pub fn logout(&mut self) -> Result<Route, DashboardError> {
        let route = auth::logout(self.client.session().as_ref())?;
        self.user = None;
        self.prediction.clear();
        self.history.clear();
        self.admin_records.clear();
        Ok(route)
    }
}
