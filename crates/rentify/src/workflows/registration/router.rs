use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{ApplicantDraft, Attachment, DocumentKind};
use super::submission::RegistrationSubmitter;
use super::validation::validate_personal_data;
use super::wizard::{RegistrationWizard, WizardError};
use crate::clients::{AccountGateway, DocumentGateway};
use crate::session::SessionStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub kind: DocumentKind,
    pub file_name: String,
    #[serde(default)]
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub draft: ApplicantDraft,
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
}

/// Router builder exposing the registration wizard over HTTP.
pub fn registration_router<A, D>(submitter: Arc<RegistrationSubmitter<A, D>>) -> Router
where
    A: AccountGateway + 'static,
    D: DocumentGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/registration/personal-data",
            post(personal_data_handler),
        )
        .route("/api/v1/registration", post(register_handler::<A, D>))
        .with_state(submitter)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Validates the first step only; needs no gateways.
pub(crate) async fn personal_data_handler(
    axum::Json(draft): axum::Json<ApplicantDraft>,
) -> Response {
    let errors = validate_personal_data(&draft, today());
    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let payload = json!({
        "valid": errors.is_empty(),
        "errors": errors,
    });
    (status, axum::Json(payload)).into_response()
}

/// Runs the whole wizard for one request against a throwaway session.
pub(crate) async fn register_handler<A, D>(
    State(submitter): State<Arc<RegistrationSubmitter<A, D>>>,
    axum::Json(request): axum::Json<RegistrationRequest>,
) -> Response
where
    A: AccountGateway + 'static,
    D: DocumentGateway + 'static,
{
    let session = SessionStore::in_memory();
    let mut wizard = RegistrationWizard::new(submitter, session.clone());
    wizard.update_draft(today(), |draft| *draft = request.draft);

    if let Err(error) = wizard.advance(today()) {
        return wizard_error_response(&wizard, error, &session);
    }
    for upload in request.documents {
        if let Err(error) = wizard.attach(
            upload.kind,
            Attachment::new(upload.file_name, upload.size_bytes),
        ) {
            return wizard_error_response(&wizard, error, &session);
        }
    }

    match wizard.submit().await {
        Ok(report) => {
            let payload = json!({
                "step": wizard.step(),
                "report": report,
                "session": session.read().ok(),
                "landing_path": wizard.landing_path(),
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => wizard_error_response(&wizard, error, &session),
    }
}

fn wizard_error_response<A, D>(
    wizard: &RegistrationWizard<A, D>,
    error: WizardError,
    session: &SessionStore,
) -> Response
where
    A: AccountGateway + 'static,
    D: DocumentGateway + 'static,
{
    match error {
        WizardError::Invalid(errors) => {
            let payload = json!({
                "valid": false,
                "step": wizard.step(),
                "errors": errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        WizardError::SubmissionFailed { message, report } => {
            let payload = json!({
                "error": message,
                "step": wizard.step(),
                "report": report,
                "session": session.read().ok(),
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
