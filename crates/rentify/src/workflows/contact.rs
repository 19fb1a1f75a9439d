use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clients::{ContactClient, NewContactMessage, ServiceError};
use crate::session::{SessionError, SessionStore};
use crate::workflows::FieldErrors;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

pub const DEFAULT_SUBJECT: &str = "Consulta desde formulario web";
pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 200;

/// Public contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactDraft {
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellidos")]
    pub last_names: String,
    pub email: String,
    #[serde(rename = "mensaje")]
    pub message: String,
    #[serde(rename = "asunto", skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(rename = "numeroTelefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ContactDraft {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_names.trim())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    #[error("El formulario de contacto tiene errores ({0})")]
    Invalid(FieldErrors),
    #[error("{}", .0.user_message())]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub fn validate_contact(draft: &ContactDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if draft.first_name.trim().is_empty() {
        errors.insert("nombre", "El nombre no puede estar vacío.");
    }
    if draft.last_names.trim().is_empty() {
        errors.insert("apellidos", "Los apellidos no pueden estar vacíos.");
    }

    let email = draft.email.trim();
    if email.is_empty() {
        errors.insert("email", "El email es obligatorio.");
    } else if !EMAIL.is_match(email) {
        errors.insert("email", "Formato de email no válido.");
    }

    // Length limits count the message as typed.
    let length = draft.message.chars().count();
    if draft.message.trim().is_empty() {
        errors.insert("mensaje", "El mensaje no puede estar vacío.");
    } else if length < MESSAGE_MIN_CHARS {
        errors.insert("mensaje", "El mensaje debe tener al menos 10 caracteres.");
    } else if length > MESSAGE_MAX_CHARS {
        errors.insert("mensaje", "El mensaje no puede superar los 200 caracteres.");
    }

    errors
}

pub fn can_send(draft: &ContactDraft) -> bool {
    validate_contact(draft).is_empty()
}

/// Builds the contact-service payload, attaching the user id when someone is
/// logged in.
pub fn contact_payload(draft: &ContactDraft, user_id: Option<i64>) -> NewContactMessage {
    let subject = draft
        .subject
        .as_deref()
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .unwrap_or(DEFAULT_SUBJECT);

    NewContactMessage {
        name: draft.full_name(),
        email: draft.email.trim().to_string(),
        subject: subject.to_string(),
        body: draft.message.trim().to_string(),
        phone: draft
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .map(str::to_string),
        user_id,
    }
}

/// Validates and posts the form, returning the thank-you line shown to the
/// visitor.
pub async fn send(
    client: &ContactClient,
    session: &SessionStore,
    draft: &ContactDraft,
) -> Result<String, ContactError> {
    let errors = validate_contact(draft);
    if !errors.is_empty() {
        return Err(ContactError::Invalid(errors));
    }

    let record = session.read()?;
    let user_id = record.logged_in.then_some(record.user_id).flatten();
    let payload = contact_payload(draft, user_id);

    let created = client.create(&payload).await.map_err(|err| {
        warn!(error = %err, "contact message not sent");
        err
    })?;
    info!(message_id = created.id, ?user_id, "contact message sent");

    Ok(format!(
        "Gracias {} {}, tu mensaje ha sido enviado!",
        draft.first_name.trim(),
        draft.last_names.trim()
    ))
}
