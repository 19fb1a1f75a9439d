use crate::clients::{ServiceError, ServiceErrorKind};
use crate::config::ConfigError;
use crate::session::SessionError;
use crate::telemetry::TelemetryError;
use crate::workflows::registration::WizardError;
use crate::workflows::{
    AuthError, ContactError, ListingError, RentalRequestError, ReviewError,
};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Service(ServiceError),
    Session(SessionError),
    Registration(WizardError),
    Auth(AuthError),
    Contact(ContactError),
    Listing(ListingError),
    Review(ReviewError),
    RentalRequest(RentalRequestError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Service(err) => service_status(err),
            AppError::Session(err) => session_status(err),
            AppError::Registration(err) => match err {
                WizardError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                WizardError::InvalidTransition { .. } => StatusCode::CONFLICT,
                WizardError::SubmissionFailed { .. } => StatusCode::BAD_GATEWAY,
                WizardError::Session(err) => session_status(err),
            },
            AppError::Auth(err) => match err {
                AuthError::MissingCredentials => StatusCode::BAD_REQUEST,
                AuthError::Rejected(_) => StatusCode::UNAUTHORIZED,
                AuthError::Service(err) => service_status(err),
                AuthError::Session(err) => session_status(err),
            },
            AppError::Contact(err) => match err {
                ContactError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ContactError::Service(err) => service_status(err),
                ContactError::Session(err) => session_status(err),
            },
            AppError::Listing(err) => match err {
                ListingError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ListingError::NotPermitted { .. } => StatusCode::FORBIDDEN,
                ListingError::Service(err) => service_status(err),
                ListingError::Session(err) => session_status(err),
            },
            AppError::Review(err) => match err {
                ReviewError::MissingObservations => StatusCode::UNPROCESSABLE_ENTITY,
                ReviewError::Service(err) => service_status(err),
                ReviewError::Session(err) => session_status(err),
            },
            AppError::RentalRequest(err) => match err {
                RentalRequestError::InvalidUser | RentalRequestError::InvalidProperty => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                RentalRequestError::Service(err) => service_status(err),
                RentalRequestError::Session(err) => session_status(err),
            },
        }
    }
}

/// Client-side rejections keep their 4xx status; everything else that went
/// wrong upstream is a bad gateway.
fn service_status(err: &ServiceError) -> StatusCode {
    match err.kind() {
        ServiceErrorKind::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceErrorKind::NotFound | ServiceErrorKind::Rejected => err
            .status()
            .and_then(|status| StatusCode::from_u16(status).ok())
            .filter(StatusCode::is_client_error)
            .unwrap_or(StatusCode::BAD_GATEWAY),
        ServiceErrorKind::Connectivity | ServiceErrorKind::Timeout | ServiceErrorKind::Decode => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn session_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::NotLoggedIn => StatusCode::UNAUTHORIZED,
        SessionError::Forbidden { .. } => StatusCode::FORBIDDEN,
        SessionError::Io { .. } | SessionError::Format { .. } | SessionError::Poisoned => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Service(err) => f.write_str(&err.user_message()),
            AppError::Session(err) => write!(f, "{}", err),
            AppError::Registration(err) => write!(f, "{}", err),
            AppError::Auth(err) => write!(f, "{}", err),
            AppError::Contact(err) => write!(f, "{}", err),
            AppError::Listing(err) => write!(f, "{}", err),
            AppError::Review(err) => write!(f, "{}", err),
            AppError::RentalRequest(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Service(err) => Some(err),
            AppError::Session(err) => Some(err),
            AppError::Registration(err) => Some(err),
            AppError::Auth(err) => Some(err),
            AppError::Contact(err) => Some(err),
            AppError::Listing(err) => Some(err),
            AppError::Review(err) => Some(err),
            AppError::RentalRequest(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

macro_rules! app_error_from {
    ($($source:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$source> for AppError {
                fn from(value: $source) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

app_error_from! {
    ConfigError => Config,
    TelemetryError => Telemetry,
    std::io::Error => Io,
    axum::Error => Server,
    ServiceError => Service,
    SessionError => Session,
    WizardError => Registration,
    AuthError => Auth,
    ContactError => Contact,
    ListingError => Listing,
    ReviewError => Review,
    RentalRequestError => RentalRequest,
}
