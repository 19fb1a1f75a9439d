use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Backend microservices consumed by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    User,
    Property,
    Document,
    Application,
    Contact,
}

impl Service {
    pub const fn label(self) -> &'static str {
        match self {
            Service::User => "User Service",
            Service::Property => "Property Service",
            Service::Document => "Document Service",
            Service::Application => "Application Service",
            Service::Contact => "Contact Service",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse classification of a client failure, used by presentation code
/// instead of inspecting message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
    Connectivity,
    Timeout,
    Rejected,
    NotFound,
    Decode,
    Configuration,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("could not reach {service}: {source}")]
    Unreachable {
        service: Service,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} did not answer before the request deadline")]
    Timeout { service: Service },
    #[error("{service} rejected the request ({status}): {message}")]
    Rejected {
        service: Service,
        status: u16,
        message: String,
        server_message: bool,
    },
    #[error("unexpected payload from {service}: {source}")]
    Decode {
        service: Service,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid endpoint for {service}: {url}")]
    InvalidEndpoint { service: Service, url: String },
    #[error("http client unavailable: {0}")]
    Client(#[source] reqwest::Error),
}

impl ServiceError {
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            ServiceError::Unreachable { .. } => ServiceErrorKind::Connectivity,
            ServiceError::Timeout { .. } => ServiceErrorKind::Timeout,
            ServiceError::Rejected { status: 404, .. } => ServiceErrorKind::NotFound,
            ServiceError::Rejected { .. } => ServiceErrorKind::Rejected,
            ServiceError::Decode { .. } => ServiceErrorKind::Decode,
            ServiceError::InvalidEndpoint { .. } | ServiceError::Client(_) => {
                ServiceErrorKind::Configuration
            }
        }
    }

    pub fn service(&self) -> Option<Service> {
        match self {
            ServiceError::Unreachable { service, .. }
            | ServiceError::Timeout { service }
            | ServiceError::Rejected { service, .. }
            | ServiceError::Decode { service, .. }
            | ServiceError::InvalidEndpoint { service, .. } => Some(*service),
            ServiceError::Client(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text shown to end users, chosen by error kind.
    pub fn user_message(&self) -> String {
        let service = self
            .service()
            .map(Service::label)
            .unwrap_or("el servicio");
        match self {
            ServiceError::Rejected { message, .. } => message.clone(),
            _ => match self.kind() {
                ServiceErrorKind::Connectivity => format!(
                    "No se pudo conectar con el servidor. Verifica que {service} esté corriendo"
                ),
                ServiceErrorKind::Timeout => {
                    format!("La solicitud a {service} excedió el tiempo de espera")
                }
                ServiceErrorKind::Decode => {
                    format!("Respuesta inesperada de {service}")
                }
                _ => "Error desconocido".to_string(),
            },
        }
    }

    /// Replaces the generic rejection text when the server supplied none.
    pub fn with_fallback_message(self, fallback: &str) -> Self {
        match self {
            ServiceError::Rejected {
                service,
                status,
                server_message: false,
                ..
            } => ServiceError::Rejected {
                service,
                status,
                message: fallback.to_string(),
                server_message: false,
            },
            other => other,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// JSON-over-HTTP plumbing shared by every service client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    service: Service,
    base_url: String,
    http: Client,
}

impl HttpTransport {
    pub fn new(
        service: Service,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ServiceError::Client)?;

        Ok(Self::with_client(service, base_url, http))
    }

    pub fn with_client(service: Service, base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            service,
            base_url,
            http,
        }
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.http.request(method, url)
    }

    /// Builds `<base><prefix>/<segment>` with the segment percent-encoded.
    pub(crate) fn segment_url(&self, prefix: &str, segment: &str) -> Result<Url, ServiceError> {
        let raw = format!("{}{}", self.base_url, prefix);
        let mut url = Url::parse(&raw).map_err(|_| ServiceError::InvalidEndpoint {
            service: self.service,
            url: raw.clone(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ServiceError::InvalidEndpoint {
                service: self.service,
                url: raw.clone(),
            })?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    pub(crate) fn request_url(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }

    pub(crate) async fn json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let response = self.dispatch(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|source| ServiceError::Decode {
                service: self.service,
                source,
            })
    }

    pub(crate) async fn empty(&self, request: RequestBuilder) -> Result<(), ServiceError> {
        self.dispatch(request).await.map(|_| ())
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let service = self.service;
        let response = request.send().await.map_err(|source| {
            if source.is_timeout() {
                warn!(%service, "request timed out");
                ServiceError::Timeout { service }
            } else {
                warn!(%service, error = %source, "request could not be delivered");
                ServiceError::Unreachable { service, source }
            }
        })?;

        let status = response.status();
        debug!(%service, url = %response.url(), status = status.as_u16(), "response received");
        if status.is_success() {
            return Ok(response);
        }

        Err(rejection(service, status, response).await)
    }
}

async fn rejection(service: Service, status: StatusCode, response: Response) -> ServiceError {
    let body = response.text().await.unwrap_or_default();
    let server_message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.trim().is_empty());

    let (message, server_message) = match server_message {
        Some(message) => (message, true),
        None => (
            format!(
                "Error {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Error en la petición")
            ),
            false,
        ),
    };

    warn!(%service, status = status.as_u16(), %message, "request rejected");
    ServiceError::Rejected {
        service,
        status: status.as_u16(),
        message,
        server_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(status: u16, server_message: bool) -> ServiceError {
        ServiceError::Rejected {
            service: Service::Document,
            status,
            message: "Error 400: Bad Request".to_string(),
            server_message,
        }
    }

    #[test]
    fn not_found_rejections_are_classified_separately() {
        assert_eq!(rejected(404, false).kind(), ServiceErrorKind::NotFound);
        assert_eq!(rejected(409, true).kind(), ServiceErrorKind::Rejected);
        assert_eq!(
            ServiceError::Timeout {
                service: Service::User
            }
            .kind(),
            ServiceErrorKind::Timeout
        );
    }

    #[test]
    fn fallback_only_replaces_generic_messages() {
        let generic = rejected(401, false).with_fallback_message("Credenciales inválidas");
        assert_eq!(generic.user_message(), "Credenciales inválidas");

        let from_server = ServiceError::Rejected {
            service: Service::User,
            status: 401,
            message: "Usuario bloqueado".to_string(),
            server_message: true,
        }
        .with_fallback_message("Credenciales inválidas");
        assert_eq!(from_server.user_message(), "Usuario bloqueado");
    }

    #[test]
    fn timeout_message_names_the_service() {
        let error = ServiceError::Timeout {
            service: Service::Contact,
        };
        assert_eq!(
            error.user_message(),
            "La solicitud a Contact Service excedió el tiempo de espera"
        );
    }

    #[test]
    fn segment_urls_encode_reserved_characters() {
        let transport = HttpTransport::with_client(
            Service::Contact,
            "http://localhost:8085/api/",
            Client::new(),
        );
        let url = transport
            .segment_url("/contacto/email", "ana maria@test.cl")
            .expect("valid url");
        assert_eq!(
            url.as_str(),
            "http://localhost:8085/api/contacto/email/ana%20maria@test.cl"
        );
    }
}
