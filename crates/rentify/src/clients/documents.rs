use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::transport::{HttpTransport, Service, ServiceError};
use super::users::User;
use super::{include_details, Lookup};

/// Review states of an uploaded document; ids match the document service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Pendiente,
    Aceptado,
    Rechazado,
    EnRevision,
}

impl DocumentStatus {
    pub const fn id(self) -> i64 {
        match self {
            DocumentStatus::Pendiente => 1,
            DocumentStatus::Aceptado => 2,
            DocumentStatus::Rechazado => 3,
            DocumentStatus::EnRevision => 4,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(DocumentStatus::Pendiente),
            2 => Some(DocumentStatus::Aceptado),
            3 => Some(DocumentStatus::Rechazado),
            4 => Some(DocumentStatus::EnRevision),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Pendiente => "PENDIENTE",
            DocumentStatus::Aceptado => "ACEPTADO",
            DocumentStatus::Rechazado => "RECHAZADO",
            DocumentStatus::EnRevision => "EN_REVISION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "fechaSubido", default, skip_serializing_if = "Option::is_none")]
    pub uploaded_at: Option<String>,
    #[serde(rename = "usuarioId")]
    pub user_id: i64,
    #[serde(rename = "estadoId")]
    pub status_id: i64,
    #[serde(rename = "tipoDocId")]
    pub type_id: i64,
    #[serde(rename = "estadoNombre", default, skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    #[serde(rename = "tipoDocNombre", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(rename = "usuario", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Document {
    pub fn status(&self) -> Option<DocumentStatus> {
        DocumentStatus::from_id(self.status_id)
    }
}

/// Creation payload: metadata only, the file body is handled elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "usuarioId")]
    pub user_id: i64,
    #[serde(rename = "estadoId")]
    pub status_id: i64,
    #[serde(rename = "tipoDocId")]
    pub type_id: i64,
}

#[derive(Debug, Clone)]
pub struct DocumentClient {
    transport: HttpTransport,
}

impl DocumentClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn service(&self) -> Service {
        self.transport.service()
    }

    pub async fn create(&self, document: &NewDocument) -> Result<Document, ServiceError> {
        let request = self
            .transport
            .request(Method::POST, "/documentos")
            .json(document);
        let created: Document = self.transport.json(request).await?;
        info!(
            document_id = created.id,
            user_id = created.user_id,
            type_id = created.type_id,
            "document registered"
        );
        Ok(created)
    }

    pub async fn list(&self, details: bool) -> Result<Vec<Document>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, "/documentos")
            .query(&include_details(details));
        self.transport.json(request).await
    }

    pub async fn get(&self, id: i64, details: bool) -> Result<Document, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/documentos/{id}"))
            .query(&include_details(details));
        self.transport.json(request).await
    }

    pub async fn list_by_user(
        &self,
        user_id: i64,
        details: bool,
    ) -> Result<Vec<Document>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/documentos/usuario/{user_id}"))
            .query(&include_details(details));
        self.transport.json(request).await
    }

    /// Whether the user has at least one accepted document. Failures count as `false`.
    pub async fn has_approved(&self, user_id: i64) -> bool {
        let request = self.transport.request(
            Method::GET,
            &format!("/documentos/usuario/{user_id}/verificar-aprobados"),
        );
        match self.transport.json::<bool>(request).await {
            Ok(approved) => approved,
            Err(err) => {
                warn!(user_id, error = %err, "approved document check failed");
                false
            }
        }
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: DocumentStatus,
    ) -> Result<Document, ServiceError> {
        let request = self.transport.request(
            Method::PATCH,
            &format!("/documentos/{id}/estado/{}", status.id()),
        );
        let updated = self.transport.json(request).await?;
        info!(document_id = id, status = status.as_str(), "document status updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let request = self
            .transport
            .request(Method::DELETE, &format!("/documentos/{id}"));
        self.transport.empty(request).await
    }

    pub async fn statuses(&self) -> Result<Vec<Lookup>, ServiceError> {
        let request = self.transport.request(Method::GET, "/estados");
        self.transport.json(request).await
    }

    pub async fn status(&self, id: i64) -> Result<Lookup, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/estados/{id}"));
        self.transport.json(request).await
    }

    pub async fn document_types(&self) -> Result<Vec<Lookup>, ServiceError> {
        let request = self.transport.request(Method::GET, "/tipos-documentos");
        self.transport.json(request).await
    }

    pub async fn document_type(&self, id: i64) -> Result<Lookup, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/tipos-documentos/{id}"));
        self.transport.json(request).await
    }
}
