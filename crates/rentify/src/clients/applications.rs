use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::properties::Property;
use super::transport::{HttpTransport, Service, ServiceError};
use super::users::User;
use super::include_details;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pendiente,
    Aceptada,
    Rechazada,
}

impl RequestStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pendiente => "PENDIENTE",
            RequestStatus::Aceptada => "ACEPTADA",
            RequestStatus::Rechazada => "RECHAZADA",
        }
    }
}

/// A tenant's request to rent a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalRequest {
    pub id: i64,
    #[serde(rename = "usuarioId")]
    pub user_id: i64,
    #[serde(rename = "propiedadId")]
    pub property_id: i64,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(rename = "fechaSolicitud", default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<String>,
    #[serde(rename = "usuario", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(rename = "propiedad", default, skip_serializing_if = "Option::is_none")]
    pub property: Option<Property>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRentalRequest {
    #[serde(rename = "usuarioId")]
    pub user_id: i64,
    #[serde(rename = "propiedadId")]
    pub property_id: i64,
}

/// Signed lease derived from an accepted request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub id: i64,
    #[serde(rename = "solicitudId")]
    pub request_id: i64,
    #[serde(rename = "fechaInicio")]
    pub starts_on: String,
    #[serde(rename = "fechaFin", default, skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<String>,
    #[serde(rename = "montoMensual")]
    pub monthly_amount: f64,
    #[serde(rename = "activo", default)]
    pub active: bool,
    #[serde(rename = "solicitud", default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RentalRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLeaseRecord {
    #[serde(rename = "solicitudId")]
    pub request_id: i64,
    #[serde(rename = "fechaInicio")]
    pub starts_on: String,
    #[serde(rename = "fechaFin", skip_serializing_if = "Option::is_none")]
    pub ends_on: Option<String>,
    #[serde(rename = "montoMensual")]
    pub monthly_amount: f64,
}

/// Client for `/solicitudes` on the application service.
#[derive(Debug, Clone)]
pub struct RentalRequestClient {
    transport: HttpTransport,
}

impl RentalRequestClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn service(&self) -> Service {
        self.transport.service()
    }

    /// The service checks ownership rules, active-request limits and
    /// document approval itself; violations come back as rejections.
    pub async fn create(&self, request: &NewRentalRequest) -> Result<RentalRequest, ServiceError> {
        let builder = self
            .transport
            .request(Method::POST, "/solicitudes")
            .json(request);
        let created: RentalRequest = self.transport.json(builder).await?;
        info!(
            request_id = created.id,
            user_id = created.user_id,
            property_id = created.property_id,
            "rental request created"
        );
        Ok(created)
    }

    pub async fn list(&self, details: bool) -> Result<Vec<RentalRequest>, ServiceError> {
        let builder = self
            .transport
            .request(Method::GET, "/solicitudes")
            .query(&include_details(details));
        self.transport.json(builder).await
    }

    pub async fn get(&self, id: i64, details: bool) -> Result<RentalRequest, ServiceError> {
        let builder = self
            .transport
            .request(Method::GET, &format!("/solicitudes/{id}"))
            .query(&include_details(details));
        self.transport.json(builder).await
    }

    pub async fn list_by_user(
        &self,
        user_id: i64,
        details: bool,
    ) -> Result<Vec<RentalRequest>, ServiceError> {
        let builder = self
            .transport
            .request(Method::GET, &format!("/solicitudes/usuario/{user_id}"))
            .query(&include_details(details));
        self.transport.json(builder).await
    }

    pub async fn list_by_property(
        &self,
        property_id: i64,
        details: bool,
    ) -> Result<Vec<RentalRequest>, ServiceError> {
        let builder = self
            .transport
            .request(Method::GET, &format!("/solicitudes/propiedad/{property_id}"))
            .query(&include_details(details));
        self.transport.json(builder).await
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: RequestStatus,
    ) -> Result<RentalRequest, ServiceError> {
        let builder = self
            .transport
            .request(Method::PATCH, &format!("/solicitudes/{id}/estado"))
            .json(&json!({ "estado": status }));
        let updated = self.transport.json(builder).await?;
        info!(request_id = id, status = status.as_str(), "rental request status updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let builder = self
            .transport
            .request(Method::DELETE, &format!("/solicitudes/{id}"));
        self.transport.empty(builder).await
    }

    pub async fn count_active(&self, user_id: i64) -> Result<u32, ServiceError> {
        let builder = self.transport.request(
            Method::GET,
            &format!("/solicitudes/usuario/{user_id}/count-activas"),
        );
        self.transport.json(builder).await
    }
}

/// Client for `/registros` on the application service.
#[derive(Debug, Clone)]
pub struct LeaseRecordClient {
    transport: HttpTransport,
}

impl LeaseRecordClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn service(&self) -> Service {
        self.transport.service()
    }

    pub async fn create(&self, record: &NewLeaseRecord) -> Result<LeaseRecord, ServiceError> {
        let builder = self
            .transport
            .request(Method::POST, "/registros")
            .json(record);
        self.transport.json(builder).await
    }

    pub async fn list(&self, details: bool) -> Result<Vec<LeaseRecord>, ServiceError> {
        let builder = self
            .transport
            .request(Method::GET, "/registros")
            .query(&include_details(details));
        self.transport.json(builder).await
    }

    pub async fn get(&self, id: i64, details: bool) -> Result<LeaseRecord, ServiceError> {
        let builder = self
            .transport
            .request(Method::GET, &format!("/registros/{id}"))
            .query(&include_details(details));
        self.transport.json(builder).await
    }

    pub async fn list_by_request(
        &self,
        request_id: i64,
        details: bool,
    ) -> Result<Vec<LeaseRecord>, ServiceError> {
        let builder = self
            .transport
            .request(Method::GET, &format!("/registros/solicitud/{request_id}"))
            .query(&include_details(details));
        self.transport.json(builder).await
    }

    pub async fn update(&self, id: i64, record: &NewLeaseRecord) -> Result<LeaseRecord, ServiceError> {
        let builder = self
            .transport
            .request(Method::PUT, &format!("/registros/{id}"))
            .json(record);
        self.transport.json(builder).await
    }

    pub async fn finalize(&self, id: i64) -> Result<LeaseRecord, ServiceError> {
        let builder = self
            .transport
            .request(Method::PATCH, &format!("/registros/{id}/finalizar"));
        let record = self.transport.json(builder).await?;
        info!(lease_id = id, "lease finalized");
        Ok(record)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let builder = self
            .transport
            .request(Method::DELETE, &format!("/registros/{id}"));
        self.transport.empty(builder).await
    }
}
