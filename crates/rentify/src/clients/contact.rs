use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::include_details;
use super::transport::{HttpTransport, Service, ServiceError};
use super::users::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactStatus {
    Pendiente,
    EnProceso,
    Resuelto,
}

impl ContactStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            ContactStatus::Pendiente => "PENDIENTE",
            ContactStatus::EnProceso => "EN_PROCESO",
            ContactStatus::Resuelto => "RESUELTO",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "asunto", default)]
    pub subject: String,
    #[serde(rename = "mensaje")]
    pub body: String,
    #[serde(rename = "numeroTelefono", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "usuarioId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContactStatus>,
    #[serde(rename = "fechaCreacion", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "fechaActualizacion", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(rename = "respuesta", default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(rename = "respondidoPor", default, skip_serializing_if = "Option::is_none")]
    pub replied_by: Option<i64>,
    #[serde(rename = "usuario", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContactMessage {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "asunto")]
    pub subject: String,
    #[serde(rename = "mensaje")]
    pub body: String,
    #[serde(rename = "numeroTelefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "usuarioId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactReply {
    #[serde(rename = "respuesta")]
    pub reply: String,
    #[serde(rename = "respondidoPor")]
    pub replied_by: i64,
    #[serde(rename = "nuevoEstado", skip_serializing_if = "Option::is_none")]
    pub new_status: Option<ContactStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactStatistics {
    pub total: u64,
    #[serde(rename = "pendientes")]
    pub pending: u64,
    #[serde(rename = "enProceso")]
    pub in_progress: u64,
    #[serde(rename = "resueltos")]
    pub resolved: u64,
}

#[derive(Debug, Clone)]
pub struct ContactClient {
    transport: HttpTransport,
}

impl ContactClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn service(&self) -> Service {
        self.transport.service()
    }

    pub async fn create(&self, message: &NewContactMessage) -> Result<ContactMessage, ServiceError> {
        info!(email = %message.email, "sending contact message");
        let request = self
            .transport
            .request(Method::POST, "/contacto")
            .json(message);
        self.transport.json(request).await
    }

    pub async fn list(&self, details: bool) -> Result<Vec<ContactMessage>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, "/contacto")
            .query(&include_details(details));
        self.transport.json(request).await
    }

    pub async fn get(&self, id: i64, details: bool) -> Result<ContactMessage, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/contacto/{id}"))
            .query(&include_details(details));
        self.transport.json(request).await
    }

    pub async fn list_by_email(&self, email: &str) -> Result<Vec<ContactMessage>, ServiceError> {
        let url = self.transport.segment_url("/contacto/email", email)?;
        let request = self.transport.request_url(Method::GET, url);
        self.transport.json(request).await
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<ContactMessage>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/contacto/usuario/{user_id}"));
        self.transport.json(request).await
    }

    pub async fn list_by_status(
        &self,
        status: ContactStatus,
    ) -> Result<Vec<ContactMessage>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/contacto/estado/{}", status.as_str()));
        self.transport.json(request).await
    }

    pub async fn unanswered(&self) -> Result<Vec<ContactMessage>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, "/contacto/sin-responder");
        self.transport.json(request).await
    }

    pub async fn search(&self, keyword: &str) -> Result<Vec<ContactMessage>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, "/contacto/buscar")
            .query(&[("keyword", keyword)]);
        self.transport.json(request).await
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: ContactStatus,
    ) -> Result<ContactMessage, ServiceError> {
        let request = self
            .transport
            .request(Method::PATCH, &format!("/contacto/{id}/estado"))
            .query(&[("estado", status.as_str())]);
        self.transport.json(request).await
    }

    pub async fn respond(
        &self,
        id: i64,
        reply: &ContactReply,
    ) -> Result<ContactMessage, ServiceError> {
        let request = self
            .transport
            .request(Method::POST, &format!("/contacto/{id}/responder"))
            .json(reply);
        let answered = self.transport.json(request).await?;
        info!(message_id = id, admin_id = reply.replied_by, "contact message answered");
        Ok(answered)
    }

    pub async fn delete(&self, id: i64, admin_id: i64) -> Result<(), ServiceError> {
        let request = self
            .transport
            .request(Method::DELETE, &format!("/contacto/{id}"))
            .query(&[("adminId", admin_id)]);
        self.transport.empty(request).await
    }

    pub async fn statistics(&self) -> Result<ContactStatistics, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, "/contacto/estadisticas");
        self.transport.json(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_omits_status_when_unchanged() {
        let reply = ContactReply {
            reply: "Hola, ya revisamos tu caso".to_string(),
            replied_by: 1,
            new_status: None,
        };
        let value = serde_json::to_value(&reply).expect("serializes");
        assert_eq!(value["respondidoPor"], 1);
        assert!(value.get("nuevoEstado").is_none());
    }

    #[test]
    fn statistics_read_camel_case_counters() {
        let raw = r#"{"total":9,"pendientes":4,"enProceso":3,"resueltos":2}"#;
        let stats: ContactStatistics = serde_json::from_str(raw).expect("parses");
        assert_eq!(stats.in_progress, 3);
        assert_eq!(stats.pending + stats.in_progress + stats.resolved, stats.total);
    }
}
