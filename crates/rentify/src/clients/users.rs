use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::transport::{HttpTransport, ServiceError};
use super::{include_details as details, Lookup};

/// Account as returned by the user service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(rename = "pnombre")]
    pub first_name: String,
    #[serde(rename = "snombre", default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(rename = "papellido")]
    pub last_name: String,
    pub email: String,
    #[serde(rename = "rut", default)]
    pub national_id: String,
    #[serde(rename = "ntelefono", default)]
    pub phone: String,
    #[serde(rename = "fnacimiento", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(rename = "rolId")]
    pub role_id: i64,
    #[serde(rename = "estadoId", default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<i64>,
    #[serde(rename = "duocVip", default)]
    pub institutional_affiliate: bool,
    #[serde(rename = "codigoRef", default, skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    #[serde(rename = "puntos", default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(rename = "rol", default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Lookup>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Lookup>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Account-creation payload. The password travels as a plain field because
/// the user service expects it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    #[serde(rename = "pnombre")]
    pub first_name: String,
    #[serde(rename = "snombre", skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(rename = "papellido")]
    pub last_name: String,
    #[serde(rename = "fnacimiento")]
    pub birth_date: String,
    pub email: String,
    #[serde(rename = "rut")]
    pub national_id: String,
    #[serde(rename = "ntelefono")]
    pub phone: String,
    #[serde(rename = "clave")]
    pub password: String,
    #[serde(rename = "estadoId")]
    pub status_id: i64,
    #[serde(rename = "rolId")]
    pub role_id: i64,
    #[serde(rename = "duocVip")]
    pub institutional_affiliate: bool,
    #[serde(rename = "codigoRef", skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

/// Status id assigned to freshly created accounts.
pub const ACTIVE_ACCOUNT_STATUS: i64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    #[serde(rename = "clave")]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(rename = "mensaje", default)]
    pub message: String,
    #[serde(rename = "usuario", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Client for the user service (accounts, roles, account statuses).
#[derive(Debug, Clone)]
pub struct UserClient {
    transport: HttpTransport,
}

impl UserClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ServiceError> {
        info!(email = %credentials.email, "attempting login");
        let request = self
            .transport
            .request(Method::POST, "/usuarios/login")
            .json(credentials);
        self.transport
            .json(request)
            .await
            .map_err(|err| err.with_fallback_message("Credenciales inválidas"))
    }

    pub async fn create_account(&self, account: &NewAccount) -> Result<User, ServiceError> {
        let request = self
            .transport
            .request(Method::POST, "/usuarios")
            .json(account);
        let user: User = self.transport.json(request).await?;
        info!(user_id = user.id, role_id = user.role_id, "account created");
        Ok(user)
    }

    pub async fn get(&self, id: i64, include_details: bool) -> Result<User, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/usuarios/{id}"))
            .query(&details(include_details));
        self.transport.json(request).await
    }

    /// Any failure is reported as "does not exist".
    pub async fn exists(&self, id: i64) -> bool {
        let request = self
            .transport
            .request(Method::GET, &format!("/usuarios/{id}/existe"));
        match self.transport.json::<bool>(request).await {
            Ok(exists) => exists,
            Err(err) => {
                warn!(user_id = id, error = %err, "user existence check failed");
                false
            }
        }
    }

    pub async fn roles(&self) -> Result<Vec<Lookup>, ServiceError> {
        let request = self.transport.request(Method::GET, "/roles");
        self.transport.json(request).await
    }

    pub async fn role(&self, id: i64) -> Result<Lookup, ServiceError> {
        let request = self.transport.request(Method::GET, &format!("/roles/{id}"));
        self.transport.json(request).await
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
}
