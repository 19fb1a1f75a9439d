use std::fmt;

use serde::de::IntoDeserializer;
use serde::{Deserialize, Deserializer, Serialize};

use crate::session::UserRole;

/// Account type picked on the personal-data step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountKind {
    #[serde(rename = "PROPIETARIO")]
    Owner,
    #[serde(rename = "ARRIENDATARIO", alias = "ARRENDATARIO")]
    Tenant,
}

impl AccountKind {
    pub const fn role(self) -> UserRole {
        match self {
            AccountKind::Owner => UserRole::Owner,
            AccountKind::Tenant => UserRole::Tenant,
        }
    }

    pub const fn role_id(self) -> i64 {
        self.role().role_id()
    }
}

/// Personal data as typed into the first wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantDraft {
    #[serde(rename = "pnombre")]
    pub first_name: String,
    #[serde(rename = "snombre", skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(rename = "papellido")]
    pub last_name: String,
    #[serde(rename = "rut")]
    pub national_id: String,
    pub email: String,
    #[serde(rename = "ntelefono")]
    pub phone: String,
    #[serde(rename = "fnacimiento")]
    pub birth_date: String,
    pub password: String,
    #[serde(rename = "confirmPassword", alias = "confirm")]
    pub confirm_password: String,
    #[serde(rename = "rol", deserialize_with = "blank_as_none")]
    pub account_kind: Option<AccountKind>,
    #[serde(rename = "codigoRef", skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<AccountKind>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => AccountKind::deserialize(value.into_deserializer()).map(Some),
    }
}

/// Identity documents requested on the second step, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Dni,
    Pasaporte,
    LiquidacionSueldo,
    CertificadoAntecedentes,
    CertificadoAfp,
    ContratoTrabajo,
}

impl DocumentKind {
    pub const CATALOGUE: [DocumentKind; 6] = [
        DocumentKind::Dni,
        DocumentKind::Pasaporte,
        DocumentKind::LiquidacionSueldo,
        DocumentKind::CertificadoAntecedentes,
        DocumentKind::CertificadoAfp,
        DocumentKind::ContratoTrabajo,
    ];

    /// `tipoDocId` expected by the document service.
    pub const fn type_id(self) -> i64 {
        match self {
            DocumentKind::Dni => 1,
            DocumentKind::Pasaporte => 2,
            DocumentKind::LiquidacionSueldo => 3,
            DocumentKind::CertificadoAntecedentes => 4,
            DocumentKind::CertificadoAfp => 5,
            DocumentKind::ContratoTrabajo => 6,
        }
    }

    pub const fn is_required(self) -> bool {
        matches!(
            self,
            DocumentKind::Dni
                | DocumentKind::LiquidacionSueldo
                | DocumentKind::CertificadoAntecedentes
        )
    }

    pub const fn wire_name(self) -> &'static str {
        match self {
            DocumentKind::Dni => "DNI",
            DocumentKind::Pasaporte => "PASAPORTE",
            DocumentKind::LiquidacionSueldo => "LIQUIDACION_SUELDO",
            DocumentKind::CertificadoAntecedentes => "CERTIFICADO_ANTECEDENTES",
            DocumentKind::CertificadoAfp => "CERTIFICADO_AFP",
            DocumentKind::ContratoTrabajo => "CONTRATO_TRABAJO",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::Dni => "Cédula de Identidad",
            DocumentKind::Pasaporte => "Pasaporte",
            DocumentKind::LiquidacionSueldo => "Liquidación de Sueldo",
            DocumentKind::CertificadoAntecedentes => "Certificado de Antecedentes",
            DocumentKind::CertificadoAfp => "Certificado de AFP",
            DocumentKind::ContratoTrabajo => "Contrato de Trabajo",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::CATALOGUE
            .into_iter()
            .find(|kind| kind.wire_name().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// File chosen for a slot. Only its metadata travels to the document service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    #[serde(default)]
    pub size_bytes: u64,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            file_name: file_name.into(),
            size_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSlot {
    pub kind: DocumentKind,
    pub required: bool,
    pub attachment: Option<Attachment>,
}

/// The six slots in catalogue order, all empty.
pub fn empty_slots() -> Vec<DocumentSlot> {
    DocumentKind::CATALOGUE
        .into_iter()
        .map(|kind| DocumentSlot {
            kind,
            required: kind.is_required(),
            attachment: None,
        })
        .collect()
}
