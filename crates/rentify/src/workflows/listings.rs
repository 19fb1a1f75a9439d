use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clients::{Currency, NewProperty, Property, PropertyClient, ServiceError};
use crate::session::{SessionError, SessionRecord, SessionStore, UserRole};

pub const CREATED_MESSAGE: &str = "Propiedad agregada exitosamente";
pub const UPDATED_MESSAGE: &str = "Propiedad actualizada exitosamente";
pub const DELETED_MESSAGE: &str = "Propiedad eliminada exitosamente";

const REQUIRED_FIELDS: &str =
    "Por favor completa los campos obligatorios (Título, Dirección, Precio).";
const LOCATION_AND_TYPE: &str =
    "Por favor, selecciona una Comuna y un Tipo de Propiedad válidos.";
const DIMENSIONS: &str = "Verifica que los metros cuadrados (m2) sea mayor a cero, y el número de habitaciones y baños sean válidos.";

/// Listing form as edited by an owner or an administrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingDraft {
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "precioMensual")]
    pub monthly_price: f64,
    #[serde(rename = "divisa")]
    pub currency: Currency,
    #[serde(rename = "m2")]
    pub square_meters: f64,
    #[serde(rename = "nHabit")]
    pub bedrooms: u32,
    #[serde(rename = "nBanos")]
    pub bathrooms: u32,
    #[serde(rename = "petFriendly")]
    pub pet_friendly: bool,
    #[serde(rename = "tipoId")]
    pub type_id: i64,
    #[serde(rename = "comunaId")]
    pub comuna_id: i64,
}

impl From<&Property> for ListingDraft {
    fn from(property: &Property) -> Self {
        Self {
            code: property.code.clone(),
            title: property.title.clone(),
            description: property.description.clone(),
            address: property.address.clone(),
            monthly_price: property.monthly_price,
            currency: property.currency,
            square_meters: property.square_meters,
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            pet_friendly: property.pet_friendly,
            type_id: property.type_id,
            comuna_id: property.comuna_id,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("{0}")]
    Invalid(&'static str),
    #[error("No tienes permisos para {action} esta propiedad")]
    NotPermitted { action: &'static str },
    #[error("{}", .0.user_message())]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Checks the form in the order the messages are shown; the first broken
/// rule is the one reported. Room counts are unsigned so only the surface
/// can fail the last rule.
pub fn validate_listing(draft: &ListingDraft) -> Result<(), ListingError> {
    if draft.title.trim().is_empty()
        || draft.address.trim().is_empty()
        || draft.monthly_price <= 0.0
    {
        return Err(ListingError::Invalid(REQUIRED_FIELDS));
    }
    if draft.comuna_id <= 0 || draft.type_id <= 0 {
        return Err(ListingError::Invalid(LOCATION_AND_TYPE));
    }
    if draft.square_meters <= 0.0 {
        return Err(ListingError::Invalid(DIMENSIONS));
    }
    Ok(())
}

pub fn can_publish(record: &SessionRecord) -> bool {
    record.logged_in && (record.is_admin() || record.has_role(UserRole::Owner))
}

/// Admins manage every listing; owners only the ones published under
/// their e-mail.
pub fn can_manage(record: &SessionRecord, property: &Property) -> bool {
    if !record.logged_in {
        return false;
    }
    if record.is_admin() {
        return true;
    }
    match (&record.email, &property.owner_email) {
        (Some(mine), Some(owner)) => mine.eq_ignore_ascii_case(owner),
        _ => false,
    }
}

pub fn listing_payload(
    draft: &ListingDraft,
    owner_id: Option<i64>,
    now: DateTime<Utc>,
) -> NewProperty {
    let code = match draft.code.trim() {
        "" => format!("WEB-{}", now.timestamp_millis()),
        code => code.to_string(),
    };

    NewProperty {
        code,
        title: draft.title.trim().to_string(),
        description: draft
            .description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        address: draft.address.trim().to_string(),
        monthly_price: draft.monthly_price,
        currency: draft.currency,
        square_meters: draft.square_meters,
        bedrooms: draft.bedrooms,
        bathrooms: draft.bathrooms,
        pet_friendly: draft.pet_friendly,
        type_id: draft.type_id,
        comuna_id: draft.comuna_id,
        owner_id,
    }
}

/// Listing management for owners and administrators.
#[derive(Debug, Clone)]
pub struct ListingManager {
    properties: PropertyClient,
    session: SessionStore,
}

impl ListingManager {
    pub fn new(properties: PropertyClient, session: SessionStore) -> Self {
        Self {
            properties,
            session,
        }
    }

    fn publisher(&self) -> Result<SessionRecord, ListingError> {
        let record = self.session.require_login()?;
        if can_publish(&record) {
            Ok(record)
        } else {
            Err(SessionError::Forbidden {
                required: UserRole::Owner,
            }
            .into())
        }
    }

    /// Every listing for an admin, the caller's own listings for an owner.
    pub async fn list_for_session(&self) -> Result<Vec<Property>, ListingError> {
        let record = self.publisher()?;
        let listings = self.properties.list(true).await?;
        if record.is_admin() {
            return Ok(listings);
        }
        Ok(listings
            .into_iter()
            .filter(|property| can_manage(&record, property))
            .collect())
    }

    pub async fn create(&self, draft: &ListingDraft) -> Result<Property, ListingError> {
        let record = self.publisher()?;
        validate_listing(draft)?;

        let payload = listing_payload(draft, record.user_id, Utc::now());
        let created = self.properties.create(&payload).await?;
        info!(property_id = created.id, code = %created.code, "listing created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, draft: &ListingDraft) -> Result<Property, ListingError> {
        let record = self.publisher()?;
        let current = self.properties.get(id, false).await?;
        if !can_manage(&record, &current) {
            warn!(property_id = id, user_id = ?record.user_id, "listing edit denied");
            return Err(ListingError::NotPermitted { action: "editar" });
        }
        validate_listing(draft)?;

        let payload = listing_payload(draft, record.user_id, Utc::now());
        let updated = self.properties.update(id, &payload).await?;
        info!(property_id = id, "listing updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ListingError> {
        let record = self.publisher()?;
        let current = self.properties.get(id, false).await?;
        if !can_manage(&record, &current) {
            warn!(property_id = id, user_id = ?record.user_id, "listing delete denied");
            return Err(ListingError::NotPermitted {
                action: "eliminar",
            });
        }

        self.properties.delete(id).await?;
        info!(property_id = id, "listing deleted");
        Ok(())
    }
}
