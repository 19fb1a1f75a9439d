use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::transport::{HttpTransport, ServiceError};
use super::{include_details, Lookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "CLP")]
    Clp,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Activa,
    Inactiva,
    EnRevision,
    Arrendada,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comuna {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "regionId", default)]
    pub region_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Lookup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub url: String,
    #[serde(rename = "propiedadId")]
    pub property_id: i64,
}

/// Rental listing as served by the property service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    #[serde(rename = "codigo", default)]
    pub code: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "precioMensual")]
    pub monthly_price: f64,
    #[serde(rename = "divisa", default)]
    pub currency: Currency,
    #[serde(rename = "m2", default)]
    pub square_meters: f64,
    #[serde(rename = "nHabit", default)]
    pub bedrooms: u32,
    #[serde(rename = "nBanos", default)]
    pub bathrooms: u32,
    #[serde(rename = "petFriendly", default)]
    pub pet_friendly: bool,
    #[serde(rename = "tipoId", default)]
    pub type_id: i64,
    #[serde(rename = "comunaId", default)]
    pub comuna_id: i64,
    #[serde(rename = "fcreacion", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "estadoPropiedad", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    #[serde(rename = "propietarioEmail", default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    #[serde(rename = "tipo", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<Lookup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comuna: Option<Comuna>,
    #[serde(rename = "fotos", default)]
    pub photos: Vec<Photo>,
    #[serde(rename = "categorias", default)]
    pub categories: Vec<Lookup>,
}

/// Create/update payload for a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProperty {
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
    #[serde(rename = "propietarioId", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<i64>,
}

/// Search criteria; unset fields are left out of the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyFilters {
    pub type_id: Option<i64>,
    pub comuna_id: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_bedrooms: Option<u32>,
    pub pet_friendly: Option<bool>,
    pub include_details: Option<bool>,
}

impl PropertyFilters {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(type_id) = self.type_id {
            pairs.push(("tipoId", type_id.to_string()));
        }
        if let Some(comuna_id) = self.comuna_id {
            pairs.push(("comunaId", comuna_id.to_string()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("precioMin", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("precioMax", max.to_string()));
        }
        if let Some(rooms) = self.min_bedrooms {
            pairs.push(("nHabitMin", rooms.to_string()));
        }
        if let Some(pets) = self.pet_friendly {
            pairs.push(("petFriendly", pets.to_string()));
        }
        if let Some(details) = self.include_details {
            pairs.push(("includeDetails", details.to_string()));
        }
        pairs
    }
}

/// Client for the property service (listings, photos, lookup tables).
#[derive(Debug, Clone)]
pub struct PropertyClient {
    transport: HttpTransport,
}

impl PropertyClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub async fn create(&self, property: &NewProperty) -> Result<Property, ServiceError> {
        let request = self
            .transport
            .request(Method::POST, "/propiedades")
            .json(property);
        self.transport.json(request).await
    }

    pub async fn list(&self, details: bool) -> Result<Vec<Property>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, "/propiedades")
            .query(&include_details(details));
        self.transport.json(request).await
    }

    pub async fn get(&self, id: i64, details: bool) -> Result<Property, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/propiedades/{id}"))
            .query(&include_details(details));
        self.transport.json(request).await
    }

    pub async fn exists(&self, id: i64) -> bool {
        let request = self
            .transport
            .request(Method::GET, &format!("/propiedades/{id}/existe"));
        match self.transport.json::<bool>(request).await {
            Ok(exists) => exists,
            Err(err) => {
                warn!(property_id = id, error = %err, "property existence check failed");
                false
            }
        }
    }

    pub async fn search(&self, filters: &PropertyFilters) -> Result<Vec<Property>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, "/propiedades/buscar")
            .query(&filters.query_pairs());
        self.transport.json(request).await
    }

    pub async fn update(&self, id: i64, property: &NewProperty) -> Result<Property, ServiceError> {
        let request = self
            .transport
            .request(Method::PUT, &format!("/propiedades/{id}"))
            .json(property);
        self.transport.json(request).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let request = self
            .transport
            .request(Method::DELETE, &format!("/propiedades/{id}"));
        self.transport.empty(request).await
    }

    pub async fn photos(&self, property_id: i64) -> Result<Vec<Photo>, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/propiedades/{property_id}/fotos"));
        self.transport.json(request).await
    }

    pub async fn comunas(&self) -> Result<Vec<Comuna>, ServiceError> {
        let request = self.transport.request(Method::GET, "/comunas");
        self.transport.json(request).await
    }

    pub async fn comuna(&self, id: i64) -> Result<Comuna, ServiceError> {
        let request = self
            .transport
            .request(Method::GET, &format!("/comunas/{id}"));
        self.transport.json(request).await
    }

    pub async fn regions(&self) -> Result<Vec<Lookup>, ServiceError> {
        let request = self.transport.request(Method::GET, "/regiones");
        self.transport.json(request).await
    }

    pub async fn property_types(&self) -> Result<Vec<Lookup>, ServiceError> {
        let request = self.transport.request(Method::GET, "/tipos");
        self.transport.json(request).await
    }

    pub async fn categories(&self) -> Result<Vec<Lookup>, ServiceError> {
        let request = self.transport.request(Method::GET, "/categorias");
        self.transport.json(request).await
    }
}
