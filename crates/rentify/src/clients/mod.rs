//! HTTP clients for the five backend microservices.

mod applications;
mod contact;
mod documents;
mod gateway;
mod properties;
mod transport;
mod users;

use serde::{Deserialize, Serialize};

use crate::config::ServiceEndpoints;

pub use applications::{
    LeaseRecord, LeaseRecordClient, NewLeaseRecord, NewRentalRequest, RentalRequest,
    RentalRequestClient, RequestStatus,
};
pub use contact::{
    ContactClient, ContactMessage, ContactReply, ContactStatistics, ContactStatus,
    NewContactMessage,
};
pub use documents::{Document, DocumentClient, DocumentStatus, NewDocument};
pub use gateway::{AccountGateway, DocumentGateway};
pub use properties::{
    Comuna, Currency, ListingStatus, NewProperty, Photo, Property, PropertyClient,
    PropertyFilters,
};
pub use transport::{HttpTransport, Service, ServiceError, ServiceErrorKind};
pub use users::{
    Credentials, LoginResponse, NewAccount, User, UserClient, ACTIVE_ACCOUNT_STATUS,
};

/// Id/name pair used by every lookup table (roles, regions, types...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
}

pub(crate) fn include_details(details: bool) -> Vec<(&'static str, &'static str)> {
    if details {
        vec![("includeDetails", "true")]
    } else {
        Vec::new()
    }
}

/// One client per backend service, sharing the configured timeout.
#[derive(Debug, Clone)]
pub struct ServiceClients {
    pub users: UserClient,
    pub properties: PropertyClient,
    pub documents: DocumentClient,
    pub requests: RentalRequestClient,
    pub leases: LeaseRecordClient,
    pub contact: ContactClient,
}

impl ServiceClients {
    pub fn from_config(endpoints: &ServiceEndpoints) -> Result<Self, ServiceError> {
        let timeout = endpoints.request_timeout;
        let transport = |service, url: &str| HttpTransport::new(service, url, timeout);

        let application = transport(Service::Application, &endpoints.application)?;
        Ok(Self {
            users: UserClient::new(transport(Service::User, &endpoints.user)?),
            properties: PropertyClient::new(transport(Service::Property, &endpoints.property)?),
            documents: DocumentClient::new(transport(Service::Document, &endpoints.document)?),
            requests: RentalRequestClient::new(application.clone()),
            leases: LeaseRecordClient::new(application),
            contact: ContactClient::new(transport(Service::Contact, &endpoints.contact)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn builds_one_client_per_service() {
        let endpoints = ServiceEndpoints {
            user: "http://users.local/api".to_string(),
            property: "http://properties.local/api".to_string(),
            document: "http://documents.local/api".to_string(),
            application: "http://applications.local/api".to_string(),
            contact: "http://contact.local/api".to_string(),
            request_timeout: Some(Duration::from_secs(2)),
        };
        let clients = ServiceClients::from_config(&endpoints).expect("clients build");
        assert_eq!(clients.requests.service(), Service::Application);
        assert_eq!(clients.leases.service(), Service::Application);
        assert_eq!(clients.contact.service(), Service::Contact);
    }

    #[test]
    fn details_flag_is_only_sent_when_requested() {
        assert!(include_details(false).is_empty());
        assert_eq!(include_details(true), vec![("includeDetails", "true")]);
    }
}
