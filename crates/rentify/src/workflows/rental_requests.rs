use tracing::{info, warn};

use crate::clients::{NewRentalRequest, RentalRequest, RentalRequestClient, ServiceError};
use crate::session::{SessionError, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum RentalRequestError {
    #[error("Por favor, ingrese un ID de usuario válido")]
    InvalidUser,
    #[error("Por favor, ingrese un ID de propiedad válido")]
    InvalidProperty,
    #[error("{}", .0.user_message())]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub fn validate_request(request: &NewRentalRequest) -> Result<(), RentalRequestError> {
    if request.user_id <= 0 {
        return Err(RentalRequestError::InvalidUser);
    }
    if request.property_id <= 0 {
        return Err(RentalRequestError::InvalidProperty);
    }
    Ok(())
}

/// Submits a request on behalf of an explicit user id.
///
/// Limits on active requests and the approved-document requirement are
/// enforced by the application service; its message is passed through.
pub async fn submit_request(
    client: &RentalRequestClient,
    request: NewRentalRequest,
) -> Result<RentalRequest, RentalRequestError> {
    validate_request(&request)?;
    match client.create(&request).await {
        Ok(created) => Ok(created),
        Err(err) => {
            warn!(
                user_id = request.user_id,
                property_id = request.property_id,
                error = %err,
                "rental request refused"
            );
            Err(err.into())
        }
    }
}

/// Requests a listing for whoever is logged in.
pub async fn request_rental(
    client: &RentalRequestClient,
    session: &SessionStore,
    property_id: i64,
) -> Result<RentalRequest, RentalRequestError> {
    let record = session.require_login()?;
    let user_id = record.user_id.ok_or(RentalRequestError::InvalidUser)?;
    let created = submit_request(
        client,
        NewRentalRequest {
            user_id,
            property_id,
        },
    )
    .await?;
    info!(request_id = created.id, user_id, property_id, "listing requested");
    Ok(created)
}

/// Requests filed by the logged-in user, with property details.
pub async fn my_requests(
    client: &RentalRequestClient,
    session: &SessionStore,
) -> Result<Vec<RentalRequest>, RentalRequestError> {
    let record = session.require_login()?;
    let user_id = record.user_id.ok_or(RentalRequestError::InvalidUser)?;
    Ok(client.list_by_user(user_id, true).await?)
}
