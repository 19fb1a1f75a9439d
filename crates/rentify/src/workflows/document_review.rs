use tracing::info;

use crate::clients::{Document, DocumentClient, DocumentStatus, ServiceError};
use crate::session::{SessionError, SessionRecord, SessionStore, UserRole};

pub const MIN_OBSERVATION_CHARS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Las observaciones de rechazo son obligatorias y deben ser más detalladas.")]
    MissingObservations,
    #[error("{}", .0.user_message())]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub fn validate_observations(observations: &str) -> Result<(), ReviewError> {
    if observations.trim().chars().count() < MIN_OBSERVATION_CHARS {
        return Err(ReviewError::MissingObservations);
    }
    Ok(())
}

/// Administrator queue for uploaded identity documents.
#[derive(Debug, Clone)]
pub struct DocumentReview {
    documents: DocumentClient,
    session: SessionStore,
}

impl DocumentReview {
    pub fn new(documents: DocumentClient, session: SessionStore) -> Self {
        Self { documents, session }
    }

    fn reviewer(&self) -> Result<SessionRecord, ReviewError> {
        Ok(self.session.require_role(UserRole::Admin)?)
    }

    pub async fn pending_queue(&self) -> Result<Vec<Document>, ReviewError> {
        self.reviewer()?;
        let documents = self.documents.list(true).await?;
        Ok(documents
            .into_iter()
            .filter(|document| document.status() == Some(DocumentStatus::Pendiente))
            .collect())
    }

    pub async fn approve(&self, id: i64) -> Result<Document, ReviewError> {
        let reviewer = self.reviewer()?;
        let document = self
            .documents
            .update_status(id, DocumentStatus::Aceptado)
            .await?;
        info!(document_id = id, reviewer = ?reviewer.user_id, "document approved");
        Ok(document)
    }

    /// The observations are only checked here; the document service keeps
    /// no field for them.
    pub async fn reject(&self, id: i64, observations: &str) -> Result<Document, ReviewError> {
        let reviewer = self.reviewer()?;
        validate_observations(observations)?;
        let document = self
            .documents
            .update_status(id, DocumentStatus::Rechazado)
            .await?;
        info!(
            document_id = id,
            reviewer = ?reviewer.user_id,
            observations = observations.trim(),
            "document rejected"
        );
        Ok(document)
    }
}
