use std::sync::Arc;

use tracing::{info, warn};

use crate::clients::{AccountGateway, Credentials, ServiceError, User};
use crate::session::{SessionError, SessionRecord, SessionStore, UserRole};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Por favor ingrese correo y contraseña")]
    MissingCredentials,
    #[error("{0}")]
    Rejected(String),
    #[error("{}", .0.user_message())]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Login, logout and "who am I" on top of the account gateway.
pub struct AuthService<A> {
    accounts: Arc<A>,
    session: SessionStore,
}

impl<A> AuthService<A>
where
    A: AccountGateway + 'static,
{
    pub fn new(accounts: Arc<A>, session: SessionStore) -> Self {
        Self { accounts, session }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let response = self
            .accounts
            .login(&Credentials {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await?;

        let user = match (response.success, response.user) {
            (true, Some(user)) => user,
            _ => {
                let message = if response.message.trim().is_empty() {
                    "Credenciales inválidas".to_string()
                } else {
                    response.message
                };
                warn!(%email, "login rejected");
                return Err(AuthError::Rejected(message));
            }
        };

        let role = UserRole::from_role_id(user.role_id);
        self.session.write(&SessionRecord {
            logged_in: true,
            user_id: Some(user.id),
            email: Some(user.email.clone()),
            role: Some(role),
        })?;
        info!(user_id = user.id, %role, "user logged in");
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.session.clear()?;
        Ok(())
    }

    /// `None` when nobody is stored in the session or the lookup fails.
    pub async fn current_user(&self) -> Option<User> {
        let record = match self.session.read() {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "session unreadable");
                return None;
            }
        };
        let user_id = record.user_id?;
        match self.accounts.fetch_user(user_id).await {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(user_id, error = %err, "current user lookup failed");
                None
            }
        }
    }
}
