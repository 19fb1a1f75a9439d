use async_trait::async_trait;

use super::documents::{Document, DocumentClient, NewDocument};
use super::transport::ServiceError;
use super::users::{Credentials, LoginResponse, NewAccount, User, UserClient};

/// Account operations the registration and login workflows depend on.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    async fn create_account(&self, account: &NewAccount) -> Result<User, ServiceError>;
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ServiceError>;
    async fn fetch_user(&self, id: i64) -> Result<User, ServiceError>;
}

/// Document registration as used by the wizard's submission loop.
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    async fn create_document(&self, document: &NewDocument) -> Result<Document, ServiceError>;
}

#[async_trait]
impl AccountGateway for UserClient {
    async fn create_account(&self, account: &NewAccount) -> Result<User, ServiceError> {
        UserClient::create_account(self, account).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ServiceError> {
        UserClient::login(self, credentials).await
    }

    async fn fetch_user(&self, id: i64) -> Result<User, ServiceError> {
        self.get(id, true).await
    }
}

#[async_trait]
impl DocumentGateway for DocumentClient {
    async fn create_document(&self, document: &NewDocument) -> Result<Document, ServiceError> {
        self.create(document).await
    }
}
