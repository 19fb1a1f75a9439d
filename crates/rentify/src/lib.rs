//! Rentify platform client: service clients for the rental microservices,
//! a typed session store and the user-facing workflows built on them.

pub mod clients;
pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod workflows;

pub use clients::{ServiceClients, ServiceError, ServiceErrorKind};
pub use config::AppConfig;
pub use error::AppError;
pub use session::{SessionRecord, SessionStore, UserRole};
