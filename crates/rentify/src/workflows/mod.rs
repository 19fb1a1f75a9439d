pub mod auth;
pub mod contact;
pub mod document_review;
mod field_errors;
pub mod listings;
pub mod registration;
pub mod rental_requests;

pub use auth::{AuthError, AuthService};
pub use contact::{ContactDraft, ContactError};
pub use document_review::{DocumentReview, ReviewError};
pub use field_errors::FieldErrors;
pub use listings::{ListingDraft, ListingError, ListingManager};
pub use rental_requests::RentalRequestError;
