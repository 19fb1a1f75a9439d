//! Account registration wizard: personal data, identity documents, then the
//! account and document calls against the user and document services.

pub mod domain;
pub mod router;
pub mod submission;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{empty_slots, AccountKind, ApplicantDraft, Attachment, DocumentKind, DocumentSlot};
pub use router::{registration_router, DocumentUpload, RegistrationRequest};
pub use submission::{
    CreatedAccount, DocumentOutcome, DocumentSubmission, RegistrationSubmitter, SubmissionFailure,
    SubmissionReport, SubmissionStage,
};
pub use validation::{validate_documents, validate_personal_data};
pub use wizard::{RegistrationWizard, SuccessHook, WizardError, WizardStep, LANDING_PATH};
