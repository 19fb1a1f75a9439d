use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{empty_slots, ApplicantDraft, Attachment, DocumentKind, DocumentSlot};
use super::submission::{RegistrationSubmitter, SubmissionReport};
use super::validation::{validate_documents, validate_personal_data};
use crate::clients::{AccountGateway, DocumentGateway};
use crate::session::{SessionError, SessionRecord, SessionStore};
use crate::workflows::FieldErrors;

/// Where the user lands once registration is done.
pub const LANDING_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    CollectingPersonalData,
    CollectingDocuments,
    Submitting,
    Done,
}

impl WizardStep {
    pub const fn label(self) -> &'static str {
        match self {
            WizardStep::CollectingPersonalData => "collecting_personal_data",
            WizardStep::CollectingDocuments => "collecting_documents",
            WizardStep::Submitting => "submitting",
            WizardStep::Done => "done",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Por favor corrige los campos marcados ({0})")]
    Invalid(FieldErrors),
    #[error("cannot {action} from step {}", .step.label())]
    InvalidTransition {
        step: WizardStep,
        action: &'static str,
    },
    #[error("{message}")]
    SubmissionFailed {
        message: String,
        report: Box<SubmissionReport>,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type SuccessHook = Box<dyn Fn(&SessionRecord) + Send + Sync>;

/// Two-step registration flow: personal data, then identity documents.
pub struct RegistrationWizard<A, D> {
    submitter: Arc<RegistrationSubmitter<A, D>>,
    session: SessionStore,
    step: WizardStep,
    draft: ApplicantDraft,
    slots: Vec<DocumentSlot>,
    errors: FieldErrors,
    last_error: Option<String>,
    last_report: Option<SubmissionReport>,
    on_registered: Option<SuccessHook>,
}

impl<A, D> fmt::Debug for RegistrationWizard<A, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationWizard")
            .field("step", &self.step)
            .field("errors", &self.errors)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl<A, D> RegistrationWizard<A, D>
where
    A: AccountGateway + 'static,
    D: DocumentGateway + 'static,
{
    pub fn new(submitter: Arc<RegistrationSubmitter<A, D>>, session: SessionStore) -> Self {
        Self {
            submitter,
            session,
            step: WizardStep::CollectingPersonalData,
            draft: ApplicantDraft::default(),
            slots: empty_slots(),
            errors: FieldErrors::new(),
            last_error: None,
            last_report: None,
            on_registered: None,
        }
    }

    pub fn on_registered(mut self, hook: impl Fn(&SessionRecord) + Send + Sync + 'static) -> Self {
        self.on_registered = Some(Box::new(hook));
        self
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &ApplicantDraft {
        &self.draft
    }

    /// Applies an edit to the personal data.
    ///
    /// Once a failed `advance` has flagged fields, every edit re-runs the
    /// rules so a corrected field drops its message. An untouched form stays
    /// clean.
    pub fn update_draft(&mut self, today: NaiveDate, edit: impl FnOnce(&mut ApplicantDraft)) {
        edit(&mut self.draft);
        if self.step == WizardStep::CollectingPersonalData && !self.errors.is_empty() {
            self.errors = validate_personal_data(&self.draft, today);
        }
    }

    pub fn slots(&self) -> &[DocumentSlot] {
        &self.slots
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_report(&self) -> Option<&SubmissionReport> {
        self.last_report.as_ref()
    }

    /// Set once the wizard is done.
    pub fn landing_path(&self) -> Option<&'static str> {
        (self.step == WizardStep::Done).then_some(LANDING_PATH)
    }

    pub fn can_advance(&self, today: NaiveDate) -> bool {
        self.step == WizardStep::CollectingPersonalData
            && validate_personal_data(&self.draft, today).is_empty()
    }

    pub fn can_submit(&self) -> bool {
        self.step == WizardStep::CollectingDocuments && validate_documents(&self.slots).is_empty()
    }

    pub fn attach(&mut self, kind: DocumentKind, attachment: Attachment) -> Result<(), WizardError> {
        self.expect_step(WizardStep::CollectingDocuments, "attach documents")?;
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.kind == kind) {
            slot.attachment = Some(attachment);
        }
        self.errors.remove(kind.wire_name());
        Ok(())
    }

    pub fn detach(&mut self, kind: DocumentKind) -> Result<(), WizardError> {
        self.expect_step(WizardStep::CollectingDocuments, "detach documents")?;
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.kind == kind) {
            slot.attachment = None;
        }
        Ok(())
    }

    /// Personal data → documents. Stays put and records the errors on failure.
    pub fn advance(&mut self, today: NaiveDate) -> Result<(), WizardError> {
        self.expect_step(WizardStep::CollectingPersonalData, "advance")?;
        let errors = validate_personal_data(&self.draft, today);
        if !errors.is_empty() {
            debug!(fields = errors.len(), "personal data rejected");
            self.errors = errors.clone();
            return Err(WizardError::Invalid(errors));
        }
        self.errors.clear();
        self.step = WizardStep::CollectingDocuments;
        Ok(())
    }

    pub fn back(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::CollectingDocuments, "go back")?;
        self.errors.clear();
        self.step = WizardStep::CollectingPersonalData;
        Ok(())
    }

    /// Creates the account and registers every attached document.
    ///
    /// On failure the wizard returns to the document step; submitting again
    /// creates the account again.
    pub async fn submit(&mut self) -> Result<SubmissionReport, WizardError> {
        self.expect_step(WizardStep::CollectingDocuments, "submit")?;

        let errors = validate_documents(&self.slots);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(WizardError::Invalid(errors));
        }
        let Some(kind) = self.draft.account_kind else {
            let mut errors = FieldErrors::new();
            errors.insert("rol", "Debe seleccionar un tipo de cuenta");
            self.errors = errors.clone();
            return Err(WizardError::Invalid(errors));
        };

        self.errors.clear();
        self.last_error = None;
        self.step = WizardStep::Submitting;

        let outcome = self
            .submitter
            .submit(&self.session, &self.draft, kind, &self.slots)
            .await;
        let report = match outcome {
            Ok(report) => report,
            Err(err) => {
                self.step = WizardStep::CollectingDocuments;
                self.last_error = Some(err.to_string());
                return Err(err.into());
            }
        };
        self.last_report = Some(report.clone());

        if let Some(failure) = &report.failure {
            warn!(stage = ?failure.stage, kind = ?failure.kind, "registration submission failed");
            self.step = WizardStep::CollectingDocuments;
            self.last_error = Some(failure.message.clone());
            return Err(WizardError::SubmissionFailed {
                message: failure.message.clone(),
                report: Box::new(report),
            });
        }

        self.step = WizardStep::Done;
        let record = self.session.read()?;
        info!(user_id = record.user_id, "registration completed");
        if let Some(hook) = &self.on_registered {
            hook(&record);
        }
        Ok(report)
    }

    fn expect_step(&self, expected: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(WizardError::InvalidTransition {
                step: self.step,
                action,
            })
        }
    }
}
