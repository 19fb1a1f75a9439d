use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{AccountKind, ApplicantDraft, DocumentKind, DocumentSlot};
use crate::clients::{
    AccountGateway, DocumentGateway, DocumentStatus, NewAccount, NewDocument, ServiceError,
    ServiceErrorKind, ACTIVE_ACCOUNT_STATUS,
};
use crate::config::RegistrationSettings;
use crate::session::{SessionError, SessionRecord, SessionStore, UserRole};

/// Account created during a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAccount {
    pub user_id: i64,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentSubmission {
    Created { document_id: i64 },
    Failed { message: String },
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub kind: DocumentKind,
    pub file_name: String,
    #[serde(flatten)]
    pub submission: DocumentSubmission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStage {
    Account,
    Document { kind: DocumentKind },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionFailure {
    pub stage: SubmissionStage,
    pub kind: ServiceErrorKind,
    pub message: String,
}

/// Which calls of a submission went through. Calls are never rolled back,
/// so a failed report with an account means that account exists upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub account: Option<CreatedAccount>,
    pub documents: Vec<DocumentOutcome>,
    pub failure: Option<SubmissionFailure>,
}

impl SubmissionReport {
    pub fn is_complete(&self) -> bool {
        self.account.is_some() && self.failure.is_none()
    }

    pub fn created_documents(&self) -> usize {
        self.documents
            .iter()
            .filter(|outcome| matches!(outcome.submission, DocumentSubmission::Created { .. }))
            .count()
    }

    fn fail(&mut self, stage: SubmissionStage, error: &ServiceError) {
        self.failure = Some(SubmissionFailure {
            stage,
            kind: error.kind(),
            message: error.user_message(),
        });
    }
}

/// Issues the account call followed by one document call per attached slot.
pub struct RegistrationSubmitter<A, D> {
    accounts: Arc<A>,
    documents: Arc<D>,
    settings: RegistrationSettings,
}

impl<A, D> RegistrationSubmitter<A, D>
where
    A: AccountGateway + 'static,
    D: DocumentGateway + 'static,
{
    pub fn new(accounts: Arc<A>, documents: Arc<D>, settings: RegistrationSettings) -> Self {
        Self {
            accounts,
            documents,
            settings,
        }
    }

    pub fn is_affiliate(&self, email: &str) -> bool {
        let email = email.trim().to_ascii_lowercase();
        self.settings
            .affiliate_domains
            .iter()
            .any(|domain| email.ends_with(&format!("@{domain}")))
    }

    pub fn account_payload(&self, draft: &ApplicantDraft, kind: AccountKind) -> NewAccount {
        let optional = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        NewAccount {
            first_name: draft.first_name.trim().to_string(),
            middle_name: optional(&draft.middle_name),
            last_name: draft.last_name.trim().to_string(),
            birth_date: draft.birth_date.trim().to_string(),
            email: draft.email.trim().to_string(),
            national_id: draft.national_id.trim().to_string(),
            phone: draft.phone.chars().filter(|c| !c.is_whitespace()).collect(),
            password: draft.password.clone(),
            status_id: ACTIVE_ACCOUNT_STATUS,
            role_id: kind.role_id(),
            institutional_affiliate: self.is_affiliate(&draft.email),
            referral_code: optional(&draft.referral_code),
        }
    }

    /// Runs the calls in catalogue order and stops at the first failure.
    ///
    /// The session receives the new account (not yet logged in) as soon as it
    /// exists, and is marked logged in only after every document went through.
    pub async fn submit(
        &self,
        session: &SessionStore,
        draft: &ApplicantDraft,
        kind: AccountKind,
        slots: &[DocumentSlot],
    ) -> Result<SubmissionReport, SessionError> {
        let attached: Vec<_> = slots
            .iter()
            .filter_map(|slot| slot.attachment.as_ref().map(|file| (slot.kind, file)))
            .collect();
        let mut report = SubmissionReport {
            documents: attached
                .iter()
                .map(|(kind, file)| DocumentOutcome {
                    kind: *kind,
                    file_name: file.file_name.clone(),
                    submission: DocumentSubmission::NotAttempted,
                })
                .collect(),
            ..SubmissionReport::default()
        };

        let payload = self.account_payload(draft, kind);
        let user = match self.accounts.create_account(&payload).await {
            Ok(user) => user,
            Err(err) => {
                warn!(email = %payload.email, error = %err, "account creation failed");
                report.fail(SubmissionStage::Account, &err);
                return Ok(report);
            }
        };

        let account = CreatedAccount {
            user_id: user.id,
            email: if user.email.is_empty() {
                payload.email.clone()
            } else {
                user.email.clone()
            },
            role: kind.role(),
        };
        session.write(&SessionRecord {
            logged_in: false,
            user_id: Some(account.user_id),
            email: Some(account.email.clone()),
            role: Some(account.role),
        })?;
        info!(user_id = account.user_id, role = %account.role, "registration account created");
        report.account = Some(account.clone());

        for (index, (doc_kind, file)) in attached.iter().enumerate() {
            let document = NewDocument {
                name: file.file_name.clone(),
                user_id: account.user_id,
                status_id: DocumentStatus::Pendiente.id(),
                type_id: doc_kind.type_id(),
            };
            match self.documents.create_document(&document).await {
                Ok(created) => {
                    info!(user_id = account.user_id, kind = %doc_kind, document_id = created.id, "document submitted");
                    report.documents[index].submission = DocumentSubmission::Created {
                        document_id: created.id,
                    };
                }
                Err(err) => {
                    warn!(user_id = account.user_id, kind = %doc_kind, error = %err, "document submission failed");
                    report.documents[index].submission = DocumentSubmission::Failed {
                        message: err.user_message(),
                    };
                    report.fail(SubmissionStage::Document { kind: *doc_kind }, &err);
                    return Ok(report);
                }
            }
        }

        session.write(&SessionRecord {
            logged_in: true,
            user_id: Some(account.user_id),
            email: Some(account.email),
            role: Some(account.role),
        })?;
        Ok(report)
    }
}
