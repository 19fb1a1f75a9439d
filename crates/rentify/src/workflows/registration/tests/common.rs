use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::clients::{
    AccountGateway, Credentials, Document, DocumentGateway, LoginResponse, NewAccount,
    NewDocument, Service, ServiceError, User,
};
use crate::config::RegistrationSettings;
use crate::session::SessionStore;
use crate::workflows::registration::{
    AccountKind, ApplicantDraft, Attachment, DocumentKind, RegistrationSubmitter,
    RegistrationWizard,
};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

pub(super) fn juan_draft() -> ApplicantDraft {
    ApplicantDraft {
        first_name: "Juan".to_string(),
        middle_name: None,
        last_name: "Pérez".to_string(),
        national_id: "12345678-9".to_string(),
        email: "juan@test.com".to_string(),
        phone: "+56912345678".to_string(),
        birth_date: "1995-05-15".to_string(),
        password: "password123".to_string(),
        confirm_password: "password123".to_string(),
        account_kind: Some(AccountKind::Tenant),
        referral_code: None,
    }
}

pub(super) fn required_attachments() -> Vec<(DocumentKind, Attachment)> {
    vec![
        (DocumentKind::Dni, Attachment::new("cedula.pdf", 120_000)),
        (
            DocumentKind::LiquidacionSueldo,
            Attachment::new("liquidacion.pdf", 80_000),
        ),
        (
            DocumentKind::CertificadoAntecedentes,
            Attachment::new("antecedentes.pdf", 64_000),
        ),
    ]
}

pub(super) fn user(id: i64, email: &str, role_id: i64) -> User {
    User {
        id,
        first_name: "Juan".to_string(),
        middle_name: None,
        last_name: "Pérez".to_string(),
        email: email.to_string(),
        national_id: "12345678-9".to_string(),
        phone: "+56912345678".to_string(),
        birth_date: Some("1995-05-15".to_string()),
        role_id,
        status_id: Some(1),
        institutional_affiliate: false,
        referral_code: None,
        points: None,
        role: None,
        status: None,
    }
}

pub(super) fn rejected(service: Service, status: u16, message: &str) -> ServiceError {
    ServiceError::Rejected {
        service,
        status,
        message: message.to_string(),
        server_message: true,
    }
}

#[derive(Default)]
pub(super) struct MemoryAccounts {
    created: Mutex<Vec<NewAccount>>,
    failure: Mutex<Option<ServiceError>>,
}

impl MemoryAccounts {
    pub(super) fn failing(error: ServiceError) -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            failure: Mutex::new(Some(error)),
        }
    }

    pub(super) fn created(&self) -> Vec<NewAccount> {
        self.created.lock().expect("accounts mutex poisoned").clone()
    }
}

#[async_trait]
impl AccountGateway for MemoryAccounts {
    async fn create_account(&self, account: &NewAccount) -> Result<User, ServiceError> {
        if let Some(error) = self.failure.lock().expect("accounts mutex poisoned").take() {
            return Err(error);
        }
        let mut created = self.created.lock().expect("accounts mutex poisoned");
        created.push(account.clone());
        Ok(user(
            100 + created.len() as i64,
            &account.email,
            account.role_id,
        ))
    }

    async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse, ServiceError> {
        Ok(LoginResponse {
            success: false,
            message: "not used".to_string(),
            user: None,
        })
    }

    async fn fetch_user(&self, id: i64) -> Result<User, ServiceError> {
        Ok(user(id, "juan@test.com", 3))
    }
}

/// Document gateway that fails the call at `fail_at` (0-based) once.
#[derive(Default)]
pub(super) struct MemoryDocuments {
    created: Mutex<Vec<NewDocument>>,
    fail_at: Mutex<Option<usize>>,
    calls: Mutex<usize>,
}

impl MemoryDocuments {
    pub(super) fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Mutex::new(Some(index)),
            ..Self::default()
        }
    }

    pub(super) fn created(&self) -> Vec<NewDocument> {
        self.created.lock().expect("documents mutex poisoned").clone()
    }
}

#[async_trait]
impl DocumentGateway for MemoryDocuments {
    async fn create_document(&self, document: &NewDocument) -> Result<Document, ServiceError> {
        let call = {
            let mut calls = self.calls.lock().expect("documents mutex poisoned");
            let call = *calls;
            *calls += 1;
            call
        };
        {
            let mut fail_at = self.fail_at.lock().expect("documents mutex poisoned");
            if *fail_at == Some(call) {
                *fail_at = None;
                return Err(rejected(
                    Service::Document,
                    500,
                    "Error al guardar el documento",
                ));
            }
        }
        let mut created = self.created.lock().expect("documents mutex poisoned");
        created.push(document.clone());
        Ok(Document {
            id: created.len() as i64,
            name: document.name.clone(),
            uploaded_at: None,
            user_id: document.user_id,
            status_id: document.status_id,
            type_id: document.type_id,
            status_name: None,
            type_name: None,
            user: None,
        })
    }
}

pub(super) fn submitter(
    accounts: Arc<MemoryAccounts>,
    documents: Arc<MemoryDocuments>,
) -> Arc<RegistrationSubmitter<MemoryAccounts, MemoryDocuments>> {
    Arc::new(RegistrationSubmitter::new(
        accounts,
        documents,
        RegistrationSettings::default(),
    ))
}

pub(super) fn wizard_with(
    accounts: Arc<MemoryAccounts>,
    documents: Arc<MemoryDocuments>,
    session: SessionStore,
) -> RegistrationWizard<MemoryAccounts, MemoryDocuments> {
    RegistrationWizard::new(submitter(accounts, documents), session)
}

/// Wizard already on the document step with every required slot filled.
pub(super) fn ready_wizard(
    accounts: Arc<MemoryAccounts>,
    documents: Arc<MemoryDocuments>,
    session: SessionStore,
) -> RegistrationWizard<MemoryAccounts, MemoryDocuments> {
    let mut wizard = wizard_with(accounts, documents, session);
    wizard.update_draft(today(), |draft| *draft = juan_draft());
    wizard.advance(today()).expect("personal data is valid");
    for (kind, attachment) in required_attachments() {
        wizard.attach(kind, attachment).expect("attach on document step");
    }
    wizard
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
