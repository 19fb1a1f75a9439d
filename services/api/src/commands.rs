use crate::infra::{parse_date, parse_document, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Subcommand, ValueEnum};
use rentify::clients::{Currency, Document, Property, PropertyFilters, RentalRequest};
use rentify::error::AppError;
use rentify::workflows::contact::{self, ContactDraft};
use rentify::workflows::listings::{
    ListingDraft, ListingManager, CREATED_MESSAGE, DELETED_MESSAGE, UPDATED_MESSAGE,
};
use rentify::workflows::registration::{
    AccountKind, Attachment, DocumentKind, DocumentSubmission, RegistrationSubmitter,
    RegistrationWizard, SubmissionReport,
};
use rentify::workflows::{rental_requests, AuthService, DocumentReview};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) password: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum AccountKindArg {
    Propietario,
    Arriendatario,
}

impl From<AccountKindArg> for AccountKind {
    fn from(value: AccountKindArg) -> Self {
        match value {
            AccountKindArg::Propietario => AccountKind::Owner,
            AccountKindArg::Arriendatario => AccountKind::Tenant,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub(crate) first_name: String,
    #[arg(long)]
    pub(crate) middle_name: Option<String>,
    #[arg(long)]
    pub(crate) last_name: String,
    /// RUT without dots, e.g. 12345678-9
    #[arg(long)]
    pub(crate) rut: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) phone: String,
    /// Birth date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) birth_date: String,
    #[arg(long)]
    pub(crate) password: String,
    /// Defaults to --password
    #[arg(long)]
    pub(crate) confirm_password: Option<String>,
    #[arg(long, value_enum)]
    pub(crate) account_kind: AccountKindArg,
    #[arg(long)]
    pub(crate) referral_code: Option<String>,
    /// Identity document as KIND=FILE (repeatable), e.g. DNI=cedula.pdf
    #[arg(long = "document", value_parser = parse_document)]
    pub(crate) documents: Vec<(DocumentKind, Attachment)>,
    /// Reference date for the age check (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SearchArgs {
    #[arg(long)]
    pub(crate) type_id: Option<i64>,
    #[arg(long)]
    pub(crate) comuna_id: Option<i64>,
    #[arg(long)]
    pub(crate) min_price: Option<f64>,
    #[arg(long)]
    pub(crate) max_price: Option<f64>,
    #[arg(long)]
    pub(crate) min_bedrooms: Option<u32>,
    #[arg(long)]
    pub(crate) pet_friendly: Option<bool>,
}

impl SearchArgs {
    /// `None` when no criterion was given, so the plain listing is used.
    fn filters(&self) -> Option<PropertyFilters> {
        let filters = PropertyFilters {
            type_id: self.type_id,
            comuna_id: self.comuna_id,
            min_price: self.min_price,
            max_price: self.max_price,
            min_bedrooms: self.min_bedrooms,
            pet_friendly: self.pet_friendly,
            include_details: None,
        };
        if filters == PropertyFilters::default() {
            return None;
        }
        Some(PropertyFilters {
            include_details: Some(true),
            ..filters
        })
    }
}

#[derive(Args, Debug)]
pub(crate) struct ListingArgs {
    /// Listing code; generated when omitted
    #[arg(long, default_value = "")]
    pub(crate) code: String,
    #[arg(long)]
    pub(crate) title: String,
    #[arg(long)]
    pub(crate) description: Option<String>,
    #[arg(long)]
    pub(crate) address: String,
    /// Monthly price
    #[arg(long)]
    pub(crate) price: f64,
    #[arg(long, value_parser = parse_currency, default_value = "CLP")]
    pub(crate) currency: Currency,
    #[arg(long)]
    pub(crate) m2: f64,
    #[arg(long, default_value_t = 0)]
    pub(crate) bedrooms: u32,
    #[arg(long, default_value_t = 0)]
    pub(crate) bathrooms: u32,
    #[arg(long)]
    pub(crate) pet_friendly: bool,
    #[arg(long)]
    pub(crate) type_id: i64,
    #[arg(long)]
    pub(crate) comuna_id: i64,
}

impl From<ListingArgs> for ListingDraft {
    fn from(args: ListingArgs) -> Self {
        Self {
            code: args.code,
            title: args.title,
            description: args.description,
            address: args.address,
            monthly_price: args.price,
            currency: args.currency,
            square_meters: args.m2,
            bedrooms: args.bedrooms,
            bathrooms: args.bathrooms,
            pet_friendly: args.pet_friendly,
            type_id: args.type_id,
            comuna_id: args.comuna_id,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum PropertiesCommand {
    /// List listings, optionally filtered
    List(SearchArgs),
    /// Show one listing with details
    Show { id: i64 },
    /// Listings managed by the logged-in owner (all of them for admins)
    Mine,
    /// Publish a new listing
    Create(ListingArgs),
    /// Replace a listing's data
    Update {
        id: i64,
        #[command(flatten)]
        listing: ListingArgs,
    },
    /// Remove a listing
    Delete { id: i64 },
    /// Available comunas
    Comunas,
}

#[derive(Subcommand, Debug)]
pub(crate) enum DocumentsCommand {
    /// Documents uploaded by the logged-in user
    Mine,
    /// Documents waiting for review (admin)
    Pending,
    /// Accept a document (admin)
    Approve { id: i64 },
    /// Reject a document with observations (admin)
    Reject {
        id: i64,
        #[arg(long)]
        observations: String,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum RequestsCommand {
    /// Request a listing for the logged-in user
    Create {
        #[arg(long)]
        property_id: i64,
    },
    /// Requests filed by the logged-in user
    Mine,
}

#[derive(Args, Debug)]
pub(crate) struct ContactArgs {
    #[arg(long)]
    pub(crate) nombre: String,
    #[arg(long)]
    pub(crate) apellidos: String,
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) mensaje: String,
    #[arg(long)]
    pub(crate) asunto: Option<String>,
    #[arg(long)]
    pub(crate) telefono: Option<String>,
}

fn parse_currency(raw: &str) -> Result<Currency, String> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "CLP" => Ok(Currency::Clp),
        "USD" => Ok(Currency::Usd),
        "EUR" => Ok(Currency::Eur),
        other => Err(format!("unsupported currency '{other}' (CLP, USD or EUR)")),
    }
}

fn currency_code(currency: Currency) -> &'static str {
    match currency {
        Currency::Clp => "CLP",
        Currency::Usd => "USD",
        Currency::Eur => "EUR",
    }
}

pub(crate) fn format_property(property: &Property) -> String {
    let comuna = property
        .comuna
        .as_ref()
        .map(|comuna| format!(" ({})", comuna.name))
        .unwrap_or_default();
    format!(
        "#{} [{}] {} - {}{} - {:.0} {} | {} m2, {} hab, {} baños{}",
        property.id,
        property.code,
        property.title,
        property.address,
        comuna,
        property.monthly_price,
        currency_code(property.currency),
        property.square_meters,
        property.bedrooms,
        property.bathrooms,
        if property.pet_friendly { " | pet friendly" } else { "" },
    )
}

fn format_document(document: &Document) -> String {
    let status = document
        .status_name
        .clone()
        .or_else(|| document.status().map(|status| status.as_str().to_string()))
        .unwrap_or_else(|| format!("estado {}", document.status_id));
    let kind = document
        .type_name
        .clone()
        .unwrap_or_else(|| format!("tipo {}", document.type_id));
    format!(
        "#{} {} ({}) usuario {} -> {}",
        document.id, document.name, kind, document.user_id, status
    )
}

fn format_request(request: &RentalRequest) -> String {
    let status = request
        .status
        .map(|status| status.as_str())
        .unwrap_or("SIN ESTADO");
    let title = request
        .property
        .as_ref()
        .map(|property| format!(" {}", property.title))
        .unwrap_or_default();
    format!(
        "#{} propiedad {}{} -> {}",
        request.id, request.property_id, title, status
    )
}

fn print_report(report: &SubmissionReport) {
    if let Some(account) = &report.account {
        println!(
            "Cuenta creada: #{} {} ({})",
            account.user_id, account.email, account.role
        );
    }
    for outcome in &report.documents {
        let status = match &outcome.submission {
            DocumentSubmission::Created { document_id } => format!("registrado #{document_id}"),
            DocumentSubmission::Failed { message } => format!("falló: {message}"),
            DocumentSubmission::NotAttempted => "no enviado".to_string(),
        };
        println!("  - {} {}: {}", outcome.kind.label(), outcome.file_name, status);
    }
}

pub(crate) async fn run_login(args: LoginArgs) -> Result<(), AppError> {
    let ctx = Context::load()?;
    let auth = AuthService::new(Arc::new(ctx.clients.users), ctx.session);
    let user = auth.login(&args.email, &args.password).await?;
    println!(
        "Bienvenido {} ({})",
        user.display_name(),
        rentify::UserRole::from_role_id(user.role_id)
    );
    Ok(())
}

pub(crate) fn run_logout() -> Result<(), AppError> {
    let ctx = Context::load()?;
    ctx.session.clear()?;
    println!("Sesión cerrada");
    Ok(())
}

pub(crate) async fn run_whoami() -> Result<(), AppError> {
    let ctx = Context::load()?;
    let record = ctx.session.read()?;
    let auth = AuthService::new(Arc::new(ctx.clients.users), ctx.session);
    match auth.current_user().await {
        Some(user) => {
            println!("{} <{}>", user.display_name(), user.email);
            if let Some(role) = record.role {
                println!("Rol: {role}");
            }
            if !record.logged_in {
                println!("Registro incompleto: la sesión no está activa");
            }
        }
        None => println!("No hay sesión activa"),
    }
    Ok(())
}

pub(crate) async fn run_register(args: RegisterArgs) -> Result<(), AppError> {
    let ctx = Context::load()?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let submitter = Arc::new(RegistrationSubmitter::new(
        Arc::new(ctx.clients.users),
        Arc::new(ctx.clients.documents),
        ctx.config.registration.clone(),
    ));

    let mut wizard = RegistrationWizard::new(submitter, ctx.session).on_registered(|record| {
        if let Some(email) = &record.email {
            println!("Registro completado, sesión iniciada como {email}");
        }
    });

    let RegisterArgs {
        first_name,
        middle_name,
        last_name,
        rut,
        email,
        phone,
        birth_date,
        password,
        confirm_password,
        account_kind,
        referral_code,
        documents,
        ..
    } = args;
    wizard.update_draft(today, |draft| {
        draft.first_name = first_name;
        draft.middle_name = middle_name;
        draft.last_name = last_name;
        draft.national_id = rut;
        draft.email = email;
        draft.phone = phone;
        draft.birth_date = birth_date;
        draft.confirm_password = confirm_password.unwrap_or_else(|| password.clone());
        draft.password = password;
        draft.account_kind = Some(account_kind.into());
        draft.referral_code = referral_code;
    });

    wizard.advance(today)?;
    for (kind, attachment) in documents {
        wizard.attach(kind, attachment)?;
    }

    match wizard.submit().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(err) => {
            if let Some(report) = wizard.last_report() {
                print_report(report);
            }
            Err(err.into())
        }
    }
}

pub(crate) async fn run_properties(command: PropertiesCommand) -> Result<(), AppError> {
    let ctx = Context::load()?;
    let properties = ctx.clients.properties.clone();
    let manager = ListingManager::new(ctx.clients.properties, ctx.session);

    match command {
        PropertiesCommand::List(search) => {
            let listings = match search.filters() {
                Some(filters) => properties.search(&filters).await?,
                None => properties.list(true).await?,
            };
            if listings.is_empty() {
                println!("No hay propiedades que coincidan");
            }
            for property in &listings {
                println!("{}", format_property(property));
            }
        }
        PropertiesCommand::Show { id } => {
            let property = properties.get(id, true).await?;
            println!("{}", format_property(&property));
            if let Some(description) = &property.description {
                println!("{description}");
            }
            for photo in &property.photos {
                println!("  foto: {}", photo.url);
            }
        }
        PropertiesCommand::Mine => {
            for property in manager.list_for_session().await? {
                println!("{}", format_property(&property));
            }
        }
        PropertiesCommand::Create(listing) => {
            let created = manager.create(&listing.into()).await?;
            println!("{CREATED_MESSAGE}: {}", format_property(&created));
        }
        PropertiesCommand::Update { id, listing } => {
            let updated = manager.update(id, &listing.into()).await?;
            println!("{UPDATED_MESSAGE}: {}", format_property(&updated));
        }
        PropertiesCommand::Delete { id } => {
            manager.delete(id).await?;
            println!("{DELETED_MESSAGE}");
        }
        PropertiesCommand::Comunas => {
            for comuna in properties.comunas().await? {
                println!("{} {}", comuna.id, comuna.name);
            }
        }
    }
    Ok(())
}

pub(crate) async fn run_documents(command: DocumentsCommand) -> Result<(), AppError> {
    let ctx = Context::load()?;
    let documents = ctx.clients.documents.clone();
    let session = ctx.session.clone();
    let review = DocumentReview::new(ctx.clients.documents, ctx.session);

    match command {
        DocumentsCommand::Mine => {
            let record = session.require_login()?;
            let user_id = record.user_id.unwrap_or_default();
            for document in documents.list_by_user(user_id, true).await? {
                println!("{}", format_document(&document));
            }
        }
        DocumentsCommand::Pending => {
            let queue = review.pending_queue().await?;
            if queue.is_empty() {
                println!("No hay documentos pendientes");
            }
            for document in &queue {
                println!("{}", format_document(document));
            }
        }
        DocumentsCommand::Approve { id } => {
            let document = review.approve(id).await?;
            println!("Documento aprobado: {}", format_document(&document));
        }
        DocumentsCommand::Reject { id, observations } => {
            let document = review.reject(id, &observations).await?;
            println!("Documento rechazado: {}", format_document(&document));
        }
    }
    Ok(())
}

pub(crate) async fn run_requests(command: RequestsCommand) -> Result<(), AppError> {
    let ctx = Context::load()?;
    let client = ctx.clients.requests;

    match command {
        RequestsCommand::Create { property_id } => {
            let created = rental_requests::request_rental(&client, &ctx.session, property_id).await?;
            println!("Solicitud enviada: {}", format_request(&created));
        }
        RequestsCommand::Mine => {
            for request in rental_requests::my_requests(&client, &ctx.session).await? {
                println!("{}", format_request(&request));
            }
        }
    }
    Ok(())
}

pub(crate) async fn run_contact(args: ContactArgs) -> Result<(), AppError> {
    let ctx = Context::load()?;
    let draft = ContactDraft {
        first_name: args.nombre,
        last_names: args.apellidos,
        email: args.email,
        message: args.mensaje,
        subject: args.asunto,
        phone: args.telefono,
    };
    let thanks = contact::send(&ctx.clients.contact, &ctx.session, &draft).await?;
    println!("{thanks}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_flag_is_case_insensitive() {
        assert_eq!(parse_currency("usd"), Ok(Currency::Usd));
        assert_eq!(parse_currency(" CLP "), Ok(Currency::Clp));
        assert!(parse_currency("ARS").is_err());
    }

    #[test]
    fn empty_search_lists_everything() {
        assert!(SearchArgs::default().filters().is_none());
        let search = SearchArgs {
            comuna_id: Some(13),
            ..SearchArgs::default()
        };
        assert_eq!(search.filters().and_then(|f| f.comuna_id), Some(13));
    }

    #[test]
    fn property_line_shows_price_and_rooms() {
        let property: Property = serde_json::from_value(serde_json::json!({
            "id": 3,
            "codigo": "WEB-9",
            "titulo": "Depto Ñuñoa",
            "direccion": "Irarrázaval 100",
            "precioMensual": 420000.0,
            "m2": 48.0,
            "nHabit": 2,
            "nBanos": 1,
            "petFriendly": true,
            "comuna": { "id": 13, "nombre": "Ñuñoa" }
        }))
        .expect("valid property");

        assert_eq!(
            format_property(&property),
            "#3 [WEB-9] Depto Ñuñoa - Irarrázaval 100 (Ñuñoa) - 420000 CLP | 48 m2, 2 hab, 1 baños | pet friendly"
        );
    }
}
