use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rentify::clients::ServiceClients;
use rentify::config::AppConfig;
use rentify::error::AppError;
use rentify::session::SessionStore;
use rentify::telemetry;
use rentify::workflows::registration::{Attachment, DocumentKind};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Everything a terminal command needs: configuration, one client per
/// service and the persisted session.
pub(crate) struct Context {
    pub(crate) config: AppConfig,
    pub(crate) clients: ServiceClients,
    pub(crate) session: SessionStore,
}

impl Context {
    pub(crate) fn load() -> Result<Self, AppError> {
        let config = AppConfig::load()?;
        telemetry::init(&config.telemetry)?;
        let clients = ServiceClients::from_config(&config.services)?;
        let session = SessionStore::file(config.session.path.clone());
        Ok(Self {
            config,
            clients,
            session,
        })
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

/// Parses `KIND=FILE` as given to `register --document`.
pub(crate) fn parse_document(raw: &str) -> Result<(DocumentKind, Attachment), String> {
    let (kind, file) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KIND=FILE, got '{raw}'"))?;
    let kind = DocumentKind::parse(kind.trim())
        .ok_or_else(|| format!("unknown document kind '{}'", kind.trim()))?;
    let file = file.trim();
    if file.is_empty() {
        return Err(format!("missing file name for {}", kind.wire_name()));
    }
    let size_bytes = std::fs::metadata(file).map(|meta| meta.len()).unwrap_or(0);
    Ok((kind, Attachment::new(file, size_bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_arguments_need_kind_and_file() {
        let (kind, attachment) = parse_document("DNI=cedula.pdf").expect("parses");
        assert_eq!(kind, DocumentKind::Dni);
        assert_eq!(attachment.file_name, "cedula.pdf");

        assert!(parse_document("cedula.pdf").is_err());
        assert!(parse_document("BOLETA=x.pdf").is_err());
        assert!(parse_document("DNI=").is_err());
    }

    #[test]
    fn dates_use_iso_format() {
        assert_eq!(
            parse_date("2025-06-01"),
            Ok(NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"))
        );
        assert!(parse_date("01/06/2025").is_err());
    }
}
