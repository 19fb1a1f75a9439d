use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use super::domain::{ApplicantDraft, DocumentSlot};
use crate::workflows::FieldErrors;

static RUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{7,8}-[\dkK]$").expect("rut pattern is valid"));

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.-]+@([\w-]+\.)+[\w-]{2,4}$").expect("email pattern is valid")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?56)?9\d{8}$").expect("phone pattern is valid"));

pub const MINIMUM_AGE: i32 = 18;
pub const MINIMUM_PASSWORD_LENGTH: usize = 8;

pub fn validate_first_name(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("El primer nombre es obligatorio");
    }
    Ok(())
}

pub fn validate_last_name(value: &str) -> Result<(), &'static str> {
    if value.trim().is_empty() {
        return Err("El apellido paterno es obligatorio");
    }
    Ok(())
}

pub fn validate_rut(value: &str) -> Result<(), &'static str> {
    let value = value.trim();
    if value.is_empty() {
        return Err("El RUT es obligatorio");
    }
    if !RUT_RE.is_match(value) {
        return Err("Formato de RUT inválido (ej: 12345678-9)");
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), &'static str> {
    let value = value.trim();
    if value.is_empty() {
        return Err("El correo es obligatorio");
    }
    if !EMAIL_RE.is_match(value) {
        return Err("Formato de correo inválido");
    }
    Ok(())
}

/// Chilean mobile numbers, optionally prefixed with `56` or `+56`. Spaces are ignored.
pub fn validate_phone(value: &str) -> Result<(), &'static str> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err("El teléfono es obligatorio");
    }
    if !PHONE_RE.is_match(&compact) {
        return Err("Formato de teléfono inválido (ej: +56912345678)");
    }
    Ok(())
}

/// Age is the difference of calendar years; day and month are not considered.
pub fn validate_birth_date(value: &str, today: NaiveDate) -> Result<(), &'static str> {
    let value = value.trim();
    if value.is_empty() {
        return Err("La fecha de nacimiento es obligatoria");
    }
    let birth = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| "Fecha de nacimiento inválida")?;
    if today.year() - birth.year() < MINIMUM_AGE {
        return Err("Debes ser mayor de 18 años");
    }
    Ok(())
}

pub fn validate_password(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Err("La contraseña es obligatoria");
    }
    if value.chars().count() < MINIMUM_PASSWORD_LENGTH {
        return Err("La contraseña debe tener al menos 8 caracteres");
    }
    Ok(())
}

pub fn validate_confirmation(password: &str, confirmation: &str) -> Result<(), &'static str> {
    if password != confirmation {
        return Err("Las contraseñas no coinciden");
    }
    Ok(())
}

/// Full personal-data pass, one message per failing field.
pub fn validate_personal_data(draft: &ApplicantDraft, today: NaiveDate) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let checks = [
        ("pnombre", validate_first_name(&draft.first_name)),
        ("papellido", validate_last_name(&draft.last_name)),
        ("rut", validate_rut(&draft.national_id)),
        ("email", validate_email(&draft.email)),
        ("ntelefono", validate_phone(&draft.phone)),
        ("fnacimiento", validate_birth_date(&draft.birth_date, today)),
        ("password", validate_password(&draft.password)),
        (
            "confirmPassword",
            validate_confirmation(&draft.password, &draft.confirm_password),
        ),
    ];
    for (field, outcome) in checks {
        if let Err(message) = outcome {
            errors.insert(field, message);
        }
    }
    if draft.account_kind.is_none() {
        errors.insert("rol", "Debe seleccionar un tipo de cuenta");
    }
    errors
}

/// Required slots without a file, keyed by document kind.
pub fn validate_documents(slots: &[DocumentSlot]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for slot in slots {
        if slot.required && slot.attachment.is_none() {
            errors.insert(
                slot.kind.wire_name(),
                format!("El documento {} es obligatorio", slot.kind.label()),
            );
        }
    }
    errors
}
