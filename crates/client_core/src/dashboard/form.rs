//! Editable form state for the patient dashboard and its payload builder.

use shared::{
    domain::{PatientId, PatientRecord},
    protocol::PatientPayload,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Missing required fields")]
    MissingRequired,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
}

/// Raw text of the dashboard form plus the record under edit, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub name: String,
    pub age: String,
    pub ailment: String,
    pub email: String,
    pub password: String,
    pub edit_id: Option<PatientId>,
}

impl FormState {
    pub fn is_editing(&self) -> bool {
        self.edit_id.is_some()
    }

    /// Loads a record for editing. The password is left blank so that an
    /// untouched field keeps the stored password.
    pub fn load_record(&mut self, record: &PatientRecord) {
        *self = Self {
            name: record.name.clone(),
            age: record.age.map(|age| age.to_string()).unwrap_or_default(),
            ailment: record.ailment.clone(),
            email: record.email.clone(),
            password: String::new(),
            edit_id: Some(record.id.clone()),
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Checks required fields. Age only has to be present; non-numeric text
    /// is coerced and left to the server.
    pub fn validate(&self) -> Result<(), FormError> {
        let password_required = !self.is_editing();
        if is_blank(&self.name)
            || is_blank(&self.age)
            || is_blank(&self.email)
            || is_blank(&self.ailment)
            || (password_required && is_blank(&self.password))
        {
            return Err(FormError::MissingRequired);
        }
        if !is_well_formed_email(&self.email) {
            return Err(FormError::InvalidEmail);
        }
        Ok(())
    }

    /// Builds the outgoing body. On update a blank password is omitted,
    /// meaning "leave unchanged".
    pub fn to_payload(&self) -> PatientPayload {
        let password = if self.is_editing() && self.password.is_empty() {
            None
        } else {
            Some(self.password.clone())
        };
        PatientPayload {
            name: self.name.clone(),
            age: coerce_age(&self.age),
            ailment: self.ailment.clone(),
            email: self.email.clone(),
            password,
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Numeric conversion of the age field: blank is `0`, integral text inside
/// the `i64` range is its value, anything else has no numeric value.
pub fn coerce_age(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    match trimmed.parse::<f64>() {
        // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
        Ok(value)
            if value.is_finite()
                && value.fract() == 0.0
                && value >= i64::MIN as f64
                && value < i64::MAX as f64 =>
        {
            Some(value as i64)
        }
        _ => None,
    }
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_well_formed_email(raw: &str) -> bool {
    let email = raw.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}
