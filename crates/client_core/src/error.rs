//! Client error taxonomy and the user-facing messages derived from it.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const OPERATION_FAILED: &str = "Operation failed";
pub const DELETE_FAILED: &str = "Failed to delete patient";
pub const LOGIN_FAILED: &str = "Login failed";
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";
pub const CHECK_REQUIRED_FIELDS: &str = "Please check all required fields";

const VALIDATION_PREFIX: &str = "Patient validation failed:";

static REQUIRED_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[A-Za-z_]+:\s*)?Path\s`[A-Za-z_]+`\sis\srequired\.")
        .expect("required-path pattern is valid")
});

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("validation rejected ({status}): {}", .message.as_deref().unwrap_or("no detail"))]
    Validation { status: u16, message: Option<String> },
    #[error("unauthorized ({status}): {}", .message.as_deref().unwrap_or("no detail"))]
    Unauthorized { status: u16, message: Option<String> },
    #[error("not found: {}", .message.as_deref().unwrap_or("no detail"))]
    NotFound { message: Option<String> },
    #[error("server error ({status}): {}", .message.as_deref().unwrap_or("no detail"))]
    Server { status: u16, message: Option<String> },
}

impl ClientError {
    /// Maps a non-2xx status and its optional `{error}`/`{message}` detail.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let mentions_validation = message
            .as_deref()
            .is_some_and(|text| text.to_ascii_lowercase().contains("validation failed"));
        match status {
            401 | 403 => Self::Unauthorized { status, message },
            404 => Self::NotFound { message },
            400 | 422 => Self::Validation { status, message },
            _ if mentions_validation => Self::Validation { status, message },
            _ => Self::Server { status, message },
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Validation { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::NotFound { message }
            | Self::Server { message, .. } => message.as_deref(),
            Self::Transport(_) | Self::InvalidUrl(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidUrl(_))
    }
}

/// Which operation boundary an error is being surfaced at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContext {
    Load,
    Submit,
    Delete,
    Login,
    Register,
}

impl ErrorContext {
    fn fallback(self) -> &'static str {
        match self {
            Self::Load | Self::Submit => OPERATION_FAILED,
            Self::Delete => DELETE_FAILED,
            Self::Login => LOGIN_FAILED,
            Self::Register => REGISTRATION_FAILED,
        }
    }
}

/// Converts an error into the message shown to the user at `context`.
pub fn user_message(err: &ClientError, context: ErrorContext) -> String {
    let Some(detail) = err.server_message() else {
        return context.fallback().to_string();
    };

    match context {
        ErrorContext::Load if detail.to_ascii_lowercase().contains("validation failed") => {
            CHECK_REQUIRED_FIELDS.to_string()
        }
        ErrorContext::Submit if matches!(err, ClientError::Validation { .. }) => {
            normalize_validation_message(detail)
        }
        _ => detail.to_string(),
    }
}

/// Strips the validation framework prefix and collapses every
/// "Path `field` is required." clause into one "Missing required fields".
pub fn normalize_validation_message(raw: &str) -> String {
    let stripped = raw.replace(VALIDATION_PREFIX, "");
    let collapsed = REQUIRED_PATH.replace_all(&stripped, MISSING_REQUIRED_FIELDS);

    let mut parts: Vec<&str> = Vec::new();
    for part in collapsed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        if !parts.contains(&part) {
            parts.push(part);
        }
    }

    if parts.is_empty() {
        return OPERATION_FAILED.to_string();
    }
    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_required_path_clauses_into_one_phrase() {
        let raw = "Patient validation failed: name: Path `name` is required., email: Path `email` is required.";
        assert_eq!(normalize_validation_message(raw), MISSING_REQUIRED_FIELDS);
    }

    #[test]
    fn keeps_other_validation_clauses_verbatim() {
        let raw = "Patient validation failed: age: Cast to Number failed, ailment: Path `ailment` is required.";
        assert_eq!(
            normalize_validation_message(raw),
            "age: Cast to Number failed, Missing required fields"
        );
    }

    #[test]
    fn passes_through_messages_without_known_prefix() {
        assert_eq!(
            normalize_validation_message("Email already exists"),
            "Email already exists"
        );
    }

    #[test]
    fn transport_errors_use_context_fallback() {
        let err = ClientError::InvalidUrl(url::ParseError::EmptyHost);
        assert_eq!(user_message(&err, ErrorContext::Load), OPERATION_FAILED);
        assert_eq!(user_message(&err, ErrorContext::Delete), DELETE_FAILED);
        assert_eq!(user_message(&err, ErrorContext::Login), LOGIN_FAILED);
    }

    #[test]
    fn load_rewrites_validation_failures() {
        let err = ClientError::from_status(500, Some("Patient validation failed: x".into()));
        assert!(matches!(err, ClientError::Validation { .. }));
        assert_eq!(user_message(&err, ErrorContext::Load), CHECK_REQUIRED_FIELDS);
    }

    #[test]
    fn server_messages_pass_through_for_delete() {
        let err = ClientError::from_status(404, Some("Patient not found".into()));
        assert!(matches!(err, ClientError::NotFound { .. }));
        assert_eq!(user_message(&err, ErrorContext::Delete), "Patient not found");
    }

    #[test]
    fn status_without_detail_uses_fallback() {
        let err = ClientError::from_status(500, None);
        assert_eq!(user_message(&err, ErrorContext::Submit), OPERATION_FAILED);
        assert_eq!(user_message(&err, ErrorContext::Register), REGISTRATION_FAILED);
    }

    #[test]
    fn submit_normalizes_only_validation_errors() {
        let conflict = ClientError::from_status(409, Some("a, a, b".into()));
        assert!(matches!(conflict, ClientError::Server { .. }));
        assert_eq!(user_message(&conflict, ErrorContext::Submit), "a, a, b");

        let missing = ClientError::from_status(404, Some("Patient validation failed: gone".into()));
        assert_eq!(
            user_message(&missing, ErrorContext::Submit),
            "Patient validation failed: gone"
        );

        let invalid = ClientError::from_status(400, Some("a, a, b".into()));
        assert_eq!(user_message(&invalid, ErrorContext::Submit), "a, b");
    }

    #[test]
    fn maps_auth_statuses_to_unauthorized() {
        assert!(matches!(
            ClientError::from_status(401, None),
            ClientError::Unauthorized { status: 401, .. }
        ));
        assert!(matches!(
            ClientError::from_status(403, Some("Forbidden".into())),
            ClientError::Unauthorized { status: 403, .. }
        ));
    }
}
