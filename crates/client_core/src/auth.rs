//! Submit logic of the login and registration screens.

use std::sync::Arc;

use shared::protocol::{LoginRequest, RegisterRequest};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    dashboard::form::{coerce_age, is_well_formed_email, FormError},
    error::{user_message, ErrorContext},
    session::TokenStore,
    AuthApi,
};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const REGISTRATION_SUCCEEDED: &str = "Registration successful!";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Optional; blank means not given.
    pub age: String,
    /// Optional; blank means not given.
    pub ailment: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), FormError> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err(FormError::MissingRequired);
        }
        if !is_well_formed_email(&self.email) {
            return Err(FormError::InvalidEmail);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FormError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }
        Ok(())
    }

    pub fn to_request(&self) -> RegisterRequest {
        let age = if self.age.trim().is_empty() {
            None
        } else {
            coerce_age(&self.age)
        };
        let ailment = Some(self.ailment.trim())
            .filter(|ailment| !ailment.is_empty())
            .map(str::to_owned);
        RegisterRequest {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
            age,
            ailment,
        }
    }
}

/// Message to show on the screen that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AuthFailure {
    pub message: String,
}

impl AuthFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub struct AuthFlow {
    api: Arc<dyn AuthApi>,
    tokens: TokenStore,
}

impl AuthFlow {
    pub fn new(api: Arc<dyn AuthApi>, tokens: TokenStore) -> Self {
        Self { api, tokens }
    }

    /// Signs in and stores the issued token for later requests.
    pub async fn login(&self, form: &LoginForm) -> Result<(), AuthFailure> {
        if form.email.trim().is_empty() || form.password.is_empty() {
            return Err(AuthFailure::new(FormError::MissingRequired.to_string()));
        }

        let request = LoginRequest {
            email: form.email.trim().to_string(),
            password: form.password.clone(),
        };
        match self.api.login(&request).await {
            Ok(response) => {
                self.tokens.set(response.access_token).await;
                info!("signed in");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                Err(AuthFailure::new(user_message(&err, ErrorContext::Login)))
            }
        }
    }

    /// Creates an account. On success the caller should send the user to
    /// the login screen; no token is issued.
    pub async fn register(&self, form: &RegistrationForm) -> Result<(), AuthFailure> {
        form.validate()
            .map_err(|invalid| AuthFailure::new(invalid.to_string()))?;

        match self.api.register(&form.to_request()).await {
            Ok(()) => {
                info!("account registered");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                Err(AuthFailure::new(user_message(&err, ErrorContext::Register)))
            }
        }
    }

    pub async fn logout(&self) {
        self.tokens.clear().await;
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
