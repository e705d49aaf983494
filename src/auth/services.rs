use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    auth::{
        jwt::TokenCodec,
        password::{hash_password, verify_password},
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::{ApiError, ValidationErrors},
    store::StoreError,
};

pub const CREDENTIALS_MISMATCH: &str =
    "The account credentials doesn't match with our database records";
pub const EMAIL_TAKEN: &str = "The email has been taken.";
pub const REGISTRATION_FAILED: &str =
    "There is a problem while creating a user please try again later";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("validation failed")]
    Validation(ValidationErrors),
    /// Unknown email and wrong password both end up here.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("registration failed: {0}")]
    RegistrationFailed(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => ApiError::Validation(errors),
            AuthError::InvalidCredentials => {
                let mut errors = ValidationErrors::new();
                errors.add("email", CREDENTIALS_MISMATCH);
                ApiError::Validation(errors)
            }
            AuthError::RegistrationFailed(cause) => {
                ApiError::internal("user", REGISTRATION_FAILED, cause)
            }
            AuthError::Internal(cause) => {
                ApiError::internal("server", "There is a problem while processing the request", cause)
            }
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Length in characters, bounds inclusive.
pub(crate) fn check_length(errors: &mut ValidationErrors, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.add(field, format!("{} not in range({}, {})", field, min, max));
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if !is_valid_email(email) {
        errors.add("email", "email does not match the email format.");
    }
}

/// Credential verification, token issuance and registration.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<TokenCodec>) -> Self {
        Self { users, tokens }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let email = normalize_email(email);

        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &email);
        if password.is_empty() {
            errors.add("password", "Password can not be blank.");
        }
        errors.into_result().map_err(AuthError::Validation)?;

        let user = match self.users.find_by_email(&email).await {
            Ok(Some(u)) => u,
            Ok(None) => {
                warn!(email = %email, "login unknown email");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                error!(error = %e, "find_by_email failed");
                return Err(AuthError::Internal(e.to_string()));
            }
        };

        let ok = verify_password(password, &user.password_hash).map_err(|e| {
            error!(error = %e, user_id = %user.id, "verify_password failed");
            AuthError::Internal(e.to_string())
        })?;
        if !ok {
            warn!(email = %email, user_id = %user.id, "login invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, self.tokens.ttl()).map_err(|e| {
            error!(error = %e, "jwt sign failed");
            AuthError::Internal(e.to_string())
        })?;

        info!(user_id = %user.id, email = %user.email, "user logged in");
        Ok((token, user))
    }

    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);

        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &email);
        check_length(&mut errors, "name", name, 3, 255);
        check_length(&mut errors, "password", password, 5, 32);

        if !email.is_empty() {
            match self.users.find_by_email(&email).await {
                Ok(Some(_)) => {
                    warn!(email = %email, "email already registered");
                    errors.add("email", EMAIL_TAKEN);
                }
                Ok(None) => {}
                Err(e) => return Err(AuthError::RegistrationFailed(e.to_string())),
            }
        }
        errors.into_result().map_err(AuthError::Validation)?;

        let password_hash =
            hash_password(password).map_err(|e| AuthError::RegistrationFailed(e.to_string()))?;

        let new_user = NewUser {
            email,
            password_hash,
            name: name.to_string(),
        };
        match self.users.create(new_user).await {
            Ok(user) => {
                info!(user_id = %user.id, email = %user.email, "user registered");
                Ok(user)
            }
            Err(StoreError::Conflict) => {
                warn!("email taken at insert time");
                let mut errors = ValidationErrors::new();
                errors.add("email", EMAIL_TAKEN);
                Err(AuthError::Validation(errors))
            }
            Err(e) => Err(AuthError::RegistrationFailed(e.to_string())),
        }
    }
}
