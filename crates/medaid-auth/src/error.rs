//! Error types for the password reset flow.

use medaid_core::error::MedaidError;

/// Shown when the provider fails without saying why.
const GENERIC_FAILURE: &str = "Password reset failed";

/// Errors from the password reset flow.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email address: {0:?}")]
    InvalidEmail(String),
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),
    /// Failure reported by the external provider, with its message if any.
    #[error("{}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Provider { message: Option<String> },
}

impl AuthError {
    pub fn provider(message: impl Into<String>) -> Self {
        AuthError::Provider {
            message: Some(message.into()),
        }
    }
}

/// Text to show the user for a failed reset step.
///
/// Provider messages are passed through verbatim; a provider error without a
/// message (or with a blank one) becomes a generic failure notice.
pub fn user_message(err: &AuthError) -> String {
    match err {
        AuthError::Provider { message } => message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(GENERIC_FAILURE)
            .to_string(),
        other => other.to_string(),
    }
}

impl From<AuthError> for MedaidError {
    fn from(err: AuthError) -> Self {
        MedaidError::Auth(user_message(&err))
    }
}
