//! Contract with the external auth provider.

use async_trait::async_trait;

use crate::error::AuthError;

/// Operations the app needs from the hosted auth service.
///
/// Implementations translate provider failures into
/// [`AuthError::Provider`], keeping the provider's message when it has one.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Send a reset email whose link returns the user to `redirect_to`.
    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AuthError>;

    /// Set a new password for the user of the current recovery session.
    async fn update_user_password(&self, password: &str) -> Result<(), AuthError>;
}
