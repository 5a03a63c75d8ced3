//! Two-step password reset: request an email, then set the new password.

use medaid_core::config::AuthConfig;
use tracing::{info, warn};

use crate::error::AuthError;
use crate::provider::AuthProvider;

/// Drives a password reset through an [`AuthProvider`].
pub struct PasswordResetFlow<P> {
    provider: P,
    redirect_to: String,
    min_password_length: usize,
}

impl<P: AuthProvider> PasswordResetFlow<P> {
    pub fn new(provider: P, config: &AuthConfig) -> Self {
        let redirect_to = format!(
            "{}/{}",
            config.site_url.trim_end_matches('/'),
            config.reset_path.trim_start_matches('/')
        );
        Self {
            provider,
            redirect_to,
            min_password_length: config.min_password_length,
        }
    }

    /// Where the reset email sends the user back to.
    pub fn redirect_to(&self) -> &str {
        &self.redirect_to
    }

    /// Ask the provider to email a reset link.
    pub async fn request_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidEmail(email.to_string()));
        }

        match self
            .provider
            .reset_password_for_email(email, &self.redirect_to)
            .await
        {
            Ok(()) => {
                info!(redirect_to = %self.redirect_to, "Password reset email requested");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Password reset request failed");
                Err(e)
            }
        }
    }

    /// Set the new password once both entries agree and meet the length rule.
    pub async fn update_password(
        &self,
        password: &str,
        confirmation: &str,
    ) -> Result<(), AuthError> {
        if password != confirmation {
            return Err(AuthError::PasswordMismatch);
        }
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::PasswordTooShort(self.min_password_length));
        }

        self.provider.update_user_password(password).await?;
        info!("Password updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records calls and optionally fails with a fixed error message.
    #[derive(Default)]
    struct MockProvider {
        fail_with: Option<Option<String>>,
        reset_calls: Mutex<Vec<(String, String)>>,
        updates: Mutex<Vec<String>>,
    }

    impl MockProvider {
        fn failing(message: Option<&str>) -> Self {
            Self {
                fail_with: Some(message.map(str::to_string)),
                ..Default::default()
            }
        }

        fn result(&self) -> Result<(), AuthError> {
            match &self.fail_with {
                Some(message) => Err(AuthError::Provider {
                    message: message.clone(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl AuthProvider for MockProvider {
        async fn reset_password_for_email(
            &self,
            email: &str,
            redirect_to: &str,
        ) -> Result<(), AuthError> {
            self.reset_calls
                .lock()
                .unwrap()
                .push((email.to_string(), redirect_to.to_string()));
            self.result()
        }

        async fn update_user_password(&self, password: &str) -> Result<(), AuthError> {
            self.updates.lock().unwrap().push(password.to_string());
            self.result()
        }
    }

    fn flow(provider: MockProvider) -> PasswordResetFlow<MockProvider> {
        PasswordResetFlow::new(provider, &AuthConfig::default())
    }

    #[tokio::test]
    async fn test_request_reset_builds_redirect() {
        let flow = flow(MockProvider::default());
        flow.request_reset(" user@example.com ").await.unwrap();

        let calls = flow.provider.reset_calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[(
                "user@example.com".to_string(),
                "http://localhost:3000/reset-password".to_string()
            )]
        );
    }

    #[test]
    fn test_redirect_joins_slashes_once() {
        let config = AuthConfig {
            site_url: "https://medaid.example/".to_string(),
            reset_path: "auth/reset".to_string(),
            min_password_length: 6,
        };
        let flow = PasswordResetFlow::new(MockProvider::default(), &config);
        assert_eq!(flow.redirect_to(), "https://medaid.example/auth/reset");
    }

    #[tokio::test]
    async fn test_request_reset_rejects_bad_email() {
        let flow = flow(MockProvider::default());
        for email in ["", "   ", "not-an-email"] {
            let err = flow.request_reset(email).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidEmail(_)));
        }
        assert!(flow.provider.reset_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_reset_surfaces_provider_error() {
        let flow = flow(MockProvider::failing(Some("User not found")));
        let err = flow.request_reset("user@example.com").await.unwrap_err();
        assert_eq!(crate::user_message(&err), "User not found");
    }

    #[tokio::test]
    async fn test_update_password_mismatch() {
        let flow = flow(MockProvider::default());
        let err = flow
            .update_password("secret123", "secret124")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
        assert!(flow.provider.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_password_too_short() {
        let flow = flow(MockProvider::default());
        let err = flow.update_password("abc", "abc").await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooShort(6)));
        assert!(flow.provider.updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_password_success() {
        let flow = flow(MockProvider::default());
        flow.update_password("secret123", "secret123").await.unwrap();
        assert_eq!(
            flow.provider.updates.lock().unwrap().as_slice(),
            &["secret123".to_string()]
        );
    }

    #[tokio::test]
    async fn test_update_password_provider_failure_without_message() {
        let flow = flow(MockProvider::failing(None));
        let err = flow
            .update_password("secret123", "secret123")
            .await
            .unwrap_err();
        assert_eq!(crate::user_message(&err), "Password reset failed");
    }
}
