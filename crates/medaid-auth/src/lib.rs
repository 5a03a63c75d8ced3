//! MedAid Auth crate - password reset against an external auth provider.
//!
//! The provider itself lives outside this workspace. This crate owns the
//! contract with it and the checks the app performs before each call.
//!
//! No [`AuthProvider`] implementation ships here, and the `medaid` binary does
//! not use this crate. The application that hosts the web frontend supplies a
//! client for its auth service and drives it through [`PasswordResetFlow`].

pub mod error;
pub mod provider;
pub mod reset;

pub use error::{user_message, AuthError};
pub use provider::AuthProvider;
pub use reset::PasswordResetFlow;
