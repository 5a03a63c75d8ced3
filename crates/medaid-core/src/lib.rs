pub mod config;
pub mod error;
pub mod types;

pub use config::MedaidConfig;
pub use error::{MedaidError, Result};
pub use types::*;
