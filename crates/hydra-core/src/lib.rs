pub mod config;
pub mod error;
pub mod timezone;
pub mod types;

pub use config::HydraConfig;
pub use error::{HydraError, Result};
