pub mod config;
pub mod consultant;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod reporter;
pub mod retry;
pub mod validate;

pub use config::Config;
pub use consultant::{Consultant, Review, ReviewOptions};
pub use error::{BackendError, ConsultError};
pub use llm::{ModelAvailability, ModelBackend, OllamaClient};
pub use reporter::{HealthScore, Reporter};
pub use retry::RetryPolicy;

pub type Result<T> = anyhow::Result<T>;
