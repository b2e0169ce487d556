pub mod client;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod judge0;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::KeyRotatingClient;
pub use credentials::CredentialPool;
pub use engine::{Grader, PollPolicy};
pub use error::{ClientError, GradingError};
pub use judge0::{Judge0Api, JudgeBackend};
pub use transport::{HttpTransport, ReqwestTransport};

/// Grader wired to the production Judge0 backend
pub type Judge0Grader = Grader<Judge0Api<ReqwestTransport>>;

/// Build the production grader from configuration
pub fn grader_from_config(config: &gradeline_common::Config) -> Result<Judge0Grader, ClientError> {
    Ok(Grader::new(
        Judge0Api::from_config(config)?,
        PollPolicy::from_config(config),
    ))
}
