use common::RequestError;

/// Failures that leave the registry untouched.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("invalid job request: {0}")]
    InvalidRequest(#[from] RequestError),
    #[error("job {0} already has an active handler")]
    AlreadyActive(String),
    #[error("could not marshal config: {0}")]
    EncodeConfig(#[from] serde_yaml::Error),
    #[error("could not marshal request: {0}")]
    EncodeRequest(#[from] serde_json::Error),
    #[error("could not launch process {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// No capacity under the current admission policy. Expected; retry later.
    #[error("no capacity to accept job {0}")]
    Rejected(String),
    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl SubmitError {
    pub fn is_rejected(&self) -> bool {
        matches!(self, SubmitError::Rejected(_))
    }
}
