use supalite_core::SupaliteError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("No active session")]
    NoSession,
}

impl From<AuthError> for SupaliteError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidConfig(msg) => SupaliteError::Configuration(msg),
            AuthError::UrlParse(err) => SupaliteError::Configuration(err.to_string()),
            AuthError::NoSession => {
                SupaliteError::InvalidOperation("no active session".to_string())
            }
        }
    }
}
