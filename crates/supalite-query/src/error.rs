use supalite_core::SupaliteError;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Invalid table name: {0}")]
    InvalidTable(String),

    /// The wildcard table is valid for subscriptions only; REST verbs on
    /// it have no defined semantics.
    #[error("Query operations are not supported on the wildcard table")]
    WildcardTable,

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend rejected the request (PostgREST error body).
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },
}

impl From<QueryError> for SupaliteError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::InvalidTable(msg) => SupaliteError::InvalidArgument(msg),
            QueryError::InvalidHeader(msg) => SupaliteError::InvalidArgument(msg),
            QueryError::WildcardTable => SupaliteError::InvalidOperation(
                "query operations are not supported on the wildcard table".to_string(),
            ),
            QueryError::UrlParse(err) => SupaliteError::Configuration(err.to_string()),
            QueryError::Http(err) => SupaliteError::Transport(err.to_string()),
            QueryError::Serialization(err) => SupaliteError::Serialization(err),
            QueryError::Api {
                status,
                message,
                code,
            } => SupaliteError::Rest {
                status,
                message,
                code,
            },
        }
    }
}
