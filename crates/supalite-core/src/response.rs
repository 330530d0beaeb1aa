use crate::error::SupaliteError;

/// Response envelope for REST/RPC calls: rows, optional exact count, and
/// the HTTP status the backend answered with.
#[derive(Debug)]
pub struct RestResponse<T> {
    /// The returned rows (empty for `return=minimal` / 204 responses).
    pub data: Vec<T>,
    /// Row count from the `Content-Range` header, when exact counting
    /// was requested.
    pub count: Option<i64>,
    /// HTTP status code of the response.
    pub status: u16,
}

impl<T> RestResponse<T> {
    pub fn new(data: Vec<T>, count: Option<i64>, status: u16) -> Self {
        Self {
            data,
            count,
            status,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the first row, or None if empty.
    pub fn first(&self) -> Option<&T> {
        self.data.first()
    }

    /// Consume and return exactly one row, or a Rest-flavored error.
    pub fn into_single(self) -> Result<T, SupaliteError> {
        let mut data = self.data;
        match data.len() {
            1 => Ok(data.remove(0)),
            n => Err(SupaliteError::Rest {
                status: 406,
                message: format!("expected exactly one row, got {}", n),
                code: None,
            }),
        }
    }

    /// Consume and return zero or one row.
    pub fn maybe_single(self) -> Result<Option<T>, SupaliteError> {
        let mut data = self.data;
        match data.len() {
            0 => Ok(None),
            1 => Ok(Some(data.remove(0))),
            n => Err(SupaliteError::Rest {
                status: 406,
                message: format!("expected at most one row, got {}", n),
                code: None,
            }),
        }
    }
}
