use crate::error::CopyFactoryError;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;

/// Header carrying the caller token on every request.
pub const AUTH_TOKEN_HEADER: &str = "auth-token";

/// Class of credential a token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Long-lived API access token (a JWT).
    ApiAccess,
    /// Short-lived, account-scoped connection token.
    AccountAccess,
}

/// Token-based credentials for the CopyFactory API.
#[derive(Clone)]
pub struct CopyFactoryAuth {
    token: String,
}

impl fmt::Debug for CopyFactoryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyFactoryAuth")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

impl CopyFactoryAuth {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// A token with exactly three dot-separated segments is an API access token.
    pub fn kind(&self) -> TokenKind {
        if self.token.split('.').count() == 3 {
            TokenKind::ApiAccess
        } else {
            TokenKind::AccountAccess
        }
    }

    /// Fail with [`CopyFactoryError::WrongTokenType`] unless this is an API access token.
    pub fn require_api_token(&self, method: &'static str) -> Result<(), CopyFactoryError> {
        match self.kind() {
            TokenKind::ApiAccess => Ok(()),
            TokenKind::AccountAccess => Err(CopyFactoryError::WrongTokenType { method }),
        }
    }

    pub(crate) fn insert_header(&self, headers: &mut HeaderMap) -> Result<(), CopyFactoryError> {
        headers.insert(
            HeaderName::from_static(AUTH_TOKEN_HEADER),
            HeaderValue::from_str(&self.token).map_err(|e| CopyFactoryError::Header(e.to_string()))?,
        );
        Ok(())
    }
}
