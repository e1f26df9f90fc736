use axum::http::HeaderMap;
use std::collections::HashSet;

use crate::error::ApiError;

/// Header carrying the caller's claimed admin identity.
pub const ADMIN_EMAIL_HEADER: &str = "x-admin-email";

/// Allowlist of admin emails for mutating routes.
///
/// The platform authenticates admin actions by a configured email
/// allowlist rather than a token scheme; an empty allowlist locks every
/// gated route.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowlist {
    emails: HashSet<String>,
}

impl AdminAllowlist {
    /// Parse a comma-separated list of emails (case-insensitive).
    #[must_use]
    pub fn from_csv(raw: &str) -> Self {
        let emails = raw
            .split(',')
            .map(|e| e.trim().to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_ascii_lowercase())
    }

    /// Check the admin header on a request.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Forbidden` if the header is missing, unreadable,
    /// or not on the allowlist.
    pub fn authorize(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        let email = headers
            .get(ADMIN_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Forbidden)?;
        if self.contains(email) {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}
