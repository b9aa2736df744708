use serde::{Deserialize, Serialize};

/// The only mail domain accepted at login.
pub const ALLOWED_DOMAIN: &str = "gmail.com";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("a valid Gmail address is required")]
    InvalidEmail,
}

/// Caller profile derived from the login email. Nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
    pub email: String,
}

impl Identity {
    /// Accept `<local-part>@gmail.com` and derive the identity from the local part.
    pub fn from_email(email: &str) -> Result<Self, LoginError> {
        let (local, domain) = email.split_once('@').ok_or(LoginError::InvalidEmail)?;
        if local.is_empty() || domain != ALLOWED_DOMAIN {
            return Err(LoginError::InvalidEmail);
        }
        Ok(Self {
            id: local.to_string(),
            display_name: local.to_string(),
            email: email.to_string(),
        })
    }
}
