//! Credential sign-in against a configured user table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A signed-in operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub email: String,
    /// Email with every char outside `[a-z0-9]` replaced by `_`
    pub uid: String,
    /// Local part of the email
    pub name: String,
}

impl AuthUser {
    pub fn from_email(email: &str) -> Self {
        let uid = email
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let name = email.split('@').next().unwrap_or_default().to_string();

        Self {
            email: email.to_string(),
            uid,
            name,
        }
    }
}

/// Email to password table loaded from configuration
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialTable {
    entries: BTreeMap<String, String>,
}

impl CredentialTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check a credential pair.
    ///
    /// Unknown users and wrong passwords fail with the same error.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::AuthRejected);
        }

        match self.entries.get(email) {
            Some(expected) if expected == password => {
                tracing::info!("Signed in {}", email);
                Ok(AuthUser::from_email(email))
            }
            _ => Err(Error::AuthRejected),
        }
    }
}

impl fmt::Debug for CredentialTable {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_map()
            .entries(self.entries.keys().map(|email| (email, "[REDACTED]")))
            .finish()
    }
}

impl FromIterator<(String, String)> for CredentialTable {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
