//! Persisted library configuration
//!
//! A small set of named string values with presence/absence semantics. Where the values
//! are stored is up to the front end; the data-access layer only ever receives a
//! `LibraryConfig` by value.

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

/// Named settings that make up a configured installation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Google API key used for Sheets/Drive calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OAuth client id used by the sign-in flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// The single super-user identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_email: Option<String>,

    /// Active spreadsheet handle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
}

impl LibraryConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the OAuth client id
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self
    }

    /// Set the administrator email
    pub fn admin_email(mut self, email: impl Into<String>) -> Self {
        self.admin_email = Some(email.into());
        self
    }

    /// Set the active spreadsheet
    pub fn spreadsheet_id(mut self, id: impl Into<String>) -> Self {
        self.spreadsheet_id = Some(id.into());
        self
    }

    /// True when API key, client id and admin email are all present
    pub fn is_configured(&self) -> bool {
        present(&self.api_key).is_some()
            && present(&self.client_id).is_some()
            && present(&self.admin_email).is_some()
    }

    /// True when an active spreadsheet has been chosen
    pub fn has_spreadsheet(&self) -> bool {
        present(&self.spreadsheet_id).is_some()
    }

    pub fn require_api_key(&self) -> Result<&str> {
        present(&self.api_key)
            .ok_or_else(|| LibraryError::Configuration("API key is not set".to_string()))
    }

    pub fn require_client_id(&self) -> Result<&str> {
        present(&self.client_id)
            .ok_or_else(|| LibraryError::Configuration("OAuth client id is not set".to_string()))
    }

    pub fn require_admin_email(&self) -> Result<&str> {
        present(&self.admin_email).ok_or_else(|| {
            LibraryError::Configuration("Administrator email is not set".to_string())
        })
    }

    pub fn require_spreadsheet_id(&self) -> Result<&str> {
        present(&self.spreadsheet_id).ok_or_else(|| {
            LibraryError::Configuration("No spreadsheet is connected".to_string())
        })
    }

    /// Drop every value, returning to the unconfigured state
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
