use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Empty spreadsheet id")]
    EmptySpreadsheetId,

    #[error("Empty sheet name")]
    EmptySheetName,

    #[error("At least one access scope is required")]
    NoScopes,
}

/// log-sync configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for the public API
    #[serde(default)]
    pub listener: Listener,
    /// Optional listener for `/health` and `/ready`
    pub admin_listener: Option<Listener>,
    /// Where appended rows go
    pub spreadsheet: SpreadsheetConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        if let Some(admin_listener) = &self.admin_listener {
            admin_listener.validate()?;
        }
        self.spreadsheet.validate()
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 5001,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SpreadsheetConfig {
    /// Service account key file (JSON)
    pub credentials_path: PathBuf,
    pub spreadsheet_id: String,
    /// Rows are appended after the data found in `<sheet_name>!A1`
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Base URL of the Sheets API, `https://sheets.googleapis.com` when unset
    pub api_base_url: Option<Url>,
}

impl SpreadsheetConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(ValidationError::EmptySpreadsheetId);
        }
        if self.sheet_name.trim().is_empty() {
            return Err(ValidationError::EmptySheetName);
        }
        if self.scopes.is_empty() {
            return Err(ValidationError::NoScopes);
        }
        Ok(())
    }

    /// The A1 range rows are appended to.
    pub fn range(&self) -> String {
        format!("{}!A1", self.sheet_name)
    }
}

fn default_sheet_name() -> String {
    "RegistroDiario".into()
}

fn default_scopes() -> Vec<String> {
    vec![SPREADSHEETS_SCOPE.into()]
}
