//! The spreadsheet collaborator.
//!
//! [`SheetAppender`] is what the API handlers talk to. [`GoogleSheets`]
//! implements it on top of the Sheets v4 `values.append` endpoint, authorized
//! with a service account key.

use crate::config::SpreadsheetConfig;
use crate::entry::NormalizedRow;
use async_trait::async_trait;
use google_cloud_auth::credentials::service_account::{AccessSpecifier, Builder};
use google_cloud_auth::credentials::{CacheableResource, Credentials};
use http::{Extensions, HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com";

#[derive(thiserror::Error, Debug)]
pub enum SheetsError {
    #[error("credentials file not found at {0}")]
    CredentialsNotFound(PathBuf),
    #[error("could not read credentials file: {0}")]
    CredentialsIo(#[from] io::Error),
    #[error("invalid service account credentials: {0}")]
    InvalidCredentials(String),
    #[error("could not obtain access token: {0}")]
    Token(String),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Sheets API returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

/// Counts reported back by an append call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResult {
    #[serde(default)]
    pub updated_rows: u64,
    #[serde(default)]
    pub updated_cells: u64,
}

/// A sink that appends rows after the existing data of a sheet.
#[async_trait]
pub trait SheetAppender: Send + Sync {
    /// Makes sure the collaborator can be reached, e.g. by loading credentials.
    async fn connect(&self) -> Result<(), SheetsError>;

    /// Appends all `rows` in a single call. Either every row is written or none.
    async fn append(&self, rows: &[NormalizedRow]) -> Result<AppendResult, SheetsError>;

    fn is_ready(&self) -> bool;
}

#[derive(Serialize)]
struct ValueRange<'a> {
    values: &'a [NormalizedRow],
}

#[derive(Deserialize)]
struct AppendResponse {
    #[serde(default)]
    updates: AppendResult,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

enum Authorizer {
    ServiceAccount {
        credentials_path: PathBuf,
        scopes: Vec<String>,
        credentials: OnceCell<Credentials>,
    },
    #[cfg(test)]
    Static(HeaderMap),
}

impl Authorizer {
    async fn connect(&self) -> Result<(), SheetsError> {
        match self {
            Authorizer::ServiceAccount {
                credentials_path,
                scopes,
                credentials,
            } => load_cached(credentials, credentials_path, scopes)
                .await
                .map(|_| ()),
            #[cfg(test)]
            Authorizer::Static(_) => Ok(()),
        }
    }

    async fn headers(&self) -> Result<HeaderMap, SheetsError> {
        let credentials = match self {
            Authorizer::ServiceAccount {
                credentials_path,
                scopes,
                credentials,
            } => load_cached(credentials, credentials_path, scopes).await?,
            #[cfg(test)]
            Authorizer::Static(headers) => return Ok(headers.clone()),
        };

        match credentials
            .headers(Extensions::new())
            .await
            .map_err(|e| SheetsError::Token(e.to_string()))?
        {
            CacheableResource::New { data, .. } => Ok(data),
            CacheableResource::NotModified => Err(SheetsError::Token(
                "credentials returned no authorization headers".into(),
            )),
        }
    }

    fn is_ready(&self) -> bool {
        match self {
            Authorizer::ServiceAccount { credentials, .. } => credentials.initialized(),
            #[cfg(test)]
            Authorizer::Static(_) => true,
        }
    }
}

// A failed load is not cached, the next request tries again.
async fn load_cached<'a>(
    cell: &'a OnceCell<Credentials>,
    path: &Path,
    scopes: &[String],
) -> Result<&'a Credentials, SheetsError> {
    cell.get_or_try_init(|| load_service_account(path, scopes))
        .await
}

async fn load_service_account(path: &Path, scopes: &[String]) -> Result<Credentials, SheetsError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SheetsError::CredentialsNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let key: serde_json::Value = serde_json::from_str(&contents)
        .map_err(|e| SheetsError::InvalidCredentials(e.to_string()))?;

    let credentials = Builder::new(key)
        .with_access_specifier(AccessSpecifier::from_scopes(scopes.to_vec()))
        .build()
        .map_err(|e| SheetsError::InvalidCredentials(e.to_string()))?;

    tracing::info!(path = %path.display(), "Loaded service account credentials");
    Ok(credentials)
}

/// Builds `{base}/v4/spreadsheets/{id}/values/{range}:append` with the append options.
fn append_url(base: &Url, spreadsheet_id: &str, range: &str) -> Result<Url, SheetsError> {
    let mut url = base.clone();
    let last_segment = format!("{range}:append");
    url.path_segments_mut()
        .map_err(|_| SheetsError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend([
            "v4",
            "spreadsheets",
            spreadsheet_id,
            "values",
            last_segment.as_str(),
        ]);
    url.query_pairs_mut()
        .append_pair("valueInputOption", "USER_ENTERED")
        .append_pair("insertDataOption", "INSERT_ROWS");
    Ok(url)
}

pub struct GoogleSheets {
    client: reqwest::Client,
    append_url: Url,
    authorizer: Authorizer,
}

impl GoogleSheets {
    pub fn new(config: &SpreadsheetConfig) -> Result<Self, SheetsError> {
        Self::with_authorizer(
            config,
            Authorizer::ServiceAccount {
                credentials_path: config.credentials_path.clone(),
                scopes: config.scopes.clone(),
                credentials: OnceCell::new(),
            },
        )
    }

    #[cfg(test)]
    fn with_static_headers(
        config: &SpreadsheetConfig,
        headers: HeaderMap,
    ) -> Result<Self, SheetsError> {
        Self::with_authorizer(config, Authorizer::Static(headers))
    }

    fn with_authorizer(
        config: &SpreadsheetConfig,
        authorizer: Authorizer,
    ) -> Result<Self, SheetsError> {
        let base_url = match &config.api_base_url {
            Some(url) => url.clone(),
            None => Url::parse(DEFAULT_API_BASE_URL)
                .map_err(|e| SheetsError::InvalidUrl(e.to_string()))?,
        };

        Ok(GoogleSheets {
            client: reqwest::Client::new(),
            append_url: append_url(&base_url, &config.spreadsheet_id, &config.range())?,
            authorizer,
        })
    }
}

#[async_trait]
impl SheetAppender for GoogleSheets {
    async fn connect(&self) -> Result<(), SheetsError> {
        self.authorizer.connect().await
    }

    async fn append(&self, rows: &[NormalizedRow]) -> Result<AppendResult, SheetsError> {
        let headers = self.authorizer.headers().await?;

        let response = self
            .client
            .post(self.append_url.clone())
            .headers(headers)
            .json(&ValueRange { values: rows })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            let message = match serde_json::from_str::<ApiErrorBody>(&body) {
                Ok(parsed) => parsed.error.message,
                Err(_) => body,
            };
            return Err(SheetsError::Api { status, message });
        }

        Ok(response.json::<AppendResponse>().await?.updates)
    }

    fn is_ready(&self) -> bool {
        self.authorizer.is_ready()
    }
}
