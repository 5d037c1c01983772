use crate::entry::NormalizedRow;
use crate::sheets::{AppendResult, SheetAppender, SheetsError};
use async_trait::async_trait;
use http::StatusCode;
use std::sync::Mutex;

/// In-memory stand-in for the spreadsheet. Records every append call.
#[derive(Default)]
pub struct FakeSheets {
    unavailable: bool,
    append_error: Option<String>,
    calls: Mutex<Vec<Vec<NormalizedRow>>>,
}

impl FakeSheets {
    pub fn unavailable() -> Self {
        FakeSheets {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn failing_append(message: &str) -> Self {
        FakeSheets {
            append_error: Some(message.to_owned()),
            ..Default::default()
        }
    }

    /// Rows of every successful append, one element per call.
    pub fn appended(&self) -> Vec<Vec<NormalizedRow>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SheetAppender for FakeSheets {
    async fn connect(&self) -> Result<(), SheetsError> {
        if self.unavailable {
            return Err(SheetsError::CredentialsNotFound("credentials.json".into()));
        }
        Ok(())
    }

    async fn append(&self, rows: &[NormalizedRow]) -> Result<AppendResult, SheetsError> {
        self.connect().await?;
        if let Some(message) = &self.append_error {
            return Err(SheetsError::Api {
                status: StatusCode::FORBIDDEN,
                message: message.clone(),
            });
        }

        self.calls.lock().unwrap().push(rows.to_vec());
        Ok(AppendResult {
            updated_rows: rows.len() as u64,
            updated_cells: rows.len() as u64 * 3,
        })
    }

    fn is_ready(&self) -> bool {
        !self.unavailable
    }
}
