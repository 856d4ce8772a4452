use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{CellRange, RowStyle, TableStore};
use crate::errors::StoreError;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Cells are stored exactly as sent: listing text never becomes a formula,
/// date or number on the way in.
const VALUE_INPUT_OPTION: &str = "RAW";

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Serialize)]
struct ValueRangeBody<'a> {
    range: &'a str,
    #[serde(rename = "majorDimension")]
    major_dimension: &'static str,
    values: &'a [Vec<String>],
}

/// Google Sheets v4 values/batchUpdate client for a single tab.
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: Client,
    base_url: String,
    spreadsheet_id: String,
    sheet_name: String,
    sheet_gid: i64,
    access_token: String,
}

impl SheetsClient {
    pub fn new(
        http: Client,
        spreadsheet_id: String,
        sheet_name: String,
        sheet_gid: i64,
        access_token: String,
    ) -> Self {
        Self {
            http,
            base_url: SHEETS_API_BASE.into(),
            spreadsheet_id,
            sheet_name,
            sheet_gid,
            access_token,
        }
    }

    /// `{base}/{id}/values/{range}{suffix}` with the range percent-encoded as
    /// a single path segment.
    fn values_url(&self, a1: &str, suffix: &str, query: &[(&str, &str)]) -> Result<Url, StoreError> {
        let mut url = Url::parse(&format!("{}/{}/values", self.base_url, self.spreadsheet_id))
            .map_err(|e| StoreError::Unexpected(format!("bad base url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Unexpected("base url cannot hold a path".into()))?
            .push(&format!("{a1}{suffix}"));
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn update_url(&self, a1: &str) -> Result<Url, StoreError> {
        self.values_url(a1, "", &[("valueInputOption", VALUE_INPUT_OPTION)])
    }

    fn append_url(&self, a1: &str) -> Result<Url, StoreError> {
        self.values_url(
            a1,
            ":append",
            &[
                ("valueInputOption", VALUE_INPUT_OPTION),
                ("insertDataOption", "INSERT_ROWS"),
            ],
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let resp = request
            .bearer_auth(&self.access_token)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp)
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn style_format(style: RowStyle) -> Value {
    match style {
        RowStyle::Header => json!({
            "backgroundColor": { "red": 0.9, "green": 0.9, "blue": 0.9 },
            "textFormat": { "bold": true, "strikethrough": false },
        }),
        RowStyle::Removed => json!({
            "backgroundColor": { "red": 0.94, "green": 0.94, "blue": 0.94 },
            "textFormat": {
                "bold": false,
                "strikethrough": true,
                "foregroundColor": { "red": 0.5, "green": 0.5, "blue": 0.5 },
            },
        }),
        RowStyle::Normal => json!({
            "backgroundColor": { "red": 1.0, "green": 1.0, "blue": 1.0 },
            "textFormat": {
                "bold": false,
                "strikethrough": false,
                "foregroundColor": { "red": 0.0, "green": 0.0, "blue": 0.0 },
            },
        }),
    }
}

#[async_trait]
impl TableStore for SheetsClient {
    async fn read_range(&self, range: CellRange) -> Result<Vec<Vec<String>>, StoreError> {
        let a1 = range.to_a1(&self.sheet_name);
        let url = self.values_url(&a1, "", &[("valueRenderOption", "FORMATTED_VALUE")])?;

        let body: ValueRange = self.send(self.http.get(url)).await?.json().await?;
        let rows = body
            .values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect::<Vec<Vec<String>>>();

        tracing::debug!(range = %a1, rows = rows.len(), "Sheet range read");
        Ok(rows)
    }

    async fn write_range(&self, range: CellRange, rows: &[Vec<String>]) -> Result<(), StoreError> {
        if range.row_count().is_some_and(|n| n != rows.len()) {
            return Err(StoreError::InvalidRange(format!(
                "{range} given {} rows",
                rows.len()
            )));
        }

        let a1 = range.to_a1(&self.sheet_name);
        let url = self.update_url(&a1)?;
        let body = ValueRangeBody {
            range: &a1,
            major_dimension: "ROWS",
            values: rows,
        };

        self.send(self.http.put(url).json(&body)).await?;
        tracing::debug!(range = %a1, rows = rows.len(), "Sheet range written");
        Ok(())
    }

    async fn append_rows(&self, rows: &[Vec<String>]) -> Result<(), StoreError> {
        let a1 = CellRange::whole_sheet().to_a1(&self.sheet_name);
        let url = self.append_url(&a1)?;
        let body = ValueRangeBody {
            range: &a1,
            major_dimension: "ROWS",
            values: rows,
        };

        self.send(self.http.post(url).json(&body)).await?;
        tracing::debug!(rows = rows.len(), "Sheet rows appended");
        Ok(())
    }

    async fn format_range(&self, range: CellRange, style: RowStyle) -> Result<(), StoreError> {
        let end_row = range
            .end_row
            .ok_or_else(|| StoreError::InvalidRange(format!("{range} is open-ended")))?;

        let mut grid = json!({
            "sheetId": self.sheet_gid,
            "startRowIndex": range.start_row.saturating_sub(1),
            "endRowIndex": end_row,
        });
        if let Some(width) = range.width {
            grid["startColumnIndex"] = json!(0);
            grid["endColumnIndex"] = json!(width);
        }

        let body = json!({
            "requests": [{
                "repeatCell": {
                    "range": grid,
                    "cell": { "userEnteredFormat": style_format(style) },
                    "fields": "userEnteredFormat(backgroundColor,textFormat)",
                }
            }]
        });

        let url = format!("{}/{}:batchUpdate", self.base_url, self.spreadsheet_id);
        self.send(self.http.post(&url).json(&body)).await?;
        tracing::debug!(%range, %style, "Sheet range formatted");
        Ok(())
    }
}
