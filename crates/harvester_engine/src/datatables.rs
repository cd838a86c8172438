use std::time::Duration;

use engine_logging::engine_debug;
use futures_util::StreamExt;
use harvester_core::{PageInfo, RawPage};
use scraper::Html;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::source::TableSource;
use crate::{AdvanceMode, SourceError, SourceErrorKind};

#[derive(Debug, Clone)]
pub struct DataTablesSettings {
    /// Rows requested per page (`length`).
    pub page_length: u32,
    /// Query parameter carrying the source id.
    pub source_param: String,
    /// Column names; when unset they come from the row objects.
    pub columns: Option<Vec<String>>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_bytes: u64,
}

impl Default for DataTablesSettings {
    fn default() -> Self {
        Self {
            page_length: 200,
            source_param: "source".to_string(),
            columns: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_bytes: 32 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DataTablesResponse {
    #[serde(rename = "recordsTotal", default)]
    records_total: Option<u64>,
    #[serde(default)]
    data: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
struct LoadedPage {
    page_index: u32,
    raw: RawPage,
    total_records: Option<u64>,
}

/// A table served through the jQuery DataTables server-side protocol.
///
/// Pages are addressed by `start`/`length`; the source keeps its own page
/// cursor and only talks to the server when the cursor's page is not loaded.
pub struct DataTablesSource {
    client: reqwest::Client,
    endpoint: Url,
    source_id: String,
    settings: DataTablesSettings,
    page_index: u32,
    draw: u64,
    loaded: Option<LoadedPage>,
}

impl DataTablesSource {
    pub fn new(
        endpoint: &str,
        source_id: impl Into<String>,
        settings: DataTablesSettings,
    ) -> Result<Self, SourceError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|err| SourceError::structural(format!("invalid endpoint: {err}")))?;
        if settings.page_length == 0 {
            return Err(SourceError::structural("page length must be positive"));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SourceError::new(SourceErrorKind::Network, err.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            source_id: source_id.into(),
            settings,
            page_index: 0,
            draw: 0,
            loaded: None,
        })
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    fn page_url(&mut self) -> Url {
        self.draw += 1;
        let start = u64::from(self.page_index) * u64::from(self.settings.page_length);
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(&self.settings.source_param, &self.source_id)
            .append_pair("draw", &self.draw.to_string())
            .append_pair("start", &start.to_string())
            .append_pair("length", &self.settings.page_length.to_string());
        url
    }

    async fn load(&mut self) -> Result<&LoadedPage, SourceError> {
        let cached = matches!(&self.loaded, Some(page) if page.page_index == self.page_index);
        if !cached {
            let page = self.request().await?;
            self.loaded = Some(page);
        }
        self.loaded
            .as_ref()
            .ok_or_else(|| SourceError::unavailable("page not loaded"))
    }

    async fn request(&mut self) -> Result<LoadedPage, SourceError> {
        let url = self.page_url();
        engine_debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let kind = match code {
                408 | 429 => SourceErrorKind::HttpStatus(code),
                400..=499 => SourceErrorKind::Structural,
                _ => SourceErrorKind::HttpStatus(code),
            };
            return Err(SourceError::new(kind, status.to_string()));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, content_len));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }

        let parsed: DataTablesResponse = serde_json::from_slice(&body)
            .map_err(|err| SourceError::new(SourceErrorKind::Decode, err.to_string()))?;
        if let Some(message) = parsed.error {
            return Err(SourceError::unavailable(message));
        }
        let rows = parsed
            .data
            .ok_or_else(|| SourceError::structural("response has no data array"))?;

        Ok(LoadedPage {
            page_index: self.page_index,
            raw: self.raw_page(rows)?,
            total_records: parsed.records_total,
        })
    }

    fn raw_page(&self, rows: Vec<Value>) -> Result<RawPage, SourceError> {
        let mut headers = self.settings.columns.clone().unwrap_or_default();
        if headers.is_empty() {
            if let Some(Value::Object(first)) = rows.first() {
                headers = first.keys().cloned().collect();
            }
        }

        let mut cells = Vec::with_capacity(rows.len());
        for row in rows {
            let row: Vec<Option<String>> = match row {
                Value::Array(values) => values.iter().map(cell_text).collect(),
                Value::Object(map) => headers
                    .iter()
                    .map(|h| map.get(h).map_or(Some(String::new()), cell_text))
                    .collect(),
                other => {
                    return Err(SourceError::structural(format!(
                        "unexpected row shape: {other}"
                    )))
                }
            };
            cells.push(row);
        }
        Ok(RawPage::new(headers, cells))
    }

    fn move_to(&mut self, page_index: u32) {
        self.page_index = page_index;
        self.loaded = None;
    }
}

fn info_for(page: &LoadedPage, page_length: u32) -> PageInfo {
    let length = u64::from(page_length);
    let total_pages = match page.total_records {
        Some(total) => u32::try_from(total.div_ceil(length)).unwrap_or(u32::MAX),
        // Without a total, a full page hints at more to come.
        None if page.raw.rows.len() as u64 >= length => page.page_index + 2,
        None => page.page_index + 1,
    };
    PageInfo {
        current_page_index: page.page_index,
        total_pages,
        total_records: page.total_records,
        has_next_page: page.page_index + 1 < total_pages,
    }
}

#[async_trait::async_trait]
impl TableSource for DataTablesSource {
    async fn fetch_current_page(&mut self) -> Result<RawPage, SourceError> {
        Ok(self.load().await?.raw.clone())
    }

    async fn page_info(&mut self) -> Result<PageInfo, SourceError> {
        let page_length = self.settings.page_length;
        let page = self.load().await?;
        Ok(info_for(page, page_length))
    }

    async fn go_to_page(&mut self, page_index: u32) -> Result<bool, SourceError> {
        let info = self.page_info().await?;
        if page_index >= info.total_pages {
            return Ok(false);
        }
        self.move_to(page_index);
        Ok(true)
    }

    async fn advance_to_next_page(&mut self, mode: AdvanceMode) -> Result<bool, SourceError> {
        if mode == AdvanceMode::Normal && !self.page_info().await?.has_next_page {
            return Ok(false);
        }
        self.move_to(self.page_index + 1);
        Ok(true)
    }
}

/// Visible text of a cell; markup is stripped the way a browser renders it.
fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.contains('<') || s.contains('&') => Some(
            Html::parse_fragment(s)
                .root_element()
                .text()
                .collect::<String>(),
        ),
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn too_large(max_bytes: u64, actual: u64) -> SourceError {
    SourceError::new(
        SourceErrorKind::Decode,
        format!("response too large (max {max_bytes}, actual {actual})"),
    )
}

fn map_reqwest_error(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        return SourceError::new(SourceErrorKind::Timeout, err.to_string());
    }
    SourceError::new(SourceErrorKind::Network, err.to_string())
}
