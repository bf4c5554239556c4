//! Airtable storage adapter.
//!
//! Posts live in one Airtable table; this adapter maps [`PostRecord`]
//! fields onto the table's columns and drives the records REST API.
//! Airtable assigns its own record ids, so lookups go through a
//! `filterByFormula` match on the `Post Id` column.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use postpilot_models::{Audience, PostId, PostRecord, PostStatus, SeriesId, Tone};

use crate::error::{Result, StorageError};
use crate::store::PostStore;

/// Environment variable for the Airtable API key.
pub const AIRTABLE_API_KEY_ENV: &str = "AIRTABLE_API_KEY";

/// Environment variable for the Airtable base id.
pub const AIRTABLE_BASE_ID_ENV: &str = "AIRTABLE_BASE_ID";

/// Environment variable overriding the table name.
pub const AIRTABLE_TABLE_ENV: &str = "AIRTABLE_TABLE";

/// Default table name.
const DEFAULT_TABLE: &str = "Posts";

/// Airtable REST API root.
const AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";

/// Airtable-backed post store.
#[derive(Clone)]
pub struct AirtableStore {
    client: reqwest::Client,
    api_key: String,
    base_id: String,
    table: String,
}

impl AirtableStore {
    /// Create a store for the given base and table.
    pub fn new(
        api_key: impl Into<String>,
        base_id: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_id: base_id.into(),
            table: table.into(),
        }
    }

    /// Create a store from `AIRTABLE_API_KEY`, `AIRTABLE_BASE_ID`, and the
    /// optional `AIRTABLE_TABLE` environment variables.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(AIRTABLE_API_KEY_ENV).map_err(|_| {
            StorageError::Configuration(format!("Missing {} environment variable", AIRTABLE_API_KEY_ENV))
        })?;
        let base_id = std::env::var(AIRTABLE_BASE_ID_ENV).map_err(|_| {
            StorageError::Configuration(format!("Missing {} environment variable", AIRTABLE_BASE_ID_ENV))
        })?;
        let table = std::env::var(AIRTABLE_TABLE_ENV).unwrap_or_else(|_| DEFAULT_TABLE.to_string());
        Ok(Self::new(api_key, base_id, table))
    }

    fn table_url(&self) -> String {
        format!("{}/{}/{}", AIRTABLE_API_URL, self.base_id, self.table)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(StorageError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Find the Airtable record holding the given post id.
    async fn find_record(&self, id: &PostId) -> Result<Option<AirtableRecord>> {
        let response = self
            .client
            .get(self.table_url())
            .bearer_auth(&self.api_key)
            .query(&[
                ("filterByFormula", post_id_formula(id).as_str()),
                ("maxRecords", "1"),
            ])
            .send()
            .await?;
        let response = Self::check(response).await?;
        let mut listing: ListResponse = response.json().await?;
        Ok(if listing.records.is_empty() {
            None
        } else {
            Some(listing.records.swap_remove(0))
        })
    }
}

#[async_trait]
impl PostStore for AirtableStore {
    async fn save(&self, record: &PostRecord) -> Result<()> {
        let fields = RecordFields::from_record(record);

        if let Some(existing) = self.find_record(&record.id).await? {
            let response = self
                .client
                .patch(format!("{}/{}", self.table_url(), existing.id))
                .bearer_auth(&self.api_key)
                .json(&PatchRequest { fields })
                .send()
                .await?;
            Self::check(response).await?;
            debug!(post_id = %record.id, "Airtable record updated");
        } else {
            let response = self
                .client
                .post(self.table_url())
                .bearer_auth(&self.api_key)
                .json(&CreateRequest {
                    records: vec![CreateRecord { fields }],
                })
                .send()
                .await?;
            Self::check(response).await?;
            debug!(post_id = %record.id, "Airtable record created");
        }
        Ok(())
    }

    async fn update_status(&self, id: &PostId, status: PostStatus) -> Result<()> {
        let existing = self
            .find_record(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;

        let response = self
            .client
            .patch(format!("{}/{}", self.table_url(), existing.id))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "fields": { fields::STATUS: status.to_string() }
            }))
            .send()
            .await?;
        Self::check(response).await?;
        debug!(post_id = %id, %status, "Airtable status updated");
        Ok(())
    }

    async fn get(&self, id: &PostId) -> Result<Option<PostRecord>> {
        match self.find_record(id).await? {
            Some(record) => record.fields.into_record().map(Some),
            None => Ok(None),
        }
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>> {
        let response = self
            .client
            .get(self.table_url())
            .bearer_auth(&self.api_key)
            .query(&[
                ("maxRecords", limit.to_string().as_str()),
                ("sort[0][field]", fields::CREATED_AT),
                ("sort[0][direction]", "desc"),
            ])
            .send()
            .await?;
        let response = Self::check(response).await?;
        let listing: ListResponse = response.json().await?;
        listing
            .records
            .into_iter()
            .map(|r| r.fields.into_record())
            .collect()
    }
}

/// Column names in the Airtable table.
mod fields {
    pub const POST_ID: &str = "Post Id";
    pub const SERIES_ID: &str = "Series Id";
    pub const CONTENT: &str = "Content";
    pub const TONE: &str = "Tone";
    pub const AUDIENCE: &str = "Audience";
    pub const SOURCE_TITLE: &str = "Source Title";
    pub const STATUS: &str = "Status";
    pub const CREATED_AT: &str = "Created At";
}

/// `filterByFormula` expression matching one post id.
fn post_id_formula(id: &PostId) -> String {
    // Post ids are UUIDs, so no quote escaping is needed.
    format!("{{{}}} = '{}'", fields::POST_ID, id)
}

/// Typed mapping of one table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordFields {
    #[serde(rename = "Post Id")]
    post_id: String,

    #[serde(rename = "Series Id", skip_serializing_if = "Option::is_none", default)]
    series_id: Option<String>,

    #[serde(rename = "Content")]
    content: String,

    #[serde(rename = "Tone")]
    tone: String,

    #[serde(rename = "Audience")]
    audience: String,

    #[serde(rename = "Source Title")]
    source_title: String,

    #[serde(rename = "Status")]
    status: String,

    #[serde(rename = "Created At")]
    created_at: String,
}

impl RecordFields {
    fn from_record(record: &PostRecord) -> Self {
        Self {
            post_id: record.id.to_string(),
            series_id: record.series_id.as_ref().map(ToString::to_string),
            content: record.content.clone(),
            tone: record.tone.to_string(),
            audience: record.audience.to_string(),
            source_title: record.source_title.clone(),
            status: record.status.to_string(),
            created_at: record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    fn into_record(self) -> Result<PostRecord> {
        let tone = Tone::parse(&self.tone)
            .ok_or_else(|| StorageError::MalformedRecord(format!("unknown tone `{}`", self.tone)))?;
        let audience = Audience::parse(&self.audience).ok_or_else(|| {
            StorageError::MalformedRecord(format!("unknown audience `{}`", self.audience))
        })?;
        let status = PostStatus::parse(&self.status).ok_or_else(|| {
            StorageError::MalformedRecord(format!("unknown status `{}`", self.status))
        })?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| {
                StorageError::MalformedRecord(format!("bad timestamp `{}`: {}", self.created_at, e))
            })?
            .with_timezone(&Utc);

        Ok(PostRecord {
            id: PostId::from_string(self.post_id),
            series_id: self.series_id.map(SeriesId::from_string),
            content: self.content,
            tone,
            audience,
            source_title: self.source_title,
            status,
            created_at,
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateRequest {
    records: Vec<CreateRecord>,
}

#[derive(Debug, Serialize)]
struct CreateRecord {
    fields: RecordFields,
}

#[derive(Debug, Serialize)]
struct PatchRequest {
    fields: RecordFields,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    records: Vec<AirtableRecord>,
}

#[derive(Debug, Deserialize)]
struct AirtableRecord {
    id: String,
    fields: RecordFields,
}
