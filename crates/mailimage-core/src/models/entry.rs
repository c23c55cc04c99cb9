//! Entry model: the durable metadata record of an accepted submission.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::AppError;

/// Monotonic, never reused identity of an entry.
pub type EntryId = u64;

const CREATED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SUMMARY_CREATED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Sender of a submission, as parsed from the `From` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// Display name, empty when the header carried none
    pub name: String,
    pub address: String,
}

impl Sender {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Entry stored in the metadata store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub from_name: String,
    pub from_address: String,
    pub subject: String,
    pub text: String,
    /// Image file extension without the leading dot, e.g. `jpg`
    pub extension: String,
    pub created: DateTime<Utc>,
}

impl Entry {
    /// Field/value pairs as persisted in a key-value record.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("from", self.from_name.clone()),
            ("mail", self.from_address.clone()),
            ("subject", self.subject.clone()),
            ("text", self.text.clone()),
            ("fileext", self.extension.clone()),
            ("created", self.created.format(CREATED_FORMAT).to_string()),
        ]
    }

    /// Rebuild an entry from a key-value record.
    ///
    /// Returns `Ok(None)` for an empty record, which is how key-value stores report an
    /// absent key.
    pub fn from_fields(
        id: EntryId,
        mut fields: HashMap<String, String>,
    ) -> Result<Option<Self>, AppError> {
        if fields.is_empty() {
            return Ok(None);
        }

        let mut take = |name: &str| {
            fields.remove(name).ok_or_else(|| {
                AppError::Database(format!("entry {} is missing field '{}'", id, name))
            })
        };

        let from_name = take("from")?;
        let from_address = take("mail")?;
        let subject = take("subject")?;
        let text = take("text")?;
        let extension = take("fileext")?;
        let created_raw = take("created")?;

        let created = NaiveDateTime::parse_from_str(&created_raw, CREATED_FORMAT)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .map_err(|e| {
                AppError::Database(format!(
                    "entry {} has unparseable created time '{}': {}",
                    id, created_raw, e
                ))
            })?;

        Ok(Some(Entry {
            id,
            from_name,
            from_address,
            subject,
            text,
            extension,
            created,
        }))
    }

    pub fn summary(&self) -> EntrySummary {
        EntrySummary {
            id: self.id,
            from: self.from_name.clone(),
            title: self.subject.clone(),
            text: self.text.clone(),
            extension: self.extension.clone(),
            created: self.created.format(SUMMARY_CREATED_FORMAT).to_string(),
        }
    }
}

/// Public view of an entry used by listings. The sender address is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    pub id: EntryId,
    pub from: String,
    pub title: String,
    pub text: String,
    #[serde(rename = "fileextension")]
    pub extension: String,
    pub created: String,
}
