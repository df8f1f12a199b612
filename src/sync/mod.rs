//! Library sync events for the e-reader metadata service.
//!
//! Scans a book directory and maps each EPUB to the entitlement record the
//! reader's sync endpoint expects. Serving those records over HTTP is not
//! part of this crate; `bookfetch events` prints them as JSON.
//!
//! # Shapes
//!
//! Firmware versions accept different amounts of detail:
//!
//! - [`EventShape::V1`]: `NewEntitlement` with the core book metadata.
//! - [`EventShape::V2`]: V1 plus a top-level `ChangeType`.
//! - [`EventShape::V3`]: V2 plus contributor roles, price blocks and
//!   publisher details (the default).
//!
//! Object keys are emitted in sorted order.

mod error;
mod library;

pub use error::{MetadataError, UnknownEventShape};
pub use library::{
    Library, PackageMetadata, SyncBook, UNKNOWN_AUTHOR, UNTITLED, book_id, display_author,
    read_package_metadata,
};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Timestamp layout the reader accepts (no sub-seconds).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Book format advertised in download URLs.
pub const BOOK_FORMAT: &str = "EPUB";

const NULL_GENRE: &str = "00000000-0000-0000-0000-000000000000";

/// Amount of detail in emitted events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventShape {
    /// Entitlement and core metadata only.
    V1,
    /// Adds `ChangeType`.
    V2,
    /// Full metadata block.
    #[default]
    V3,
}

impl fmt::Display for EventShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        })
    }
}

impl FromStr for EventShape {
    type Err = UnknownEventShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            "v3" | "3" => Ok(Self::V3),
            _ => Err(UnknownEventShape(s.to_string())),
        }
    }
}

/// Formats `at` the way the reader expects.
#[must_use]
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Download URL for a book served from `host`.
#[must_use]
pub fn download_url(host: &str, book: &SyncBook) -> String {
    format!(
        "{}/download/{}/{BOOK_FORMAT}/{}",
        host.trim_end_matches('/'),
        book.id,
        book.filename
    )
}

/// One sync record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SyncEvent {
    /// Present from V2 on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_type: Option<&'static str>,
    /// The entitlement itself.
    pub new_entitlement: NewEntitlement,
}

/// Entitlement plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NewEntitlement {
    /// Ownership record.
    pub book_entitlement: BookEntitlement,
    /// Descriptive record.
    pub book_metadata: BookMetadata,
}

/// Ownership record; fields in sorted key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BookEntitlement {
    pub accessibility: &'static str,
    pub active_period: ActivePeriod,
    pub created: String,
    pub cross_revision_id: String,
    pub id: String,
    pub is_hidden_from_archive: bool,
    pub is_locked: bool,
    pub is_removed: bool,
    pub last_modified: String,
    pub origin_category: &'static str,
    pub revision_id: String,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivePeriod {
    pub from: String,
}

/// Descriptive record; fields in sorted key order. `None` fields are V3-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BookMetadata {
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributor_roles: Option<Vec<ContributorRole>>,
    pub contributors: Vec<String>,
    pub cover_image_id: String,
    pub cross_revision_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_display_price: Option<DisplayPrice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_love_display_price: Option<LovePrice>,
    pub description: String,
    pub download_urls: Vec<DownloadLink>,
    pub entitlement_id: String,
    pub external_ids: Vec<String>,
    pub genre: &'static str,
    pub is_eligible_for_kobo_love: bool,
    pub is_internet_archive: bool,
    pub is_pre_order: bool,
    pub is_social_enabled: bool,
    pub language: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic_pronunciations: Option<serde_json::Map<String, serde_json::Value>>,
    pub publication_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    pub revision_id: String,
    pub title: String,
    pub work_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContributorRole {
    pub name: String,
    pub role: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayPrice {
    pub currency_code: &'static str,
    pub total_amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LovePrice {
    pub total_amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Publisher {
    pub imprint: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    #[serde(rename = "DRMType")]
    pub drm_type: &'static str,
    #[serde(rename = "Format")]
    pub format: &'static str,
    #[serde(rename = "Platform")]
    pub platform: &'static str,
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "Url")]
    pub url: String,
}

impl SyncBook {
    /// Builds the sync record for this book.
    #[must_use]
    pub fn to_sync_event(&self, host: &str, shape: EventShape, timestamp: &str) -> SyncEvent {
        let full = shape == EventShape::V3;
        let author = self.display_author();

        let book_entitlement = BookEntitlement {
            accessibility: "Full",
            active_period: ActivePeriod {
                from: timestamp.to_string(),
            },
            created: timestamp.to_string(),
            cross_revision_id: self.id.clone(),
            id: self.id.clone(),
            is_hidden_from_archive: false,
            is_locked: false,
            is_removed: false,
            last_modified: timestamp.to_string(),
            origin_category: "Imported",
            revision_id: self.id.clone(),
            status: "Active",
        };

        let book_metadata = BookMetadata {
            categories: Vec::new(),
            contributor_roles: full.then(|| {
                vec![ContributorRole {
                    name: author.clone(),
                    role: "Author",
                }]
            }),
            contributors: vec![author],
            cover_image_id: self.id.clone(),
            cross_revision_id: self.id.clone(),
            current_display_price: full.then_some(DisplayPrice {
                currency_code: "USD",
                total_amount: 0,
            }),
            current_love_display_price: full.then_some(LovePrice { total_amount: 0 }),
            description: self.description.clone(),
            download_urls: vec![DownloadLink {
                drm_type: "NONE",
                format: BOOK_FORMAT,
                platform: "Generic",
                size: self.size,
                url: download_url(host, self),
            }],
            entitlement_id: self.id.clone(),
            external_ids: Vec::new(),
            genre: NULL_GENRE,
            is_eligible_for_kobo_love: false,
            is_internet_archive: false,
            is_pre_order: false,
            is_social_enabled: false,
            language: "en",
            phonetic_pronunciations: full.then(serde_json::Map::new),
            publication_date: timestamp.to_string(),
            publisher: full.then(|| Publisher {
                imprint: String::new(),
                name: "Unknown".to_string(),
            }),
            revision_id: self.id.clone(),
            title: self.title.clone(),
            work_id: self.id.clone(),
        };

        SyncEvent {
            change_type: (shape != EventShape::V1).then_some("Entitlement"),
            new_entitlement: NewEntitlement {
                book_entitlement,
                book_metadata,
            },
        }
    }
}

impl Library {
    /// Sync records for every book, stamped with `now`.
    #[must_use]
    pub fn sync_events(&self, host: &str, shape: EventShape, now: &DateTime<Utc>) -> Vec<SyncEvent> {
        let timestamp = format_timestamp(now);
        self.books()
            .iter()
            .map(|book| book.to_sync_event(host, shape, &timestamp))
            .collect()
    }
}
