//! Data models for the Bas Play scraper API
//!
//! This module contains the response envelopes and payload shapes used by
//! the HTTP endpoints, plus the wire format of the site's cursor feed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::filters;
use crate::parser::CatalogPage;

// Re-export parser models for convenience
pub use crate::parser::{CatalogDetail, CatalogEntry, EpisodeRef, VideoRef};

/// Generic API response wrapper for successful responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// Whether the operation was successful (always true for this type)
    pub success: bool,
    /// The response payload
    pub data: T,
    /// ISO timestamp of when data was fetched
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Create a new successful API response with the current timestamp
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Whether the operation was successful (always false for errors)
    pub success: bool,
    /// Error message describing what went wrong
    pub error: String,
    /// ISO timestamp of when the error occurred
    pub timestamp: String,
}

impl ApiError {
    /// Create a new API error response with the current timestamp
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// One page of catalog entries as returned by the listing endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPageResponse {
    /// Page number this payload corresponds to
    pub page: u32,
    /// Catalog entries, at most 30
    pub entries: Vec<CatalogEntry>,
    /// Whether a further page can be requested
    pub has_next_page: bool,
}

impl CatalogPageResponse {
    /// Wrap a parsed catalog page with its page number
    pub fn new(page: u32, catalog_page: CatalogPage) -> Self {
        Self {
            page,
            entries: catalog_page.entries,
            has_next_page: catalog_page.has_next_page,
        }
    }
}

/// Detail endpoint payload: the entry URL plus its enrichment fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailResponse {
    /// The entry URL the detail was fetched for
    pub url: String,
    /// Synopsis paragraph, when present
    pub description: Option<String>,
    /// Genre chips
    pub genres: Vec<String>,
    /// Publication status (always "Completed")
    pub status: String,
}

impl DetailResponse {
    /// Combine the queried URL with its parsed detail fields
    pub fn new(url: String, detail: CatalogDetail) -> Self {
        Self {
            url,
            description: detail.description,
            genres: detail.genres,
            status: detail.status,
        }
    }
}

/// One selectable filter option
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterOption {
    /// Label shown to the user
    pub label: String,
    /// Query value sent back to the search endpoint
    pub value: String,
}

/// Fixed category catalogs for hosts to render filter pickers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterLists {
    /// Movie categories
    pub movie_categories: Vec<FilterOption>,
    /// TV show categories
    pub tv_categories: Vec<FilterOption>,
}

impl FilterLists {
    /// Build the filter catalogs from the site's fixed category lists
    pub fn all() -> Self {
        let to_options = |pairs: &[(&str, &str)]| {
            pairs
                .iter()
                .map(|(label, value)| FilterOption {
                    label: label.to_string(),
                    value: value.to_string(),
                })
                .collect()
        };

        Self {
            movie_categories: to_options(filters::MOVIE_CATEGORIES),
            tv_categories: to_options(filters::TV_CATEGORIES),
        }
    }
}

/// JSON envelope returned by the site's cursor feed endpoint
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FeedChunk {
    /// HTML fragment holding the next batch of cards
    #[serde(default)]
    pub html: String,
    /// Cursor for the page after this one, when more data exists
    #[serde(default)]
    pub next_cursor: Option<String>,
}
