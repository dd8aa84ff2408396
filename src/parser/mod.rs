//! Parser module for extracting structured data from HTML
//!
//! This module turns Bas Play page markup into catalog entries, episode
//! references and video URLs. The site has gone through several redesigns,
//! so selectors are tried in order from newest markup to oldest and all
//! parsing is best effort: a field that cannot be extracted is left empty
//! rather than failing the whole page.

use std::collections::HashSet;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::constants::endpoints;

/// Maximum entries surfaced per catalog page
pub const PAGE_SIZE: usize = 30;

/// Status reported for every entry; the site does not expose one
pub const STATUS_COMPLETED: &str = "Completed";

/// One browsable title (movie or series) surfaced to the host app
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Entry page URL, usually site-relative (e.g. "view.php?id=7")
    pub url: String,
    /// Display title
    pub title: String,
    /// Absolute thumbnail URL, when the card carries an image
    pub thumbnail: Option<String>,
}

/// One page of catalog entries plus the forward-pagination flag
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub entries: Vec<CatalogEntry>,
    pub has_next_page: bool,
}

impl CatalogPage {
    /// An empty page that ends pagination
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            has_next_page: false,
        }
    }
}

/// Detail-page enrichment for a catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDetail {
    /// Synopsis paragraph, when present
    pub description: Option<String>,
    /// Genre chips
    pub genres: Vec<String>,
    /// Always [`STATUS_COMPLETED`]
    pub status: String,
}

/// A single playable episode (or a movie's pseudo-episode)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRef {
    /// Episode page or stream URL
    pub url: String,
    /// Display name (e.g. "Dark Matter S02E05")
    pub name: String,
    /// Numeric sort key: season * 1000 + episode
    pub episode_number: f32,
}

/// A resolved, playable video URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    /// Playable URL, percent-encoded for the player
    pub url: String,
    /// Source label shown to the user
    pub label: String,
}

/// Read the opaque pagination cursor from the home page feed state node
pub fn parse_feed_cursor(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("#feedState").unwrap();

    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("data-cursor"))
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

/// Parse feed cards from the home page
///
/// Extracts entries from `div#dateFeed`, covering both the card layout and
/// the older date-block layout.
pub fn parse_feed_items(html: &str, base_url: &str) -> Vec<CatalogEntry> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div#dateFeed a.cp-card, div#dateFeed div.date-block a").unwrap();

    collect_entries(document.select(&selector), base_url)
}

/// Parse feed cards from a cursor-feed HTML fragment
///
/// The fragment is the `html` field of the JSON returned by
/// `fetch_more.php`; it contains bare `a.cp-card` elements.
pub fn parse_feed_fragment(html: &str, base_url: &str) -> Vec<CatalogEntry> {
    let document = Html::parse_fragment(html);
    let selector = Selector::parse("a.cp-card").unwrap();

    collect_entries(document.select(&selector), base_url)
}

/// Parse grid entries from a search or category page
pub fn parse_browse_items(html: &str, base_url: &str) -> Vec<CatalogEntry> {
    let document = Html::parse_document(html);
    // Markup variants across redesigns, newest first
    let selector = Selector::parse(
        "div.grid a.cp-card, div.grid a[href^='view.php'], div.grid a[href^='tview.php'], \
         a.cp-card, a[class*='bg-white/5']",
    )
    .unwrap();

    collect_entries(document.select(&selector), base_url)
}

/// Check for a next-page link in the pagination nav
///
/// True when a `nav` link says "Next" (any casing) or points at
/// `page=<current + 1>`.
pub fn has_next_page(html: &str, current_page: u32) -> bool {
    let document = Html::parse_document(html);
    let selector = Selector::parse("nav a").unwrap();
    let marker = format!("page={}", current_page.saturating_add(1));

    document.select(&selector).any(|el| {
        let text = el.text().collect::<String>();
        text.to_ascii_lowercase().contains("next")
            || el
                .value()
                .attr("href")
                .map_or(false, |href| href.contains(&marker))
    })
}

/// Normalize raw card elements into catalog entries
///
/// Episode cards ("Title S01E02") collapse into their series entry and
/// duplicates are dropped, keeping first-occurrence order. At most
/// [`PAGE_SIZE`] elements are considered.
fn collect_entries<'a>(
    items: impl Iterator<Item = ElementRef<'a>>,
    base_url: &str,
) -> Vec<CatalogEntry> {
    let title_selector = Selector::parse("div.cp-title, h2, div.cap, div.cap-title").unwrap();
    let img_selector = Selector::parse("img").unwrap();
    let episode_card = Regex::new(r"(?i)^(.*?) S(\d+)E(\d+)").unwrap();

    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for item in items.take(PAGE_SIZE) {
        let mut url = item.value().attr("href").unwrap_or_default().to_string();

        let mut title = item
            .select(&title_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| item.value().attr("title").map(|t| t.trim().to_string()))
            .unwrap_or_default();

        if url.trim().is_empty() || title.is_empty() {
            continue;
        }

        let thumbnail = item
            .select(&img_selector)
            .next()
            .and_then(|el| el.value().attr("src").or_else(|| el.value().attr("data-src")))
            .map(|src| endpoints::fix_url(base_url, src));

        // An episode card stands in for its whole series
        if let Some(caps) = episode_card.captures(&title) {
            let series_name = caps[1].trim().to_string();
            if !series_name.is_empty() {
                url = endpoints::series_path(&series_name);
                title = series_name;
            }
        }

        if !seen.insert(url.clone()) {
            continue;
        }

        entries.push(CatalogEntry {
            url,
            title,
            thumbnail,
        });
    }

    entries
}

/// Parse detail-page enrichment fields for a catalog entry
pub fn parse_detail(html: &str) -> CatalogDetail {
    let document = Html::parse_document(html);
    let description_selector = Selector::parse("p.leading-relaxed, p.text-slate-800").unwrap();
    let genre_selector = Selector::parse("span.chip").unwrap();

    let description = document
        .select(&description_selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty());

    let genres = document
        .select(&genre_selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    CatalogDetail {
        description,
        genres,
        status: STATUS_COMPLETED.to_string(),
    }
}

/// A movie entry links straight to `view.php`; series use `tview.php`
pub fn is_movie_url(url: &str) -> bool {
    url.contains("view.php") && !url.contains("tview.php")
}

/// Resolve the playable link on a movie entry page
///
/// Fallback order follows the site's redesigns: download button, player
/// call-to-action, inline video tag, then the entry page itself.
pub fn parse_movie_play_url(html: &str, entry_url: &str) -> String {
    let document = Html::parse_document(html);

    for selector in ["a#dlBtn", "a.cta, a[href^='player.php']"] {
        let selector = Selector::parse(selector).unwrap();
        if let Some(href) = document
            .select(&selector)
            .next()
            .and_then(|el| el.value().attr("href"))
        {
            if !href.is_empty() {
                return href.to_string();
            }
        }
    }

    let video_selector = Selector::parse("video source").unwrap();
    if let Some(src) = document
        .select(&video_selector)
        .next()
        .and_then(|el| el.value().attr("src"))
    {
        if !src.is_empty() {
            return src.to_string();
        }
    }

    entry_url.to_string()
}

/// Parse the episode rail on a series page
///
/// `season` seeds the sort key for episodes whose name carries no SxxEyy
/// tag. Items without a `data-src` URL are skipped.
pub fn parse_episode_items(html: &str, season: u32) -> Vec<EpisodeRef> {
    let document = Html::parse_document(html);
    let item_selector = Selector::parse("a.ep-item").unwrap();
    let name_selector = Selector::parse("div.text-sm").unwrap();
    let tag = Regex::new(r"(?i)S(\d+)E(\d+)").unwrap();

    let mut episodes = Vec::new();

    for (index, element) in document.select(&item_selector).enumerate() {
        let url = element.value().attr("data-src").unwrap_or_default();
        if url.trim().is_empty() {
            continue;
        }

        let name = element
            .select(&name_selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| element.text().collect::<String>().trim().to_string());

        let fallback_number = element
            .value()
            .attr("data-epnum")
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or((index + 1) as f32);

        let episode_number = episode_sort_key(&name, season, fallback_number, &tag);

        let url = if url.starts_with("http") || url.starts_with('/') {
            url.to_string()
        } else {
            format!("/{}", url)
        };

        episodes.push(EpisodeRef {
            url,
            name,
            episode_number,
        });
    }

    episodes
}

/// Sort key for an episode: an SxxEyy tag in the name wins, otherwise the
/// season base plus the per-season number
fn episode_sort_key(name: &str, season: u32, fallback_number: f32, tag: &Regex) -> f32 {
    if let Some(caps) = tag.captures(name) {
        if let (Ok(s), Ok(e)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
            return (s * 1000 + e) as f32;
        }
    }
    (season * 1000) as f32 + fallback_number
}

/// Season selected on a series page, defaulting to 1
pub fn parse_selected_season(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let selector = Selector::parse("select#seasonSelect option[selected]").unwrap();

    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("value"))
        .and_then(|v| v.parse().ok())
        .unwrap_or(1)
}

/// All season options on a series page as (raw value, numeric season) pairs
///
/// Non-numeric values fall back to season 1, matching the sort-key base
/// used when parsing that season's episodes.
pub fn parse_season_options(html: &str) -> Vec<(String, u32)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("select#seasonSelect option").unwrap();

    document
        .select(&selector)
        .filter_map(|el| el.value().attr("value"))
        .filter(|v| !v.is_empty())
        .map(|v| (v.to_string(), v.parse().unwrap_or(1)))
        .collect()
}

/// Series heading used to build per-season listing URLs
pub fn parse_series_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h1.sec-title").unwrap();

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Direct video URL from a player page, when present
pub fn parse_player_video(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("video source").unwrap();

    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}
