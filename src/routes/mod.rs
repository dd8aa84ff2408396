//! API Routes module for the Bas Play scraper
//!
//! This module contains all HTTP route handlers for the public API endpoints
//! and the orchestration of the scrape/parse pipeline behind them.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::config::Config;
use crate::constants::endpoints;
use crate::error::{AppError, AppResult};
use crate::models::{
    ApiError, ApiResponse, CatalogEntry, CatalogPageResponse, DetailResponse, EpisodeRef,
    FeedChunk, FilterLists, FilterOption, VideoRef,
};
use crate::parser::{self, CatalogPage};
use crate::scraper::{Scraper, ScraperError};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub scraper: Scraper,
    /// Page number -> opaque feed cursor, populated while paging forward
    /// and cleared when a listing restarts from page one
    cursor_cache: Mutex<HashMap<u32, String>>,
}

impl AppState {
    /// Build the shared state with a fresh scraper and empty cursor cache
    pub fn new(config: Config) -> Self {
        Self {
            config,
            scraper: Scraper::new(),
            cursor_cache: Mutex::new(HashMap::new()),
        }
    }

    fn cursors(&self) -> AppResult<MutexGuard<'_, HashMap<u32, String>>> {
        self.cursor_cache
            .lock()
            .map_err(|_| AppError::internal("Cursor cache lock poisoned"))
    }
}

/// Query parameters for paged listing endpoints
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PageQuery {
    /// Page number (default: 1)
    pub page: Option<u32>,
}

/// Query parameters for the search endpoint
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SearchQuery {
    /// Search keyword; when present, category filters are ignored
    pub q: Option<String>,
    /// Page number (default: 1)
    pub page: Option<u32>,
    /// Movie category value (see /api/filters)
    pub movie_category: Option<String>,
    /// TV category value (see /api/filters); takes precedence over
    /// movie_category when both are given
    pub tv_category: Option<String>,
}

/// Query parameters for entry-scoped endpoints
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EntryQuery {
    /// Entry or episode URL as returned by the listing endpoints
    pub url: Option<String>,
}

/// GET /api/popular - Get popular entries
///
/// The site has no popularity ranking; this is an alias of the latest feed.
#[utoipa::path(
    get,
    path = "/api/popular",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "Popular entries retrieved successfully", body = CatalogPageResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_popular(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    latest_page(&data, query.page.unwrap_or(1).max(1)).await
}

/// GET /api/latest - Get the latest-additions feed
///
/// Page 1 reads the home page feed; later pages follow the site's opaque
/// pagination cursors.
#[utoipa::path(
    get,
    path = "/api/latest",
    tag = "catalog",
    params(PageQuery),
    responses(
        (status = 200, description = "Latest entries retrieved successfully", body = CatalogPageResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_latest(
    data: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    latest_page(&data, query.page.unwrap_or(1).max(1)).await
}

async fn latest_page(data: &web::Data<AppState>, page: u32) -> AppResult<HttpResponse> {
    let catalog_page = if page == 1 {
        latest_first_page(data).await?
    } else {
        latest_next_page(data, page).await?
    };

    Ok(HttpResponse::Ok().json(ApiResponse::new(CatalogPageResponse::new(page, catalog_page))))
}

/// Fetch page one of the feed and prime the cursor cache for page two
async fn latest_first_page(data: &web::Data<AppState>) -> AppResult<CatalogPage> {
    let url = endpoints::home(&data.config.base_url);
    info!("Fetching latest feed: {}", url);
    let html = data.scraper.fetch_page(&url).await?;

    let mut cursors = data.cursors()?;
    let has_next_page = prime_feed_cursors(&mut cursors, &html);
    drop(cursors);

    let entries = parser::parse_feed_items(&html, &data.config.base_url);
    info!("Parsed {} feed entries", entries.len());

    Ok(CatalogPage {
        entries,
        has_next_page,
    })
}

/// Follow a cached cursor to the requested feed page
///
/// A missing cursor or a malformed feed chunk ends pagination with an
/// empty page instead of an error.
async fn latest_next_page(data: &web::Data<AppState>, page: u32) -> AppResult<CatalogPage> {
    let cursor = match data.cursors()?.get(&page).cloned() {
        Some(cursor) => cursor,
        None => {
            warn!("No cached cursor for feed page {}", page);
            return Ok(CatalogPage::empty());
        }
    };

    let url = endpoints::fetch_more(&data.config.base_url, &cursor);
    info!("Fetching feed chunk: {}", url);
    let body = data.scraper.fetch_xhr(&url).await?;

    let mut cursors = data.cursors()?;
    Ok(apply_feed_chunk(
        &mut cursors,
        page,
        &body,
        &data.config.base_url,
    ))
}

/// Reset the cursor cache from a fresh home page
///
/// Stale cursors are dropped and the page-two cursor is recorded when the
/// feed state node carries one. Returns whether a second page exists.
fn prime_feed_cursors(cursors: &mut HashMap<u32, String>, html: &str) -> bool {
    cursors.clear();

    match parser::parse_feed_cursor(html) {
        Some(cursor) => {
            cursors.insert(2, cursor);
            true
        }
        None => false,
    }
}

/// Turn a fetched feed-chunk body into a catalog page, recording the
/// cursor for the page after it
///
/// A body that is not the expected JSON envelope ends pagination with an
/// empty page; a blank `next_cursor` ends it after this page's entries.
fn apply_feed_chunk(
    cursors: &mut HashMap<u32, String>,
    page: u32,
    body: &str,
    base_url: &str,
) -> CatalogPage {
    let chunk: FeedChunk = match serde_json::from_str(body) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!("Malformed feed chunk for page {}: {}", page, e);
            return CatalogPage::empty();
        }
    };

    let next_cursor = chunk
        .next_cursor
        .filter(|cursor| !cursor.trim().is_empty());
    let has_next_page = next_cursor.is_some();
    if let Some(cursor) = next_cursor {
        cursors.insert(page.saturating_add(1), cursor);
    }

    let entries = parser::parse_feed_fragment(&chunk.html, base_url);
    info!("Parsed {} entries from feed chunk", entries.len());

    CatalogPage {
        entries,
        has_next_page,
    }
}

/// GET /api/search - Search or browse by category
///
/// With a keyword the site search is used; otherwise one category filter
/// may apply, and with neither the home listing is browsed.
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "catalog",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search results retrieved successfully", body = CatalogPageResponse),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn search(
    data: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let page = query.page.unwrap_or(1).max(1);
    let base_url = &data.config.base_url;

    let url = if let Some(q) = non_blank(&query.q) {
        endpoints::search(base_url, q)
    } else if let Some(category) = non_blank(&query.tv_category) {
        endpoints::tv_category(base_url, category)
    } else if let Some(category) = non_blank(&query.movie_category) {
        endpoints::movie_category(base_url, category)
    } else {
        endpoints::home(base_url)
    };
    let url = endpoints::with_page(&url, page);

    info!("Browsing: {}", url);
    let html = data.scraper.fetch_page(&url).await?;

    let entries = parser::parse_browse_items(&html, base_url);
    let has_next_page = parser::has_next_page(&html, page);
    info!("Parsed {} browse entries", entries.len());

    Ok(HttpResponse::Ok().json(ApiResponse::new(CatalogPageResponse::new(
        page,
        CatalogPage {
            entries,
            has_next_page,
        },
    ))))
}

/// GET /api/details - Get detail enrichment for a catalog entry
#[utoipa::path(
    get,
    path = "/api/details",
    tag = "catalog",
    params(EntryQuery),
    responses(
        (status = 200, description = "Entry detail retrieved successfully", body = DetailResponse),
        (status = 400, description = "Bad request - url is required", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_details(
    data: web::Data<AppState>,
    query: web::Query<EntryQuery>,
) -> AppResult<HttpResponse> {
    let entry_url = require_url(&query)?;
    let page_url = endpoints::fix_url(&data.config.base_url, &entry_url);

    info!("Fetching detail page: {}", page_url);
    let html = fetch_entry_page(data.get_ref(), &page_url).await?;
    let detail = parser::parse_detail(&html);

    Ok(HttpResponse::Ok().json(ApiResponse::new(DetailResponse::new(entry_url, detail))))
}

/// GET /api/episodes - List playable episodes for a catalog entry
///
/// Movies yield a single "Play Movie" pseudo-episode; series aggregate
/// every season, newest episode first.
#[utoipa::path(
    get,
    path = "/api/episodes",
    tag = "catalog",
    params(EntryQuery),
    responses(
        (status = 200, description = "Episode list retrieved successfully", body = Vec<EpisodeRef>),
        (status = 400, description = "Bad request - url is required", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_episodes(
    data: web::Data<AppState>,
    query: web::Query<EntryQuery>,
) -> AppResult<HttpResponse> {
    let entry_url = require_url(&query)?;
    let page_url = endpoints::fix_url(&data.config.base_url, &entry_url);

    info!("Fetching episode list: {}", page_url);
    let html = fetch_entry_page(data.get_ref(), &page_url).await?;

    let episodes = if parser::is_movie_url(&entry_url) {
        vec![EpisodeRef {
            url: parser::parse_movie_play_url(&html, &entry_url),
            name: "Play Movie".to_string(),
            episode_number: 1.0,
        }]
    } else {
        series_episodes(&data, &html).await?
    };

    info!("Collected {} episodes", episodes.len());
    Ok(HttpResponse::Ok().json(ApiResponse::new(episodes)))
}

/// Collect episodes across every season of a series page
///
/// Seasons other than the selected one are fetched best effort; a failed
/// season fetch is skipped, not fatal.
async fn series_episodes(
    data: &web::Data<AppState>,
    html: &str,
) -> AppResult<Vec<EpisodeRef>> {
    let current_season = parser::parse_selected_season(html);
    let mut episodes = parser::parse_episode_items(html, current_season);

    let season_options = parser::parse_season_options(html);
    if season_options.len() > 1 {
        let series = parser::parse_series_title(html).unwrap_or_else(|| "Series".to_string());

        for (value, season) in season_options {
            if season == current_season {
                continue;
            }
            let url = endpoints::series_season(&data.config.base_url, &series, &value);
            match data.scraper.fetch_page(&url).await {
                Ok(season_html) => {
                    episodes.extend(parser::parse_episode_items(&season_html, season));
                }
                Err(e) => warn!("Skipping season {}: {}", value, e),
            }
        }
    }

    let mut seen = HashSet::new();
    episodes.retain(|episode| seen.insert(episode.url.clone()));
    episodes.sort_by(|a, b| b.episode_number.total_cmp(&a.episode_number));

    Ok(episodes)
}

/// GET /api/videos - Resolve the playable video URL for an episode
#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "catalog",
    params(EntryQuery),
    responses(
        (status = 200, description = "Video list retrieved successfully", body = Vec<VideoRef>),
        (status = 400, description = "Bad request - url is required", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn get_videos(
    data: web::Data<AppState>,
    query: web::Query<EntryQuery>,
) -> AppResult<HttpResponse> {
    let episode_url = require_url(&query)?;
    let mut url = endpoints::fix_url(&data.config.base_url, &episode_url);

    // Player pages embed the real stream in a video tag
    if url.contains("player.php") {
        info!("Resolving player page: {}", url);
        let html = fetch_entry_page(data.get_ref(), &url).await?;
        if let Some(src) = parser::parse_player_video(&html) {
            url = endpoints::fix_url(&data.config.base_url, &src);
        }
    }

    let videos = vec![VideoRef {
        url: endpoints::encode_video_url(&url),
        label: "Direct".to_string(),
    }];

    Ok(HttpResponse::Ok().json(ApiResponse::new(videos)))
}

/// GET /api/filters - Get the fixed category filter catalogs
#[utoipa::path(
    get,
    path = "/api/filters",
    tag = "catalog",
    responses(
        (status = 200, description = "Filter catalogs retrieved successfully", body = FilterLists)
    )
)]
pub async fn get_filters() -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::new(FilterLists::all())))
}

/// Fetch an entry-scoped page, surfacing an upstream 404 as not-found
async fn fetch_entry_page(state: &AppState, url: &str) -> AppResult<String> {
    state
        .scraper
        .fetch_page(url)
        .await
        .map_err(map_entry_fetch_error)
}

/// An upstream 404 means the entry URL no longer resolves on the site;
/// every other scraper failure keeps its own status mapping
fn map_entry_fetch_error(err: ScraperError) -> AppError {
    match err {
        ScraperError::HttpError(404) => AppError::not_found("Entry not found"),
        other => other.into(),
    }
}

/// Trimmed, non-blank view of an optional query value
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Extract the required url query parameter or fail with 400
fn require_url(query: &EntryQuery) -> AppResult<String> {
    non_blank(&query.url)
        .map(str::to_string)
        .ok_or_else(|| AppError::validation("url query parameter is required"))
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bas Play Scraper API",
        version = "0.1.0",
        description = "API for browsing and resolving video content from the Bas Play site"
    ),
    paths(
        get_popular,
        get_latest,
        search,
        get_details,
        get_episodes,
        get_videos,
        get_filters
    ),
    components(
        schemas(
            CatalogEntry,
            CatalogPageResponse,
            DetailResponse,
            EpisodeRef,
            VideoRef,
            FilterOption,
            FilterLists,
            ApiError,
            PageQuery,
            SearchQuery,
            EntryQuery
        )
    ),
    tags(
        (name = "catalog", description = "Catalog browse, search and playback endpoints")
    )
)]
pub struct ApiDoc;

/// Configure API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/popular", web::get().to(get_popular))
            .route("/latest", web::get().to(get_latest))
            .route("/search", web::get().to(search))
            .route("/details", web::get().to(get_details))
            .route("/episodes", web::get().to(get_episodes))
            .route("/videos", web::get().to(get_videos))
            .route("/filters", web::get().to(get_filters)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_url_missing() {
        let query = EntryQuery { url: None };
        assert!(matches!(
            require_url(&query),
            Err(AppError::Validation(_))
        ));

        let query = EntryQuery {
            url: Some("   ".to_string()),
        };
        assert!(require_url(&query).is_err());
    }

    #[test]
    fn test_require_url_trims() {
        let query = EntryQuery {
            url: Some("  view.php?id=1  ".to_string()),
        };
        assert_eq!(require_url(&query).unwrap(), "view.php?id=1");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some(" ".to_string())), None);
        assert_eq!(non_blank(&Some(" Korean ".to_string())), Some("Korean"));
    }

    #[test]
    fn test_cursor_cache_starts_empty() {
        let state = AppState::new(crate::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://103.87.212.46".to_string(),
        });

        assert!(state.cursors().unwrap().is_empty());
        state.cursors().unwrap().insert(2, "abc".to_string());
        assert_eq!(state.cursors().unwrap().get(&2).cloned(), Some("abc".to_string()));
    }

    fn test_state() -> web::Data<AppState> {
        web::Data::new(AppState::new(crate::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://103.87.212.46".to_string(),
        }))
    }

    #[test]
    fn test_prime_feed_cursors_replaces_stale_entries() {
        let mut cursors = HashMap::from([(5, "stale".to_string())]);
        let html = r#"<html><body>
            <div id="feedState" data-cursor="abc123"></div>
        </body></html>"#;

        assert!(prime_feed_cursors(&mut cursors, html));
        assert_eq!(cursors.len(), 1);
        assert_eq!(cursors.get(&2).map(String::as_str), Some("abc123"));
    }

    #[test]
    fn test_prime_feed_cursors_without_cursor() {
        let mut cursors = HashMap::from([(2, "stale".to_string())]);

        assert!(!prime_feed_cursors(
            &mut cursors,
            "<html><body><div id=\"grid\"></div></body></html>"
        ));
        assert!(cursors.is_empty());
    }

    #[test]
    fn test_apply_feed_chunk_primes_next_cursor() {
        let mut cursors = HashMap::new();
        let body = r#"{
            "html": "<a class=\"cp-card\" href=\"view.php?id=9\"><div class=\"cp-title\">Nine</div></a>",
            "next_cursor": "c3"
        }"#;

        let page = apply_feed_chunk(&mut cursors, 2, body, "http://103.87.212.46");

        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].title, "Nine");
        assert!(page.has_next_page);
        assert_eq!(cursors.get(&3).map(String::as_str), Some("c3"));
    }

    #[test]
    fn test_apply_feed_chunk_blank_cursor_ends_pagination() {
        let mut cursors = HashMap::new();
        let body = r#"{
            "html": "<a class=\"cp-card\" href=\"view.php?id=9\"><div class=\"cp-title\">Nine</div></a>",
            "next_cursor": "   "
        }"#;

        let page = apply_feed_chunk(&mut cursors, 2, body, "http://103.87.212.46");

        assert_eq!(page.entries.len(), 1);
        assert!(!page.has_next_page);
        assert!(cursors.is_empty());
    }

    #[test]
    fn test_apply_feed_chunk_malformed_body() {
        let mut cursors = HashMap::from([(2, "c2".to_string())]);

        let page = apply_feed_chunk(&mut cursors, 2, "<html>not json</html>", "http://103.87.212.46");

        assert!(page.entries.is_empty());
        assert!(!page.has_next_page);
        assert_eq!(cursors.get(&2).map(String::as_str), Some("c2"));
    }

    #[test]
    fn test_apply_feed_chunk_at_page_limit() {
        let mut cursors = HashMap::new();
        let body = r#"{"html": "", "next_cursor": "cmax"}"#;

        let page = apply_feed_chunk(&mut cursors, u32::MAX, body, "http://103.87.212.46");

        assert!(page.has_next_page);
        assert_eq!(cursors.get(&u32::MAX).map(String::as_str), Some("cmax"));
    }

    #[actix_rt::test]
    async fn test_latest_next_page_without_cursor_ends_pagination() {
        let data = test_state();

        let page = latest_next_page(&data, 7).await.unwrap();

        assert!(page.entries.is_empty());
        assert!(!page.has_next_page);
    }

    #[test]
    fn test_map_entry_fetch_error() {
        assert!(matches!(
            map_entry_fetch_error(ScraperError::HttpError(404)),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            map_entry_fetch_error(ScraperError::HttpError(500)),
            AppError::Scraping(_)
        ));
    }
}
