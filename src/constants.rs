//! Constants module for the Bas Play scraper API
//!
//! Contains endpoint URL builders that use the base URL from configuration,
//! plus the site's fixed category catalogs.

/// URL builder functions for all endpoints
pub mod endpoints {
    /// Home page URL (latest feed lives here)
    pub fn home(base_url: &str) -> String {
        base_url.to_string()
    }

    /// Cursor feed URL for pages after the first.
    ///
    /// The cursor is an opaque token issued by the site and is passed
    /// through verbatim.
    pub fn fetch_more(base_url: &str, cursor: &str) -> String {
        format!("{}/fetch_more.php?cursor={}", base_url, cursor)
    }

    /// Search URL with query parameter
    pub fn search(base_url: &str, query: &str) -> String {
        format!("{}/search.php?q={}", base_url, urlencoding::encode(query))
    }

    /// Movie category listing URL
    ///
    /// Category values already carry `+` separators (see `filters`), so
    /// they are not re-encoded here.
    pub fn movie_category(base_url: &str, category: &str) -> String {
        format!("{}/category.php?category={}", base_url, category)
    }

    /// TV category listing URL
    pub fn tv_category(base_url: &str, category: &str) -> String {
        format!("{}/tv.php?category={}", base_url, category)
    }

    /// Append the page parameter, with `?` or `&` depending on whether the
    /// URL already has a query string.
    pub fn with_page(url: &str, page: u32) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", url, separator, page)
    }

    /// Site-relative series listing path for a series name.
    ///
    /// Used when collapsing an episode card back into its series entry.
    pub fn series_path(series_name: &str) -> String {
        format!("tview.php?series={}", urlencoding::encode(series_name))
    }

    /// Absolute series listing URL for a specific season.
    pub fn series_season(base_url: &str, series_name: &str, season: &str) -> String {
        format!(
            "{}/tview.php?series={}&season={}",
            base_url,
            urlencoding::encode(series_name),
            season
        )
    }

    /// Absolutize a site-relative URL against the base URL.
    pub fn fix_url(base_url: &str, url: &str) -> String {
        if url.starts_with("http") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", base_url, url)
        } else {
            format!("{}/{}", base_url, url)
        }
    }

    /// Encode a resolved video URL for playback: spaces as `%20` and `&`
    /// as `%26`, the form the site's player accepts.
    pub fn encode_video_url(url: &str) -> String {
        url.replace(' ', "%20").replace('&', "%26")
    }
}

/// Fixed category catalogs exposed to hosts as filter options
pub mod filters {
    /// Movie categories as (label, query value) pairs
    pub const MOVIE_CATEGORIES: &[(&str, &str)] = &[
        ("None", ""),
        ("Animation", "Animation"),
        ("Bangla", "Bangla"),
        ("Bollywood", "Bollywood"),
        ("Hollywood", "Hollywood"),
        ("Chinese", "Chinese"),
        ("Korean", "Korean"),
        ("South Indian", "South+Indian"),
        ("Dubbed Movie", "Dubbed+Movie"),
    ];

    /// TV show categories as (label, query value) pairs
    ///
    /// Labels and values are spelled the way the site spells them,
    /// misspellings included.
    pub const TV_CATEGORIES: &[(&str, &str)] = &[
        ("None", ""),
        ("ANIMATED TV SERIES", "ANIMATED+TV+SERIES"),
        ("ENGLISH TV SERIES", "ENGLISH+TV+SERIES"),
        ("HINDI TV SERIES", "HINDI+TV+SERIES"),
        ("BANGLA TV SERIES", "BANGLA+TV+SERIES"),
        ("CHINESE TV SERIES", "CHINESE+TV+SERIES"),
        ("JAPANES TV SERIES", "JAPANES+TV+SERIES"),
        ("KOREAN TV SERIES", "KOREAN+TV+SERIES"),
        ("TURKISH TV SERIES", "TURKISH+TV+SERIES"),
        ("UNDEFINE", "UNDEFINE"),
    ];
}

#[cfg(test)]
mod tests {
    use super::endpoints;

    const BASE: &str = "http://103.87.212.46";

    #[test]
    fn test_with_page_appends_first_param() {
        assert_eq!(
            endpoints::with_page(BASE, 3),
            "http://103.87.212.46?page=3"
        );
    }

    #[test]
    fn test_with_page_appends_to_existing_query() {
        let url = endpoints::search(BASE, "dragon");
        assert_eq!(
            endpoints::with_page(&url, 2),
            "http://103.87.212.46/search.php?q=dragon&page=2"
        );
    }

    #[test]
    fn test_search_encodes_query() {
        assert_eq!(
            endpoints::search(BASE, "one piece"),
            "http://103.87.212.46/search.php?q=one%20piece"
        );
    }

    #[test]
    fn test_series_path_encodes_spaces_as_percent20() {
        assert_eq!(
            endpoints::series_path("Breaking Bad"),
            "tview.php?series=Breaking%20Bad"
        );
    }

    #[test]
    fn test_series_season_url() {
        assert_eq!(
            endpoints::series_season(BASE, "Dark Matter", "2"),
            "http://103.87.212.46/tview.php?series=Dark%20Matter&season=2"
        );
    }

    #[test]
    fn test_fix_url_variants() {
        assert_eq!(
            endpoints::fix_url(BASE, "https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
        assert_eq!(
            endpoints::fix_url(BASE, "/uploads/a.jpg"),
            "http://103.87.212.46/uploads/a.jpg"
        );
        assert_eq!(
            endpoints::fix_url(BASE, "view.php?id=7"),
            "http://103.87.212.46/view.php?id=7"
        );
    }

    #[test]
    fn test_encode_video_url() {
        assert_eq!(
            endpoints::encode_video_url("http://x/files/My Movie.mp4?a=1&b=2"),
            "http://x/files/My%20Movie.mp4?a=1%26b=2"
        );
    }
}
