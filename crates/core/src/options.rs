//! Options passed to providers for a search or a scrape.

use serde::{Deserialize, Serialize};

use crate::entities::{FanartSize, MediaArtworkType, MediaId, MediaIds, MediaType, PosterSize};
use crate::search::MediaSearchResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    pub media_type: MediaType,
    pub query: String,
    pub year: Option<i32>,
    /// ISO 639-1 language of the wanted titles.
    pub language: String,
    /// ISO 3166-1 country for certifications and release dates.
    pub country: String,
    #[serde(default)]
    pub ids: MediaIds,
}

impl SearchOptions {
    pub fn new(media_type: MediaType, query: impl Into<String>) -> Self {
        Self {
            media_type,
            query: query.into(),
            year: None,
            language: "en".to_string(),
            country: "US".to_string(),
            ids: MediaIds::new(),
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = (year > 0).then_some(year);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn set_id(&mut self, key: impl Into<String>, id: impl Into<MediaId>) {
        self.ids.insert(key, id);
    }

    pub fn id_as_string(&self, key: &str) -> Option<String> {
        self.ids.as_string(key)
    }

    pub fn id_as_int(&self, key: &str) -> Option<i64> {
        self.ids.as_int(key)
    }

    pub fn id_as_int_or(&self, key: &str, default: i64) -> i64 {
        self.ids.as_int_or(key, default)
    }

    pub fn imdb_id(&self) -> Option<String> {
        self.ids.imdb_id()
    }

    pub fn tmdb_id(&self) -> Option<i64> {
        self.ids.tmdb_id()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOptions {
    pub media_type: MediaType,
    pub ids: MediaIds,
    /// The result the user picked, if the scrape follows a search.
    pub search_result: Option<MediaSearchResult>,
    pub language: String,
    pub country: String,
    /// Restrict artwork to one type; `None` means all types.
    pub artwork_type: Option<MediaArtworkType>,
    pub poster_size: PosterSize,
    pub fanart_size: FanartSize,
}

impl ScrapeOptions {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            ids: MediaIds::new(),
            search_result: None,
            language: "en".to_string(),
            country: "US".to_string(),
            artwork_type: None,
            poster_size: PosterSize::Big,
            fanart_size: FanartSize::Large,
        }
    }

    /// Options to scrape what `result` points at. The result's ids are copied.
    pub fn from_search_result(result: &MediaSearchResult) -> Self {
        let mut options = Self::new(result.media_type);
        options.ids = result.ids.clone();
        options.search_result = Some(result.clone());
        options
    }

    pub fn set_id(&mut self, key: impl Into<String>, id: impl Into<MediaId>) {
        self.ids.insert(key, id);
    }

    pub fn id_as_string(&self, key: &str) -> Option<String> {
        self.ids.as_string(key)
    }

    pub fn id_as_int(&self, key: &str) -> Option<i64> {
        self.ids.as_int(key)
    }

    pub fn id_as_int_or(&self, key: &str, default: i64) -> i64 {
        self.ids.as_int_or(key, default)
    }

    pub fn imdb_id(&self) -> Option<String> {
        self.ids.imdb_id()
    }

    pub fn tmdb_id(&self) -> Option<i64> {
        self.ids.tmdb_id()
    }

    /// Whether artwork of `artwork_type` is wanted.
    pub fn wants_artwork(&self, artwork_type: MediaArtworkType) -> bool {
        self.artwork_type.map_or(true, |t| t == artwork_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ids;

    #[test]
    fn scrape_options_from_result() {
        let mut r = MediaSearchResult::new("tmdb", MediaType::Movie);
        r.set_id("603");
        r.set_ids(ids::IMDB, "tt0133093");

        let o = ScrapeOptions::from_search_result(&r);
        assert_eq!(o.tmdb_id(), Some(603));
        assert_eq!(o.imdb_id().as_deref(), Some("tt0133093"));
        assert_eq!(o.id_as_int_or(ids::TVDB, 0), 0);
        assert_eq!(o.search_result.as_ref().map(|r| r.id()), Some("603"));
    }

    #[test]
    fn artwork_filter() {
        let mut o = ScrapeOptions::new(MediaType::Movie);
        assert!(o.wants_artwork(MediaArtworkType::Banner));
        o.artwork_type = Some(MediaArtworkType::Poster);
        assert!(o.wants_artwork(MediaArtworkType::Poster));
        assert!(!o.wants_artwork(MediaArtworkType::Background));
    }

    #[test]
    fn search_options_year() {
        let o = SearchOptions::new(MediaType::Movie, "Alien").with_year(0);
        assert_eq!(o.year, None);
        let mut o = o.with_year(1979);
        assert_eq!(o.year, Some(1979));
        o.set_id("tmdbId", "348");
        assert_eq!(o.tmdb_id(), Some(348));
        assert_eq!(o.id_as_string("tmdbId").as_deref(), Some("348"));
    }
}
