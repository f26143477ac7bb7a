//! The Movie Database (TMDB) v3 provider.
//!
//! Movie search and metadata, artwork and trailers. Requests are plain
//! blocking HTTP calls; callers run them off the UI loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use reqwest::blocking::Client;
use reqwest::header::RETRY_AFTER;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use super::registry::{ProviderEnv, ProviderFactory};
use super::{
    ArtworkProvider, MediaProvider, MediaProviderConfig, MediaProviderInfo, MovieMetadataProvider,
    TrailerProvider,
};
use crate::entities::artwork::{FanartSize, MediaArtwork, MediaArtworkType, PosterSize};
use crate::entities::{ids, CastType, Certification, MediaCastMember, MediaTrailer, MediaType};
use crate::error::{ProviderError, ScrapeError};
use crate::genres::{GenreRegistry, MediaGenre};
use crate::metadata::MediaMetadata;
use crate::options::{ScrapeOptions, SearchOptions};
use crate::search::MediaSearchResult;

pub const PROVIDER_ID: &str = "tmdb";

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_URL: &str = "https://image.tmdb.org/t/p/";

pub const IMAGE_SIZES: &[&str] = &["w342", "w500", "w780", "original"];

const POSTER_PREVIEW: &str = "w185";
const BACKDROP_PREVIEW: &str = "w300";

/// Settings keys.
pub const KEY_API_KEY: &str = "apiKey";
pub const KEY_INCLUDE_ADULT: &str = "includeAdult";
pub const KEY_IMAGE_SIZE: &str = "imageSize";

// Longer waits than this are not worth honoring.
const MAX_RETRY_AFTER_SECS: u64 = 3600;

pub struct TmdbProvider {
    info: MediaProviderInfo,
    client: Client,
    base_url: String,
    image_url: String,
    genres: Arc<GenreRegistry>,
}

impl TmdbProvider {
    pub fn new(genres: Arc<GenreRegistry>) -> Result<Self, ProviderError> {
        Self::with_urls(genres, DEFAULT_BASE_URL, DEFAULT_IMAGE_URL)
    }

    /// Provider talking to another API host, e.g. a local mock.
    pub fn with_urls(
        genres: Arc<GenreRegistry>,
        base_url: &str,
        image_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("tmm/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Init {
                id: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })?;

        let info = MediaProviderInfo::new(
            PROVIDER_ID,
            "The Movie Database",
            "Metadata, artwork and trailers from themoviedb.org",
        )
        .with_config(default_config());

        Ok(Self {
            info,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            image_url: image_url.to_string(),
            genres,
        })
    }

    fn api_key(&self) -> Result<String, ScrapeError> {
        let key = self.info.config().value(KEY_API_KEY);
        if key.trim().is_empty() {
            return Err(ScrapeError::NotConfigured(PROVIDER_ID.to_string()));
        }
        Ok(key)
    }

    fn image_size(&self) -> String {
        let size = self.info.config().value(KEY_IMAGE_SIZE);
        if size.is_empty() {
            "original".to_string()
        } else {
            size
        }
    }

    fn get(&self, path: &str, params: &[(&str, String)]) -> Result<String, ScrapeError> {
        let api_key = self.api_key()?;
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, "TMDB request");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", api_key.as_str())])
            .query(params)
            .send()
            .map_err(|e| ScrapeError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let seconds = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ScrapeError::RateLimited {
                provider: PROVIDER_ID.to_string(),
                retry_after_ms: seconds.min(MAX_RETRY_AFTER_SECS).saturating_mul(1000),
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ScrapeError::NotFound);
        }

        let body = response
            .text()
            .map_err(|e| ScrapeError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(provider_error(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status_message(&body)
            )));
        }
        Ok(body)
    }

    fn details(&self, tmdb_id: i64, language: &str) -> Result<MovieDetails, ScrapeError> {
        let body = self.get(
            &format!("movie/{}", tmdb_id),
            &[
                ("language", language.to_string()),
                ("append_to_response", "credits,release_dates,videos".to_string()),
            ],
        )?;
        parse(&body)
    }

    /// TMDB id of the movie with `imdb_id`.
    fn find_by_imdb(&self, imdb_id: &str, language: &str) -> Result<Option<MovieSummary>, ScrapeError> {
        let body = self.get(
            &format!("find/{}", imdb_id),
            &[
                ("external_source", "imdb_id".to_string()),
                ("language", language.to_string()),
            ],
        )?;
        let found: FindResponse = parse(&body)?;
        Ok(found.movie_results.into_iter().next())
    }

    fn resolve_id(&self, options: &ScrapeOptions) -> Result<i64, ScrapeError> {
        if let Some(id) = options.tmdb_id() {
            return Ok(id);
        }
        if let Some(imdb) = options.imdb_id() {
            if let Some(found) = self.find_by_imdb(&imdb, &options.language)? {
                return Ok(found.id);
            }
        }
        Err(ScrapeError::MissingId(PROVIDER_ID.to_string()))
    }

    fn search_result(&self, movie: &MovieSummary) -> MediaSearchResult {
        let mut result = MediaSearchResult::new(PROVIDER_ID, MediaType::Movie);
        result.set_id(movie.id.to_string());
        result.title = movie.title.clone().unwrap_or_default();
        result.original_title = movie.original_title.clone().unwrap_or_default();
        result.year = year_of(movie.release_date.as_deref());
        result.overview = movie.overview.clone().unwrap_or_default();
        result.url = format!("https://www.themoviedb.org/movie/{}", movie.id);
        if let Some(path) = non_empty(&movie.poster_path) {
            result.poster_url = format!("{}{}{}", self.image_url, POSTER_PREVIEW, path);
        }
        result
    }

    fn metadata(&self, details: MovieDetails, options: &ScrapeOptions) -> MediaMetadata {
        let mut md = MediaMetadata::new(PROVIDER_ID);
        md.set_id(ids::TMDB, details.id);
        if let Some(imdb) = non_empty(&details.imdb_id) {
            md.set_id(ids::IMDB, imdb);
        }

        md.title = details.title.unwrap_or_default();
        md.original_title = details.original_title.unwrap_or_default();
        md.release_date = parse_date(details.release_date.as_deref());
        md.year = md.release_date.map_or(0, |d| d.year());
        md.plot = details.overview.unwrap_or_default();
        md.tagline = details.tagline.unwrap_or_default();
        md.runtime = details.runtime.unwrap_or(0);
        md.rating = details.vote_average;
        md.vote_count = details.vote_count;
        md.status = details.status.unwrap_or_default();

        if let Some(collection) = details.belongs_to_collection {
            md.set_id(ids::TMDB_SET, collection.id);
            md.collection_name = collection.name;
        }

        for genre in details.genres.iter().filter_map(|g| self.genre(g)) {
            md.add_genre(genre);
        }
        for company in details.production_companies {
            md.add_production_company(company.name);
        }
        for country in details.production_countries {
            md.add_country(country.iso_3166_1);
        }
        for language in details.spoken_languages {
            md.add_spoken_language(language.iso_639_1);
        }

        if let Some(credits) = details.credits {
            for cast in credits.cast {
                let mut member =
                    MediaCastMember::new(CastType::Actor, cast.name).with_character(cast.character);
                member.image_url = self.profile_url(&cast.profile_path);
                md.add_cast_member(member);
            }
            for crew in credits.crew {
                let cast_type = match crew.job.as_str() {
                    "Director" => CastType::Director,
                    "Screenplay" | "Writer" | "Novel" | "Story" => CastType::Writer,
                    "Producer" | "Executive Producer" => CastType::Producer,
                    _ => continue,
                };
                let mut member = MediaCastMember::new(cast_type, crew.name);
                member.part = crew.job;
                member.image_url = self.profile_url(&crew.profile_path);
                md.add_cast_member(member);
            }
        }

        if let Some(release_dates) = details.release_dates {
            let country = options.country.to_ascii_uppercase();
            let certification = release_dates
                .results
                .iter()
                .filter(|r| r.iso_3166_1.eq_ignore_ascii_case(&country))
                .flat_map(|r| r.release_dates.iter())
                .map(|d| d.certification.trim())
                .find(|c| !c.is_empty());
            if let Some(name) = certification {
                md.add_certification(Certification::new(&country, name));
            }
        }

        if let Some(videos) = details.videos {
            for trailer in trailers(videos) {
                md.add_trailer(trailer);
            }
        }

        let size = self.image_size();
        if let Some(path) = non_empty(&details.poster_path) {
            let mut poster = MediaArtwork::new(PROVIDER_ID, MediaArtworkType::Poster);
            poster.tmdb_id = details.id;
            poster.preview_url = format!("{}{}{}", self.image_url, POSTER_PREVIEW, path);
            poster.default_url = format!("{}{}{}", self.image_url, size, path);
            md.add_artwork(poster);
        }
        if let Some(path) = non_empty(&details.backdrop_path) {
            let mut backdrop = MediaArtwork::new(PROVIDER_ID, MediaArtworkType::Background);
            backdrop.tmdb_id = details.id;
            backdrop.preview_url = format!("{}{}{}", self.image_url, BACKDROP_PREVIEW, path);
            backdrop.default_url = format!("{}{}{}", self.image_url, size, path);
            md.add_artwork(backdrop);
        }
        md
    }

    fn genre(&self, genre: &TmdbGenre) -> Option<MediaGenre> {
        if let Some(known) = genre_key(genre.id).and_then(|key| self.genres.value_of(key)) {
            return Some(known);
        }
        let name = genre.name.trim();
        if name.is_empty() {
            return None;
        }
        Some(self.genres.get_genre(name))
    }

    fn profile_url(&self, path: &Option<String>) -> String {
        non_empty(path)
            .map(|p| format!("{}h632{}", self.image_url, p))
            .unwrap_or_default()
    }

    fn artwork(&self, images: Images, tmdb_id: i64, options: &ScrapeOptions) -> Vec<MediaArtwork> {
        let size = self.image_size();
        let imdb_id = options.imdb_id().unwrap_or_default();
        let mut out = Vec::new();

        let kinds = [
            (MediaArtworkType::Poster, images.posters, POSTER_PREVIEW),
            (MediaArtworkType::Background, images.backdrops, BACKDROP_PREVIEW),
        ];
        for (artwork_type, list, preview) in kinds {
            if !options.wants_artwork(artwork_type) {
                continue;
            }
            for image in list {
                let mut art = MediaArtwork::new(PROVIDER_ID, artwork_type);
                art.tmdb_id = tmdb_id;
                art.imdb_id = imdb_id.clone();
                art.preview_url = format!("{}{}{}", self.image_url, preview, image.file_path);
                art.default_url = format!("{}{}{}", self.image_url, size, image.file_path);
                art.language = image.iso_639_1.unwrap_or_default();
                art.likes = image.vote_count;
                art.size_order = match artwork_type {
                    MediaArtworkType::Poster => PosterSize::from_width(image.width).order(),
                    _ => FanartSize::from_width(image.width).order(),
                };
                art.add_image_size(
                    image.width,
                    image.height,
                    format!("{}original{}", self.image_url, image.file_path),
                );
                out.push(art);
            }
        }
        out
    }
}

fn default_config() -> MediaProviderConfig {
    let mut config = MediaProviderConfig::new(PROVIDER_ID);
    config.add_text_with(KEY_API_KEY, "", true);
    config.add_bool(KEY_INCLUDE_ADULT, false);
    config.add_select(KEY_IMAGE_SIZE, IMAGE_SIZES, "original");
    config
}

/// Factory for the provider registry.
pub fn factory() -> ProviderFactory {
    Box::new(
        |env: &ProviderEnv| -> Result<Arc<dyn MediaProvider>, ProviderError> {
            Ok(Arc::new(TmdbProvider::new(env.genres.clone())?))
        },
    )
}

impl MediaProvider for TmdbProvider {
    fn info(&self) -> &MediaProviderInfo {
        &self.info
    }

    fn as_movie_metadata(&self) -> Option<&dyn MovieMetadataProvider> {
        Some(self)
    }

    fn as_artwork(&self) -> Option<&dyn ArtworkProvider> {
        Some(self)
    }

    fn as_trailer(&self) -> Option<&dyn TrailerProvider> {
        Some(self)
    }
}

impl MovieMetadataProvider for TmdbProvider {
    fn search(&self, options: &SearchOptions) -> Result<Vec<MediaSearchResult>, ScrapeError> {
        // a known id skips the text search
        if let Some(id) = options.tmdb_id() {
            let details = self.details(id, &options.language)?;
            return Ok(vec![self.search_result(&details.summary())]);
        }
        if let Some(imdb) = options.imdb_id() {
            if let Some(found) = self.find_by_imdb(&imdb, &options.language)? {
                return Ok(vec![self.search_result(&found)]);
            }
        }

        let query = options.query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let include_adult = self
            .info
            .config()
            .value_as_bool(KEY_INCLUDE_ADULT)
            .unwrap_or(false);
        let mut params = vec![
            ("query", query.to_string()),
            ("language", options.language.clone()),
            ("include_adult", include_adult.to_string()),
        ];
        if let Some(year) = options.year.filter(|y| *y > 0) {
            params.push(("year", year.to_string()));
        }

        let body = self.get("search/movie", &params)?;
        let page: SearchPage = parse(&body)?;
        debug!(query, hits = page.results.len(), "TMDB search");
        Ok(page.results.iter().map(|m| self.search_result(m)).collect())
    }

    fn get_metadata(&self, options: &ScrapeOptions) -> Result<MediaMetadata, ScrapeError> {
        let id = self.resolve_id(options)?;
        let details = self.details(id, &options.language)?;
        Ok(self.metadata(details, options))
    }
}

impl ArtworkProvider for TmdbProvider {
    fn get_artwork(&self, options: &ScrapeOptions) -> Result<Vec<MediaArtwork>, ScrapeError> {
        let id = self.resolve_id(options)?;
        // artwork without a language is requested too
        let languages = format!("{},en,null", options.language);
        let body = self.get(
            &format!("movie/{}/images", id),
            &[("include_image_language", languages)],
        )?;
        let images: Images = parse(&body)?;
        Ok(self.artwork(images, id, options))
    }
}

impl TrailerProvider for TmdbProvider {
    fn get_trailers(&self, options: &ScrapeOptions) -> Result<Vec<MediaTrailer>, ScrapeError> {
        let id = self.resolve_id(options)?;
        let body = self.get(
            &format!("movie/{}/videos", id),
            &[("language", options.language.clone())],
        )?;
        let videos: Videos = parse(&body)?;
        Ok(trailers(videos))
    }
}

fn trailers(videos: Videos) -> Vec<MediaTrailer> {
    videos
        .results
        .into_iter()
        .filter(|v| v.kind == "Trailer" || v.kind == "Teaser")
        .filter_map(|v| {
            let url = match v.site.as_str() {
                "YouTube" => format!("https://www.youtube.com/watch?v={}", v.key),
                "Vimeo" => format!("https://vimeo.com/{}", v.key),
                other => {
                    warn!(site = other, "Skipping trailer from unknown site");
                    return None;
                }
            };
            Some(MediaTrailer {
                name: v.name,
                url,
                quality: v.size.map(|s| format!("{}p", s)).unwrap_or_default(),
                provider: v.site,
                date: v.published_at.unwrap_or_default(),
            })
        })
        .collect()
}

/// Built-in genre key for a TMDB genre id. TV ids are folded into the
/// closest movie genre.
fn genre_key(id: i64) -> Option<&'static str> {
    let key = match id {
        28 | 10759 => "ACTION",
        12 => "ADVENTURE",
        16 => "ANIMATION",
        35 => "COMEDY",
        80 => "CRIME",
        99 => "DOCUMENTARY",
        18 => "DRAMA",
        10751 | 10762 => "FAMILY",
        14 => "FANTASY",
        36 => "HISTORY",
        27 => "HORROR",
        10402 => "MUSIC",
        9648 => "MYSTERY",
        10763 => "NEWS",
        10764 => "REALITY_TV",
        10749 => "ROMANCE",
        878 | 10765 => "SCIENCE_FICTION",
        10766 => "SERIES",
        10767 => "TALK_SHOW",
        10770 => "TV_MOVIE",
        53 => "THRILLER",
        10752 | 10768 => "WAR",
        37 => "WESTERN",
        _ => return None,
    };
    Some(key)
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ScrapeError> {
    serde_json::from_str(body).map_err(|e| provider_error(format!("unexpected response: {}", e)))
}

fn provider_error(message: String) -> ScrapeError {
    ScrapeError::ProviderError {
        provider: PROVIDER_ID.to_string(),
        message,
    }
}

// TMDB error bodies look like {"status_code":7,"status_message":"Invalid API key"}
fn status_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("status_message")?.as_str().map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value?.trim(), "%Y-%m-%d").ok()
}

fn year_of(release_date: Option<&str>) -> i32 {
    parse_date(release_date).map_or(0, |d| d.year())
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<MovieSummary>,
}

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    movie_results: Vec<MovieSummary>,
}

#[derive(Debug, Clone, Deserialize)]
struct MovieSummary {
    id: i64,
    title: Option<String>,
    original_title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieDetails {
    id: i64,
    imdb_id: Option<String>,
    title: Option<String>,
    original_title: Option<String>,
    release_date: Option<String>,
    overview: Option<String>,
    tagline: Option<String>,
    runtime: Option<i32>,
    #[serde(default)]
    vote_average: f32,
    #[serde(default)]
    vote_count: i32,
    status: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    belongs_to_collection: Option<Collection>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    #[serde(default)]
    production_companies: Vec<Company>,
    #[serde(default)]
    production_countries: Vec<Country>,
    #[serde(default)]
    spoken_languages: Vec<Language>,
    credits: Option<Credits>,
    release_dates: Option<ReleaseDates>,
    videos: Option<Videos>,
}

impl MovieDetails {
    fn summary(&self) -> MovieSummary {
        MovieSummary {
            id: self.id,
            title: self.title.clone(),
            original_title: self.original_title.clone(),
            release_date: self.release_date.clone(),
            overview: self.overview.clone(),
            poster_path: self.poster_path.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Collection {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: i64,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Company {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Country {
    iso_3166_1: String,
}

#[derive(Debug, Deserialize)]
struct Language {
    iso_639_1: String,
}

#[derive(Debug, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastCredit>,
    #[serde(default)]
    crew: Vec<CrewCredit>,
}

#[derive(Debug, Deserialize)]
struct CastCredit {
    name: String,
    #[serde(default)]
    character: String,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrewCredit {
    name: String,
    #[serde(default)]
    job: String,
    profile_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseDates {
    #[serde(default)]
    results: Vec<CountryReleases>,
}

#[derive(Debug, Deserialize)]
struct CountryReleases {
    iso_3166_1: String,
    #[serde(default)]
    release_dates: Vec<Release>,
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    certification: String,
}

#[derive(Debug, Deserialize)]
struct Videos {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    key: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    site: String,
    size: Option<u32>,
    #[serde(rename = "type", default)]
    kind: String,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Images {
    #[serde(default)]
    posters: Vec<Image>,
    #[serde(default)]
    backdrops: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    file_path: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    iso_639_1: Option<String>,
    #[serde(default)]
    vote_count: i32,
}
