//! Plain data carried between providers and the library: media types, ids,
//! cast, trailers, certifications and artwork.

pub mod artwork;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseNameError;

pub use artwork::{
    ArtworkComparator, FanartSize, ImageSizeAndUrl, MediaArtwork, MediaArtworkType, PosterSize,
};

/// Well-known keys of the id maps.
pub mod ids {
    pub const IMDB: &str = "imdb";
    pub const TMDB: &str = "tmdb";
    pub const TVDB: &str = "tvdb";
    pub const TMDB_SET: &str = "tmdbSet";

    // meta ids for TV show scraping
    pub const EPISODE_NR: &str = "episodeNr";
    pub const SEASON_NR: &str = "seasonNr";
    pub const EPISODE_NR_DVD: &str = "dvdEpisodeNr";
    pub const SEASON_NR_DVD: &str = "dvdSeasonNr";

    // keys written by older versions
    pub(crate) const LEGACY_IMDB: &str = "imdbId";
    pub(crate) const LEGACY_TMDB: &str = "tmdbId";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    MovieSet,
    TvShow,
    TvEpisode,
}

impl MediaType {
    fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace(|c: char| c == '-' || c == ' ', "_").as_str() {
            "movie" => Some(Self::Movie),
            "movie_set" | "movieset" | "set" => Some(Self::MovieSet),
            "tv_show" | "tvshow" | "tv" | "show" => Some(Self::TvShow),
            "tv_episode" | "episode" => Some(Self::TvEpisode),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Movie => "movie",
            Self::MovieSet => "movie set",
            Self::TvShow => "tv show",
            Self::TvEpisode => "tv episode",
        };
        f.write_str(s)
    }
}

/// An id as handed out by a provider. Some providers use numeric ids, some
/// use strings (`tt0133093`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MediaId {
    Int(i64),
    Text(String),
}

impl MediaId {
    /// Numeric value of this id; text ids are parsed.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Int(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for MediaId {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for MediaId {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<u64> for MediaId {
    fn from(v: u64) -> Self {
        Self::Int(v as i64)
    }
}

impl From<&str> for MediaId {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MediaId {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Ids of one media item, keyed by provider (see [`ids`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaIds(BTreeMap<String, MediaId>);

impl MediaIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `id` under `key`. Empty text ids are ignored.
    pub fn insert(&mut self, key: impl Into<String>, id: impl Into<MediaId>) {
        let id = id.into();
        if !id.is_empty() {
            self.0.insert(key.into(), id);
        }
    }

    pub fn get(&self, key: &str) -> Option<&MediaId> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MediaId> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MediaId)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_string(&self, key: &str) -> Option<String> {
        self.get(key).map(|id| id.to_string())
    }

    /// Integer value of the id; text ids are parsed.
    pub fn as_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(MediaId::as_int)
    }

    pub fn as_int_or(&self, key: &str, default: i64) -> i64 {
        self.as_int(key).unwrap_or(default)
    }

    /// IMDB id, also found under the key older versions wrote.
    pub fn imdb_id(&self) -> Option<String> {
        [ids::IMDB, ids::LEGACY_IMDB]
            .iter()
            .filter_map(|k| self.as_string(k))
            .find(|v| !v.trim().is_empty())
    }

    /// TMDB id, also found under the key older versions wrote.
    pub fn tmdb_id(&self) -> Option<i64> {
        [ids::TMDB, ids::LEGACY_TMDB]
            .iter()
            .filter_map(|k| self.as_int(k))
            .find(|v| *v > 0)
    }

    /// Add the ids of `other` whose keys we do not have yet.
    pub fn merge_missing(&mut self, other: &MediaIds) {
        for (key, id) in &other.0 {
            self.0.entry(key.clone()).or_insert_with(|| id.clone());
        }
    }
}

impl FromIterator<(String, MediaId)> for MediaIds {
    fn from_iter<I: IntoIterator<Item = (String, MediaId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastType {
    Actor,
    Director,
    Writer,
    Producer,
    Other,
}

/// A person credited for a media item.
///
/// Two cast members are the same entry when type and name match; the role
/// and image are informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCastMember {
    pub cast_type: CastType,
    pub name: String,
    pub character: String,
    pub part: String,
    pub image_url: String,
    pub profile_url: String,
}

impl MediaCastMember {
    pub fn new(cast_type: CastType, name: impl Into<String>) -> Self {
        Self {
            cast_type,
            name: name.into(),
            character: String::new(),
            part: String::new(),
            image_url: String::new(),
            profile_url: String::new(),
        }
    }

    pub fn with_character(mut self, character: impl Into<String>) -> Self {
        self.character = character.into();
        self
    }
}

impl PartialEq for MediaCastMember {
    fn eq(&self, other: &Self) -> bool {
        self.cast_type == other.cast_type && self.name == other.name
    }
}

impl Eq for MediaCastMember {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrailer {
    pub name: String,
    pub url: String,
    pub quality: String,
    pub provider: String,
    pub date: String,
}

/// An age rating for one country, e.g. `US` / `PG-13`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Certification {
    pub country: String,
    pub name: String,
}

impl Certification {
    pub fn new(country: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            country: country.into().to_ascii_uppercase(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Certification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.country, self.name)
    }
}

impl FromStr for MediaType {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseNameError::new("media type", s))
    }
}
