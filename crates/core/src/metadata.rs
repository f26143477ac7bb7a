//! Scraped metadata as handed from a provider to the library.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::entities::{
    CastType, Certification, MediaArtwork, MediaArtworkType, MediaCastMember, MediaId, MediaIds,
    MediaTrailer,
};
use crate::genres::MediaGenre;

/// Everything one provider knows about one media item.
///
/// Unset values are empty strings, `0` for counts, year, runtime and rating,
/// `-1` for episode style numbers and `None` for the release date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaMetadata {
    pub provider_id: String,
    pub ids: MediaIds,

    pub title: String,
    pub original_title: String,
    pub year: i32,
    pub release_date: Option<NaiveDate>,
    pub plot: String,
    pub tagline: String,
    pub runtime: i32,
    pub rating: f32,
    pub vote_count: i32,

    // movie
    pub collection_name: String,
    pub top250: i32,

    // tv show
    pub episode_number: i32,
    pub season_number: i32,
    pub dvd_episode_number: i32,
    pub dvd_season_number: i32,
    pub display_episode_number: i32,
    pub display_season_number: i32,
    pub absolute_number: i32,
    pub status: String,

    pub cast_members: Vec<MediaCastMember>,
    pub artwork: Vec<MediaArtwork>,
    pub genres: Vec<MediaGenre>,
    pub certifications: Vec<Certification>,
    pub production_companies: Vec<String>,
    pub spoken_languages: Vec<String>,
    pub countries: Vec<String>,
    pub trailers: Vec<MediaTrailer>,
    pub sub_items: Vec<MediaMetadata>,
    pub tags: Vec<String>,

    /// Free-form key/value store for provider specific data.
    pub extra_data: BTreeMap<String, serde_json::Value>,
}

impl MediaMetadata {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            ids: MediaIds::new(),
            title: String::new(),
            original_title: String::new(),
            year: 0,
            release_date: None,
            plot: String::new(),
            tagline: String::new(),
            runtime: 0,
            rating: 0.0,
            vote_count: 0,
            collection_name: String::new(),
            top250: 0,
            episode_number: -1,
            season_number: -1,
            dvd_episode_number: -1,
            dvd_season_number: -1,
            display_episode_number: -1,
            display_season_number: -1,
            absolute_number: -1,
            status: String::new(),
            cast_members: Vec::new(),
            artwork: Vec::new(),
            genres: Vec::new(),
            certifications: Vec::new(),
            production_companies: Vec::new(),
            spoken_languages: Vec::new(),
            countries: Vec::new(),
            trailers: Vec::new(),
            sub_items: Vec::new(),
            tags: Vec::new(),
            extra_data: BTreeMap::new(),
        }
    }

    pub fn set_id(&mut self, key: impl Into<String>, id: impl Into<MediaId>) {
        self.ids.insert(key.into(), id.into());
    }

    pub fn id(&self, key: &str) -> Option<&MediaId> {
        self.ids.get(key)
    }

    pub fn add_genre(&mut self, genre: MediaGenre) {
        push_unique(&mut self.genres, genre);
    }

    pub fn remove_genre(&mut self, genre: &MediaGenre) {
        self.genres.retain(|g| g != genre);
    }

    /// Adds `member` unless a member with the same type and name exists.
    pub fn add_cast_member(&mut self, member: MediaCastMember) {
        push_unique(&mut self.cast_members, member);
    }

    /// Cast members of one type; `None` returns all of them.
    pub fn cast_members(&self, cast_type: Option<CastType>) -> Vec<&MediaCastMember> {
        self.cast_members
            .iter()
            .filter(|c| cast_type.map_or(true, |t| c.cast_type == t))
            .collect()
    }

    pub fn add_artwork(&mut self, artwork: MediaArtwork) {
        self.artwork.push(artwork);
    }

    pub fn clear_artwork(&mut self) {
        self.artwork.clear();
    }

    /// Artwork of one type; `None` returns all of it.
    pub fn media_art(&self, artwork_type: Option<MediaArtworkType>) -> Vec<&MediaArtwork> {
        self.artwork
            .iter()
            .filter(|a| artwork_type.map_or(true, |t| a.artwork_type == t))
            .collect()
    }

    pub fn add_certification(&mut self, certification: Certification) {
        self.certifications.push(certification);
    }

    pub fn add_trailer(&mut self, trailer: MediaTrailer) {
        self.trailers.push(trailer);
    }

    pub fn add_sub_item(&mut self, item: MediaMetadata) {
        self.sub_items.push(item);
    }

    pub fn add_production_company(&mut self, company: impl Into<String>) {
        push_unique(&mut self.production_companies, company.into());
    }

    pub fn remove_production_company(&mut self, company: &str) {
        self.production_companies.retain(|c| c != company);
    }

    pub fn add_spoken_language(&mut self, language: impl Into<String>) {
        push_unique(&mut self.spoken_languages, language.into());
    }

    pub fn remove_spoken_language(&mut self, language: &str) {
        self.spoken_languages.retain(|l| l != language);
    }

    pub fn add_country(&mut self, country: impl Into<String>) {
        push_unique(&mut self.countries, country.into());
    }

    pub fn remove_country(&mut self, country: &str) {
        self.countries.retain(|c| c != country);
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        push_unique(&mut self.tags, tag.into());
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn add_extra_data(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.extra_data.insert(key.into(), value.into());
    }

    pub fn extra_data(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra_data.get(key)
    }

    /// Fill in what we do not know yet from `other`.
    ///
    /// Scalars are only taken over when ours are blank (strings) or not
    /// positive (numbers). Ids and extra data gain the keys we are missing.
    /// Every list ends up with each entry of `other`'s list exactly once.
    pub fn merge_from(&mut self, other: &MediaMetadata) {
        self.ids.merge_missing(&other.ids);

        merge_str(&mut self.title, &other.title);
        merge_str(&mut self.original_title, &other.original_title);
        merge_int(&mut self.year, other.year);
        if self.release_date.is_none() {
            self.release_date = other.release_date;
        }
        merge_str(&mut self.plot, &other.plot);
        merge_str(&mut self.tagline, &other.tagline);
        merge_int(&mut self.runtime, other.runtime);
        if self.rating <= 0.0 {
            self.rating = other.rating;
        }
        merge_int(&mut self.vote_count, other.vote_count);
        merge_str(&mut self.collection_name, &other.collection_name);
        merge_int(&mut self.top250, other.top250);
        merge_int(&mut self.episode_number, other.episode_number);
        merge_int(&mut self.season_number, other.season_number);
        merge_int(&mut self.dvd_episode_number, other.dvd_episode_number);
        merge_int(&mut self.dvd_season_number, other.dvd_season_number);
        merge_int(&mut self.display_episode_number, other.display_episode_number);
        merge_int(&mut self.display_season_number, other.display_season_number);
        merge_int(&mut self.absolute_number, other.absolute_number);
        merge_str(&mut self.status, &other.status);

        merge_list(&mut self.cast_members, &other.cast_members);
        merge_list(&mut self.artwork, &other.artwork);
        merge_list(&mut self.genres, &other.genres);
        merge_list(&mut self.certifications, &other.certifications);
        merge_list(&mut self.production_companies, &other.production_companies);
        merge_list(&mut self.spoken_languages, &other.spoken_languages);
        merge_list(&mut self.countries, &other.countries);
        merge_list(&mut self.trailers, &other.trailers);
        merge_list(&mut self.sub_items, &other.sub_items);
        merge_list(&mut self.tags, &other.tags);

        for (key, value) in &other.extra_data {
            self.extra_data
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

fn merge_str(ours: &mut String, theirs: &str) {
    if ours.trim().is_empty() {
        *ours = theirs.to_string();
    }
}

fn merge_int(ours: &mut i32, theirs: i32) {
    if *ours <= 0 {
        *ours = theirs;
    }
}

// Drop our copies of their entries, then append theirs once each.
fn merge_list<T: PartialEq + Clone>(ours: &mut Vec<T>, theirs: &[T]) {
    ours.retain(|item| !theirs.contains(item));
    for item in theirs {
        push_unique(ours, item.clone());
    }
}
