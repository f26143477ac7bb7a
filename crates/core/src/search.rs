//! Search results and their ranking.

use std::cmp::Ordering;

use serde::Serialize;

use crate::entities::{MediaId, MediaIds, MediaType};
use crate::metadata::MediaMetadata;
use crate::options::SearchOptions;
use crate::similarity;

/// Penalty for results we cannot show a poster for.
const NO_POSTER_PENALTY: f32 = 0.01;

/// One candidate returned by a provider search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSearchResult {
    pub provider_id: String,
    id: String,
    pub media_type: MediaType,
    pub title: String,
    pub original_title: String,
    pub year: i32,
    pub overview: String,
    pub url: String,
    pub poster_url: String,
    pub score: f32,
    pub ids: MediaIds,
    /// Metadata the provider already fetched while searching, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Box<MediaMetadata>>,
}

impl MediaSearchResult {
    pub fn new(provider_id: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            provider_id: provider_id.into(),
            id: String::new(),
            media_type,
            title: String::new(),
            original_title: String::new(),
            year: 0,
            overview: String::new(),
            url: String::new(),
            poster_url: String::new(),
            score: 0.0,
            ids: MediaIds::new(),
            metadata: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Set the provider's id for this result. It is also recorded in
    /// [`ids`](Self::ids) under the provider's key.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        let value = match self.id.trim().parse::<i64>() {
            Ok(n) => MediaId::Int(n),
            Err(_) => MediaId::Text(self.id.clone()),
        };
        self.ids.insert(self.provider_id.clone(), value);
    }

    pub fn set_ids(&mut self, key: impl Into<String>, id: impl Into<MediaId>) {
        self.ids.insert(key, id);
    }

    /// Score this result against the search query and year.
    pub fn calculate_score(&mut self, options: &SearchOptions) {
        self.score = score(
            &options.query,
            options.year,
            &self.title,
            &self.original_title,
            self.year,
            !self.poster_url.trim().is_empty(),
        );
    }

    /// Ranking order: best score first, newer year first, then title,
    /// provider and id so equal results keep a stable order.
    pub fn compare_rank(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.year.cmp(&self.year))
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| self.provider_id.cmp(&other.provider_id))
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Fill blank fields and missing ids from `other`. The result id is only
    /// taken over from a result of the same provider.
    pub fn merge_from(&mut self, other: &MediaSearchResult) {
        if self.id.trim().is_empty()
            && !other.id.trim().is_empty()
            && self.provider_id == other.provider_id
        {
            self.set_id(other.id.clone());
        }
        self.ids.merge_missing(&other.ids);
        fill(&mut self.title, &other.title);
        fill(&mut self.original_title, &other.original_title);
        fill(&mut self.overview, &other.overview);
        fill(&mut self.url, &other.url);
        fill(&mut self.poster_url, &other.poster_url);
        if self.year <= 0 {
            self.year = other.year;
        }
        if self.metadata.is_none() {
            self.metadata = other.metadata.clone();
        }
    }
}

fn fill(ours: &mut String, theirs: &str) {
    if ours.trim().is_empty() {
        *ours = theirs.to_string();
    }
}

fn score(
    query: &str,
    search_year: Option<i32>,
    title: &str,
    original_title: &str,
    year: i32,
    has_poster: bool,
) -> f32 {
    let mut score = similarity::calculate_score(query, title)
        .max(similarity::calculate_score(query, original_title));

    if let Some(search_year) = search_year.filter(|y| *y > 0) {
        if year > 0 && year != search_year {
            score -= (year - search_year).abs() as f32 / 100.0;
        }
    }
    if !has_poster {
        score -= NO_POSTER_PENALTY;
    }
    score
}

/// Sort `results` best first.
pub fn rank(results: &mut [MediaSearchResult]) {
    results.sort_by(|a, b| a.compare_rank(b));
}
