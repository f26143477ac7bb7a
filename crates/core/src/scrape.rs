//! Search and scrape runs across the configured providers.

use tracing::{debug, info, warn};

use crate::entities::artwork::ArtworkComparator;
use crate::entities::MediaType;
use crate::error::{ProviderError, ScrapeError};
use crate::metadata::MediaMetadata;
use crate::options::{ScrapeOptions, SearchOptions};
use crate::progress::{emit_progress, ProgressHandler};
use crate::provider::MediaScraper;
use crate::search::{rank, MediaSearchResult};
use crate::task::CancelToken;

/// Search with `scraper` and return the results best first.
pub fn search(
    scraper: &MediaScraper,
    options: &SearchOptions,
    progress: Option<&dyn ProgressHandler>,
) -> Result<Vec<MediaSearchResult>, ScrapeError> {
    emit_progress(progress, "search", 0, Some(1), Some(scraper.name()));

    let mut results = match options.media_type {
        MediaType::TvShow | MediaType::TvEpisode => scraper
            .tv_show_metadata()
            .ok_or_else(|| missing(scraper, "tv show metadata"))?
            .search(options)?,
        MediaType::Movie | MediaType::MovieSet => scraper
            .movie_metadata()
            .ok_or_else(|| missing(scraper, "movie metadata"))?
            .search(options)?,
    };

    for result in &mut results {
        result.calculate_score(options);
    }
    rank(&mut results);

    info!(
        provider = scraper.id(),
        query = %options.query,
        results = results.len(),
        "Search finished"
    );
    emit_progress(progress, "search", 1, Some(1), None);
    Ok(results)
}

fn missing(scraper: &MediaScraper, capability: &str) -> ScrapeError {
    ProviderError::MissingCapability {
        id: scraper.id().to_string(),
        capability: capability.to_string(),
    }
    .into()
}

/// Which scrapers take part in one scrape.
#[derive(Debug, Clone)]
pub struct ScrapeJob {
    /// Provides the main metadata; a failure here fails the scrape.
    pub metadata: MediaScraper,
    /// Fill fields the main provider left empty.
    pub fallback: Vec<MediaScraper>,
    pub artwork: Vec<MediaScraper>,
    pub trailers: Vec<MediaScraper>,
}

impl ScrapeJob {
    pub fn new(metadata: MediaScraper) -> Self {
        Self {
            metadata,
            fallback: Vec::new(),
            artwork: Vec::new(),
            trailers: Vec::new(),
        }
    }

    fn steps(&self) -> u64 {
        (1 + self.fallback.len() + self.artwork.len() + self.trailers.len()) as u64
    }
}

/// Scrape one item.
///
/// Secondary providers (fallback, artwork, trailers) that fail are logged
/// and skipped. The collected artwork is ordered for `options.language`.
pub fn scrape(
    job: &ScrapeJob,
    options: &ScrapeOptions,
    progress: Option<&dyn ProgressHandler>,
    cancel: &CancelToken,
) -> Result<MediaMetadata, ScrapeError> {
    let total = Some(job.steps());
    let mut step = 0;

    emit_progress(progress, "scrape", step, total, Some(job.metadata.name()));
    let mut md = fetch_metadata(&job.metadata, options)?;
    step += 1;

    // later providers see the ids the earlier ones found
    let mut options = options.clone();
    options.ids.merge_missing(&md.ids);

    if options.media_type == MediaType::TvShow && md.sub_items.is_empty() {
        if let Some(tv) = job.metadata.tv_show_metadata() {
            match tv.get_episode_list(&options) {
                Ok(episodes) => {
                    debug!(provider = job.metadata.id(), count = episodes.len(), "Episodes found");
                    for episode in episodes {
                        md.add_sub_item(episode);
                    }
                }
                Err(e) => warn!(provider = job.metadata.id(), "Episode list failed: {}", e),
            }
        }
    }

    for scraper in &job.fallback {
        check(cancel)?;
        emit_progress(progress, "scrape", step, total, Some(scraper.name()));
        match fetch_metadata(scraper, &options) {
            Ok(other) => {
                md.merge_from(&other);
                options.ids.merge_missing(&md.ids);
            }
            Err(e) => warn!(provider = scraper.id(), "Fallback metadata failed: {}", e),
        }
        step += 1;
    }

    for scraper in &job.artwork {
        check(cancel)?;
        emit_progress(progress, "scrape", step, total, Some(scraper.name()));
        match scraper.artwork().map(|p| p.get_artwork(&options)) {
            Some(Ok(artwork)) => {
                debug!(provider = scraper.id(), count = artwork.len(), "Artwork found");
                for art in artwork {
                    // the main provider may already have listed the same image
                    if !md.artwork.iter().any(|a| a.default_url == art.default_url) {
                        md.add_artwork(art);
                    }
                }
            }
            Some(Err(e)) => warn!(provider = scraper.id(), "Artwork lookup failed: {}", e),
            None => warn!(provider = scraper.id(), "Not an artwork provider"),
        }
        step += 1;
    }
    ArtworkComparator::new(options.language.as_str()).sort(&mut md.artwork);

    for scraper in &job.trailers {
        check(cancel)?;
        emit_progress(progress, "scrape", step, total, Some(scraper.name()));
        match scraper.trailer().map(|p| p.get_trailers(&options)) {
            Some(Ok(trailers)) => {
                for trailer in trailers {
                    if !md.trailers.iter().any(|t| t.url == trailer.url) {
                        md.add_trailer(trailer);
                    }
                }
            }
            Some(Err(e)) => warn!(provider = scraper.id(), "Trailer lookup failed: {}", e),
            None => warn!(provider = scraper.id(), "Not a trailer provider"),
        }
        step += 1;
    }

    check(cancel)?;
    emit_progress(progress, "scrape", step, total, None);
    info!(
        provider = job.metadata.id(),
        title = %md.title,
        artwork = md.artwork.len(),
        trailers = md.trailers.len(),
        "Scrape finished"
    );
    Ok(md)
}

fn fetch_metadata(
    scraper: &MediaScraper,
    options: &ScrapeOptions,
) -> Result<MediaMetadata, ScrapeError> {
    match options.media_type {
        MediaType::TvShow | MediaType::TvEpisode => scraper
            .tv_show_metadata()
            .ok_or_else(|| missing(scraper, "tv show metadata"))?
            .get_metadata(options),
        MediaType::Movie | MediaType::MovieSet => scraper
            .movie_metadata()
            .ok_or_else(|| missing(scraper, "movie metadata"))?
            .get_metadata(options),
    }
}

fn check(cancel: &CancelToken) -> Result<(), ScrapeError> {
    if cancel.is_cancelled() {
        Err(ScrapeError::Cancelled)
    } else {
        Ok(())
    }
}
