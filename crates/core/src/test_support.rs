//! Canned providers for unit tests.

use crate::entities::{MediaArtwork, MediaTrailer};
use crate::error::ScrapeError;
use crate::metadata::MediaMetadata;
use crate::options::{ScrapeOptions, SearchOptions};
use crate::provider::{
    ArtworkProvider, MediaProvider, MediaProviderInfo, MovieMetadataProvider, TrailerProvider,
    TvShowMetadataProvider,
};
use crate::search::MediaSearchResult;

pub(crate) struct StubProvider {
    info: MediaProviderInfo,
    movie: bool,
    tv_show: bool,
    artwork: bool,
    trailer: bool,
    fail: bool,
    pub results: Vec<MediaSearchResult>,
    pub metadata: Option<MediaMetadata>,
    pub artwork_items: Vec<MediaArtwork>,
    pub trailers: Vec<MediaTrailer>,
    pub episodes: Vec<MediaMetadata>,
    /// Only the episode list fails.
    pub fail_episodes: bool,
}

impl StubProvider {
    fn new(id: &str) -> Self {
        Self {
            info: MediaProviderInfo::new(id, id, "stub provider"),
            movie: false,
            tv_show: false,
            artwork: false,
            trailer: false,
            fail: false,
            results: Vec::new(),
            metadata: None,
            artwork_items: Vec::new(),
            trailers: Vec::new(),
            episodes: Vec::new(),
            fail_episodes: false,
        }
    }

    pub fn movie(id: &str) -> Self {
        Self {
            movie: true,
            ..Self::new(id)
        }
    }

    pub fn tv_show(id: &str) -> Self {
        Self {
            tv_show: true,
            ..Self::new(id)
        }
    }

    pub fn artwork(id: &str) -> Self {
        Self {
            artwork: true,
            ..Self::new(id)
        }
    }

    pub fn trailer(id: &str) -> Self {
        Self {
            trailer: true,
            ..Self::new(id)
        }
    }

    /// Every call returns a network error.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    fn check(&self) -> Result<(), ScrapeError> {
        if self.fail {
            Err(ScrapeError::Network(format!("{} is down", self.info.id)))
        } else {
            Ok(())
        }
    }
}

impl MediaProvider for StubProvider {
    fn info(&self) -> &MediaProviderInfo {
        &self.info
    }

    fn as_movie_metadata(&self) -> Option<&dyn MovieMetadataProvider> {
        if self.movie {
            Some(self)
        } else {
            None
        }
    }

    fn as_tv_show_metadata(&self) -> Option<&dyn TvShowMetadataProvider> {
        if self.tv_show {
            Some(self)
        } else {
            None
        }
    }

    fn as_artwork(&self) -> Option<&dyn ArtworkProvider> {
        if self.artwork {
            Some(self)
        } else {
            None
        }
    }

    fn as_trailer(&self) -> Option<&dyn TrailerProvider> {
        if self.trailer {
            Some(self)
        } else {
            None
        }
    }
}

impl MovieMetadataProvider for StubProvider {
    fn search(&self, _options: &SearchOptions) -> Result<Vec<MediaSearchResult>, ScrapeError> {
        self.check()?;
        Ok(self.results.clone())
    }

    fn get_metadata(&self, _options: &ScrapeOptions) -> Result<MediaMetadata, ScrapeError> {
        self.check()?;
        self.metadata.clone().ok_or(ScrapeError::NotFound)
    }
}

impl TvShowMetadataProvider for StubProvider {
    fn search(&self, _options: &SearchOptions) -> Result<Vec<MediaSearchResult>, ScrapeError> {
        self.check()?;
        Ok(self.results.clone())
    }

    fn get_metadata(&self, _options: &ScrapeOptions) -> Result<MediaMetadata, ScrapeError> {
        self.check()?;
        self.metadata.clone().ok_or(ScrapeError::NotFound)
    }

    fn get_episode_list(&self, _options: &ScrapeOptions) -> Result<Vec<MediaMetadata>, ScrapeError> {
        self.check()?;
        if self.fail_episodes {
            return Err(ScrapeError::Network(format!("{} has no episodes", self.info.id)));
        }
        Ok(self.episodes.clone())
    }
}

impl ArtworkProvider for StubProvider {
    fn get_artwork(&self, _options: &ScrapeOptions) -> Result<Vec<MediaArtwork>, ScrapeError> {
        self.check()?;
        Ok(self.artwork_items.clone())
    }
}

impl TrailerProvider for StubProvider {
    fn get_trailers(&self, _options: &ScrapeOptions) -> Result<Vec<MediaTrailer>, ScrapeError> {
        self.check()?;
        Ok(self.trailers.clone())
    }
}
