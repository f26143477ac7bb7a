pub mod compare;
pub mod config;
pub mod context;
pub mod entities;
pub mod error;
pub mod genres;
pub mod metadata;
pub mod open_enum;
pub mod options;
pub mod progress;
pub mod provider;
pub mod scrape;
pub mod search;
pub mod similarity;
pub mod task;

#[cfg(test)]
pub(crate) mod test_support;

pub mod prelude {
    pub use crate::context::ScraperContext;
    pub use crate::entities::*;
    pub use crate::error::*;
    pub use crate::metadata::MediaMetadata;
    pub use crate::options::{ScrapeOptions, SearchOptions};
    pub use crate::search::MediaSearchResult;
}
