//! Artwork descriptors and the language-aware artwork ordering.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseNameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaArtworkType {
    Background,
    Banner,
    Poster,
    Actor,
    SeasonPoster,
    SeasonBanner,
    SeasonThumb,
    Thumb,
    ClearArt,
    KeyArt,
    CharacterArt,
    Disc,
    Logo,
    ClearLogo,
}

impl MediaArtworkType {
    fn from_name(s: &str) -> Option<Self> {
        let t = match s.to_ascii_lowercase().replace(|c: char| c == '_' || c == '-', "").as_str() {
            "background" | "fanart" | "backdrop" => Self::Background,
            "banner" => Self::Banner,
            "poster" => Self::Poster,
            "actor" => Self::Actor,
            "seasonposter" => Self::SeasonPoster,
            "seasonbanner" => Self::SeasonBanner,
            "seasonthumb" => Self::SeasonThumb,
            "thumb" => Self::Thumb,
            "clearart" => Self::ClearArt,
            "keyart" => Self::KeyArt,
            "characterart" => Self::CharacterArt,
            "disc" => Self::Disc,
            "logo" => Self::Logo,
            "clearlogo" => Self::ClearLogo,
            _ => return None,
        };
        Some(t)
    }
}

/// Preferred poster resolution. The order value is what providers put into
/// [`MediaArtwork::size_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosterSize {
    XLarge,
    Large,
    Big,
    Medium,
    Small,
}

impl PosterSize {
    pub fn order(self) -> i32 {
        match self {
            Self::XLarge => 16,
            Self::Large => 8,
            Self::Big => 4,
            Self::Medium => 2,
            Self::Small => 1,
        }
    }

    /// Bucket for an image of the given pixel width.
    pub fn from_width(width: u32) -> Self {
        match width {
            w if w >= 2000 => Self::XLarge,
            w if w >= 1000 => Self::Large,
            w if w >= 500 => Self::Big,
            w if w >= 342 => Self::Medium,
            _ => Self::Small,
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace(|c: char| c == '_' || c == '-', "").as_str() {
            "xlarge" => Some(Self::XLarge),
            "large" => Some(Self::Large),
            "big" => Some(Self::Big),
            "medium" => Some(Self::Medium),
            "small" => Some(Self::Small),
            _ => None,
        }
    }
}

impl fmt::Display for PosterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::XLarge => "Extra large: ~2000x3000px",
            Self::Large => "Large: ~1000x1500px",
            Self::Big => "Big: ~500x750px",
            Self::Medium => "Medium: ~342x513px",
            Self::Small => "Small: ~185x277px",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanartSize {
    XLarge,
    Large,
    Medium,
    Small,
}

impl FanartSize {
    pub fn order(self) -> i32 {
        match self {
            Self::XLarge => 16,
            Self::Large => 8,
            Self::Medium => 2,
            Self::Small => 1,
        }
    }

    pub fn from_width(width: u32) -> Self {
        match width {
            w if w >= 3840 => Self::XLarge,
            w if w >= 1920 => Self::Large,
            w if w >= 1280 => Self::Medium,
            _ => Self::Small,
        }
    }

    fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().replace(|c: char| c == '_' || c == '-', "").as_str() {
            "xlarge" => Some(Self::XLarge),
            "large" => Some(Self::Large),
            "medium" => Some(Self::Medium),
            "small" => Some(Self::Small),
            _ => None,
        }
    }
}

impl fmt::Display for FanartSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::XLarge => "Extra large: ~3840x2160px",
            Self::Large => "Large: ~1920x1080px",
            Self::Medium => "Medium: ~1280x720px",
            Self::Small => "Small: ~300x168px",
        };
        f.write_str(s)
    }
}

/// One rendition of an artwork.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSizeAndUrl {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

impl ImageSizeAndUrl {
    pub fn new(width: u32, height: u32, url: impl Into<String>) -> Self {
        Self {
            width,
            height,
            url: url.into(),
        }
    }
}

impl fmt::Display for ImageSizeAndUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaArtwork {
    pub provider_id: String,
    pub artwork_type: MediaArtworkType,
    pub imdb_id: String,
    pub tmdb_id: i64,
    /// `-1` when the artwork is not bound to a season.
    pub season: i32,
    pub preview_url: String,
    pub default_url: String,
    /// ISO 639-1 code, empty for language-neutral artwork.
    pub language: String,
    pub size_order: i32,
    pub likes: i32,
    pub animated: bool,
    image_sizes: Vec<ImageSizeAndUrl>,
}

impl MediaArtwork {
    pub fn new(provider_id: impl Into<String>, artwork_type: MediaArtworkType) -> Self {
        Self {
            provider_id: provider_id.into(),
            artwork_type,
            imdb_id: String::new(),
            tmdb_id: 0,
            season: -1,
            preview_url: String::new(),
            default_url: String::new(),
            language: String::new(),
            size_order: 0,
            likes: 0,
            animated: false,
            image_sizes: Vec::new(),
        }
    }

    /// Copy of `other` re-labelled as `artwork_type` (a poster reused as thumb, ...).
    pub fn with_type(other: &MediaArtwork, artwork_type: MediaArtworkType) -> Self {
        Self {
            artwork_type,
            ..other.clone()
        }
    }

    /// The preview url, or the default url when no preview has been set.
    pub fn preview_url(&self) -> &str {
        if self.preview_url.trim().is_empty() {
            &self.default_url
        } else {
            &self.preview_url
        }
    }

    pub fn add_image_size(&mut self, width: u32, height: u32, url: impl Into<String>) {
        self.image_sizes.push(ImageSizeAndUrl::new(width, height, url));
    }

    /// All renditions, biggest first.
    pub fn image_sizes(&self) -> Vec<ImageSizeAndUrl> {
        let mut sizes = self.image_sizes.clone();
        sizes.sort_by(|a, b| b.width.cmp(&a.width));
        sizes
    }

    pub fn smallest_artwork(&self) -> Option<&ImageSizeAndUrl> {
        self.image_sizes.iter().min_by_key(|s| s.width)
    }

    pub fn biggest_artwork(&self) -> Option<&ImageSizeAndUrl> {
        self.image_sizes.iter().max_by_key(|s| s.width)
    }
}

/// Orders artwork by preferred language, then English, then decreasing
/// size order, then decreasing likes.
#[derive(Debug, Clone)]
pub struct ArtworkComparator {
    preferred_language: String,
}

impl ArtworkComparator {
    pub fn new(preferred_language: impl Into<String>) -> Self {
        Self {
            preferred_language: preferred_language.into(),
        }
    }

    pub fn compare(&self, a: &MediaArtwork, b: &MediaArtwork) -> Ordering {
        let pref = |x: &MediaArtwork| x.language != self.preferred_language;
        let english = |x: &MediaArtwork| x.language != "en";

        pref(a)
            .cmp(&pref(b))
            .then_with(|| english(a).cmp(&english(b)))
            .then_with(|| b.size_order.cmp(&a.size_order))
            .then_with(|| b.likes.cmp(&a.likes))
    }

    pub fn sort(&self, artwork: &mut [MediaArtwork]) {
        artwork.sort_by(|a, b| self.compare(a, b));
    }
}

impl Default for ArtworkComparator {
    fn default() -> Self {
        Self::new("en")
    }
}

impl FromStr for MediaArtworkType {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseNameError::new("artwork type", s))
    }
}

impl FromStr for PosterSize {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseNameError::new("poster size", s))
    }
}

impl FromStr for FanartSize {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseNameError::new("fanart size", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn art(language: &str, size_order: i32, likes: i32) -> MediaArtwork {
        let mut a = MediaArtwork::new("test", MediaArtworkType::Poster);
        a.language = language.to_string();
        a.size_order = size_order;
        a.likes = likes;
        a
    }

    #[test]
    fn names_parse_loosely() {
        assert_eq!("fanart".parse::<MediaArtworkType>(), Ok(MediaArtworkType::Background));
        assert_eq!("season-poster".parse::<MediaArtworkType>(), Ok(MediaArtworkType::SeasonPoster));
        assert_eq!("x_large".parse::<PosterSize>(), Ok(PosterSize::XLarge));
        assert_eq!("XLARGE".parse::<FanartSize>(), Ok(FanartSize::XLarge));
        let err = "huge".parse::<PosterSize>().unwrap_err();
        assert_eq!(err.kind, "poster size");
        assert_eq!(err.value, "huge");
    }

    #[test]
    fn preferred_language_then_english() {
        let mut list = vec![art("fr", 16, 100), art("en", 16, 100), art("de", 1, 0)];
        ArtworkComparator::new("de").sort(&mut list);
        let langs: Vec<_> = list.iter().map(|a| a.language.as_str()).collect();
        assert_eq!(langs, vec!["de", "en", "fr"]);
    }

    #[test]
    fn size_then_likes_within_language() {
        let mut list = vec![art("en", 2, 50), art("en", 8, 1), art("en", 8, 9)];
        ArtworkComparator::new("en").sort(&mut list);
        let keys: Vec<_> = list.iter().map(|a| (a.size_order, a.likes)).collect();
        assert_eq!(keys, vec![(8, 9), (8, 1), (2, 50)]);
    }

    #[test]
    fn preview_falls_back_to_default() {
        let mut a = art("en", 0, 0);
        a.default_url = "http://img/orig.jpg".to_string();
        assert_eq!(a.preview_url(), "http://img/orig.jpg");
        a.preview_url = "http://img/w185.jpg".to_string();
        assert_eq!(a.preview_url(), "http://img/w185.jpg");
    }

    #[test]
    fn image_sizes_descending() {
        let mut a = art("en", 0, 0);
        a.add_image_size(500, 750, "b");
        a.add_image_size(2000, 3000, "c");
        a.add_image_size(185, 278, "a");
        let widths: Vec<_> = a.image_sizes().iter().map(|s| s.width).collect();
        assert_eq!(widths, vec![2000, 500, 185]);
        assert_eq!(a.smallest_artwork().unwrap().url, "a");
        assert_eq!(a.biggest_artwork().unwrap().url, "c");
        assert_eq!(a.biggest_artwork().unwrap().to_string(), "2000x3000");
    }

    #[test]
    fn with_type_keeps_everything_else() {
        let mut poster = art("en", 8, 3);
        poster.add_image_size(1000, 1500, "p");
        let thumb = MediaArtwork::with_type(&poster, MediaArtworkType::Thumb);
        assert_eq!(thumb.artwork_type, MediaArtworkType::Thumb);
        assert_eq!(thumb.image_sizes(), poster.image_sizes());
        assert_eq!(thumb.size_order, 8);
    }

    #[test]
    fn size_buckets() {
        assert_eq!(PosterSize::from_width(2000), PosterSize::XLarge);
        assert_eq!(PosterSize::from_width(780), PosterSize::Big);
        assert_eq!(PosterSize::from_width(342), PosterSize::Medium);
        assert_eq!(FanartSize::from_width(1920), FanartSize::Large);
        assert_eq!(FanartSize::from_width(300), FanartSize::Small);
        assert_eq!(PosterSize::Big.order(), 4);
    }

    fn arb_art() -> impl Strategy<Value = MediaArtwork> {
        (
            prop_oneof![Just("en"), Just("de"), Just("fr"), Just("")],
            prop_oneof![Just(1), Just(2), Just(4), Just(8), Just(16)],
            0..20i32,
        )
            .prop_map(|(l, s, k)| art(l, s, k))
    }

    fn key(pref: &str, a: &MediaArtwork) -> (bool, bool, i32, i32) {
        (a.language != pref, a.language != "en", -a.size_order, -a.likes)
    }

    proptest! {
        #[test]
        fn comparator_matches_lexicographic_key(a in arb_art(), b in arb_art(), pref in prop_oneof![Just("en"), Just("de")]) {
            let cmp = ArtworkComparator::new(pref);
            prop_assert_eq!(cmp.compare(&a, &b), key(pref, &a).cmp(&key(pref, &b)));
            prop_assert_eq!(cmp.compare(&a, &b), cmp.compare(&b, &a).reverse());
        }

        #[test]
        fn comparator_is_transitive(a in arb_art(), b in arb_art(), c in arb_art()) {
            let cmp = ArtworkComparator::new("de");
            if cmp.compare(&a, &b) != Ordering::Greater && cmp.compare(&b, &c) != Ordering::Greater {
                prop_assert_ne!(cmp.compare(&a, &c), Ordering::Greater);
            }
        }
    }
}
