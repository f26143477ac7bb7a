//! The genre set shared by all providers.
//!
//! Built-in genres are registered up front; anything a provider reports that
//! does not resolve to a known genre becomes a new genre on the fly.

use std::sync::Arc;

use crate::error::OpenEnumError;
use crate::open_enum::{EnumConstant, ListenerId, OpenEnum};

/// Payload of a genre constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genre {
    /// English printable name.
    pub name: String,
    /// Synonyms as `(language, name)`; `None` for untagged English synonyms.
    pub alternate_names: Vec<(Option<String>, String)>,
}

pub type MediaGenre = EnumConstant<Genre>;

impl Genre {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alternate_names: Vec::new(),
        }
    }

    pub fn localized_name(&self, language: &str) -> &str {
        self.alternate_names
            .iter()
            .find(|(lang, _)| lang.as_deref() == Some(language))
            .map(|(_, name)| name.as_str())
            .unwrap_or(&self.name)
    }

    fn matches(&self, name: &str) -> bool {
        let folded = fold_separators(name);
        let bare = fold_separators(strip_language_prefix(name));
        self.alternate_names.iter().any(|(_, alt)| {
            let alt = fold_separators(alt);
            alt == folded || alt == bare
        })
    }
}

// "Science.Fiction", "science_fiction" and "Science Fiction" fold alike.
fn fold_separators(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '.' | '_' | '-') { ' ' } else { c })
        .collect::<String>()
        .to_lowercase()
}

// "de-Krimi" -> "Krimi"
fn strip_language_prefix(name: &str) -> &str {
    let bytes = name.as_bytes();
    if bytes.len() > 3
        && bytes[2] == b'-'
        && bytes[0].is_ascii_alphabetic()
        && bytes[1].is_ascii_alphabetic()
    {
        &name[3..]
    } else {
        name
    }
}

struct BuiltIn {
    key: &'static str,
    ordinal: i32,
    name: &'static str,
    synonyms: &'static [&'static str],
    de: &'static str,
    fr: &'static str,
}

const fn g(
    key: &'static str,
    ordinal: i32,
    name: &'static str,
    synonyms: &'static [&'static str],
    de: &'static str,
    fr: &'static str,
) -> BuiltIn {
    BuiltIn {
        key,
        ordinal,
        name,
        synonyms,
        de,
        fr,
    }
}

#[rustfmt::skip]
const BUILT_IN: &[BuiltIn] = &[
    g("ACTION", 0, "Action", &[], "Action", "Action"),
    g("ADVENTURE", 1, "Adventure", &[], "Abenteuer", "Aventure"),
    g("ANIMATION", 2, "Animation", &[], "Animation", "Animation"),
    g("ANIME", -1, "Anime", &[], "Anime", "Animé"),
    g("ANIMAL", 3, "Animal", &[], "Tierfilm", "Animalier"),
    g("BIOGRAPHY", 4, "Biography", &[], "Biographie", "Biographie"),
    g("COMEDY", 5, "Comedy", &[], "Komödie", "Comédie"),
    g("CRIME", 6, "Crime", &[], "Krimi", "Policier"),
    g("DISASTER", 7, "Disaster", &[], "Katastrophenfilm", "Catastrophe"),
    g("DOCUMENTARY", 8, "Documentary", &["Home and Garden", "Food"], "Dokumentarfilm", "Documentaire"),
    g("DRAMA", 9, "Drama", &[], "Drama", "Drame"),
    g("EASTERN", 10, "Eastern", &[], "Eastern", "Eastern"),
    g("EROTIC", 11, "Erotic", &[], "Erotik", "Érotique"),
    g("FAMILY", 12, "Family", &["Children"], "Familie", "Familial"),
    g("FAN_FILM", 13, "Fan Film", &[], "Fan-Film", "Film de fans"),
    g("FANTASY", 14, "Fantasy", &[], "Fantasy", "Fantastique"),
    g("FILM_NOIR", 15, "Film Noir", &[], "Film Noir", "Film noir"),
    g("FOREIGN", 16, "Foreign", &[], "Ausländisch", "Étranger"),
    g("GAME_SHOW", 17, "Gameshow", &["Game Show"], "Spielshow", "Jeu télévisé"),
    g("HISTORY", 18, "History", &[], "Historie", "Histoire"),
    g("HOLIDAY", 19, "Holiday", &["Travel"], "Urlaub", "Vacances"),
    g("HORROR", 20, "Horror", &[], "Horror", "Horreur"),
    g("INDIE", 21, "Indie", &["Special Interest"], "Indie", "Indépendant"),
    g("MUSIC", 22, "Music", &[], "Musik", "Musique"),
    g("MUSICAL", 23, "Musical", &[], "Musical", "Comédie musicale"),
    g("MYSTERY", 24, "Mystery", &[], "Mystery", "Mystère"),
    g("NEO_NOIR", 25, "Neo Noir", &[], "Neo-Noir", "Néo-noir"),
    g("NEWS", 26, "News", &[], "Nachrichten", "Informations"),
    g("REALITY_TV", 27, "Reality TV", &["Reality"], "Reality-TV", "Téléréalité"),
    g("ROAD_MOVIE", 28, "Road Movie", &[], "Roadmovie", "Road movie"),
    g("ROMANCE", 29, "Romance", &[], "Liebesfilm", "Romance"),
    g("SCIENCE_FICTION", 30, "Science Fiction", &["Sci-Fi", "Science-Fiction"], "Science-Fiction", "Science-fiction"),
    g("SERIES", 31, "Series", &["Soap", "Mini-Series"], "Serie", "Série"),
    g("SHORT", 32, "Short", &[], "Kurzfilm", "Court métrage"),
    g("SILENT_MOVIE", 33, "Silent Movie", &[], "Stummfilm", "Film muet"),
    g("SPORT", 34, "Sport", &[], "Sport", "Sport"),
    g("SPORTING_EVENT", 35, "Sporting Event", &[], "Sportereignis", "Événement sportif"),
    g("SPORTS_FILM", 36, "Sports Film", &[], "Sportfilm", "Film de sport"),
    g("SUSPENSE", 37, "Suspense", &[], "Suspense", "Suspense"),
    g("TALK_SHOW", 38, "Talk show", &[], "Talkshow", "Talk-show"),
    g("TV_MOVIE", 39, "TV Movie", &[], "TV-Film", "Téléfilm"),
    g("THRILLER", 40, "Thriller", &[], "Thriller", "Thriller"),
    g("WAR", 41, "War", &[], "Kriegsfilm", "Guerre"),
    g("WESTERN", 42, "Western", &[], "Western", "Western"),
];

/// Languages for which localized genre names ship with the library.
pub const GENRE_LANGUAGES: &[&str] = &["en", "de", "fr"];

/// Thread-safe genre set. Share it as an `Arc<GenreRegistry>`.
pub struct GenreRegistry {
    genres: OpenEnum<Genre>,
    language: String,
}

impl GenreRegistry {
    /// Registry with all built-in genres; `language` selects the names used
    /// for display and sorting.
    pub fn new(language: impl Into<String>) -> Arc<Self> {
        let genres = OpenEnum::new();
        for b in BUILT_IN {
            let mut genre = Genre::new(b.name);
            genre
                .alternate_names
                .push((Some("de".to_string()), b.de.to_string()));
            genre
                .alternate_names
                .push((Some("fr".to_string()), b.fr.to_string()));
            genre.alternate_names.extend(
                b.synonyms
                    .iter()
                    .map(|s| (None::<String>, (*s).to_string())),
            );
            // keys in BUILT_IN are unique, a fresh registry cannot reject them
            if let Err(e) = genres.register(b.key, b.ordinal, genre) {
                tracing::error!("Failed to register built-in genre: {}", e);
            }
        }
        Arc::new(Self {
            genres,
            language: language.into(),
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Exact lookup by constant name (`SCIENCE_FICTION`).
    pub fn value_of(&self, key: &str) -> Option<MediaGenre> {
        self.genres.value_of(key)
    }

    /// Resolve whatever a provider reported to a genre, creating a new one if
    /// nothing matches.
    pub fn get_genre(&self, name: &str) -> MediaGenre {
        let wanted = fold_separators(name);
        self.genres.find_or_register(
            |genre| fold_separators(&genre.name) == wanted || genre.value().matches(name),
            name,
            |_| Genre::new(name),
        )
    }

    /// All genres, sorted by their name in the registry's language.
    pub fn values(&self) -> Vec<MediaGenre> {
        let mut all = self.genres.values();
        all.sort_by(|a, b| {
            a.localized_name(&self.language)
                .cmp(b.localized_name(&self.language))
        });
        all
    }

    pub fn localized_name<'a>(&self, genre: &'a MediaGenre) -> &'a str {
        genre.localized_name(&self.language)
    }

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&MediaGenre) + Send + Sync + 'static,
    {
        self.genres.add_listener(listener)
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.genres.remove_listener(id)
    }

    /// Register a genre explicitly; used when restoring a library that knows
    /// genres this build does not ship with.
    pub fn register(&self, key: &str, name: &str) -> Result<MediaGenre, OpenEnumError> {
        let ordinal = self.genres.len() as i32;
        self.genres.register(key, ordinal, Genre::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn built_ins_are_registered() {
        let reg = GenreRegistry::new("en");
        assert_eq!(reg.values().len(), 43);
        assert_eq!(reg.value_of("ANIME").unwrap().ordinal(), -1);
        assert_eq!(reg.value_of("WESTERN").unwrap().ordinal(), 42);
    }

    #[test]
    fn lookup_rules() {
        let reg = GenreRegistry::new("en");
        let sf = reg.value_of("SCIENCE_FICTION").unwrap();
        assert_eq!(reg.get_genre("SCIENCE_FICTION"), sf);
        assert_eq!(reg.get_genre("science fiction"), sf);
        assert_eq!(reg.get_genre("science-fiction"), sf);
        assert_eq!(reg.get_genre("Sci-Fi"), sf);

        let crime = reg.value_of("CRIME").unwrap();
        assert_eq!(reg.get_genre("Krimi"), crime);
        assert_eq!(reg.get_genre("de-Krimi"), crime);
        assert_eq!(reg.get_genre("Policier"), crime);

        assert_eq!(reg.get_genre("Food"), reg.value_of("DOCUMENTARY").unwrap());
        assert_eq!(reg.get_genre("Game Show"), reg.value_of("GAME_SHOW").unwrap());
    }

    #[test]
    fn unknown_genre_is_created_once() {
        let reg = GenreRegistry::new("en");
        let seen = Arc::new(AtomicUsize::new(0));
        let s = Arc::clone(&seen);
        reg.add_listener(move |_| {
            s.fetch_add(1, Ordering::SeqCst);
        });

        let g = reg.get_genre("Mockumentary");
        assert_eq!(g.name(), "Mockumentary");
        assert_eq!(g.ordinal(), 43);
        assert_eq!(reg.get_genre("mockumentary"), g);
        assert_eq!(reg.values().len(), 44);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn localized_names_and_sorting() {
        let reg = GenreRegistry::new("de");
        let crime = reg.value_of("CRIME").unwrap();
        assert_eq!(reg.localized_name(&crime), "Krimi");
        assert_eq!(crime.localized_name("fr"), "Policier");
        assert_eq!(crime.localized_name("en"), "Crime");
        assert_eq!(crime.localized_name("xx"), "Crime");

        let names: Vec<String> = reg
            .values()
            .iter()
            .map(|g| reg.localized_name(g).to_string())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "Abenteuer");
    }

    #[test]
    fn concurrent_lookup_creates_single_genre() {
        let reg = GenreRegistry::new("en");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reg = Arc::clone(&reg);
                std::thread::spawn(move || reg.get_genre("Wuxia"))
            })
            .collect();
        let results: Vec<MediaGenre> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(reg.values().len(), 44);
    }

    #[test]
    fn concurrent_lookup_of_known_names_never_registers() {
        let variants = ["Krimi", "de-Krimi", "KRIMI", "crime", "fr-Policier", "sci_fi", "Sci.Fi"];
        let reg = GenreRegistry::new("en");
        let barrier = Arc::new(std::sync::Barrier::new(variants.len()));
        let handles: Vec<_> = variants
            .into_iter()
            .map(|name| {
                let reg = Arc::clone(&reg);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    reg.get_genre(name).name().to_string()
                })
            })
            .collect();
        let keys: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            keys,
            vec!["CRIME", "CRIME", "CRIME", "CRIME", "CRIME", "SCIENCE_FICTION", "SCIENCE_FICTION"]
        );
        assert_eq!(reg.values().len(), 43);
    }

    #[test]
    fn concurrent_lookup_of_spelling_variants_creates_single_genre() {
        let variants = ["Martial Arts Epic", "martial arts epic", "MARTIAL_ARTS_EPIC", "martial-arts.epic"];
        for _ in 0..200 {
            let reg = GenreRegistry::new("en");
            let barrier = Arc::new(std::sync::Barrier::new(variants.len()));
            let handles: Vec<_> = variants
                .into_iter()
                .map(|name| {
                    let reg = Arc::clone(&reg);
                    let barrier = Arc::clone(&barrier);
                    std::thread::spawn(move || {
                        barrier.wait();
                        reg.get_genre(name)
                    })
                })
                .collect();
            let results: Vec<MediaGenre> =
                handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(reg.values().len(), 44, "{:?}", results);
        }
    }

    proptest! {
        #[test]
        fn spelling_variants_resolve_to_one_genre(a in "q[a-z]{3,7}", b in "q[a-z]{3,7}") {
            let reg = GenreRegistry::new("en");
            let first = reg.get_genre(&format!("{a} {b}"));
            for variant in [
                format!("{} {}", a.to_uppercase(), b.to_uppercase()),
                format!("{a}_{b}"),
                format!("{a}-{b}"),
                format!("{a}.{b}"),
                format!("{}_{}", a.to_uppercase(), b),
            ] {
                prop_assert_eq!(reg.get_genre(&variant), first.clone());
            }
            prop_assert_eq!(reg.values().len(), 44);
        }
    }
}
