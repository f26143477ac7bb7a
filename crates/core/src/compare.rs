//! Composable comparators over extracted keys.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseNameError;
use crate::search::MediaSearchResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

type CompareFn<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// A comparator built from key extractors.
///
/// ```
/// use tmm_core::compare::{KeyComparator, SortDirection};
///
/// let by_len = KeyComparator::by(|s: &String| s.len(), SortDirection::Descending)
///     .then(KeyComparator::by(|s: &String| s.clone(), SortDirection::Ascending));
/// let mut words = vec!["bb".to_string(), "a".to_string(), "ab".to_string()];
/// by_len.sort(&mut words);
/// assert_eq!(words, vec!["ab", "bb", "a"]);
/// ```
pub struct KeyComparator<T> {
    cmp: CompareFn<T>,
}

impl<T: 'static> KeyComparator<T> {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        Self { cmp: Box::new(f) }
    }

    pub fn by<K, F>(key: F, direction: SortDirection) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self::from_fn(move |a, b| apply(direction, key(a).cmp(&key(b))))
    }

    /// Absent keys sort before present ones ascending, after them descending.
    pub fn by_optional<K, F>(key: F, direction: SortDirection) -> Self
    where
        K: Ord,
        F: Fn(&T) -> Option<K> + Send + Sync + 'static,
    {
        Self::from_fn(move |a, b| {
            let ord = match (key(a), key(b)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => x.cmp(&y),
            };
            apply(direction, ord)
        })
    }

    /// Floating point keys, ordered with `total_cmp`.
    pub fn by_float<F>(key: F, direction: SortDirection) -> Self
    where
        F: Fn(&T) -> f64 + Send + Sync + 'static,
    {
        Self::from_fn(move |a, b| apply(direction, key(a).total_cmp(&key(b))))
    }

    /// Break ties with `next`.
    pub fn then(self, next: KeyComparator<T>) -> Self {
        let first = self.cmp;
        Self::from_fn(move |a, b| first(a, b).then_with(|| (next.cmp)(a, b)))
    }

    pub fn reversed(self) -> Self {
        let cmp = self.cmp;
        Self::from_fn(move |a, b| cmp(a, b).reverse())
    }

    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.cmp)(a, b)
    }

    pub fn sort(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

fn apply(direction: SortDirection, ord: Ordering) -> Ordering {
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// Field to order search results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchResultSort {
    /// Relevance ranking (score, then year, then title).
    #[default]
    Score,
    Year,
    Title,
}

impl SearchResultSort {
    fn from_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "score" | "rank" => Some(Self::Score),
            "year" => Some(Self::Year),
            "title" | "name" => Some(Self::Title),
            _ => None,
        }
    }

    pub fn comparator(self, direction: SortDirection) -> KeyComparator<MediaSearchResult> {
        match self {
            Self::Score => {
                let cmp = KeyComparator::from_fn(|a: &MediaSearchResult, b: &MediaSearchResult| {
                    a.compare_rank(b)
                });
                match direction {
                    SortDirection::Ascending => cmp,
                    SortDirection::Descending => cmp.reversed(),
                }
            }
            // unknown years (0) are treated as absent
            Self::Year => KeyComparator::by_optional(
                |r: &MediaSearchResult| (r.year > 0).then_some(r.year),
                direction,
            )
            .then(title_key()),
            Self::Title => KeyComparator::by(
                |r: &MediaSearchResult| r.title.to_lowercase(),
                direction,
            ),
        }
    }
}

fn title_key() -> KeyComparator<MediaSearchResult> {
    KeyComparator::by(
        |r: &MediaSearchResult| r.title.to_lowercase(),
        SortDirection::Ascending,
    )
}

impl FromStr for SearchResultSort {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| ParseNameError::new("sort", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: &'static str,
        size: Option<u32>,
        weight: f64,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { name: "b", size: Some(2), weight: 0.5 },
            Row { name: "a", size: None, weight: f64::NAN },
            Row { name: "c", size: Some(1), weight: -1.0 },
        ]
    }

    fn names(rows: &[Row]) -> Vec<&'static str> {
        rows.iter().map(|r| r.name).collect()
    }

    #[test]
    fn optional_keys_first_ascending_last_descending() {
        let mut r = rows();
        KeyComparator::by_optional(|r: &Row| r.size, SortDirection::Ascending).sort(&mut r);
        assert_eq!(names(&r), vec!["a", "c", "b"]);

        KeyComparator::by_optional(|r: &Row| r.size, SortDirection::Descending).sort(&mut r);
        assert_eq!(names(&r), vec!["b", "c", "a"]);
    }

    #[test]
    fn float_keys_are_totally_ordered() {
        let mut r = rows();
        KeyComparator::by_float(|r: &Row| r.weight, SortDirection::Ascending).sort(&mut r);
        // NaN sorts after every number under total_cmp
        assert_eq!(names(&r), vec!["c", "b", "a"]);
    }

    #[test]
    fn then_and_reversed() {
        let mut r = rows();
        r.push(Row { name: "d", size: Some(2), weight: 0.0 });
        let cmp = KeyComparator::by(|r: &Row| r.size, SortDirection::Descending)
            .then(KeyComparator::by(|r: &Row| r.name, SortDirection::Ascending));
        cmp.sort(&mut r);
        assert_eq!(names(&r), vec!["b", "d", "c", "a"]);

        let cmp = cmp.reversed();
        cmp.sort(&mut r);
        assert_eq!(names(&r), vec!["a", "c", "d", "b"]);
    }

    fn result(title: &str, year: i32, score: f32) -> MediaSearchResult {
        let mut r = MediaSearchResult::new("tmdb", crate::entities::MediaType::Movie);
        r.title = title.to_string();
        r.year = year;
        r.score = score;
        r
    }

    #[test]
    fn search_result_sorts() {
        let mut list = vec![
            result("Matrix", 0, 0.5),
            result("Animatrix", 2003, 0.9),
            result("Zion", 1999, 0.7),
        ];
        SearchResultSort::Score
            .comparator(SortDirection::Ascending)
            .sort(&mut list);
        let titles: Vec<_> = list.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Animatrix", "Zion", "Matrix"]);

        SearchResultSort::Year
            .comparator(SortDirection::Ascending)
            .sort(&mut list);
        let titles: Vec<_> = list.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Matrix", "Zion", "Animatrix"]);

        SearchResultSort::Title
            .comparator(SortDirection::Descending)
            .sort(&mut list);
        let titles: Vec<_> = list.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Zion", "Matrix", "Animatrix"]);
    }
}
