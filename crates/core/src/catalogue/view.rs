//! Pure projections of the cached collection for display.

use std::{cmp::Ordering, collections::BTreeSet, fmt};

use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::models::GameRecord;

/// Ordering applied to the visible records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Ascending by title.
    #[default]
    Title,
    /// Highest rating first.
    Rating,
}

impl SortKey {
    /// The other sort key.
    pub fn toggled(self) -> Self {
        match self {
            SortKey::Title => SortKey::Rating,
            SortKey::Rating => SortKey::Title,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Title => f.write_str("title"),
            SortKey::Rating => f.write_str("rating"),
        }
    }
}

/// Search, genre filter and sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
    /// Case-insensitive title substring. Empty disables the filter.
    pub search: String,
    /// Exact genre to keep.
    pub genre: Option<String>,
    /// Final ordering.
    pub sort: SortKey,
}

/// Distinct genres present in `games`, sorted.
pub fn genre_options(games: &[GameRecord]) -> Vec<String> {
    games
        .iter()
        .map(|game| game.genre.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Filter then sort a copy of `games`. The input is left untouched.
pub fn visible_records(games: &[GameRecord], params: &ViewParams) -> Vec<GameRecord> {
    let needle = params.search.to_lowercase();
    let mut visible: Vec<GameRecord> = games
        .iter()
        .filter(|game| needle.is_empty() || game.title.to_lowercase().contains(&needle))
        .filter(|game| {
            params
                .genre
                .as_ref()
                .map_or(true, |genre| &game.genre == genre)
        })
        .cloned()
        .collect();

    match params.sort {
        SortKey::Rating => visible.sort_by(|a, b| b.rating.cmp(&a.rating)),
        SortKey::Title => visible.sort_by(|a, b| compare_titles(&a.title, &b.title)),
    }
    visible
}

/// Title order in the manner of a root-locale collator.
///
/// Base letters decide first, ignoring accents and case. Accents break ties
/// next, then case, then the raw text.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a, true)
        .cmp(&collation_key(b, true))
        .then_with(|| collation_key(a, false).cmp(&collation_key(b, false)))
        .then_with(|| a.cmp(b))
}

fn collation_key(title: &str, strip_marks: bool) -> String {
    title
        .nfd()
        .filter(|ch| !(strip_marks && is_combining_mark(*ch)))
        .flat_map(char::to_lowercase)
        .collect()
}
