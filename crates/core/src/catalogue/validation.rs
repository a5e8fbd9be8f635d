//! Client-side checks run before any create or update request.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{release_date, GameDraft, GameId, GamePayload, GameRecord};

/// Highest accepted rating.
pub const MAX_RATING: u8 = 100;

/// Reasons a draft is refused locally. `Display` is the user-facing message.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Release date must be a valid date (YYYY-MM-DD).")]
    InvalidReleaseDate,
    #[error("Release date cannot be in the future.")]
    FutureReleaseDate,
    #[error("A game with this title already exists.")]
    DuplicateTitle,
    #[error("Title is required.")]
    MissingTitle,
    #[error("Rating must be a whole number between 0 and 100.")]
    InvalidRating,
}

/// Normalised form used for title comparisons.
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// `true` when `date` lies strictly after `today`.
pub fn is_future(date: NaiveDate, today: NaiveDate) -> bool {
    date > today
}

/// `true` when another cached record already uses `title`.
///
/// `exclude` names the record being edited so it never conflicts with itself.
pub fn is_duplicate_title(title: &str, games: &[GameRecord], exclude: Option<&GameId>) -> bool {
    let needle = title_key(title);
    games
        .iter()
        .filter(|game| Some(&game.id) != exclude)
        .any(|game| title_key(&game.title) == needle)
}

/// Validate `draft` against the cached collection and turn it into a request body.
///
/// The future-date rule runs first so it applies regardless of other fields.
pub fn validate_draft(
    draft: &GameDraft,
    games: &[GameRecord],
    exclude: Option<&GameId>,
    today: NaiveDate,
) -> Result<GamePayload, ValidationError> {
    let release_date =
        release_date::parse(&draft.release_date).ok_or(ValidationError::InvalidReleaseDate)?;
    if is_future(release_date, today) {
        return Err(ValidationError::FutureReleaseDate);
    }
    if is_duplicate_title(&draft.title, games, exclude) {
        return Err(ValidationError::DuplicateTitle);
    }
    if draft.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    let rating = parse_rating(&draft.rating)?;

    Ok(GamePayload {
        title: draft.title.clone(),
        release_date,
        rating,
        genre: draft.genre.clone(),
        platform: draft.platform.clone(),
    })
}

fn parse_rating(raw: &str) -> Result<u8, ValidationError> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|rating| *rating <= MAX_RATING)
        .ok_or(ValidationError::InvalidRating)
}
