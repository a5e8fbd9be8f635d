//! Shared domain models.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Server-assigned record identifier.
///
/// The backend may hand out numeric or textual ids; the wire form is kept
/// so per-record URLs round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GameId {
    /// Numeric identifier (e.g. an auto-increment key).
    Number(i64),
    /// Textual identifier (e.g. a UUID or document key).
    Text(String),
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameId::Number(value) => write!(f, "{value}"),
            GameId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for GameId {
    fn from(value: i64) -> Self {
        GameId::Number(value)
    }
}

impl From<&str> for GameId {
    fn from(value: &str) -> Self {
        GameId::Text(value.to_string())
    }
}

/// A single catalogue entry as returned by `GET /games`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    /// Server-assigned identifier.
    pub id: GameId,
    /// Display title.
    pub title: String,
    /// Calendar release date.
    #[serde(with = "release_date")]
    pub release_date: NaiveDate,
    /// Score between 0 and 100.
    #[serde(deserialize_with = "lenient::rating")]
    pub rating: u8,
    /// Free-text genre.
    #[serde(default, deserialize_with = "lenient::text")]
    pub genre: String,
    /// Free-text platform.
    #[serde(default, deserialize_with = "lenient::text")]
    pub platform: String,
}

/// Editable form state for creating or updating a record.
///
/// Every field is kept as typed; coercion happens during validation.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameDraft {
    pub title: String,
    pub release_date: String,
    pub rating: String,
    pub genre: String,
    pub platform: String,
}

impl From<&GameRecord> for GameDraft {
    fn from(record: &GameRecord) -> Self {
        Self {
            title: record.title.clone(),
            release_date: record.release_date.format(release_date::FORMAT).to_string(),
            rating: record.rating.to_string(),
            genre: record.genre.clone(),
            platform: record.platform.clone(),
        }
    }
}

/// Validated request body for `POST /games` and `PUT /games/{id}`.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GamePayload {
    pub title: String,
    #[serde(with = "release_date")]
    pub release_date: NaiveDate,
    pub rating: u8,
    pub genre: String,
    pub platform: String,
}

/// `YYYY-MM-DD` on the wire. Timestamps are accepted on read and truncated to their date.
pub(crate) mod release_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub(crate) const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid release date {raw:?}")))
    }

    pub(crate) fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        if let Ok(date) = NaiveDate::parse_from_str(raw, FORMAT) {
            return Some(date);
        }
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|timestamp| timestamp.date_naive())
    }
}

/// Tolerant readers for fields other clients may have written loosely.
mod lenient {
    use serde::{de::Error, Deserialize, Deserializer};

    /// Any whole number in `0..=100`, including float spellings like `87.0`.
    pub fn rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        if raw.fract() != 0.0 || !(0.0..=100.0).contains(&raw) {
            return Err(D::Error::custom(format!("invalid rating {raw}")));
        }
        Ok(raw as u8)
    }

    /// `null` reads as empty text.
    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_numeric_and_textual_ids() -> serde_json::Result<()> {
        let records: Vec<GameRecord> = serde_json::from_value(json!([
            {"id": 7, "title": "Halo", "releaseDate": "2001-11-15", "rating": 92, "genre": "FPS", "platform": "Xbox"},
            {"id": "abc", "title": "Myst", "releaseDate": "1993-09-24T00:00:00.000Z", "rating": 80, "genre": "Adventure", "platform": "Mac"}
        ]))?;

        assert_eq!(records[0].id, GameId::from(7));
        assert_eq!(records[0].id.to_string(), "7");
        assert_eq!(records[1].id, GameId::Text("abc".to_string()));
        assert_eq!(
            records[1].release_date,
            NaiveDate::from_ymd_opt(1993, 9, 24).unwrap()
        );
        Ok(())
    }

    #[test]
    fn rejects_unparseable_release_date() {
        let result = serde_json::from_value::<GameRecord>(json!({
            "id": 1, "title": "X", "releaseDate": "soon", "rating": 1, "genre": "", "platform": ""
        }));
        assert!(result.is_err());
    }

    #[test]
    fn tolerates_loose_rating_and_missing_text() -> serde_json::Result<()> {
        let record: GameRecord = serde_json::from_value(json!({
            "id": 4, "title": "Tetris", "releaseDate": "1984-06-06", "rating": 87.0, "genre": null
        }))?;
        assert_eq!(record.rating, 87);
        assert_eq!(record.genre, "");
        assert_eq!(record.platform, "");

        for rating in [json!(87.5), json!(101), json!(-1), json!("87")] {
            let result = serde_json::from_value::<GameRecord>(json!({
                "id": 4, "title": "Tetris", "releaseDate": "1984-06-06", "rating": rating
            }));
            assert!(result.is_err(), "accepted rating {rating}");
        }
        Ok(())
    }

    #[test]
    fn payload_uses_wire_field_names() -> serde_json::Result<()> {
        let payload = GamePayload {
            title: "Halo".to_string(),
            release_date: NaiveDate::from_ymd_opt(2001, 11, 15).unwrap(),
            rating: 92,
            genre: "FPS".to_string(),
            platform: "Xbox".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&payload)?,
            json!({"title": "Halo", "releaseDate": "2001-11-15", "rating": 92, "genre": "FPS", "platform": "Xbox"})
        );
        Ok(())
    }

    #[test]
    fn draft_copies_record_fields() {
        let record = GameRecord {
            id: GameId::Number(3),
            title: "Doom".to_string(),
            release_date: NaiveDate::from_ymd_opt(1993, 12, 10).unwrap(),
            rating: 95,
            genre: "FPS".to_string(),
            platform: "PC".to_string(),
        };
        let draft = GameDraft::from(&record);
        assert_eq!(draft.release_date, "1993-12-10");
        assert_eq!(draft.rating, "95");
        assert_eq!(draft.platform, "PC");
    }
}
