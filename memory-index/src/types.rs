//! Events, the domain records linked to them, and persisted embeddings.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use lifelog_embeddings::Embedding;

/// Identifier of an [`Event`].
pub type EventId = String;

/// The closed set of event variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Transaction,
    Note,
    VoiceMemo,
    Calendar,
    Location,
    Mood,
    Health,
    Photo,
    Video,
    Other,
}

/// A canonical life-record. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier.
    pub id: EventId,

    /// Which variant of life-event this is.
    pub kind: EventKind,

    /// When the event happened, as stored (normally RFC 3339).
    pub timestamp: String,

    /// Short human-readable summary.
    pub summary: String,
}

impl Event {
    /// Create a new event.
    pub fn new(
        id: impl Into<EventId>,
        kind: EventKind,
        timestamp: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            timestamp: timestamp.into(),
            summary: summary.into(),
        }
    }
}

/// A JSON payload stored as text that may be missing or malformed.
///
/// Only [`Parsed::Value`] carries usable data; the other variants record
/// why there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// No payload was stored.
    Absent,
    /// A payload was stored but did not parse; the raw text is kept.
    Unparsable(String),
    /// The parsed payload.
    Value(T),
}

impl<T> Parsed<T> {
    /// The parsed value, if there is one.
    pub fn value(&self) -> Option<&T> {
        match self {
            Parsed::Value(value) => Some(value),
            Parsed::Absent | Parsed::Unparsable(_) => None,
        }
    }
}

impl<T: DeserializeOwned> Parsed<T> {
    /// Parse a raw JSON column.
    pub fn from_json(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Parsed::Absent,
            Some(raw) => match serde_json::from_str(raw) {
                Ok(value) => Parsed::Value(value),
                Err(_) => Parsed::Unparsable(raw.to_string()),
            },
        }
    }
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Parsed::Absent
    }
}

// Persisted as the raw JSON text column it came from.
impl<T: Serialize> Serialize for Parsed<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Parsed::Absent => serializer.serialize_none(),
            Parsed::Unparsable(raw) => serializer.serialize_some(raw),
            Parsed::Value(value) => {
                let raw = serde_json::to_string(value).map_err(serde::ser::Error::custom)?;
                serializer.serialize_some(&raw)
            }
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Parsed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Parsed::from_json(raw.as_deref()))
    }
}

/// Free-form note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub content: String,
}

/// Recorded voice memo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VoiceMemo {
    /// Transcript, once transcription has finished.
    pub transcript: Option<String>,
}

/// Calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarItem {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// A visited place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub address: Option<String>,
    pub name: Option<String>,
}

/// Mood check-in. `score` is on a 1-5 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mood {
    pub score: u8,
    pub note: Option<String>,
}

/// A single health metric reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthEntry {
    pub metric: String,
    pub value: f64,
    pub unit: Option<String>,
}

/// A photo with its optional AI analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    /// Caption entered by the user.
    pub caption: Option<String>,

    /// Vision analysis, if one has been run.
    pub analysis: Option<PhotoAnalysis>,
}

/// Output of the vision analysis of a photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoAnalysis {
    pub description: Option<String>,

    /// Visual tags, stored as a JSON array.
    #[serde(default)]
    pub tags: Parsed<Vec<String>>,

    /// Text recognised in the image.
    pub detected_text: Option<String>,
}

/// A video with its summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub summary: Option<String>,
    pub duration_secs: Option<f64>,
}

/// Any domain record, tagged by the event kind it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainRecord {
    Note(Note),
    VoiceMemo(VoiceMemo),
    Calendar(CalendarItem),
    Location(Place),
    Mood(Mood),
    Health(HealthEntry),
    Photo(Photo),
    Video(Video),
}

impl DomainRecord {
    /// The only event kind this record may be attached to.
    pub fn kind(&self) -> EventKind {
        match self {
            DomainRecord::Note(_) => EventKind::Note,
            DomainRecord::VoiceMemo(_) => EventKind::VoiceMemo,
            DomainRecord::Calendar(_) => EventKind::Calendar,
            DomainRecord::Location(_) => EventKind::Location,
            DomainRecord::Mood(_) => EventKind::Mood,
            DomainRecord::Health(_) => EventKind::Health,
            DomainRecord::Photo(_) => EventKind::Photo,
            DomainRecord::Video(_) => EventKind::Video,
        }
    }
}

/// A persisted embedding row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEmbedding {
    pub event_id: EventId,
    pub vector: Embedding,
    /// Model that generated `vector`.
    pub model: String,
}
