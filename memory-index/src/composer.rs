//! Canonical text for an event.
//!
//! The text is the event summary followed by the content of every linked
//! domain record, in a fixed order, and a date clause. Lookups run
//! concurrently but parts are assembled in declaration order, so the same
//! data always yields the same text.

use chrono::{DateTime, NaiveDate};
use tokio::try_join;
use tracing::debug;

use lifelog_embeddings::{MAX_INPUT_CHARS, truncate_chars};

use crate::error::Result;
use crate::store::EventStore;
use crate::types::{CalendarItem, HealthEntry, Mood, Photo, Place, Video};

/// Maximum length of a composed text, in characters.
pub const MAX_TEXT_CHARS: usize = MAX_INPUT_CHARS;

const PART_SEPARATOR: &str = ". ";

/// Compose the embedding text for `event_id`.
///
/// Returns an empty string when the event does not exist or has nothing
/// to say. A date on its own does not count as content.
pub async fn compose_event_text(store: &dyn EventStore, event_id: &str) -> Result<String> {
    let Some(event) = store.get_event(event_id).await? else {
        debug!("No event {event_id} to compose");
        return Ok(String::new());
    };

    let (note, voice_memo, calendar, place, mood, health, photo, video) = try_join!(
        store.note_by_event(event_id),
        store.voice_memo_by_event(event_id),
        store.calendar_event_by_event(event_id),
        store.location_by_event(event_id),
        store.mood_by_event(event_id),
        store.health_entry_by_event(event_id),
        store.photo_by_event(event_id),
        store.video_by_event(event_id),
    )?;

    let mut parts = Parts::default();
    parts.push(&event.summary);

    if let Some(note) = note {
        parts.push(&note.content);
    }
    if let Some(transcript) = voice_memo.and_then(|memo| memo.transcript) {
        parts.push(&transcript);
    }
    if let Some(calendar) = calendar {
        push_calendar(&mut parts, &calendar);
    }
    if let Some(place) = place {
        push_place(&mut parts, &place);
    }
    if let Some(mood) = mood {
        parts.push(&mood_text(&mood));
    }
    if let Some(health) = health {
        parts.push(&health_text(&health));
    }
    if let Some(photo) = photo {
        push_photo(&mut parts, &photo);
    }
    if let Some(video) = video {
        push_video(&mut parts, &video);
    }

    if parts.is_empty() {
        return Ok(String::new());
    }
    if let Some(clause) = temporal_clause(&event.timestamp) {
        parts.push(&clause);
    }

    let text = parts.join();
    Ok(truncate_chars(&text, MAX_TEXT_CHARS).to_string())
}

/// Non-empty, trimmed text parts in insertion order.
#[derive(Default)]
struct Parts(Vec<String>);

impl Parts {
    fn push(&mut self, part: &str) {
        let part = part.trim();
        if !part.is_empty() {
            self.0.push(part.to_string());
        }
    }

    fn push_opt(&mut self, part: Option<&str>) {
        if let Some(part) = part {
            self.push(part);
        }
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn join(&self) -> String {
        self.0.join(PART_SEPARATOR)
    }
}

fn push_calendar(parts: &mut Parts, calendar: &CalendarItem) {
    parts.push(&calendar.title);
    parts.push_opt(calendar.description.as_deref());
    if let Some(location) = non_blank(calendar.location.as_deref()) {
        parts.push(&format!("Location: {location}"));
    }
}

fn push_place(parts: &mut Parts, place: &Place) {
    let label = non_blank(place.address.as_deref()).or(non_blank(place.name.as_deref()));
    if let Some(label) = label {
        parts.push(&format!("Location: {label}"));
    }
}

fn mood_text(mood: &Mood) -> String {
    match non_blank(mood.note.as_deref()) {
        Some(note) => format!("Mood: {}/5 - {note}", mood.score),
        None => format!("Mood: {}/5", mood.score),
    }
}

fn health_text(health: &HealthEntry) -> String {
    match non_blank(health.unit.as_deref()) {
        Some(unit) => format!("{}: {} {unit}", health.metric.trim(), health.value),
        None => format!("{}: {}", health.metric.trim(), health.value),
    }
}

/// Analysis first; the manual caption only when analysis has nothing.
fn push_photo(parts: &mut Parts, photo: &Photo) {
    let before = parts.0.len();

    if let Some(analysis) = &photo.analysis {
        parts.push_opt(analysis.description.as_deref());
        if let Some(tags) = analysis.tags.value() {
            let tags: Vec<&str> = tags
                .iter()
                .map(|tag| tag.trim())
                .filter(|tag| !tag.is_empty())
                .collect();
            if !tags.is_empty() {
                parts.push(&format!("Tags: {}", tags.join(", ")));
            }
        }
        if let Some(text) = non_blank(analysis.detected_text.as_deref()) {
            parts.push(&format!("Text: {text}"));
        }
    }

    if parts.0.len() == before {
        parts.push_opt(photo.caption.as_deref());
    }
}

fn push_video(parts: &mut Parts, video: &Video) {
    let summary = non_blank(video.summary.as_deref());
    let duration = video
        .duration_secs
        .filter(|secs| secs.is_finite() && *secs > 0.0)
        .map(|secs| secs.round() as u64);

    match (summary, duration) {
        (Some(summary), Some(secs)) => parts.push(&format!("Video ({secs}s): {summary}")),
        (Some(summary), None) => parts.push(&format!("Video: {summary}")),
        (None, Some(secs)) => parts.push(&format!("Video ({secs}s)")),
        (None, None) => {}
    }
}

/// `on <weekday> <YYYY-MM-DD>`, or `on <date>` when the weekday cannot be
/// derived.
fn temporal_clause(timestamp: &str) -> Option<String> {
    let timestamp = timestamp.trim();
    if timestamp.is_empty() {
        return None;
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(timestamp) {
        let date = datetime.date_naive();
        return Some(format!("on {}", date.format("%A %Y-%m-%d")));
    }

    let date_part = timestamp.get(..10).unwrap_or(timestamp);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(format!("on {}", date.format("%A %Y-%m-%d"))),
        Err(_) => Some(format!("on {date_part}")),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
