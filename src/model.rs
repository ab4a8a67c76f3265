use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds. Every instant in the service uses this.
pub type Ms = i64;

pub const MINUTE_MS: Ms = 60_000;
pub const HOUR_MS: Ms = 60 * MINUTE_MS;
pub const DAY_MS: Ms = 24 * HOUR_MS;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Strict overlap: spans that only touch at a boundary do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A booked time slot on a room. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: Ulid,
    pub room_id: Ulid,
    pub span: Span,
}

/// All reservations of one room, in the order they were made.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: Ulid,
    /// Creation order across all rooms.
    pub seq: u64,
    pub name: String,
    pub reservations: Vec<Reservation>,
}

impl RoomState {
    pub fn new(id: Ulid, seq: u64, name: String) -> Self {
        Self {
            id,
            seq,
            name,
            reservations: Vec::new(),
        }
    }

    pub fn insert_reservation(&mut self, reservation: Reservation) {
        self.reservations.push(reservation);
    }

    /// Remove reservation by id, keeping the order of the rest.
    pub fn remove_reservation(&mut self, id: Ulid) -> Option<Reservation> {
        let pos = self.reservations.iter().position(|r| r.id == id)?;
        Some(self.reservations.remove(pos))
    }
}

/// Raw create-reservation input. Every field may be absent; the validator
/// decides what that means.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl ReservationRequest {
    pub fn new(room_id: impl Into<String>, start_time: impl Into<String>, end_time: impl Into<String>) -> Self {
        Self {
            room_id: Some(room_id.into()),
            start_time: Some(start_time.into()),
            end_time: Some(end_time.into()),
        }
    }

    /// Convenience for callers that already hold instants.
    pub fn from_span(room_id: Ulid, start: Ms, end: Ms) -> Self {
        Self::new(room_id.to_string(), format_instant(start), format_instant(end))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationInfo {
    pub id: Ulid,
    pub room_id: Ulid,
    pub start_time: String,
    pub end_time: String,
}

impl From<&Reservation> for ReservationInfo {
    fn from(r: &Reservation) -> Self {
        Self {
            id: r.id,
            room_id: r.room_id,
            start_time: format_instant(r.span.start),
            end_time: format_instant(r.span.end),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomInfo {
    pub id: Ulid,
    pub name: String,
}

/// Parse an ISO-8601 instant. Accepts RFC 3339 with any offset, and naive
/// date-times or bare dates which are taken as UTC.
pub fn parse_instant(raw: &str) -> Option<Ms> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(naive) = raw.parse::<NaiveDateTime>() {
        return Some(naive.and_utc().timestamp_millis());
    }
    raw.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Render as RFC 3339 UTC with millisecond precision, e.g. `2026-10-17T09:00:00.000Z`.
pub fn format_instant(ms: Ms) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map_or_else(|| ms.to_string(), |dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}
