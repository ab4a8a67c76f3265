use ulid::Ulid;

use crate::model::*;

use super::EngineError;

pub(crate) fn now_ms() -> Ms {
    chrono::Utc::now().timestamp_millis()
}

/// Answers whether a room id is known. The validator only ever asks this.
pub trait RoomDirectory {
    fn room_exists(&self, id: &Ulid) -> bool;
}

/// Optional bounds on reservation length. Both bounds are off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurationPolicy {
    pub min: Option<Ms>,
    pub max: Option<Ms>,
}

impl DurationPolicy {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(min: Option<Ms>, max: Option<Ms>) -> Self {
        Self { min, max }
    }

    pub fn is_enabled(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn check(&self, span: &Span) -> Result<(), EngineError> {
        let len = span.duration_ms();
        let too_short = self.min.is_some_and(|min| len < min);
        let too_long = self.max.is_some_and(|max| len > max);
        if too_short || too_long {
            return Err(EngineError::DurationOutOfBounds {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// A request that passed every rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validated {
    pub room_id: Ulid,
    pub span: Span,
}

/// Decide whether `request` may be booked. Rules run in a fixed order and
/// the first failure is returned:
///
/// 1. room id, start and end are present
/// 2. the room exists
/// 3. both instants parse
/// 4. start is strictly before end
/// 5. start is not before `now`
/// 6. the duration policy (when enabled) holds
/// 7. no reservation of the same room overlaps `[start, end)`
///
/// `existing` may hold reservations of other rooms; they are skipped.
pub fn validate<'a, D, I>(
    request: &ReservationRequest,
    directory: &D,
    existing: I,
    now: Ms,
    policy: &DurationPolicy,
) -> Result<Validated, EngineError>
where
    D: RoomDirectory + ?Sized,
    I: IntoIterator<Item = &'a Reservation>,
{
    let room_raw = required(&request.room_id, "roomId")?;
    let start_raw = required(&request.start_time, "startTime")?;
    let end_raw = required(&request.end_time, "endTime")?;

    let room_id = Ulid::from_string(room_raw.trim())
        .ok()
        .filter(|id| directory.room_exists(id))
        .ok_or_else(|| EngineError::RoomNotFound(room_raw.to_string()))?;

    let start = parse_instant(start_raw).ok_or(EngineError::InvalidTimestamp("startTime"))?;
    let end = parse_instant(end_raw).ok_or(EngineError::InvalidTimestamp("endTime"))?;

    if start >= end {
        return Err(EngineError::InvalidOrder);
    }
    if start < now {
        return Err(EngineError::PastReservation);
    }

    let span = Span::new(start, end);
    policy.check(&span)?;
    check_no_conflict(room_id, &span, existing)?;

    Ok(Validated { room_id, span })
}

/// Linear scan for the first reservation of `room_id` overlapping `span`.
pub(crate) fn check_no_conflict<'a, I>(room_id: Ulid, span: &Span, existing: I) -> Result<(), EngineError>
where
    I: IntoIterator<Item = &'a Reservation>,
{
    match existing
        .into_iter()
        .filter(|r| r.room_id == room_id)
        .find(|r| r.span.overlaps(span))
    {
        Some(r) => Err(EngineError::RoomAlreadyReserved(r.id)),
        None => Ok(()),
    }
}

/// Absent or empty is missing. Whitespace is present and fails later rules.
fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, EngineError> {
    field
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(EngineError::MissingField(name))
}
