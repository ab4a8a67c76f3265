use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A required request field was absent or empty.
    MissingField(&'static str),
    RoomNotFound(String),
    InvalidTimestamp(&'static str),
    InvalidOrder,
    PastReservation,
    DurationOutOfBounds { min: Option<i64>, max: Option<i64> },
    /// Overlaps the reservation with this id.
    RoomAlreadyReserved(Ulid),
    NotFound(Ulid),
    RoomNameRequired,
    RoomNameTaken(String),
    LimitExceeded(&'static str),
}

impl EngineError {
    /// Short, stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            EngineError::MissingField(_) => "missing_field",
            EngineError::RoomNotFound(_) => "room_not_found",
            EngineError::InvalidTimestamp(_) => "invalid_timestamp",
            EngineError::InvalidOrder => "invalid_order",
            EngineError::PastReservation => "past_reservation",
            EngineError::DurationOutOfBounds { .. } => "duration_out_of_bounds",
            EngineError::RoomAlreadyReserved(_) => "room_already_reserved",
            EngineError::NotFound(_) => "not_found",
            EngineError::RoomNameRequired => "room_name_required",
            EngineError::RoomNameTaken(_) => "room_name_taken",
            EngineError::LimitExceeded(_) => "limit_exceeded",
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::MissingField(_) => {
                write!(f, "Room ID, startTime, and endTime are required.")
            }
            EngineError::RoomNotFound(_) => write!(f, "Room not found."),
            EngineError::InvalidTimestamp(field) => {
                write!(f, "{field} is not a valid ISO-8601 timestamp.")
            }
            EngineError::InvalidOrder => write!(f, "Start time must be before end time."),
            EngineError::PastReservation => write!(f, "Reservation cannot be in the past."),
            EngineError::DurationOutOfBounds { min, max } => {
                write!(f, "Reservation length must be")?;
                if let Some(min) = min {
                    write!(f, " at least {} minutes", min / 60_000)?;
                }
                if min.is_some() && max.is_some() {
                    write!(f, " and")?;
                }
                if let Some(max) = max {
                    write!(f, " at most {} minutes", max / 60_000)?;
                }
                write!(f, ".")
            }
            EngineError::RoomAlreadyReserved(_) => {
                write!(f, "Room is already reserved for this time.")
            }
            EngineError::NotFound(_) => write!(f, "Reservation not found."),
            EngineError::RoomNameRequired => write!(f, "Room name is required."),
            EngineError::RoomNameTaken(_) => write!(f, "Room name already exists."),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
