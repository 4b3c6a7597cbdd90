//! Error taxonomy shared by every calendar operation.

use thiserror::Error;

/// Coarse classification used by callers that map errors onto user-facing
/// responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    Conflict,
    Invariant,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    // Configuration.
    #[error("calendar must define at least one month name")]
    NoMonths,
    #[error("calendar must define exactly 7 weekday names, got {count}")]
    WeekdayCount { count: usize },
    #[error("season partition does not assign months {months:?} to exactly one season")]
    IncompletePartition { months: Vec<u32> },
    #[error("season mapping references month {month} outside 1..={total_months}")]
    SeasonMonthOutOfRange { month: u32, total_months: u32 },
    #[error("a {total_months}-month calendar requires an explicit season mapping")]
    MissingSeasonMapping { total_months: u32 },
    #[error("no season is configured for month {month}")]
    UnresolvedSeason { month: u32 },
    #[error("invalid weather model: {reason}")]
    WeatherModel { reason: String },
    #[error("malformed calendar config: {reason}")]
    MalformedConfig { reason: String },

    // Validation.
    #[error("repeat interval must be at least 1, got {interval}")]
    RepeatInterval { interval: u32 },
    #[error("repeat end must set year, month and day together")]
    PartialRepeatEnd,
    #[error("repeat type is set on a non-repeatable event")]
    RepeatTypeOnSingleEvent,
    #[error("repeatable event has no repeat type")]
    MissingRepeatType,
    #[error("invalid date {year}-{month}-{day} for a {total_months}-month calendar")]
    InvalidDate {
        year: u32,
        month: u32,
        day: u32,
        total_months: u32,
    },
    #[error("malformed date key {key:?}")]
    MalformedDateKey { key: String },
    #[error("day count must be non-negative, got {days}")]
    NegativeDayCount { days: i64 },
    #[error("day count {days} exceeds the supported maximum")]
    DayCountTooLarge { days: i64 },
    #[error("year must be at least 1, got {year}")]
    InvalidYear { year: i64 },
    #[error("date arithmetic from year {year} leaves the supported year range")]
    YearOverflow { year: u32 },

    // Lookup and concurrency.
    #[error("campaign {id} not found")]
    UnknownCampaign { id: String },
    #[error("event {id} not found")]
    UnknownEvent { id: String },
    #[error("campaign {id} has no calendar state yet")]
    Uninitialized { id: String },
    #[error("campaign {id} is already initialized")]
    AlreadyInitialized { id: String },
    #[error("event {id} already exists")]
    DuplicateEvent { id: String },
    #[error("stale revision: expected {expected}, current {current}")]
    StaleRevision { expected: u64, current: u64 },

    #[error("calendar invariant violated: {detail}")]
    InvariantViolation { detail: String },
}

impl CalendarError {
    pub fn kind(&self) -> ErrorKind {
        use CalendarError::*;
        match self {
            NoMonths
            | WeekdayCount { .. }
            | IncompletePartition { .. }
            | SeasonMonthOutOfRange { .. }
            | MissingSeasonMapping { .. }
            | UnresolvedSeason { .. }
            | WeatherModel { .. }
            | MalformedConfig { .. } => ErrorKind::Configuration,
            RepeatInterval { .. }
            | PartialRepeatEnd
            | RepeatTypeOnSingleEvent
            | MissingRepeatType
            | InvalidDate { .. }
            | MalformedDateKey { .. }
            | NegativeDayCount { .. }
            | DayCountTooLarge { .. }
            | InvalidYear { .. }
            | YearOverflow { .. } => ErrorKind::Validation,
            UnknownCampaign { .. } | UnknownEvent { .. } => ErrorKind::NotFound,
            Uninitialized { .. }
            | AlreadyInitialized { .. }
            | DuplicateEvent { .. }
            | StaleRevision { .. } => ErrorKind::Conflict,
            InvariantViolation { .. } => ErrorKind::Invariant,
        }
    }
}

pub type Result<T> = std::result::Result<T, CalendarError>;
