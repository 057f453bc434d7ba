use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised while constructing a trigger.
///
/// All trigger configuration is validated up front; a trigger that was built
/// successfully never fails at firing time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
  #[error("interval must be greater than zero")]
  ZeroInterval,
  #[error("unparsable interval spec '{0}'")]
  InvalidInterval(String),
  #[error("calendar step '{0}' needs a date range; build a CalendarTrigger with start and end instants")]
  CalendarRangeRequired(String),
  #[error("invalid cron expression '{expression}': {reason}")]
  InvalidCron { expression: String, reason: String },
  #[error("exclusion window is empty: 'from' ({from}) must precede 'until' ({until})")]
  EmptyWindow {
    from: DateTime<Utc>,
    until: DateTime<Utc>,
  },
  #[error("calendar range end ({end}) precedes start ({start})")]
  EndBeforeStart {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  },
}

/// Errors raised while resolving a `schedule://` DSN into a transport.
///
/// Resolution failures always name the offending value so misconfiguration
/// is diagnosable from the error alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
  #[error("malformed schedule DSN '{0}' (expected schedule://<name>[?cache=<name>&lock=<name>])")]
  InvalidDsn(String),
  #[error("unknown schedule '{0}'")]
  UnknownSchedule(String),
  #[error("unknown option '{0}' in schedule DSN")]
  UnknownOption(String),
  #[error("unknown cursor cache '{0}'")]
  UnknownCache(String),
  #[error("unknown lock backend '{0}'")]
  UnknownLock(String),
  #[error("durable schedules need both the 'cache' and 'lock' options")]
  IncompleteDurableOptions,
}

/// Errors returned by the pull-queue surface of a schedule transport.
///
/// A schedule transport is generative: messages come out of trigger
/// arithmetic, nothing is ever physically enqueued. `reject` and `send` are
/// therefore caller bugs, not recoverable conditions, and are never retried
/// internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
  #[error("schedule transports generate their messages; rejecting one is a caller bug")]
  RejectNotSupported,
  #[error("schedule transports generate their messages; sending to one is a caller bug")]
  SendNotSupported,
}
