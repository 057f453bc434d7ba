use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tracing::warn;

use super::{format_duration, CalendarStep, Trigger};
use crate::error::TriggerError;

/// An interval specification, resolved exactly once at construction time.
///
/// Interval configuration arrives in several textual shapes; this tagged
/// variant canonicalizes them so no trigger ever branches on string shape at
/// firing time:
///
/// - plain decimal seconds: `"30"`, `"2.5"`
/// - unit shorthand: `"500ms"`, `"90s"`, `"15m"`, `"1h30m"` (fixed);
///   `"3d"`, `"2w"`, `"1mo"`, `"1y"` (calendar)
/// - ISO-8601 durations: `"PT90S"`, `"PT1H30M"` (fixed); `"P3D"`, `"P1Y2M"`
///   (calendar)
///
/// A spec mixing calendar units with clock units (`"P1DT6H"`) is rejected:
/// the two interval families obey different arithmetic and cannot be
/// combined into one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalSpec {
  /// An interval expressible purely in (sub-)seconds.
  Fixed(StdDuration),
  /// An interval in calendar units (years/months/days), not reducible to a
  /// fixed second count.
  Calendar(CalendarStep),
}

impl FromStr for IntervalSpec {
  type Err = TriggerError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
      return Err(TriggerError::InvalidInterval(s.to_string()));
    }
    if trimmed.starts_with(['P', 'p']) {
      return parse_iso(trimmed);
    }
    if trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
      let fixed = parse_decimal_seconds(trimmed)?;
      if fixed.is_zero() {
        return Err(TriggerError::ZeroInterval);
      }
      return Ok(IntervalSpec::Fixed(fixed));
    }
    parse_shorthand(trimmed)
  }
}

/// Parses `"12"` / `"2.5"` into a duration, with up to nanosecond precision.
/// Zero is allowed here; callers decide whether zero is acceptable.
fn parse_decimal_seconds(s: &str) -> Result<StdDuration, TriggerError> {
  let err = || TriggerError::InvalidInterval(s.to_string());
  let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
  if whole.is_empty() && frac.is_empty() {
    return Err(err());
  }
  let secs: u64 = if whole.is_empty() {
    0
  } else {
    whole.parse().map_err(|_| err())?
  };
  if frac.len() > 9 || frac.chars().any(|c| !c.is_ascii_digit()) {
    return Err(err());
  }
  let nanos: u32 = if frac.is_empty() {
    0
  } else {
    format!("{:0<9}", frac).parse().map_err(|_| err())?
  };
  Ok(StdDuration::new(secs, nanos))
}

fn checked_component(existing: u32, n: u64, spec: &str) -> Result<u32, TriggerError> {
  let n = u32::try_from(n).map_err(|_| TriggerError::InvalidInterval(spec.to_string()))?;
  existing
    .checked_add(n)
    .ok_or_else(|| TriggerError::InvalidInterval(spec.to_string()))
}

/// Parses unit shorthand such as `"1h30m"` or `"2w"`.
fn parse_shorthand(s: &str) -> Result<IntervalSpec, TriggerError> {
  let err = || TriggerError::InvalidInterval(s.to_string());
  let mut fixed_ms: u64 = 0;
  let mut step = CalendarStep::default();
  let mut saw_fixed = false;
  let mut saw_calendar = false;

  let mut rest = s;
  while !rest.is_empty() {
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(err)?;
    if digits_end == 0 {
      return Err(err());
    }
    let n: u64 = rest[..digits_end].parse().map_err(|_| err())?;
    rest = &rest[digits_end..];
    let unit_end = rest
      .find(|c: char| c.is_ascii_digit())
      .unwrap_or(rest.len());
    let unit = &rest[..unit_end];
    rest = &rest[unit_end..];

    let mut add_fixed = |per_unit_ms: u64| -> Result<(), TriggerError> {
      let ms = n.checked_mul(per_unit_ms).ok_or_else(err)?;
      fixed_ms = fixed_ms.checked_add(ms).ok_or_else(err)?;
      Ok(())
    };
    match unit {
      "ms" => {
        add_fixed(1)?;
        saw_fixed = true;
      }
      "s" => {
        add_fixed(1_000)?;
        saw_fixed = true;
      }
      "m" => {
        add_fixed(60_000)?;
        saw_fixed = true;
      }
      "h" => {
        add_fixed(3_600_000)?;
        saw_fixed = true;
      }
      "d" => {
        step.days = checked_component(step.days, n, s)?;
        saw_calendar = true;
      }
      "w" => {
        step.days = checked_component(step.days, n.checked_mul(7).ok_or_else(err)?, s)?;
        saw_calendar = true;
      }
      "mo" => {
        step.months = checked_component(step.months, n, s)?;
        saw_calendar = true;
      }
      "y" => {
        step.years = checked_component(step.years, n, s)?;
        saw_calendar = true;
      }
      _ => return Err(err()),
    }
  }

  if saw_fixed && saw_calendar {
    return Err(err());
  }
  if saw_calendar {
    if step.is_zero() {
      return Err(TriggerError::ZeroInterval);
    }
    return Ok(IntervalSpec::Calendar(step));
  }
  if saw_fixed {
    if fixed_ms == 0 {
      return Err(TriggerError::ZeroInterval);
    }
    return Ok(IntervalSpec::Fixed(StdDuration::from_millis(fixed_ms)));
  }
  Err(err())
}

/// Parses an ISO-8601 duration (`P3D`, `PT1H30M`, `P1Y2M`).
fn parse_iso(s: &str) -> Result<IntervalSpec, TriggerError> {
  let err = || TriggerError::InvalidInterval(s.to_string());
  let body = &s[1..];
  if body.is_empty() {
    return Err(err());
  }
  let (date_part, time_part) = body.split_once(['T', 't']).unwrap_or((body, ""));
  if !date_part.is_empty() && !time_part.is_empty() {
    // Mixed calendar + clock durations have no single-step semantics here.
    return Err(err());
  }

  let mut step = CalendarStep::default();
  let mut rest = date_part;
  while !rest.is_empty() {
    let digits_end = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(err)?;
    if digits_end == 0 {
      return Err(err());
    }
    let n: u64 = rest[..digits_end].parse().map_err(|_| err())?;
    let designator = rest.as_bytes()[digits_end] as char;
    rest = &rest[digits_end + 1..];
    match designator.to_ascii_uppercase() {
      'Y' => step.years = checked_component(step.years, n, s)?,
      'M' => step.months = checked_component(step.months, n, s)?,
      'W' => step.days = checked_component(step.days, n.checked_mul(7).ok_or_else(err)?, s)?,
      'D' => step.days = checked_component(step.days, n, s)?,
      _ => return Err(err()),
    }
  }

  let mut fixed = StdDuration::ZERO;
  let mut rest = time_part;
  while !rest.is_empty() {
    let num_end = rest
      .find(|c: char| !(c.is_ascii_digit() || c == '.'))
      .ok_or_else(err)?;
    if num_end == 0 {
      return Err(err());
    }
    let num = &rest[..num_end];
    let designator = rest.as_bytes()[num_end] as char;
    rest = &rest[num_end + 1..];
    let component = match designator.to_ascii_uppercase() {
      'H' if !num.contains('.') => {
        let n: u64 = num.parse().map_err(|_| err())?;
        StdDuration::from_secs(n.checked_mul(3_600).ok_or_else(err)?)
      }
      'M' if !num.contains('.') => {
        let n: u64 = num.parse().map_err(|_| err())?;
        StdDuration::from_secs(n.checked_mul(60).ok_or_else(err)?)
      }
      'S' => parse_decimal_seconds(num)?,
      _ => return Err(err()),
    };
    fixed = fixed.checked_add(component).ok_or_else(err)?;
  }

  if !step.is_zero() {
    Ok(IntervalSpec::Calendar(step))
  } else if !fixed.is_zero() {
    Ok(IntervalSpec::Fixed(fixed))
  } else {
    Err(TriggerError::ZeroInterval)
  }
}

/// Fires at exact multiples of a fixed interval counted from an anchor
/// instant.
///
/// The anchor is set-once: either explicitly via [`starting_at`], via the
/// schedule-start notification ([`Trigger::on_start`]), or lazily to the
/// first reference instant the trigger is queried with. Boundary arithmetic
/// is closed-form over integer nanoseconds, so the cadence never accumulates
/// rounding drift no matter how many boundaries elapse.
///
/// [`starting_at`]: IntervalTrigger::starting_at
pub struct IntervalTrigger {
  interval: ChronoDuration,
  interval_ns: i64,
  anchor: OnceLock<DateTime<Utc>>,
  until: Option<DateTime<Utc>>,
}

impl IntervalTrigger {
  /// Creates a trigger firing every `interval`.
  ///
  /// # Errors
  ///
  /// [`TriggerError::ZeroInterval`] for a zero interval,
  /// [`TriggerError::InvalidInterval`] for one too large to represent.
  pub fn new(interval: StdDuration) -> Result<Self, TriggerError> {
    if interval.is_zero() {
      return Err(TriggerError::ZeroInterval);
    }
    let chrono_interval = ChronoDuration::from_std(interval)
      .map_err(|_| TriggerError::InvalidInterval(format!("{:?}", interval)))?;
    let interval_ns = chrono_interval
      .num_nanoseconds()
      .ok_or_else(|| TriggerError::InvalidInterval(format!("{:?}", interval)))?;
    Ok(Self {
      interval: chrono_interval,
      interval_ns,
      anchor: OnceLock::new(),
      until: None,
    })
  }

  /// Creates a trigger from an interval spec string; the spec must resolve
  /// to a fixed interval.
  pub fn from_spec(spec: &str) -> Result<Self, TriggerError> {
    match spec.parse::<IntervalSpec>()? {
      IntervalSpec::Fixed(interval) => Self::new(interval),
      IntervalSpec::Calendar(_) => Err(TriggerError::CalendarRangeRequired(spec.to_string())),
    }
  }

  /// Anchors the boundary grid at `anchor`. Without this, the trigger
  /// anchors itself to the schedule start (or, failing that, to the first
  /// instant it is queried with).
  pub fn starting_at(self, anchor: DateTime<Utc>) -> Self {
    let _ = self.anchor.set(anchor);
    self
  }

  /// Stops firing after `bound`: a computed boundary past it is terminal.
  pub fn until(mut self, bound: DateTime<Utc>) -> Self {
    self.until = Some(bound);
    self
  }

  /// The anchor, if one has been resolved yet.
  pub fn anchor(&self) -> Option<DateTime<Utc>> {
    self.anchor.get().copied()
  }
}

impl Trigger for IntervalTrigger {
  fn next_run(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let anchor = *self.anchor.get_or_init(|| after);
    if let Some(until) = self.until {
      if anchor > until {
        return None;
      }
    }
    let elapsed_ns = match (after - anchor).num_nanoseconds() {
      Some(ns) => ns,
      None => {
        warn!(trigger = %self.describe(), %after, "Elapsed span exceeds representable range; treating trigger as exhausted.");
        return None;
      }
    };
    // First boundary strictly greater than `after`.
    let index = elapsed_ns.div_euclid(self.interval_ns) + 1;
    let offset_ns = match index.checked_mul(self.interval_ns) {
      Some(offset) => offset,
      None => {
        warn!(trigger = %self.describe(), %after, "Boundary offset overflowed; treating trigger as exhausted.");
        return None;
      }
    };
    let next = match anchor.checked_add_signed(ChronoDuration::nanoseconds(offset_ns)) {
      Some(next) => next,
      None => {
        warn!(trigger = %self.describe(), %after, "Boundary instant overflowed; treating trigger as exhausted.");
        return None;
      }
    };
    match self.until {
      Some(until) if next > until => None,
      _ => Some(next),
    }
  }

  fn describe(&self) -> String {
    let mut out = format!("every {}", format_duration(self.interval));
    if let Some(anchor) = self.anchor.get() {
      out.push_str(&format!(" from {}", anchor));
    }
    if let Some(until) = self.until {
      out.push_str(&format!(" until {}", until));
    }
    out
  }

  fn on_start(&self, start: DateTime<Utc>) {
    let _ = self.anchor.set(start);
  }
}

impl std::fmt::Debug for IntervalTrigger {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("IntervalTrigger")
      .field("interval", &self.interval)
      .field("anchor", &self.anchor.get())
      .field("until", &self.until)
      .finish()
  }
}
