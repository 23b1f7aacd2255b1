//! Quiet-hours (do-not-disturb) evaluation.
//!
//! A [`QuietHoursWindow`] is a pair of local `HH:mm` boundaries. When `end`
//! is earlier than `start` the window wraps midnight (e.g. `21:00` to `07:00`)
//! and is quiet in the evening portion *or* the early-morning portion.
//! Boundaries are start-inclusive and end-exclusive.

use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Timezone assumed when a user has none configured (or an unknown one).
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Parsed form of [`DEFAULT_TIMEZONE`].
pub const DEFAULT_TZ: Tz = chrono_tz::America::New_York;

/// Boundary format.
const TIME_FORMAT: &str = "%H:%M";

// ---------------------------------------------------------------------------
// QuietHoursWindow
// ---------------------------------------------------------------------------

/// A do-not-disturb window local to some timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHoursWindow {
    pub start: String,
    pub end: String,
}

impl QuietHoursWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Either boundary is blank, which disables suppression.
    pub fn is_empty(&self) -> bool {
        self.start.trim().is_empty() || self.end.trim().is_empty()
    }

    /// Parse both boundaries. `None` if either is not a valid `HH:mm`.
    pub fn bounds(&self) -> Option<(NaiveTime, NaiveTime)> {
        let start = NaiveTime::parse_from_str(self.start.trim(), TIME_FORMAT).ok()?;
        let end = NaiveTime::parse_from_str(self.end.trim(), TIME_FORMAT).ok()?;
        Some((start, end))
    }

    /// Whether the local wall-clock time `local` falls inside the window.
    ///
    /// An unparseable window covers nothing.
    pub fn covers(&self, local: NaiveTime) -> bool {
        let Some((start, end)) = self.bounds() else {
            return false;
        };
        if end >= start {
            start <= local && local < end
        } else {
            // Wraps midnight: evening tail or early-morning head of the same night.
            local >= start || local < end
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Resolve an IANA timezone name, falling back to [`DEFAULT_TZ`].
pub fn resolve_timezone(name: Option<&str>) -> Tz {
    let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) else {
        return DEFAULT_TZ;
    };
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            tracing::warn!(
                timezone = name,
                fallback = DEFAULT_TIMEZONE,
                "Unknown timezone, using default"
            );
            DEFAULT_TZ
        }
    }
}

/// Whether "now" is inside `window` in `timezone`.
pub fn is_quiet_now(window: Option<&QuietHoursWindow>, timezone: Option<&str>) -> bool {
    is_quiet_at(window, timezone, Utc::now())
}

/// Whether the instant `now` is inside `window` when viewed in `timezone`.
///
/// Absent or blank windows never suppress. Malformed boundaries are logged
/// and treated as "not quiet".
pub fn is_quiet_at(
    window: Option<&QuietHoursWindow>,
    timezone: Option<&str>,
    now: DateTime<Utc>,
) -> bool {
    let Some(window) = window.filter(|w| !w.is_empty()) else {
        return false;
    };
    if window.bounds().is_none() {
        tracing::warn!(
            start = %window.start,
            end = %window.end,
            "Malformed quiet-hours window, ignoring"
        );
        return false;
    }
    let tz = resolve_timezone(timezone);
    let local = now.with_timezone(&tz).time();
    window.covers(local)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
