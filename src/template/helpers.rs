//! Identifier and clock sources behind `freshId()` and `nowTimestamp()`.
//!
//! Template evaluation is otherwise pure, so these two are injected: the
//! resolver gets UUIDs and wall-clock time, tests get predictable sequences
//! and can count invocations.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

pub trait IdGenerator: Send + Sync {
    fn fresh_id(&self) -> String;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn fresh_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Produces `{prefix}-1`, `{prefix}-2`, ... and counts calls.
#[derive(Debug)]
pub struct SequenceIdGenerator {
    prefix: String,
    calls: AtomicU64,
}

impl SequenceIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IdGenerator for SequenceIdGenerator {
    fn fresh_id(&self) -> String {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{}-{}", self.prefix, n)
    }
}

/// Deterministic clock: `start + step * n` on the n-th call (0-based).
#[derive(Debug)]
pub struct ManualClock {
    start: DateTime<Utc>,
    step: chrono::Duration,
    calls: AtomicU64,
}

impl ManualClock {
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::stepping(at, chrono::Duration::zero())
    }

    pub fn stepping(start: DateTime<Utc>, step: chrono::Duration) -> Self {
        Self {
            start,
            step,
            calls: AtomicU64::new(0),
        }
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Time of the n-th reading; saturates instead of wrapping.
    fn reading(&self, n: u64) -> DateTime<Utc> {
        let ticks = i32::try_from(n).unwrap_or(i32::MAX);
        self.step
            .checked_mul(ticks)
            .and_then(|offset| self.start.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.reading(n)
    }
}

/// Generator and clock handed to the evaluator.
#[derive(Clone)]
pub struct TemplateHelpers {
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
}

impl TemplateHelpers {
    pub fn new(ids: Arc<dyn IdGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { ids, clock }
    }

    /// UUID v4 identifiers and the system clock.
    pub fn system() -> Self {
        Self::new(Arc::new(UuidGenerator), Arc::new(SystemClock))
    }

    pub fn fresh_id(&self) -> String {
        self.ids.fresh_id()
    }

    /// RFC 3339 UTC with millisecond precision, e.g. `2024-05-01T10:00:00.000Z`.
    pub fn now_timestamp(&self) -> String {
        self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl Default for TemplateHelpers {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for TemplateHelpers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateHelpers").finish_non_exhaustive()
    }
}
