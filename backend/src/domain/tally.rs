//! Increment/decrement state machine coupling a counter to its event log.
//!
//! [`plan_tally`] is pure: given a locked snapshot of a counter and its most
//! recent event it decides the next count and the single log mutation that
//! keeps both in step. Adapters implementing
//! [`crate::domain::ports::TallyLedger`] load the snapshot, call the planner
//! and write the plan inside one atomic unit.
//!
//! Decrement removes the most recent event so that an increment followed by
//! a decrement leaves no trace. Decrementing at zero is a silent no-op.

use chrono::{DateTime, Utc};

use super::{COUNT_MAX, Counter, CounterEvent, CounterId, EventId, UserId};

/// Direction of a tally request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyStep {
    Increment,
    Decrement,
}

impl TallyStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increment => "increment",
            Self::Decrement => "decrement",
        }
    }
}

/// Counter state read under lock before planning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallySnapshot {
    pub counter: Counter,
    /// Most recent event by `(recorded_at, id)`, if any.
    pub latest_event: Option<CounterEvent>,
}

/// The log mutation accompanying a count change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEffect {
    /// Insert one event stamped `recorded_at`.
    Append { recorded_at: DateTime<Utc> },
    /// Delete this event.
    Remove(EventId),
    /// Decrement with an empty log; count drops, nothing to delete.
    RemoveMissing,
    /// Decrement at zero.
    Unchanged,
}

/// Writes an adapter must perform atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyPlan {
    pub counter_id: CounterId,
    pub next_count: u64,
    pub effect: LogEffect,
}

impl TallyPlan {
    /// Whether the plan changes anything at all.
    pub fn is_noop(&self) -> bool {
        matches!(self.effect, LogEffect::Unchanged)
    }
}

/// Reasons the planner refuses a request. Nothing is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyRejection {
    Forbidden,
    CountOverflow,
}

/// Decide how a counter and its log change for one tally step.
///
/// The appended timestamp is clamped to the latest existing event so a
/// counter's log never goes backwards when the clock does.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use onemore::domain::{
///     Counter, CounterId, CounterTitle, LogEffect, TallySnapshot, TallyStep, UserId, plan_tally,
/// };
///
/// let owner = UserId::new(1);
/// let snapshot = TallySnapshot {
///     counter: Counter {
///         id: CounterId::new(4),
///         title: CounterTitle::new("Coffee").unwrap(),
///         count: 0,
///         owner_id: owner,
///         created_at: Utc::now(),
///     },
///     latest_event: None,
/// };
/// let plan = plan_tally(&snapshot, owner, TallyStep::Decrement, Utc::now()).unwrap();
/// assert_eq!(plan.next_count, 0);
/// assert_eq!(plan.effect, LogEffect::Unchanged);
/// ```
pub fn plan_tally(
    snapshot: &TallySnapshot,
    caller: UserId,
    step: TallyStep,
    now: DateTime<Utc>,
) -> Result<TallyPlan, TallyRejection> {
    let counter = &snapshot.counter;
    if !counter.is_owned_by(caller) {
        return Err(TallyRejection::Forbidden);
    }

    let (next_count, effect) = match step {
        TallyStep::Increment => {
            let next = counter
                .count
                .checked_add(1)
                .filter(|next| *next <= COUNT_MAX)
                .ok_or(TallyRejection::CountOverflow)?;
            let recorded_at = snapshot
                .latest_event
                .as_ref()
                .map_or(now, |latest| latest.recorded_at.max(now));
            (next, LogEffect::Append { recorded_at })
        }
        TallyStep::Decrement => match (counter.count, snapshot.latest_event.as_ref()) {
            (0, _) => (0, LogEffect::Unchanged),
            (count, Some(latest)) => (count - 1, LogEffect::Remove(latest.id)),
            (count, None) => (count - 1, LogEffect::RemoveMissing),
        },
    };

    Ok(TallyPlan {
        counter_id: counter.id,
        next_count,
        effect,
    })
}

/// Input to a ledger: which counter, who asks, which way, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyRequest {
    pub counter_id: CounterId,
    pub caller: UserId,
    pub step: TallyStep,
    pub now: DateTime<Utc>,
}

/// Log mutation that was actually written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedEffect {
    Appended(CounterEvent),
    Removed(CounterEvent),
    RemovedNothing,
    Unchanged,
}

/// Observable result of an applied tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyReceipt {
    pub step: TallyStep,
    pub counter: Counter,
    pub effect: AppliedEffect,
    /// Events left for the counter after the write, read in the same unit.
    pub events_remaining: u64,
}

/// A recoverable mismatch between a counter and its log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// Decrement found no event to remove.
    EmptyLogOnDecrement { count: u64 },
    /// Count and log size disagree after the write.
    CountMismatch { count: u64, events: u64 },
}

impl TallyReceipt {
    /// Report any inconsistency left behind by a manual update.
    pub fn divergence(&self) -> Option<Divergence> {
        if matches!(self.effect, AppliedEffect::RemovedNothing) {
            return Some(Divergence::EmptyLogOnDecrement {
                count: self.counter.count,
            });
        }
        (self.events_remaining != self.counter.count).then_some(Divergence::CountMismatch {
            count: self.counter.count,
            events: self.events_remaining,
        })
    }
}

/// Ledger result for one tally request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TallyOutcome {
    Applied(TallyReceipt),
    Missing,
    Rejected(TallyRejection),
}
