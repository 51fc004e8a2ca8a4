//! Counters ("items") owned by a single user.

use std::fmt;

use chrono::{DateTime, Utc};

use super::UserId;

/// Maximum length of a counter title, in characters.
pub const COUNTER_TITLE_MAX: usize = 100;

/// Validation errors for counter input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterValidationError {
    EmptyTitle,
    TitleTooLong { max: usize },
    CountOutOfRange { max: u64 },
}

impl fmt::Display for CounterValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::TitleTooLong { max } => write!(f, "title must be at most {max} characters"),
            Self::CountOutOfRange { max } => write!(f, "count must be at most {max}"),
        }
    }
}

impl std::error::Error for CounterValidationError {}

/// Largest count representable by the store.
pub const COUNT_MAX: u64 = i64::MAX as u64;

/// Stable counter identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CounterId(i64);

impl CounterId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human readable counter title.
///
/// # Examples
/// ```
/// use onemore::domain::CounterTitle;
///
/// let title = CounterTitle::new("  Coffee ").expect("valid title");
/// assert_eq!(title.as_ref(), "Coffee");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterTitle(String);

impl CounterTitle {
    pub fn new(value: impl AsRef<str>) -> Result<Self, CounterValidationError> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CounterValidationError::EmptyTitle);
        }
        if trimmed.chars().count() > COUNTER_TITLE_MAX {
            return Err(CounterValidationError::TitleTooLong {
                max: COUNTER_TITLE_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for CounterTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for CounterTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<CounterTitle> for String {
    fn from(value: CounterTitle) -> Self {
        value.0
    }
}

/// A named, owned, non-negative tally.
///
/// ## Invariants
/// - `count` never drops below zero and never exceeds [`COUNT_MAX`].
/// - Unless a manual update has bypassed it, `count` equals the number of
///   events logged for this counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter {
    pub id: CounterId,
    pub title: CounterTitle,
    pub count: u64,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Counter {
    /// Whether `user` owns this counter.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

/// Partial update applied by the manual update escape hatch.
///
/// Absent fields are left untouched. Changing `count` here does not touch
/// the event log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterPatch {
    pub title: Option<CounterTitle>,
    pub count: Option<u64>,
}

impl CounterPatch {
    /// Validate raw patch values.
    pub fn try_new(
        title: Option<&str>,
        count: Option<u64>,
    ) -> Result<Self, CounterValidationError> {
        let title = title.map(CounterTitle::new).transpose()?;
        if count.is_some_and(|value| value > COUNT_MAX) {
            return Err(CounterValidationError::CountOutOfRange { max: COUNT_MAX });
        }
        Ok(Self { title, count })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.count.is_none()
    }

    /// Apply the patch to a counter, returning the patched copy.
    #[must_use]
    pub fn apply_to(&self, counter: &Counter) -> Counter {
        Counter {
            title: self.title.clone().unwrap_or_else(|| counter.title.clone()),
            count: self.count.unwrap_or(counter.count),
            ..counter.clone()
        }
    }
}
