//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and are
//! never exposed to the domain. Conversions into domain types re-validate
//! stored values.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::{
    Counter, CounterEvent, CounterId, CounterPatch, CounterTitle, EventId, ExternalIdentity,
    NewUser, User, UserId,
};

use super::schema::{counter_events, counters, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub external_identity: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_domain(self) -> Result<User, String> {
        let external_identity =
            ExternalIdentity::new(self.external_identity).map_err(|err| err.to_string())?;
        Ok(User::new(
            UserId::new(self.id),
            NewUser::new(external_identity, self.email, self.display_name),
            self.created_at,
        ))
    }
}

/// Insertable struct for provisioning users.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub external_identity: &'a str,
    pub email: Option<&'a str>,
    pub display_name: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the counters table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = counters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CounterRow {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub count: i64,
    pub created_at: DateTime<Utc>,
}

impl CounterRow {
    pub(crate) fn into_domain(self) -> Result<Counter, String> {
        let title = CounterTitle::new(&self.title).map_err(|err| err.to_string())?;
        let count = u64::try_from(self.count)
            .map_err(|_| format!("counter {} has negative count {}", self.id, self.count))?;
        Ok(Counter {
            id: CounterId::new(self.id),
            title,
            count,
            owner_id: UserId::new(self.owner_id),
            created_at: self.created_at,
        })
    }
}

/// Insertable struct for creating counters.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = counters)]
pub(crate) struct NewCounterRow<'a> {
    pub owner_id: i64,
    pub title: &'a str,
    pub count: i64,
    pub created_at: DateTime<Utc>,
}

/// Changeset for the manual update path. `None` fields are skipped.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = counters)]
pub(crate) struct CounterChangeset<'a> {
    pub title: Option<&'a str>,
    pub count: Option<i64>,
}

impl<'a> CounterChangeset<'a> {
    pub(crate) fn from_patch(patch: &'a CounterPatch) -> Result<Self, String> {
        let count = patch
            .count
            .map(|count| i64::try_from(count).map_err(|_| format!("count {count} out of range")))
            .transpose()?;
        Ok(Self {
            title: patch.title.as_ref().map(AsRef::as_ref),
            count,
        })
    }
}

/// Row struct for reading from the counter_events table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = counter_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CounterEventRow {
    pub id: i64,
    pub counter_id: i64,
    pub recorded_at: DateTime<Utc>,
}

impl From<CounterEventRow> for CounterEvent {
    fn from(row: CounterEventRow) -> Self {
        Self {
            id: EventId::new(row.id),
            counter_id: CounterId::new(row.counter_id),
            recorded_at: row.recorded_at,
        }
    }
}

/// Insertable struct for appending events.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = counter_events)]
pub(crate) struct NewCounterEventRow {
    pub counter_id: i64,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn row(count: i64, title: &str) -> CounterRow {
        CounterRow {
            id: 3,
            owner_id: 1,
            title: title.to_owned(),
            count,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn counter_row_converts_to_domain() {
        let counter = row(4, "Coffee").into_domain().expect("valid row");
        assert_eq!(counter.count, 4);
        assert_eq!(counter.title.as_ref(), "Coffee");
        assert_eq!(counter.owner_id, UserId::new(1));
    }

    #[rstest]
    #[case(-1, "Coffee")]
    #[case(0, "   ")]
    fn corrupt_counter_rows_are_rejected(#[case] count: i64, #[case] title: &str) {
        assert!(row(count, title).into_domain().is_err());
    }

    #[rstest]
    fn changeset_skips_absent_fields() {
        let patch = CounterPatch::try_new(Some("Tea"), None).expect("valid patch");
        let changeset = CounterChangeset::from_patch(&patch).expect("in range");
        assert_eq!(changeset.title, Some("Tea"));
        assert_eq!(changeset.count, None);
    }
}
