//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Users provisioned from verified identities.
    users (id) {
        /// Primary key (BIGSERIAL).
        id -> Int8,
        /// Identity provider subject, unique.
        external_identity -> Varchar,
        email -> Nullable<Varchar>,
        display_name -> Nullable<Varchar>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Counters ("items") owned by a user.
    counters (id) {
        /// Primary key (BIGSERIAL).
        id -> Int8,
        /// Owning user; cascades on delete.
        owner_id -> Int8,
        title -> Varchar,
        /// Current value, constrained to `>= 0`.
        count -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per increment still on record.
    counter_events (id) {
        /// Primary key (BIGSERIAL); later inserts have higher ids.
        id -> Int8,
        /// Owning counter; cascades on delete.
        counter_id -> Int8,
        recorded_at -> Timestamptz,
    }
}

diesel::joinable!(counters -> users (owner_id));
diesel::joinable!(counter_events -> counters (counter_id));

diesel::allow_tables_to_appear_in_same_query!(users, counters, counter_events);
