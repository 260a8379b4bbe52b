//! Data access layer backed by SQLite.

pub mod sqlite;
