//! SQLite storage backend for the commerce payment engine.

mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
