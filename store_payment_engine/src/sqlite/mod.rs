//! SQLite backend for the store payment engine.
//!
//! [`SqliteDatabase`] implements every backend trait. The free functions in [`db`] hold the individual queries.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
