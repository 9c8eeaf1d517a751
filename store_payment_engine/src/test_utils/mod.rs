//! Helpers for tests that run against a throwaway SQLite database.
pub mod fixtures;
pub mod prepare_env;
