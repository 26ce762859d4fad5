//! SQLite-backed persistence

mod database;

pub use database::ScreeningDb;
