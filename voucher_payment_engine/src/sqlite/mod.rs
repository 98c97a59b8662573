//! SQLite backend for the order store.

pub mod db;
mod sqlite_impl;

pub use sqlite_impl::SqliteOrderStore;
