//! Core types, rules and trait definitions for the fitlog daily-metrics
//! logger.
//!
//! This crate is deliberately free of HTTP and filesystem dependencies.
//! Storage backends implement [`store::EntryStore`]; the API layer only talks
//! to that trait and to [`validate::validate`], which is the single place an
//! untyped request body becomes a typed [`entry::NewEntry`].

pub mod entry;
pub mod error;
pub mod metric;
pub mod score;
pub mod store;
pub mod validate;

pub use error::{Error, PersistenceError, Result};
