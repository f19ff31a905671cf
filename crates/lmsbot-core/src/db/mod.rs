//! Database layer for the local mirror

mod connection;
mod ledger;
mod repository;
mod schema;

pub use connection::Database;
pub use ledger::{LedgerEntry, NotificationLedger};
pub use repository::{EntityStore, Stored};
pub use schema::{Column, Entity, EntitySchema, SEQUENCE_COLUMN};
