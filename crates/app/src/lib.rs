//! Till register application: backend client, sales terminal, refund desk and cart persistence.

pub mod api;
pub mod config;
pub mod context;
pub mod observability;
pub mod refund_desk;
pub mod session;
pub mod terminal;
