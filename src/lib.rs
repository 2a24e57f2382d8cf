//! Till
//!
//! Till is the point-of-sale core of a retail terminal: an in-progress cart with derived totals, the
//! payloads the backend expects for orders and refunds, and a return calculator that turns partial
//! return selections into a refund.

pub mod cart;
pub mod customers;
pub mod ids;
pub mod money;
pub mod orders;
pub mod prelude;
pub mod products;
pub mod receipt;
pub mod refunds;
pub mod resource;
pub mod returns;
