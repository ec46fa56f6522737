//! Money and date arithmetic over student records.
//!
//! Everything in here is pure: it takes records that were already fetched and
//! a "today" supplied by the caller, and never touches the database.

pub mod alerts;
pub mod balance;
pub mod dormitory;
pub mod fleet;
pub mod registration;
pub mod search;
