//! Question board: domain types and the persistent store.

pub mod question;
pub mod store;
