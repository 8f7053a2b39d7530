//! Daily puzzle trainer: storage, corpus store, rating engine, attempt
//! ledger, and the puzzle session state machine.

pub mod config;
pub mod corpus;
pub mod error;
pub mod ledger;
pub mod rating;
pub mod retry;
pub mod rules;
pub mod session;
pub mod settings;
pub mod stats;
pub mod storage;
