//! Core domain types
//!
//! The job record is the only entity. It is owned by the server's job store,
//! mutated by the background worker, and read back by the client and CLI.

pub mod job;
