//! Data Transfer Objects for the HTTP API
//!
//! Request and response bodies exchanged between the server and its
//! clients. The full job record itself is `domain::job::Job`.

pub mod job;
