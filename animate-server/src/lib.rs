//! Express Animate server
//!
//! Accepts text prompts, runs video generation against a hosted model in the
//! background and serves job status and the finished videos over HTTP.
//!
//! Layers:
//! - `api`: axum handlers and error mapping
//! - `service`: the job orchestrator (submit, status, artifacts, cancel)
//! - `repository`: job store
//! - `worker`: bounded background execution and retention sweeping
//! - `storage`: generated video directory
//! - `config`: command-line / environment configuration

pub mod api;
pub mod config;
pub mod repository;
pub mod service;
pub mod storage;
pub mod worker;
