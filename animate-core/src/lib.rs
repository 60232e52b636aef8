//! Animate Core
//!
//! Core types shared by the Express Animate server, client and CLI.
//!
//! This crate contains:
//! - Domain types: the generation `Job` and its status state machine
//! - DTOs: request/response bodies of the HTTP API
//! - Params: defaults and bounds validation for generation parameters

pub mod domain;
pub mod dto;
pub mod params;
