//! Chatform - Conversational form filling
//!
//! A form author declares a schema of typed fields. An LLM-driven interviewer
//! asks one question at a time until every field is answered, then a second,
//! deterministic pass turns the transcript into a JSON object keyed by the
//! schema's labels.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
