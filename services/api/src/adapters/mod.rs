//! services/api/src/adapters/mod.rs
//!
//! Concrete implementations of the core's service ports: the PostgreSQL
//! data store and the OpenAI-backed generation adapters.

pub mod content_llm;
pub mod db;
pub mod plan_llm;
