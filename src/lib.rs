//! ragcore - chunking and retrieval evaluation for RAG pipelines
//!
//! Splits documents into validated chunks (code, markdown or prose aware)
//! and scores retrieval-augmented answers: retrieval metrics, generation
//! metrics, quality heuristics, batch reports and benchmark comparisons.

pub mod chunk;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod eval;
pub mod rank;

pub use error::{Error, Result};
