//! QA Model - local extractive question answering for question compliance rules
//!
//! This crate provides:
//! - A BERT encoder with a span-prediction head (Candle)
//! - Model file resolution from a local directory or the Hugging Face Hub
//! - Windowed span extraction over long contexts
//! - A `QuestionAnswerer` implementation for the compliance engine

pub mod bert;
pub mod config;
pub mod model;
pub mod span;

pub use config::{QaModelConfig, DEFAULT_MODEL_ID};
pub use model::{BertQaModel, ModelFiles};
