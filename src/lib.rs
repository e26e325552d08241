//! # Condensa
//!
//! A web application for text summarisation with follow-up Q&A.
//!
//! ## Features
//!
//! - **Abstractive summarisation** at three length presets, delegated to a
//!   hosted sequence-to-sequence model
//! - **Interactive Q&A**: questions are answered from the most recently
//!   generated summary by an extractive QA model, with a confidence score
//! - **Per-session state** behind a cookie; nothing persists across restarts

pub mod config;
pub mod inference;
pub mod models;
pub mod session;
pub mod summary;
pub mod web;

pub use config::Config;
pub use models::ModelProvider;
pub use session::SessionStore;
pub use summary::SummaryLength;
