//! yakulint - asynchronous 薬機法 compliance checks for Japanese ad copy
//!
//! This library provides the check-processing pipeline: an AI provider
//! gateway over OpenAI, OpenRouter and LM Studio, a response extractor
//! that normalizes model output into violations, a bounded queue with a
//! worker pool, and realtime delivery of check progress over SSE.

pub mod api;
pub mod cli;
pub mod config;
pub mod dictionary;
pub mod extractor;
pub mod gateway;
pub mod metrics;
pub mod pipeline;
pub mod realtime;
pub mod store;
