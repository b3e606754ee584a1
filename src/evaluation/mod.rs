//! Transcript extraction and AI evaluation.
//!
//! Call records are resolved to transcripts ([`extract`]), rendered into one
//! prompt ([`prompt`]), sent with a declared output shape ([`schema`]) and the
//! reply is repaired where the model is known to fall short ([`normalize`]).
//! [`pipeline`] ties the steps together for the HTTP handlers.

pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod schema;

pub use extract::ExtractedTranscript;
pub use pipeline::{
    CallAnalysis, CallAnalysisRequest, CustomerReport, EvaluationReport, FullReportRequest,
    LocalEvaluationRequest,
};
