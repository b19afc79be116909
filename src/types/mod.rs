//! Type definitions for the fraud detection pipeline

pub mod prediction;
pub mod record;

pub use prediction::{Prediction, Verdict, DEFAULT_FRAUD_THRESHOLD};
pub use record::TransactionRecord;
