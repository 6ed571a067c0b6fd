// apps/payout_console/src/pipelines/mod.rs

//! Application-level pipelines. Payout orchestration itself lives in the
//! engine; the console adds processor webhook intake.

pub mod contexts;
pub mod webhook_pipeline;
