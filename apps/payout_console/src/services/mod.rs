// apps/payout_console/src/services/mod.rs

pub mod processor_mock;
pub mod signature;
