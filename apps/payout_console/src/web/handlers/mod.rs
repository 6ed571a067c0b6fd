// apps/payout_console/src/web/handlers/mod.rs

pub mod account_handlers;
pub mod commission_handlers;
pub mod payout_handlers;
pub mod settlement_handlers;
pub mod webhook_handlers;
