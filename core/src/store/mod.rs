// payout_engine/src/store/mod.rs

//! Store implementations that live inside the engine crate. Production
//! deployments provide their own (see the console app's Postgres stores).

pub mod memory;

pub use memory::InMemoryStore;
