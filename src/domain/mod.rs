//! Domain layer: value objects and pure pipeline state

pub mod admission;
pub mod audio;
pub mod audit;
pub mod call_event;
pub mod config;
pub mod credentials;
pub mod error;
pub mod event_store;
pub mod retry;
