//! Port interfaces (traits) for external systems
//!
//! These traits define the boundaries between the application
//! and infrastructure layers.

pub mod audio_fetcher;
pub mod config;
pub mod credential_store;
pub mod forwarder;
pub mod provider;

// Re-export common types
pub use audio_fetcher::{AudioFetcher, FetchError};
pub use config::ConfigStore;
pub use credential_store::{CredentialError, CredentialStore};
pub use forwarder::{ForwardError, Forwarder};
pub use provider::{ProviderError, SpeechProvider, Transcript};
