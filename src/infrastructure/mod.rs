//! Infrastructure layer - Adapter implementations
//!
//! Contains concrete implementations of the port interfaces,
//! integrating with external systems like the downstream webhook,
//! the recording server and the speech APIs.

pub mod audio;
pub mod config;
pub mod credentials;
pub mod forwarding;
pub mod providers;

// Re-export adapters
pub use audio::HttpAudioFetcher;
pub use config::FileConfigStore;
pub use credentials::FileCredentialStore;
pub use forwarding::HttpForwarder;
pub use providers::{provider_registry, GeminiTranscriber, OpenAiTranscriber};
