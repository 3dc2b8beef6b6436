//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod ingress;
pub mod ports;
pub mod relay;
pub mod transcribe;

// Re-export use cases
pub use ingress::{AcceptedEvent, AdmissionError, IngressUseCase};
pub use relay::RelayService;
pub use transcribe::{
    AudioSource, TranscribeError, TranscribeUseCase, TranscriptionOutcome, TranscriptionRequest,
};
