//! CallScribe - call event relay and transcription service
//!
//! This crate ingests call-completion events from a telephony platform,
//! relays them to a downstream automation endpoint with retries, and on
//! demand resolves a call to its recorded audio and produces a transcript
//! through a chain of speech-to-text providers.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Core business logic, value objects, and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (forwarder, fetchers, providers)
//! - **HTTP**: Axum router, handlers, and middleware
//! - **CLI**: Command-line interface, argument parsing, and the server runner

pub mod application;
pub mod cli;
pub mod domain;
pub mod http;
pub mod infrastructure;
