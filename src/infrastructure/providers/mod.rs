//! Speech provider adapters

mod gemini;
mod openai;

use std::collections::HashMap;
use std::sync::Arc;

pub use gemini::GeminiTranscriber;
pub use openai::OpenAiTranscriber;

use crate::application::ports::SpeechProvider;
use crate::domain::credentials::ProviderKind;

/// Build the adapter registry the orchestrator looks providers up in.
pub fn provider_registry(language: &str) -> HashMap<ProviderKind, Arc<dyn SpeechProvider>> {
    let mut providers: HashMap<ProviderKind, Arc<dyn SpeechProvider>> = HashMap::new();
    providers.insert(
        ProviderKind::Gemini,
        Arc::new(GeminiTranscriber::new(language)),
    );
    providers.insert(
        ProviderKind::OpenAi,
        Arc::new(OpenAiTranscriber::new(language)),
    );
    providers
}
