//! Tenant provider credentials

use std::fmt;

use serde::{Deserialize, Serialize};

/// A known speech-to-text provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl ProviderKind {
    /// Name used in config files, HTTP responses and logs
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One usable credential for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCredential {
    pub provider: ProviderKind,
    pub token: String,
    pub preferred: bool,
}

/// Recognize tokens that are placeholders rather than real credentials.
///
/// Tenant files shipped from templates tend to carry `changeme`,
/// `your-api-key-here` or strings of x's where a key should go.
pub fn is_placeholder(token: &str) -> bool {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lower = trimmed.to_lowercase();
    lower == "changeme" || lower.starts_with("your") || lower.chars().all(|c| c == 'x')
}

/// Drop placeholder entries and stably sort the preferred provider first,
/// preserving declaration order for the rest.
pub fn order_credentials(entries: Vec<ProviderCredential>) -> Vec<ProviderCredential> {
    let mut kept: Vec<ProviderCredential> = entries
        .into_iter()
        .filter(|c| !is_placeholder(&c.token))
        .collect();
    kept.sort_by_key(|c| !c.preferred);
    kept
}
