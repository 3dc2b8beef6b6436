//! Tenants file credential store

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::fs;

use crate::application::ports::{CredentialError, CredentialStore};
use crate::domain::credentials::{order_credentials, ProviderCredential, ProviderKind};

/// One tenant record: up to one credential per known provider, plus an
/// optional preferred-provider marker.
#[derive(Debug, Clone, Default, Deserialize)]
struct TenantEntry {
    openai_api_key: Option<String>,
    gemini_api_key: Option<String>,
    preferred_provider: Option<ProviderKind>,
}

#[derive(Debug, Default, Deserialize)]
struct TenantsFile {
    #[serde(default)]
    tenants: HashMap<String, TenantEntry>,
}

/// Credential store backed by a `tenants.toml` file.
///
/// The file is read fresh on every resolve so credential rotations take
/// effect without a restart; nothing is cached across requests.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn credentials_of(entry: &TenantEntry) -> Vec<ProviderCredential> {
        let preferred = entry.preferred_provider;
        let slot = |provider: ProviderKind, token: &Option<String>| {
            token.as_ref().map(|token| ProviderCredential {
                provider,
                token: token.clone(),
                preferred: preferred == Some(provider),
            })
        };
        [
            slot(ProviderKind::OpenAi, &entry.openai_api_key),
            slot(ProviderKind::Gemini, &entry.gemini_api_key),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn resolve(&self, tenant_id: &str) -> Result<Vec<ProviderCredential>, CredentialError> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            CredentialError::Load(format!("{}: {e}", self.path.to_string_lossy()))
        })?;
        let parsed: TenantsFile =
            toml::from_str(&content).map_err(|e| CredentialError::Load(e.to_string()))?;

        let entry = parsed
            .tenants
            .get(tenant_id)
            .ok_or_else(|| CredentialError::TenantNotFound(tenant_id.to_string()))?;

        let ordered = order_credentials(Self::credentials_of(entry));
        if ordered.is_empty() {
            return Err(CredentialError::NoCredentials(tenant_id.to_string()));
        }
        Ok(ordered)
    }
}
