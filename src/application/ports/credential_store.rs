//! Tenant credential port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::credentials::ProviderCredential;

/// Credential resolution errors.
/// Distinct from provider errors so operators know to fix tenant setup
/// rather than retry.
#[derive(Debug, Clone, Error)]
pub enum CredentialError {
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("No usable credentials configured for tenant: {0}")]
    NoCredentials(String),

    #[error("Failed to load tenant credentials: {0}")]
    Load(String),
}

/// Port for resolving tenant credentials
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolve a tenant to its ordered, usable credentials.
    ///
    /// Placeholder tokens are already filtered out and the preferred
    /// provider sorted first. Loaded fresh on every call, never cached.
    async fn resolve(&self, tenant_id: &str) -> Result<Vec<ProviderCredential>, CredentialError>;
}
