//! Server runner and config assembly

use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::application::ports::{AudioFetcher, ConfigStore, CredentialStore, Forwarder};
use crate::application::{IngressUseCase, RelayService, TranscribeUseCase};
use crate::domain::admission::{IpAllowList, RateLimiter};
use crate::domain::audio::RecordingLayout;
use crate::domain::audit::AuditTrail;
use crate::domain::config::{
    ForwardingConfig, RecordingsConfig, RelayConfig, TranscriptionConfig,
};
use crate::domain::event_store::LatestEvents;
use crate::domain::retry::RetryPolicy;
use crate::http::{create_router, proxy_allow_set, AppState};
use crate::infrastructure::{
    provider_registry, FileConfigStore, FileCredentialStore, HttpAudioFetcher, HttpForwarder,
};

use super::presenter::Presenter;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// Tenants file read when the config names none
const DEFAULT_TENANTS_FILE: &str = "tenants.toml";

/// Config store for the given `--config` override, the XDG default
/// location otherwise.
pub fn config_store(path: Option<&str>) -> FileConfigStore {
    match path {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(store: &FileConfigStore, cli_config: RelayConfig) -> RelayConfig {
    let file_config = store.load().await.unwrap_or_else(|_| RelayConfig::empty());

    // Build env config
    let env_config = RelayConfig {
        bind: env_value("CALL_SCRIBE_BIND"),
        forwarding: env_value("CALL_SCRIBE_DOWNSTREAM_URL").map(|url| ForwardingConfig {
            downstream_url: Some(url),
            ..Default::default()
        }),
        recordings: env_value("CALL_SCRIBE_RECORDING_BASE_URL").map(|url| RecordingsConfig {
            base_url: Some(url),
            ..Default::default()
        }),
        transcription: env_value("CALL_SCRIBE_TENANTS_FILE").map(|path| TranscriptionConfig {
            tenants_file: Some(path),
            ..Default::default()
        }),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    RelayConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.is_empty())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,call_scribe=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

/// Run the relay server until interrupted.
pub async fn run_server(config: RelayConfig) -> ExitCode {
    let presenter = Presenter::new();

    // Forwarding without a destination is misconfiguration, not a
    // runtime condition to limp along with
    let Some(downstream_url) = config.downstream_url().map(String::from) else {
        presenter.error(
            "Missing downstream URL. Set forwarding.downstream_url in the config file \
             or the CALL_SCRIBE_DOWNSTREAM_URL environment variable",
        );
        return ExitCode::from(EXIT_USAGE_ERROR);
    };

    init_tracing();

    // Shared mutable structures, one coarse lock each
    let audit = Arc::new(Mutex::new(AuditTrail::new(config.audit_cap_or_default())));
    let rate_limiter = Arc::new(Mutex::new(RateLimiter::new(
        config.rate_window_or_default(),
        config.rate_max_or_default(),
    )));
    let latest = Arc::new(Mutex::new(LatestEvents::new()));

    // Relay pipeline
    let forwarder: Arc<dyn Forwarder> = Arc::new(HttpForwarder::new(
        downstream_url.clone(),
        config.forward_timeout_or_default(),
    ));
    let relay = Arc::new(RelayService::new(
        forwarder,
        RetryPolicy::new(
            config.retry_base_or_default(),
            config.retry_max_attempts_or_default(),
        ),
        Arc::clone(&audit),
    ));
    let ingress = Arc::new(IngressUseCase::new(
        IpAllowList::new(config.allowed_ips_or_default()),
        Arc::clone(&rate_limiter),
        Arc::clone(&audit),
        Arc::clone(&latest),
        Arc::clone(&relay),
        config.max_body_bytes_or_default(),
    ));

    // Transcription pipeline
    let fetcher: Arc<dyn AudioFetcher> =
        Arc::new(HttpAudioFetcher::new(config.download_timeout_or_default()));
    let credentials: Arc<dyn CredentialStore> = Arc::new(FileCredentialStore::new(
        config.tenants_file().unwrap_or(DEFAULT_TENANTS_FILE),
    ));
    let language = config.language_or_default().to_string();
    let layout = RecordingLayout {
        base_url: config.recording_base_url().unwrap_or_default().to_string(),
        live_extension: config.live_extension_or_default().to_string(),
        archive_extension: config.archive_extension_or_default().to_string(),
    };
    let transcribe = Arc::new(TranscribeUseCase::new(
        fetcher,
        credentials,
        provider_registry(&language),
        layout,
        language,
    ));

    let state = AppState {
        ingress,
        relay: Arc::clone(&relay),
        transcribe,
        rate_limiter,
        audit,
        latest,
        proxy_client: reqwest::Client::builder()
            .timeout(config.proxy_timeout_or_default())
            .build()
            .unwrap_or_default(),
        proxy_allowed_hosts: Arc::new(proxy_allow_set(&config)),
        recordings_configured: config.recording_base_url().is_some(),
    };

    let sweep_interval = config.sweep_interval_or_default();
    let sweeper = Arc::clone(&relay);
    tokio::spawn(async move {
        sweeper.run(sweep_interval).await;
    });

    let router = create_router(state);

    let bind = config.bind_or_default();
    let listener = match TcpListener::bind(bind).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(bind, error = %e, "failed to bind listen address");
            presenter.error(&format!("Failed to bind {}: {}", bind, e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    tracing::info!(
        bind,
        downstream_url = %downstream_url,
        "call-scribe listening"
    );

    let serve = axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(e) = serve.await {
        tracing::error!(error = %e, "server error");
        presenter.error(&format!("Server error: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    tracing::info!("shutdown complete");
    ExitCode::from(EXIT_SUCCESS)
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }
}
