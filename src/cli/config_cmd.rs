//! Config command handler

use crate::application::ports::ConfigStore;
use crate::domain::error::ConfigError;

use super::args::ConfigAction;
use super::presenter::Presenter;

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    presenter.key_value("bind", config.bind_or_default());

    let allowed = config.allowed_ips_or_default();
    presenter.key_value(
        "ingress.allowed_ips",
        &if allowed.is_empty() {
            "(any)".to_string()
        } else {
            allowed.join(", ")
        },
    );
    presenter.key_value(
        "ingress.rate_window_secs",
        &config.rate_window_or_default().as_secs().to_string(),
    );
    presenter.key_value(
        "ingress.rate_max_requests",
        &config.rate_max_or_default().to_string(),
    );
    presenter.key_value(
        "ingress.max_body_bytes",
        &config.max_body_bytes_or_default().to_string(),
    );
    presenter.key_value(
        "ingress.audit_cap",
        &config.audit_cap_or_default().to_string(),
    );

    presenter.key_value(
        "forwarding.downstream_url",
        config.downstream_url().unwrap_or("(not set)"),
    );
    presenter.key_value(
        "forwarding.timeout_secs",
        &config.forward_timeout_or_default().as_secs().to_string(),
    );
    presenter.key_value(
        "forwarding.retry_base_secs",
        &config.retry_base_or_default().as_secs().to_string(),
    );
    presenter.key_value(
        "forwarding.retry_max_attempts",
        &config.retry_max_attempts_or_default().to_string(),
    );
    presenter.key_value(
        "forwarding.sweep_interval_secs",
        &config.sweep_interval_or_default().as_secs().to_string(),
    );

    presenter.key_value(
        "recordings.base_url",
        config.recording_base_url().unwrap_or("(not set)"),
    );
    presenter.key_value("recordings.live_extension", config.live_extension_or_default());
    presenter.key_value(
        "recordings.archive_extension",
        config.archive_extension_or_default(),
    );
    presenter.key_value(
        "recordings.download_timeout_secs",
        &config.download_timeout_or_default().as_secs().to_string(),
    );

    presenter.key_value("transcription.language", config.language_or_default());
    presenter.key_value(
        "transcription.tenants_file",
        config.tenants_file().unwrap_or("(not set)"),
    );

    let proxy_hosts = config.proxy_allowed_hosts_or_default();
    presenter.key_value(
        "proxy.allowed_hosts",
        &if proxy_hosts.is_empty() {
            "(none)".to_string()
        } else {
            proxy_hosts.join(", ")
        },
    );
    presenter.key_value(
        "proxy.timeout_secs",
        &config.proxy_timeout_or_default().as_secs().to_string(),
    );

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}
