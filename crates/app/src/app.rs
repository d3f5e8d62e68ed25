//! Wires configuration, storage and the remote client into the panic button.

use std::sync::Arc;

use anyhow::Context;
use domain::error::AlertError;
use domain::models::{AlertRecord, UserRef};
use domain::services::{
    clear_session, load_session, save_session, AlertHistory, AlertLifecycleController,
    AlertRemoteClient, GeoProvider, PanicButton, SecureStateStore,
};
use persistence::{create_pool, init_schema, SecureStateRepository};
use tracing::info;

use crate::config::Config;
use crate::services::{geo_provider, HttpAlertClient};

/// Everything a host needs to drive the panic button.
pub struct PanicButtonApp {
    config: Config,
    store: Arc<dyn SecureStateStore>,
    button: PanicButton,
    history: AlertHistory,
}

impl PanicButtonApp {
    /// Opens the SQLite store and the HTTP client described by `config`.
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database_config())
            .await
            .with_context(|| format!("failed to open secure store at {}", config.storage.url))?;
        init_schema(&pool)
            .await
            .context("failed to prepare secure store schema")?;
        persistence::metrics::record_pool_metrics(&pool);

        let remote = HttpAlertClient::new(&config.remote).context("failed to build HTTP client")?;
        info!(base_url = %remote.base_url(), "Alert API client ready");

        let geo = geo_provider(&config.location);
        Ok(Self::assemble(
            config,
            geo,
            Arc::new(remote),
            Arc::new(SecureStateRepository::new(pool)),
        ))
    }

    /// Builds the app around already constructed collaborators.
    pub fn assemble(
        config: Config,
        geo: Arc<dyn GeoProvider>,
        remote: Arc<dyn AlertRemoteClient>,
        store: Arc<dyn SecureStateStore>,
    ) -> Self {
        let controller = Arc::new(AlertLifecycleController::new(
            geo,
            remote.clone(),
            store.clone(),
            config.lifecycle_config(),
        ));
        let history = AlertHistory::new(remote, controller.context());
        let button = PanicButton::new(controller, config.gesture_thresholds());

        Self {
            config,
            store,
            button,
            history,
        }
    }

    /// Restores an alert left active by a previous run.
    pub async fn start(&self) -> Option<AlertRecord> {
        self.button.controller().rehydrate().await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn button(&self) -> &PanicButton {
        &self.button
    }

    pub fn history(&self) -> &AlertHistory {
        &self.history
    }

    pub async fn current_user(&self) -> Option<UserRef> {
        load_session(self.store.as_ref()).await
    }

    /// Stores the signed-in user used as the owner of new alerts.
    pub async fn login(&self, user: &UserRef) -> Result<(), AlertError> {
        save_session(self.store.as_ref(), user).await?;
        info!(user_id = user.id, "Session stored");
        Ok(())
    }

    pub async fn logout(&self) -> Result<(), AlertError> {
        clear_session(self.store.as_ref()).await?;
        info!("Session cleared");
        Ok(())
    }
}
