//! Application wiring and lifecycle.

use crate::config::AppConfig;
use crate::error::AppResult;
use gasbridge_bus::{DynBusLink, DynBusPublisher, MqttConnection};
use gasbridge_dashboard::{run_server, AppState, CommandGateway};
use gasbridge_hub::spawn_hub;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// The bridge: MQTT driver, hub actor and dashboard server.
pub struct Application {
    config: AppConfig,
}

impl Application {
    /// Validate `config` and create the application.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run until `shutdown` fires or the server fails.
    ///
    /// On exit every task is stopped: the server drains, the driver sends
    /// DISCONNECT and the hub releases its clients.
    pub async fn run(self, shutdown: CancellationToken) -> AppResult<()> {
        let connection = MqttConnection::new(&self.config.bus);
        let publisher: DynBusPublisher = Arc::new(connection.publisher());
        let link: DynBusLink = Arc::new(connection.link());

        let (hub, hub_task) = spawn_hub(self.config.hub_config(), link, shutdown.clone());
        let bus_task = tokio::spawn(connection.run(hub.events(), shutdown.clone()));

        let gateway = CommandGateway::new(publisher, self.config.topics());
        let state = AppState::new(hub, gateway, self.config.dashboard.clone());

        info!(
            host = %self.config.bus.host,
            port = self.config.bus.port,
            "Bridge running"
        );
        let result = run_server(state, shutdown.clone()).await;
        if let Err(e) = &result {
            warn!(error = %e, "Dashboard server stopped with error");
        }

        shutdown.cancel();
        if let Err(e) = bus_task.await {
            warn!(error = %e, "Bus driver task failed");
        }
        if let Err(e) = hub_task.await {
            warn!(error = %e, "Hub task failed");
        }

        result.map_err(Into::into)
    }
}
