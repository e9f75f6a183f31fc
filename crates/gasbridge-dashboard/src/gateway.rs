//! Command gateway.
//!
//! Validates client commands and publishes them to the bus at QoS 1. The
//! gateway never writes device state; the device's status echo does that
//! through the normal ingestion path.

use gasbridge_bus::{BusError, DynBusPublisher};
use gasbridge_core::{Command, TopicTable, ValidationError};
use gasbridge_telemetry::Metrics;
use std::time::Instant;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Publish failed: {0}")]
    Transport(#[from] BusError),
}

/// Publishes validated commands on `{prefix}/control/*`.
#[derive(Clone)]
pub struct CommandGateway {
    publisher: DynBusPublisher,
    topics: TopicTable,
}

impl CommandGateway {
    pub fn new(publisher: DynBusPublisher, topics: TopicTable) -> Self {
        Self { publisher, topics }
    }

    /// Validate a raw threshold and publish it. Returns the accepted value.
    pub async fn set_threshold(&self, value: i64) -> Result<u32, GatewayError> {
        let command = match Command::set_threshold(value) {
            Ok(command) => command,
            Err(e) => {
                Metrics::command("set-threshold", "invalid");
                return Err(e.into());
            }
        };
        self.execute(command).await?;
        Ok(value as u32)
    }

    /// Publish `command` and wait for the broker's acknowledgement. No retry.
    pub async fn execute(&self, command: Command) -> Result<(), GatewayError> {
        let topic = self.topics.control_topic(&command);
        let payload = command.payload();
        let started = Instant::now();

        match self.publisher.publish(topic.clone(), payload.clone()).await {
            Ok(()) => {
                Metrics::command(command.name(), "ok");
                Metrics::command_latency(command.name(), started.elapsed().as_secs_f64() * 1000.0);
                info!(command = command.name(), %topic, %payload, "Command published");
                Ok(())
            }
            Err(e) => {
                Metrics::command(command.name(), e.kind());
                warn!(command = command.name(), %topic, error = %e, "Command publish failed");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gasbridge_bus::MockPublisher;
    use gasbridge_core::{Actuator, Mode};
    use std::sync::Arc;
    use std::time::Duration;

    fn gateway() -> (CommandGateway, Arc<MockPublisher>) {
        let publisher = Arc::new(MockPublisher::new());
        (
            CommandGateway::new(publisher.clone(), TopicTable::default()),
            publisher,
        )
    }

    #[tokio::test]
    async fn test_publishes_encoded_commands() {
        let (gateway, publisher) = gateway();
        gateway
            .execute(Command::set_actuator(Actuator::Relay1, true))
            .await
            .unwrap();
        gateway
            .execute(Command::set_mode(Mode::Manual))
            .await
            .unwrap();
        assert_eq!(gateway.set_threshold(2500).await.unwrap(), 2500);

        assert_eq!(
            publisher.published(),
            vec![
                ("gas/control/relay1".to_string(), "1".to_string()),
                ("gas/control/mode".to_string(), "0".to_string()),
                ("gas/control/threshold".to_string(), "2500".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_threshold_never_published() {
        let (gateway, publisher) = gateway();
        for value in [199, 10000] {
            let err = gateway.set_threshold(value).await.unwrap_err();
            assert!(matches!(err, GatewayError::Validation(_)));
        }
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces() {
        let (gateway, publisher) = gateway();
        publisher.set_next_result(Err(BusError::AckTimeout(Duration::from_secs(5))));
        let err = gateway
            .execute(Command::set_actuator(Actuator::Buzzer, false))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(BusError::AckTimeout(_))));

        publisher.set_connected(false);
        let err = gateway
            .execute(Command::set_actuator(Actuator::Buzzer, false))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Transport(BusError::NotConnected)));
    }
}
