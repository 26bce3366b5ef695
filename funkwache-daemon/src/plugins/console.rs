//! Console output plugin -- writes each alarm to the tracing log.
//!
//! The simplest output channel: one structured log line per alarm,
//! formatted per protocol family.

use funkwache_core::error::FunkwacheError;
use funkwache_core::event::{AlarmEvent, AlarmPayload};
use funkwache_core::plugin::{AlarmPlugin, PluginInfo, PluginKind};

/// Console output plugin.
pub struct ConsolePlugin {
    info: PluginInfo,
}

impl ConsolePlugin {
    /// Create a console plugin with the given registry name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info: PluginInfo {
                name: name.into(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                description: "writes alarms to the log".to_owned(),
                kind: PluginKind::Console,
            },
        }
    }
}

impl AlarmPlugin for ConsolePlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    async fn init(&mut self) -> Result<(), FunkwacheError> {
        Ok(())
    }

    async fn deliver(&self, event: &AlarmEvent) -> Result<(), FunkwacheError> {
        match &event.payload {
            AlarmPayload::Fms(fms) => tracing::info!(
                target: "funkwache::alarm",
                service = %fms.service,
                region = %fms.region,
                location = %fms.location,
                vehicle = %fms.vehicle,
                status = %fms.status,
                status_text = %fms.status_text.as_deref().unwrap_or(&fms.status),
                direction = %fms.direction.text(),
                tactical_info = %fms.tactical_info,
                "FMS alarm"
            ),
            AlarmPayload::Zvei(zvei) => tracing::info!(
                target: "funkwache::alarm",
                code = %zvei.code,
                description = %zvei.description.as_deref().unwrap_or(&zvei.code),
                "5-Ton alarm"
            ),
            AlarmPayload::Pocsag(poc) => tracing::info!(
                target: "funkwache::alarm",
                ric = %poc.ric,
                function = poc.function,
                bit_rate = %poc.bit_rate,
                message = %poc.message,
                description = %poc.description.as_deref().unwrap_or(&poc.ric),
                "POCSAG alarm"
            ),
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), FunkwacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funkwache_core::event::ZveiTelegram;

    #[tokio::test]
    async fn delivers_without_error() {
        let mut plugin = ConsolePlugin::new("console");
        plugin.init().await.unwrap();

        let event = AlarmEvent::new(
            172_500_000,
            AlarmPayload::Zvei(ZveiTelegram {
                code: "25832".to_owned(),
                description: None,
            }),
        );
        plugin.deliver(&event).await.unwrap();
        plugin.stop().await.unwrap();
    }

    #[test]
    fn info_carries_configured_name() {
        let plugin = ConsolePlugin::new("main-console");
        assert_eq!(plugin.info().name, "main-console");
        assert_eq!(plugin.info().kind, PluginKind::Console);
    }
}
