use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event bus between the console router, the pollers and the landing page.
pub struct EventBus {
    /// Backend config mutated through the console (api → pollers)
    pub config_changed: broadcast::Sender<ConfigChangeEvent>,
    /// Landing files rewritten by the update webhook (webhook → landing cache)
    pub landing_updated: broadcast::Sender<LandingUpdateEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            config_changed: broadcast::channel(16).0,
            landing_updated: broadcast::channel(8).0,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigChangeEvent {
    Users,
    AclUsers,
    Gateways,
    Routes,
    Settings,
    Security,
    Imported,
    Applied,
}

impl ConfigChangeEvent {
    /// Whether the change can alter what the dashboard shows.
    pub fn affects_dashboard(&self) -> bool {
        matches!(
            self,
            Self::Users | Self::Gateways | Self::Imported | Self::Applied
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingUpdateEvent {
    pub updated: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn config_change_reaches_subscribers() {
        let bus = EventBus::new();
        let mut rx = bus.config_changed.subscribe();
        bus.config_changed.send(ConfigChangeEvent::Gateways).unwrap();
        assert_eq!(rx.recv().await.unwrap(), ConfigChangeEvent::Gateways);
    }

    #[test]
    fn dashboard_relevance() {
        assert!(ConfigChangeEvent::Gateways.affects_dashboard());
        assert!(ConfigChangeEvent::Imported.affects_dashboard());
        assert!(!ConfigChangeEvent::Security.affects_dashboard());
        assert!(!ConfigChangeEvent::Settings.affects_dashboard());
    }
}
