use plp_events::BusConfig;

/// Configuration for the [`crate::AccountingEngine`].
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Capacity of per-subscriber event channels.
    pub event_channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            event_channel_capacity: 1024,
        }
    }
}

impl EngineConfig {
    /// The bus configuration derived from this engine configuration.
    pub fn bus_config(&self) -> BusConfig {
        BusConfig {
            channel_capacity: self.event_channel_capacity,
        }
    }
}
