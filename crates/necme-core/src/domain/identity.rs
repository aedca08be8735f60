//! Discovered controller identity.

use serde::{Deserialize, Serialize};

use crate::domain::monitor::MonitorId;

/// Metadata describing one monitor found during discovery.
///
/// The model/serial pair is the stable identity used to track a physical
/// display across restarts and reconfigurations; both fields are guaranteed
/// non-empty by the discovery flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerIdentity {
    /// Hostname or IP address of the controller.
    pub host: String,
    /// Address of the discovered monitor on that controller.
    pub monitor_id: MonitorId,
    /// Model name reported by the display, whitespace-trimmed.
    pub model: String,
    /// Serial number reported by the display, whitespace-trimmed.
    pub serial: String,
}

impl ControllerIdentity {
    /// Stable unique key for this physical display, `"{model}:{serial}"`.
    ///
    /// Used to refuse configuring the same display twice.
    pub fn unique_id(&self) -> String {
        format!("{}:{}", self.model, self.serial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_id_is_model_colon_serial() {
        let identity = ControllerIdentity {
            host: "10.0.0.5".to_string(),
            monitor_id: MonitorId::new(1).unwrap(),
            model: "ME501".to_string(),
            serial: "7Z00123".to_string(),
        };
        assert_eq!(identity.unique_id(), "ME501:7Z00123");
    }
}
