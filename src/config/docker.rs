//! Docker configuration — opaque passthrough, optional and ignored by core.

use serde::{Deserialize, Serialize};

/// Docker provisioning settings. The core never reads these fields; they
/// exist only so the config shape round-trips for callers that provision
/// containers themselves. Kept as a raw JSON object rather than a typed
/// struct since the core has no opinion on its contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockerConfig {
    #[serde(flatten)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}
