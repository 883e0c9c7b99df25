pub mod download_bridge;
pub mod readiness;

pub use download_bridge::{BridgeContext, DownloadBridge};
pub use readiness::ReadinessProbe;
