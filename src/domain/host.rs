use async_trait::async_trait;

use super::{DialogSelection, HostError, SaveDialogOptions};

/// The native window as seen by the download bridge.
///
/// Implementations answer a save-dialog request with whatever shape the
/// platform primitive produces; callers normalize it with
/// [`DialogSelection::resolve`].
#[async_trait]
pub trait HostWindow: Send + Sync {
    async fn save_dialog(&self, options: SaveDialogOptions) -> Result<DialogSelection, HostError>;
}
