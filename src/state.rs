use std::path::PathBuf;
use std::sync::Arc;

use crate::relay::RelayClient;

pub type SharedState = Arc<AppState>;

/// State owned by the front-end role. Nothing in here is shared with the
/// ingestion role; the relay address is the only link between them.
pub struct AppState {
    pub doc_root: PathBuf,
    pub relay: RelayClient,
}
