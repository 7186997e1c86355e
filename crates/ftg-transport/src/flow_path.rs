//! Flow-path management.
//!
//! The session layer keeps reconnection bookkeeping in a working directory,
//! one subdirectory per channel. The directory must exist before the
//! transport initializes and may be discarded after a clean shutdown.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::error::{TransportError, TransportResult};

/// Create the flow-path directory tree and return its root.
///
/// With no configured path, a fresh directory under the system temp dir is
/// used, so concurrent runs never share session state.
pub fn prepare_flow_path(configured: Option<&Path>) -> TransportResult<PathBuf> {
    let root = match configured {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.subsec_nanos())
                .unwrap_or(0);
            std::env::temp_dir().join(format!("ftg-{}-{nanos}", std::process::id()))
        }
    };

    for dir in [root.clone(), root.join("md"), root.join("td")] {
        std::fs::create_dir_all(&dir)
            .map_err(|e| TransportError::FlowPath(format!("create {}: {e}", dir.display())))?;
    }

    debug!(path = %root.display(), "flow path prepared");
    Ok(root)
}

/// Remove the flow-path tree after a clean shutdown.
pub fn remove_flow_path(root: &Path) -> TransportResult<()> {
    std::fs::remove_dir_all(root)
        .map_err(|e| TransportError::FlowPath(format!("remove {}: {e}", root.display())))
}
