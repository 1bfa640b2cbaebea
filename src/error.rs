use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{} does not exist!", .0.display())]
    InventoryNotFound(PathBuf),

    /// Host pattern with a malformed `[a:b]` range (e.g. `web[3:1]`)
    #[error("invalid host pattern '{pattern}': {reason}")]
    InvalidHostPattern { pattern: String, reason: String },

    #[error("invalid inventory {}: {reason}", .path.display())]
    InvalidInventory { path: PathBuf, reason: String },
}
