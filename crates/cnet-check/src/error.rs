use std::path::PathBuf;

use cnet_core::{ImageId, NetworkError};
use thiserror::Error;

/// Fatal audit errors. Any of these aborts the run before findings are produced.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("malformed control network: {0}")]
    Network(#[from] NetworkError),
    #[error("image {0} is measured in the network but missing from the catalog")]
    UncatalogedImage(ImageId),
    #[error("invalid audit configuration: {0}")]
    InvalidConfig(String),
}

/// A backing image could not be opened. Recorded per image; never fatal.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("backing image {} does not exist", path.display())]
    Missing { path: PathBuf },
    #[error("backing image {} is unreadable: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}
