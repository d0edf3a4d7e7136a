//! Backing images and their projection capability.
//!
//! An [`ImageOpener`] turns a catalog path into an [`ImageHandle`]; handles
//! expose the frame size and, when a usable camera model exists, a
//! [`GroundProjector`]. [`LabelOpener`] is the file-backed implementation
//! reading JSON image labels.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cnet_core::{FrameCamera, FrameExtent, ImageLabel, LabelError, Real};
use serde::Serialize;
use tracing::debug;

use crate::OpenError;

/// Pixel → ground mapping of one image.
pub trait GroundProjector {
    /// Whether pixel `(sample, line)` maps to a location on the target body.
    fn projects(&self, sample: Real, line: Real) -> bool;
}

impl GroundProjector for FrameCamera {
    fn projects(&self, sample: Real, line: Real) -> bool {
        self.ground_point(sample, line).is_some()
    }
}

/// Why an image has no usable projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ModelUnavailable {
    NoCameraModel,
    InvalidModel(String),
}

impl fmt::Display for ModelUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelUnavailable::NoCameraModel => write!(f, "no camera model"),
            ModelUnavailable::InvalidModel(why) => write!(f, "invalid camera model: {why}"),
        }
    }
}

/// Result of asking an image for its projection capability.
pub enum Capability<'a> {
    Available(&'a dyn GroundProjector),
    Unavailable(ModelUnavailable),
}

/// An open backing image.
pub trait ImageHandle {
    fn extent(&self) -> FrameExtent;

    /// Projection capability, decided once for the whole image.
    fn capability(&self) -> Capability<'_>;

    /// Release underlying resources. Called by the cache on eviction.
    fn close(&mut self) {}
}

/// Opens backing images by catalog path.
pub trait ImageOpener {
    type Handle: ImageHandle;

    fn open(&self, path: &Path) -> Result<Self::Handle, OpenError>;
}

/// Opens JSON image labels from disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelOpener;

/// Label-backed image with its camera model built at open time.
#[derive(Debug)]
pub struct LabelHandle {
    path: PathBuf,
    label: ImageLabel,
    camera: Result<FrameCamera, ModelUnavailable>,
    open: bool,
}

impl LabelHandle {
    pub fn new(path: PathBuf, label: ImageLabel) -> Self {
        let camera = match &label.camera {
            None => Err(ModelUnavailable::NoCameraModel),
            Some(params) => params
                .build()
                .map_err(|e| ModelUnavailable::InvalidModel(e.to_string())),
        };
        Self {
            path,
            label,
            camera,
            open: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl ImageHandle for LabelHandle {
    fn extent(&self) -> FrameExtent {
        self.label.extent()
    }

    fn capability(&self) -> Capability<'_> {
        match &self.camera {
            Ok(camera) => Capability::Available(camera),
            Err(why) => Capability::Unavailable(why.clone()),
        }
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            debug!(path = %self.path.display(), "closed image label");
        }
    }
}

impl ImageOpener for LabelOpener {
    type Handle = LabelHandle;

    fn open(&self, path: &Path) -> Result<LabelHandle, OpenError> {
        match ImageLabel::read(path) {
            Ok(label) => Ok(LabelHandle::new(path.to_path_buf(), label)),
            Err(LabelError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Err(OpenError::Missing {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => Err(OpenError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }
}
