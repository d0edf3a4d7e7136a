//! Image label files.
//!
//! A label is the JSON sidecar that stands in for a backing image: it carries
//! the image serial number, the frame size in pixels, and optionally a frame
//! camera description.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{FrameCameraParams, ImageId, Real};

/// Frame size of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameExtent {
    pub samples: u32,
    pub lines: u32,
}

impl FrameExtent {
    pub fn new(samples: u32, lines: u32) -> Self {
        Self { samples, lines }
    }

    /// Frame area in square pixels.
    pub fn area(&self) -> Real {
        Real::from(self.samples) * Real::from(self.lines)
    }
}

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("cannot read label {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse label {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Contents of an image label file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageLabel {
    pub serial_number: ImageId,
    pub samples: u32,
    pub lines: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<FrameCameraParams>,
}

impl ImageLabel {
    pub fn extent(&self) -> FrameExtent {
        FrameExtent::new(self.samples, self.lines)
    }

    pub fn read(path: &Path) -> Result<Self, LabelError> {
        let data = fs::read_to_string(path).map_err(|source| LabelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&data).map_err(|source| LabelError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write(&self, path: &Path) -> Result<(), LabelError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| LabelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| LabelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::nadir_label;
    use tempfile::tempdir;

    #[test]
    fn label_roundtrips_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.json");
        let label = nadir_label("A");
        label.write(&path).unwrap();
        assert_eq!(ImageLabel::read(&path).unwrap(), label);
    }

    #[test]
    fn missing_label_is_io_error() {
        let dir = tempdir().unwrap();
        let err = ImageLabel::read(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, LabelError::Io { .. }));
    }

    #[test]
    fn corrupt_label_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            ImageLabel::read(&path).unwrap_err(),
            LabelError::Parse { .. }
        ));
    }

    #[test]
    fn extent_area_multiplies_dimensions() {
        assert_eq!(FrameExtent::new(10, 20).area(), 200.0);
    }
}
