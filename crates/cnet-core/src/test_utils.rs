//! Synthetic networks and labels for tests across the workspace.
//!
//! Public so integration tests in other crates can share the fixtures; not
//! intended for production use.

use std::f64::consts::PI;

use crate::{
    ControlMeasure, ControlNet, ControlPoint, Distortion, FrameCameraParams, FxFyCxCySkew,
    ImageLabel, PoseParams, Real, TargetBody,
};

/// Side length of the square frame used by [`nadir_label`].
pub const NADIR_FRAME: u32 = 1024;

/// Pinhole camera 3000 units from the center of a 1000-unit sphere, looking
/// straight down.
///
/// Pixels within roughly 350 px of the frame center see the body; the frame
/// corners look past the limb.
pub fn nadir_camera_params() -> FrameCameraParams {
    FrameCameraParams {
        intrinsics: FxFyCxCySkew {
            fx: 1000.0,
            fy: 1000.0,
            cx: 512.0,
            cy: 512.0,
            skew: 0.0,
        },
        distortion: Distortion::None,
        pose: PoseParams {
            position: [0.0, 0.0, 3000.0],
            axis_angle: [PI, 0.0, 0.0],
        },
        body: TargetBody::Sphere { radius: 1000.0 },
    }
}

/// Label for a [`NADIR_FRAME`]-square image with the nadir camera.
pub fn nadir_label(serial: &str) -> ImageLabel {
    ImageLabel {
        serial_number: serial.into(),
        samples: NADIR_FRAME,
        lines: NADIR_FRAME,
        camera: Some(nadir_camera_params()),
    }
}

/// Label without any camera model.
pub fn bare_label(serial: &str, samples: u32, lines: u32) -> ImageLabel {
    ImageLabel {
        serial_number: serial.into(),
        samples,
        lines,
        camera: None,
    }
}

/// Point with one measure per `(image, sample, line)` triple.
pub fn point(id: &str, measures: &[(&str, Real, Real)]) -> ControlPoint {
    ControlPoint::new(
        id,
        measures
            .iter()
            .map(|&(image, sample, line)| ControlMeasure::new(image, sample, line))
            .collect(),
    )
}

/// Point measured at the frame center of every listed image.
pub fn tie_point(id: &str, images: &[&str]) -> ControlPoint {
    let c = Real::from(NADIR_FRAME) / 2.0;
    let triples: Vec<(&str, Real, Real)> = images.iter().map(|&img| (img, c, c)).collect();
    point(id, &triples)
}

/// Network with one two-image tie point per link.
pub fn linked_network(links: &[(&str, &str)]) -> ControlNet {
    ControlNet::new(
        links
            .iter()
            .enumerate()
            .map(|(i, &(a, b))| tie_point(&format!("tie_{i}"), &[a, b]))
            .collect(),
    )
}
