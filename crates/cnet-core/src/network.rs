//! Control network data model.
//!
//! A [`ControlNet`] is an owned tree: points own their measures. The
//! measure → point back-reference is never stored; it is recovered as a
//! borrowed [`MeasureRef`] while walking the network. All consumers take
//! `&ControlNet`, so a network is an immutable snapshot for the whole audit.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Pt2, Real};

/// Canonical image identifier (serial number). Used as graph vertex key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ImageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One image's pixel observation of a control point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMeasure {
    /// Image the observation was made in.
    pub image: ImageId,
    /// Sub-pixel sample (column) coordinate.
    pub sample: Real,
    /// Sub-pixel line (row) coordinate.
    pub line: Real,
    #[serde(default)]
    pub ignored: bool,
}

impl ControlMeasure {
    pub fn new(image: impl Into<ImageId>, sample: Real, line: Real) -> Self {
        Self {
            image: image.into(),
            sample,
            line,
            ignored: false,
        }
    }

    /// Mark the measure as ignored (builder style).
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// `(sample, line)` as a 2D point.
    pub fn coordinate(&self) -> Pt2 {
        Pt2::new(self.sample, self.line)
    }
}

/// A ground location observed in one or more images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub id: String,
    #[serde(default)]
    pub ignored: bool,
    pub measures: Vec<ControlMeasure>,
}

impl ControlPoint {
    pub fn new(id: impl Into<String>, measures: Vec<ControlMeasure>) -> Self {
        Self {
            id: id.into(),
            ignored: false,
            measures,
        }
    }

    /// Mark the point as ignored (builder style).
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Measures that survive the ignore policy, in network order.
    pub fn eligible_measures(
        &self,
        policy: IgnorePolicy,
    ) -> impl Iterator<Item = &ControlMeasure> + '_ {
        self.measures
            .iter()
            .filter(move |m| policy.measure_eligible(m))
    }

    pub fn num_eligible_measures(&self, policy: IgnorePolicy) -> usize {
        self.eligible_measures(policy).count()
    }
}

/// Whether ignore flags on points and measures are honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnorePolicy {
    /// Ignored points and measures are skipped.
    #[default]
    Honor,
    /// Every point and measure takes part, regardless of its flag.
    Disregard,
}

impl IgnorePolicy {
    pub fn from_honor_flag(honor: bool) -> Self {
        if honor {
            Self::Honor
        } else {
            Self::Disregard
        }
    }

    pub fn point_eligible(self, point: &ControlPoint) -> bool {
        match self {
            Self::Honor => !point.ignored,
            Self::Disregard => true,
        }
    }

    pub fn measure_eligible(self, measure: &ControlMeasure) -> bool {
        match self {
            Self::Honor => !measure.ignored,
            Self::Disregard => true,
        }
    }
}

/// A measure viewed together with the point that owns it.
#[derive(Debug, Clone, Copy)]
pub struct MeasureRef<'a> {
    pub point: &'a ControlPoint,
    pub measure: &'a ControlMeasure,
}

impl<'a> MeasureRef<'a> {
    pub fn point_id(&self) -> &'a str {
        &self.point.id
    }

    pub fn coordinate(&self) -> Pt2 {
        self.measure.coordinate()
    }
}

/// Structural defects that make a network unusable as audit input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("control point at index {index} has an empty id")]
    EmptyPointId { index: usize },
    #[error("control point id {0} appears more than once")]
    DuplicatePointId(String),
    #[error("control point {point} has a measure with an empty image id")]
    EmptyImageId { point: String },
    #[error("control point {point} has a non-finite measure on image {image}")]
    NonFiniteCoordinate { point: String, image: ImageId },
}

/// Points and measures shared across a set of overlapping images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlNet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    pub points: Vec<ControlPoint>,
}

impl ControlNet {
    pub fn new(points: Vec<ControlPoint>) -> Self {
        Self {
            network_id: None,
            points,
        }
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Check the structural invariants every audit relies on.
    ///
    /// # Errors
    ///
    /// Returns the first defect found, in point order.
    pub fn validate(&self) -> Result<(), NetworkError> {
        let mut seen = HashSet::with_capacity(self.points.len());
        for (index, point) in self.points.iter().enumerate() {
            if point.id.is_empty() {
                return Err(NetworkError::EmptyPointId { index });
            }
            if !seen.insert(point.id.as_str()) {
                return Err(NetworkError::DuplicatePointId(point.id.clone()));
            }
            for measure in &point.measures {
                if measure.image.as_str().is_empty() {
                    return Err(NetworkError::EmptyImageId {
                        point: point.id.clone(),
                    });
                }
                if !measure.sample.is_finite() || !measure.line.is_finite() {
                    return Err(NetworkError::NonFiniteCoordinate {
                        point: point.id.clone(),
                        image: measure.image.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Points that survive the ignore policy, in network order.
    pub fn eligible_points(
        &self,
        policy: IgnorePolicy,
    ) -> impl Iterator<Item = &ControlPoint> + '_ {
        self.points
            .iter()
            .filter(move |p| policy.point_eligible(p))
    }

    /// Every eligible measure of every eligible point, grouped by image.
    ///
    /// Within an image, measures keep network order.
    pub fn measures_by_image(&self, policy: IgnorePolicy) -> BTreeMap<&ImageId, Vec<MeasureRef<'_>>> {
        let mut by_image: BTreeMap<&ImageId, Vec<MeasureRef<'_>>> = BTreeMap::new();
        for point in self.eligible_points(policy) {
            for measure in point.eligible_measures(policy) {
                by_image
                    .entry(&measure.image)
                    .or_default()
                    .push(MeasureRef { point, measure });
            }
        }
        by_image
    }
}
