//! Pixel → ground reprojection validity of every measure.

use std::collections::{BTreeMap, BTreeSet};

use cnet_core::{ImageCatalog, ImageId, MeasureRef};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{Capability, ImageCache, ImageHandle, ImageOpener, ModelUnavailable, ProgressSink};

/// Measures that fail to reach the ground under their image's camera.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReprojectionFindings {
    /// Flagged image → ids of points owning its flagged measures.
    pub flagged: BTreeMap<ImageId, BTreeSet<String>>,
    /// Images without a usable camera model; all their measures are flagged.
    pub unavailable: BTreeMap<ImageId, ModelUnavailable>,
    /// Images whose backing file could not be opened.
    pub resource_faults: BTreeMap<ImageId, String>,
    pub measures_checked: usize,
    pub measures_flagged: usize,
}

impl ReprojectionFindings {
    pub fn is_flagged(&self, image: &ImageId) -> bool {
        self.flagged.contains_key(image)
    }

    pub fn num_flagged_images(&self) -> usize {
        self.flagged.len()
    }

    fn record(&mut self, image: &ImageId, measures: &[MeasureRef<'_>]) {
        if measures.is_empty() {
            return;
        }
        self.measures_flagged += measures.len();
        self.flagged
            .entry(image.clone())
            .or_default()
            .extend(measures.iter().map(|m| m.point_id().to_string()));
    }
}

/// Measures of one image that fail `capability`.
///
/// An unavailable capability fails every measure; an available one fails
/// exactly those whose `(sample, line)` does not project.
pub fn failing_measures<'a>(
    capability: &Capability<'_>,
    measures: &[MeasureRef<'a>],
) -> Vec<MeasureRef<'a>> {
    match capability {
        Capability::Unavailable(_) => measures.to_vec(),
        Capability::Available(projector) => measures
            .iter()
            .filter(|m| !projector.projects(m.measure.sample, m.measure.line))
            .copied()
            .collect(),
    }
}

/// Check every measure of every cataloged image in `by_image`.
///
/// Images missing from the catalog are skipped. An image that cannot be
/// opened is recorded in `resource_faults` and the run moves on.
pub fn validate_reprojection<O: ImageOpener>(
    by_image: &BTreeMap<&ImageId, Vec<MeasureRef<'_>>>,
    catalog: &ImageCatalog,
    cache: &mut ImageCache<O>,
    progress: &mut dyn ProgressSink,
) -> ReprojectionFindings {
    let mut findings = ReprojectionFindings::default();

    progress.start("Checking reprojection", by_image.len());
    for (&image, measures) in by_image {
        progress.advance(1);
        let Some(path) = catalog.file_name(image) else {
            continue;
        };

        let outcome = cache.with_image(path, |handle| {
            let capability = handle.capability();
            let unavailable = match &capability {
                Capability::Unavailable(why) => Some(why.clone()),
                Capability::Available(_) => None,
            };
            (failing_measures(&capability, measures), unavailable)
        });

        match outcome {
            Ok((failed, unavailable)) => {
                findings.measures_checked += measures.len();
                if let Some(why) = unavailable {
                    debug!(image = %image, reason = %why, "no projection for image");
                    findings.unavailable.insert(image.clone(), why);
                }
                findings.record(image, &failed);
            }
            Err(e) => {
                warn!(image = %image, error = %e, "skipping reprojection check");
                findings.resource_faults.insert(image.clone(), e.to_string());
            }
        }
    }
    progress.finish();

    findings
}
