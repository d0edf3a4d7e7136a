//! Cross-checks between the control network and the image catalog.

use std::collections::{BTreeMap, BTreeSet};

use cnet_core::{ControlNet, IgnorePolicy, ImageCatalog, ImageId};
use serde::Serialize;

use crate::ProgressSink;

/// A network image with no catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncatalogedImage {
    pub id: ImageId,
    /// Eligible measures of this image across the whole network.
    pub valid_measures: usize,
}

/// Bookkeeping findings that need no backing image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogFindings {
    /// Image → ids of eligible points whose only eligible measure is on it.
    pub single_measure: BTreeMap<ImageId, BTreeSet<String>>,
    /// Cataloged images not tied to any other image by a point.
    pub no_control: BTreeSet<ImageId>,
    /// Images of multi-measure points missing from the catalog, in order of first appearance.
    pub no_cube: Vec<UncatalogedImage>,
    /// Images with exactly one eligible measure in the whole network.
    pub single_cube: BTreeSet<ImageId>,
}

impl CatalogFindings {
    pub fn num_single_measure_points(&self) -> usize {
        self.single_measure.values().map(BTreeSet::len).sum()
    }
}

/// Compare `net` against `catalog` under `policy`.
pub fn check_catalog(
    net: &ControlNet,
    catalog: &ImageCatalog,
    policy: IgnorePolicy,
    progress: &mut dyn ProgressSink,
) -> CatalogFindings {
    let mut findings = CatalogFindings::default();
    let mut measure_count: BTreeMap<&ImageId, usize> = BTreeMap::new();
    let mut controlled: BTreeSet<&ImageId> = BTreeSet::new();
    let mut uncataloged: Vec<&ImageId> = Vec::new();

    progress.start("Checking catalog", net.num_points());
    for point in &net.points {
        progress.advance(1);
        if !policy.point_eligible(point) {
            continue;
        }
        let measures: Vec<_> = point.eligible_measures(policy).collect();
        for &m in &measures {
            *measure_count.entry(&m.image).or_default() += 1;
        }

        if let [only] = measures.as_slice() {
            findings
                .single_measure
                .entry(only.image.clone())
                .or_default()
                .insert(point.id.clone());
            continue;
        }

        for &m in &measures {
            controlled.insert(&m.image);
            if !catalog.contains(&m.image) && !uncataloged.contains(&&m.image) {
                uncataloged.push(&m.image);
            }
        }
    }
    progress.finish();

    findings.no_control = catalog
        .ids()
        .filter(|id| !controlled.contains(id))
        .cloned()
        .collect();
    findings.no_cube = uncataloged
        .into_iter()
        .map(|id| UncatalogedImage {
            id: id.clone(),
            valid_measures: measure_count.get(id).copied().unwrap_or(0),
        })
        .collect();
    findings.single_cube = measure_count
        .into_iter()
        .filter(|&(_, n)| n == 1)
        .map(|(id, _)| id.clone())
        .collect();

    findings
}
