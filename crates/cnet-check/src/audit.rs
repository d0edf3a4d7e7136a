//! One complete audit run over a control network.

use std::collections::BTreeMap;

use cnet_core::{ControlNet, ImageCatalog, ImageId, Real};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    check_catalog, evaluate_coverage, find_islands, validate_reprojection, AuditConfig, AuditError,
    CatalogFindings, CorrespondenceGraph, CoverageFinding, ImageCache, ImageOpener, Island,
    ProgressSink, ReprojectionFindings,
};

/// Size of the correspondence graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub vertices: usize,
    pub edges: usize,
}

/// Everything one audit run found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkAudit {
    pub num_points: usize,
    pub graph: GraphStats,
    /// Connected components, ordered by their smallest image id.
    pub islands: Vec<Island>,
    #[serde(flatten)]
    pub catalog: CatalogFindings,
    /// Per-image hull coverage; `None` when the check was disabled.
    pub coverage: Option<BTreeMap<ImageId, CoverageFinding>>,
    /// `None` when the check was disabled.
    pub reprojection: Option<ReprojectionFindings>,
    /// Images whose backing file could not be opened by any check. An image
    /// faulted by the reprojection check is not retried for coverage.
    pub resource_faults: BTreeMap<ImageId, String>,
    pub tolerance: Real,
}

impl NetworkAudit {
    /// Exactly one island holds every image of the graph.
    pub fn is_connected(&self) -> bool {
        self.islands.len() == 1
    }

    /// Index of the island holding `image`.
    pub fn island_of(&self, image: &ImageId) -> Option<usize> {
        self.islands.iter().position(|island| island.contains(image))
    }

    /// Images below the coverage tolerance or with a degenerate hull.
    pub fn low_coverage(&self) -> impl Iterator<Item = (&ImageId, &CoverageFinding)> + '_ {
        self.coverage
            .iter()
            .flat_map(|c| c.iter())
            .filter(|(_, f)| f.is_flagged())
    }

    pub fn num_low_coverage(&self) -> usize {
        self.low_coverage().count()
    }
}

/// Run every enabled check of `config` against `net`.
///
/// Backing images listed in `catalog` are opened through `opener` and kept in
/// a cache bounded by `config.cache_capacity`; the cache lives for this call
/// only.
///
/// # Errors
///
/// Fails before any finding is produced when the configuration is out of
/// range, the network is malformed, or, with
/// `config.require_cataloged_images`, a measured image is not cataloged.
pub fn run_audit<O: ImageOpener>(
    net: &ControlNet,
    catalog: &ImageCatalog,
    opener: O,
    config: &AuditConfig,
    progress: &mut dyn ProgressSink,
) -> Result<NetworkAudit, AuditError> {
    config.validate()?;
    net.validate()?;
    let policy = config.ignore_policy();
    let by_image = net.measures_by_image(policy);

    if config.require_cataloged_images {
        if let Some(&missing) = by_image.keys().find(|id| !catalog.contains(id)) {
            return Err(AuditError::UncatalogedImage(missing.clone()));
        }
    }

    let catalog_findings = check_catalog(net, catalog, policy, progress);

    let graph = CorrespondenceGraph::build(net, policy, progress);
    let islands = find_islands(&graph, progress);
    let graph_stats = GraphStats {
        vertices: graph.num_vertices(),
        edges: graph.num_edges(),
    };
    info!(
        vertices = graph_stats.vertices,
        edges = graph_stats.edges,
        islands = islands.len(),
        "correspondence graph partitioned"
    );

    let mut cache = ImageCache::new(opener, config.cache_capacity)?;
    let mut resource_faults = BTreeMap::new();

    let reprojection = if config.check_reprojection {
        let findings = validate_reprojection(&by_image, catalog, &mut cache, progress);
        resource_faults.extend(
            findings
                .resource_faults
                .iter()
                .map(|(id, why)| (id.clone(), why.clone())),
        );
        info!(
            checked = findings.measures_checked,
            flagged = findings.measures_flagged,
            images = findings.num_flagged_images(),
            "reprojection checked"
        );
        Some(findings)
    } else {
        None
    };

    let coverage = if config.check_coverage {
        let openable: BTreeMap<_, _> = by_image
            .iter()
            .filter(|(id, _)| !resource_faults.contains_key(**id))
            .map(|(&id, measures)| (id, measures.clone()))
            .collect();
        let report = evaluate_coverage(&openable, catalog, &mut cache, config.tolerance, progress);
        info!(
            images = report.findings.len(),
            flagged = report.flagged().count(),
            tolerance = config.tolerance,
            "coverage evaluated"
        );
        for (id, why) in report.resource_faults {
            resource_faults.entry(id).or_insert(why);
        }
        Some(report.findings)
    } else {
        None
    };

    let stats = cache.stats();
    if !resource_faults.is_empty() {
        warn!(
            images = resource_faults.len(),
            "some backing images could not be opened"
        );
    }
    info!(
        opened = stats.opened,
        evicted = stats.evicted,
        "audit finished"
    );

    Ok(NetworkAudit {
        num_points: net.num_points(),
        graph: graph_stats,
        islands,
        catalog: catalog_findings,
        coverage,
        reprojection,
        resource_faults,
        tolerance: config.tolerance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Capability, ImageHandle, ModelUnavailable, NullProgress, OpenError};
    use cnet_core::test_utils::{linked_network, point, tie_point};
    use cnet_core::FrameExtent;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};
    use std::rc::Rc;

    /// Every image is a 10×10 frame without a camera.
    struct Blank;

    struct BlankHandle;

    impl ImageHandle for BlankHandle {
        fn extent(&self) -> FrameExtent {
            FrameExtent::new(10, 10)
        }

        fn capability(&self) -> Capability<'_> {
            Capability::Unavailable(ModelUnavailable::NoCameraModel)
        }
    }

    impl ImageOpener for Blank {
        type Handle = BlankHandle;

        fn open(&self, _path: &Path) -> Result<BlankHandle, OpenError> {
            Ok(BlankHandle)
        }
    }

    fn catalog(ids: &[&str]) -> ImageCatalog {
        ImageCatalog::from_entries(
            ids.iter()
                .map(|id| (ImageId::from(*id), PathBuf::from(*id))),
        )
        .unwrap()
    }

    #[test]
    fn disabled_checks_are_absent() {
        let net = linked_network(&[("A", "B")]);
        let config = AuditConfig {
            check_coverage: false,
            check_reprojection: false,
            ..AuditConfig::default()
        };
        let audit = run_audit(&net, &catalog(&["A", "B"]), Blank, &config, &mut NullProgress).unwrap();
        assert!(audit.is_connected());
        assert!(audit.coverage.is_none());
        assert!(audit.reprojection.is_none());
        assert_eq!(audit.graph, GraphStats { vertices: 2, edges: 1 });
    }

    #[test]
    fn strict_catalog_rejects_unknown_images() {
        let net = linked_network(&[("A", "B")]);
        let config = AuditConfig {
            require_cataloged_images: true,
            ..AuditConfig::default()
        };
        let err = run_audit(&net, &catalog(&["A"]), Blank, &config, &mut NullProgress).unwrap_err();
        assert!(matches!(err, AuditError::UncatalogedImage(id) if id.as_str() == "B"));
    }

    #[test]
    fn malformed_network_is_fatal() {
        let net = ControlNet::new(vec![point("", &[("A", 1.0, 1.0)])]);
        let err = run_audit(&net, &catalog(&["A"]), Blank, &AuditConfig::default(), &mut NullProgress)
            .unwrap_err();
        assert!(matches!(err, AuditError::Network(_)));
    }

    #[test]
    fn invalid_config_is_fatal() {
        let net = linked_network(&[("A", "B")]);
        let config = AuditConfig {
            tolerance: Real::NAN,
            ..AuditConfig::default()
        };
        let err = run_audit(&net, &catalog(&["A", "B"]), Blank, &config, &mut NullProgress).unwrap_err();
        assert!(matches!(err, AuditError::InvalidConfig(_)));
    }

    #[test]
    fn no_model_flags_every_measure_and_two_measures_are_degenerate() {
        let net = linked_network(&[("A", "B"), ("B", "C")]);
        let audit = run_audit(&net, &catalog(&["A", "B", "C"]), Blank, &AuditConfig::default(), &mut NullProgress)
            .unwrap();

        let reproj = audit.reprojection.as_ref().unwrap();
        assert_eq!(reproj.measures_checked, 4);
        assert_eq!(reproj.measures_flagged, 4);
        assert_eq!(reproj.unavailable.len(), 3);

        assert_eq!(audit.num_low_coverage(), 3);
        assert_eq!(audit.island_of(&ImageId::from("C")), Some(0));
    }

    /// Like [`Blank`], but `B` cannot be opened; every attempt is logged.
    struct Flaky(Rc<RefCell<Vec<PathBuf>>>);

    impl ImageOpener for Flaky {
        type Handle = BlankHandle;

        fn open(&self, path: &Path) -> Result<BlankHandle, OpenError> {
            self.0.borrow_mut().push(path.to_path_buf());
            if path == Path::new("B") {
                return Err(OpenError::Missing {
                    path: path.to_path_buf(),
                });
            }
            Ok(BlankHandle)
        }
    }

    #[test]
    fn faulted_image_is_opened_once() {
        let net = linked_network(&[("A", "B")]);
        let attempts = Rc::new(RefCell::new(Vec::new()));
        let opener = Flaky(attempts.clone());
        let config = AuditConfig::default();
        let audit = run_audit(&net, &catalog(&["A", "B"]), opener, &config, &mut NullProgress).unwrap();

        let tried_b = attempts
            .borrow()
            .iter()
            .filter(|p| p.as_path() == Path::new("B"))
            .count();
        assert_eq!(tried_b, 1);
        assert!(audit.resource_faults.contains_key(&ImageId::from("B")));
        let coverage = audit.coverage.as_ref().unwrap();
        assert!(coverage.contains_key(&ImageId::from("A")));
        assert!(!coverage.contains_key(&ImageId::from("B")));
    }

    /// Keeps `(label, total, advanced)` per phase.
    #[derive(Default)]
    struct Phases(Vec<(String, usize, usize)>);

    impl ProgressSink for Phases {
        fn start(&mut self, label: &str, total: usize) {
            self.0.push((label.to_string(), total, 0));
        }

        fn advance(&mut self, n: usize) {
            if let Some(phase) = self.0.last_mut() {
                phase.2 += n;
            }
        }
    }

    #[test]
    fn every_phase_reaches_its_total() {
        let mut net = linked_network(&[("A", "B"), ("B", "C")]);
        net.points.push(tie_point("skip", &["C", "D"]).ignored());
        let mut phases = Phases::default();
        let config = AuditConfig::default();
        run_audit(&net, &catalog(&["A", "B", "C", "D"]), Blank, &config, &mut phases).unwrap();

        let labels: Vec<&str> = phases.0.iter().map(|(l, _, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            [
                "Checking catalog",
                "Building correspondence graph",
                "Finding islands",
                "Checking reprojection",
                "Evaluating coverage",
            ]
        );
        for (label, total, done) in &phases.0 {
            assert_eq!(done, total, "{label} stopped at {done} of {total}");
        }
        assert_eq!(phases.0[0].1, 3);
        assert_eq!(phases.0[2].1, 3);
    }
}
