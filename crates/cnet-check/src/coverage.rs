//! Measurement coverage: convex hull area over frame area, per image.
//!
//! The fitness of an image is the area of the convex hull of all its
//! measure coordinates divided by the frame area. It approximates how much of
//! the frame is tied down by control and is always in `[0, 1]`.

use std::collections::BTreeMap;

use cnet_core::{cross2, FrameExtent, ImageCatalog, ImageId, MeasureRef, Pt2, Real};
use rayon::prelude::*;
use serde::Serialize;
use tracing::warn;

use crate::{ImageCache, ImageHandle, ImageOpener, ProgressSink};

/// Minimum closed-ring length (three coordinates plus the closing repeat).
pub const MIN_RING_POINTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DegenerateReason {
    /// Closed ring has fewer than [`MIN_RING_POINTS`] points.
    TooFewPoints { ring_points: usize },
    /// All coordinates are coincident or collinear.
    Collinear,
    /// Frame has zero samples or lines.
    EmptyFrame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HullStatus {
    Measured,
    Degenerate { reason: DegenerateReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HullFitness {
    /// Hull area over frame area, clamped to `[0, 1]`.
    pub fitness: Real,
    /// Hull area in square pixels.
    pub hull_area: Real,
    pub status: HullStatus,
}

impl HullFitness {
    fn degenerate(reason: DegenerateReason, hull_area: Real) -> Self {
        Self {
            fitness: 0.0,
            hull_area,
            status: HullStatus::Degenerate { reason },
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self.status, HullStatus::Degenerate { .. })
    }
}

/// Convex hull by Andrew's monotone chain.
///
/// Returns the hull vertices counter-clockwise without repeating the first
/// one. Collinear and duplicate points are dropped, so a degenerate input
/// yields fewer than three vertices instead of failing.
pub fn convex_hull(points: &[Pt2]) -> Vec<Pt2> {
    let mut pts: Vec<Pt2> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Pt2> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross2(&lower[lower.len() - 2], &lower[lower.len() - 1], p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Pt2> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross2(&upper[upper.len() - 2], &upper[upper.len() - 1], p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Area of a simple polygon (shoelace formula). Open or closed rings both work.
pub fn polygon_area(ring: &[Pt2]) -> Real {
    if ring.len() < 3 {
        return 0.0;
    }
    let twice: Real = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice.abs() * 0.5
}

/// Coverage fitness of one image's measure coordinates within its frame.
pub fn control_fitness(coords: &[Pt2], extent: FrameExtent) -> HullFitness {
    let mut ring = coords.to_vec();
    if let Some(first) = coords.first() {
        ring.push(*first);
    }
    if ring.len() < MIN_RING_POINTS {
        return HullFitness::degenerate(
            DegenerateReason::TooFewPoints {
                ring_points: ring.len(),
            },
            0.0,
        );
    }

    let hull = convex_hull(&ring);
    if hull.len() < 3 {
        return HullFitness::degenerate(DegenerateReason::Collinear, 0.0);
    }
    let hull_area = polygon_area(&hull);

    let frame_area = extent.area();
    if frame_area <= 0.0 {
        return HullFitness::degenerate(DegenerateReason::EmptyFrame, hull_area);
    }

    HullFitness {
        fitness: (hull_area / frame_area).clamp(0.0, 1.0),
        hull_area,
        status: HullStatus::Measured,
    }
}

/// Coverage verdict for one image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageFinding {
    #[serde(flatten)]
    pub hull: HullFitness,
    pub below_tolerance: bool,
}

impl CoverageFinding {
    pub fn new(hull: HullFitness, tolerance: Real) -> Self {
        Self {
            hull,
            below_tolerance: hull.fitness < tolerance,
        }
    }

    /// Below tolerance or degenerate.
    pub fn is_flagged(&self) -> bool {
        self.below_tolerance || self.hull.is_degenerate()
    }
}

/// Coverage findings for every cataloged image with measures.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageReport {
    pub findings: BTreeMap<ImageId, CoverageFinding>,
    /// Images whose backing file could not be opened for their frame size.
    pub resource_faults: BTreeMap<ImageId, String>,
}

impl CoverageReport {
    pub fn flagged(&self) -> impl Iterator<Item = (&ImageId, &CoverageFinding)> + '_ {
        self.findings.iter().filter(|(_, f)| f.is_flagged())
    }
}

/// Score coverage for every cataloged image in `by_image`.
///
/// Frame sizes are read serially through `cache`; the hull computations then
/// run in parallel. Images missing from the catalog are skipped.
pub fn evaluate_coverage<O: ImageOpener>(
    by_image: &BTreeMap<&ImageId, Vec<MeasureRef<'_>>>,
    catalog: &ImageCatalog,
    cache: &mut ImageCache<O>,
    tolerance: Real,
    progress: &mut dyn ProgressSink,
) -> CoverageReport {
    let mut report = CoverageReport::default();
    let mut jobs: Vec<(&ImageId, Vec<Pt2>, FrameExtent)> = Vec::with_capacity(by_image.len());

    progress.start("Evaluating coverage", by_image.len());
    for (&image, measures) in by_image {
        progress.advance(1);
        let Some(path) = catalog.file_name(image) else {
            continue;
        };
        match cache.with_image(path, |h| h.extent()) {
            Ok(extent) => {
                let coords = measures.iter().map(MeasureRef::coordinate).collect();
                jobs.push((image, coords, extent));
            }
            Err(e) => {
                warn!(image = %image, error = %e, "skipping coverage check");
                report.resource_faults.insert(image.clone(), e.to_string());
            }
        }
    }

    report.findings = jobs
        .par_iter()
        .map(|(image, coords, extent)| {
            let finding = CoverageFinding::new(control_fitness(coords, *extent), tolerance);
            ((*image).clone(), finding)
        })
        .collect();
    progress.finish();

    report
}
