//! Flat-file reports and the text summary of a [`NetworkAudit`].
//!
//! Image rows are `filename<delim>serial`, followed by `<delim>point` for
//! every associated point id. Images without a catalog entry print
//! `UnknownFilename` in place of the file name.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cnet_check::{DegenerateReason, HullStatus, NetworkAudit};
use cnet_core::{ImageCatalog, ImageId};

const UNKNOWN_FILENAME: &str = "UnknownFilename";
const RULE: &str = "--------------------------------------------------------------------------------";

/// Field separator of report rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delimiter {
    Tab,
    Comma,
    Space,
    Custom(String),
}

impl Delimiter {
    pub fn as_str(&self) -> &str {
        match self {
            Delimiter::Tab => "\t",
            Delimiter::Comma => ",",
            Delimiter::Space => " ",
            Delimiter::Custom(s) => s,
        }
    }
}

/// Which finding categories get a report file and a summary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Categories {
    pub single_measure: bool,
    pub no_lat_lon: bool,
    pub no_control: bool,
    pub no_cube: bool,
    pub single_cube: bool,
    pub low_coverage: bool,
}

impl Default for Categories {
    fn default() -> Self {
        Self {
            single_measure: true,
            no_lat_lon: true,
            no_control: true,
            no_cube: true,
            single_cube: true,
            low_coverage: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Prepended verbatim to every report file name; may contain a directory.
    pub prefix: String,
    pub delimiter: Delimiter,
    pub categories: Categories,
    /// Network file name as shown in the summary.
    pub cnet_name: String,
    /// Image list file name as shown in the summary.
    pub list_name: String,
}

/// Files written and the human-readable summary.
#[derive(Debug, Clone, Default)]
pub struct Report {
    pub files: Vec<PathBuf>,
    /// `(keyword, count)` pairs of every reported category.
    pub results: Vec<(&'static str, usize)>,
    pub summary: String,
}

/// `filename<delim>serial` for one image.
pub fn image_row(catalog: &ImageCatalog, id: &ImageId, delimiter: &str) -> String {
    let name = catalog
        .file_name(id)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| UNKNOWN_FILENAME.to_string());
    format!("{name}{delimiter}{id}")
}

/// [`image_row`] followed by the given point ids.
pub fn image_row_with_points<'a, I>(
    catalog: &ImageCatalog,
    id: &ImageId,
    points: I,
    delimiter: &str,
) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut row = image_row(catalog, id, delimiter);
    for point in points {
        row.push_str(delimiter);
        row.push_str(point);
    }
    row
}

struct Writer<'a> {
    catalog: &'a ImageCatalog,
    options: &'a ReportOptions,
    report: Report,
}

impl Writer<'_> {
    fn path(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}{}", self.options.prefix, name))
    }

    fn delim(&self) -> &str {
        self.options.delimiter.as_str()
    }

    fn write_rows(&mut self, name: &str, rows: &[String]) -> Result<PathBuf> {
        let path = self.path(name);
        let mut text = String::new();
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        fs::write(&path, text).with_context(|| format!("cannot write {}", path.display()))?;
        self.report.files.push(path.clone());
        Ok(path)
    }

    fn point_rows(&self, by_image: &BTreeMap<ImageId, BTreeSet<String>>) -> Vec<String> {
        by_image
            .iter()
            .map(|(id, points)| image_row_with_points(self.catalog, id, points, self.delim()))
            .collect()
    }

    fn id_rows<'i>(&self, ids: impl IntoIterator<Item = &'i ImageId>) -> Vec<String> {
        ids.into_iter()
            .map(|id| image_row(self.catalog, id, self.delim()))
            .collect()
    }

    fn section(&mut self) {
        self.report.summary.push_str(RULE);
        self.report.summary.push('\n');
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.report.summary.push_str(text.as_ref());
        self.report.summary.push('\n');
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn plural(n: usize, one: &'static str, many: &'static str) -> &'static str {
    if n == 1 {
        one
    } else {
        many
    }
}

/// Write every enabled report file for `audit` and compose the summary.
///
/// # Errors
///
/// Fails on the first report file that cannot be written.
pub fn write_reports(
    audit: &NetworkAudit,
    catalog: &ImageCatalog,
    options: &ReportOptions,
) -> Result<Report> {
    let mut w = Writer {
        catalog,
        options,
        report: Report::default(),
    };

    write_islands(&mut w, audit)?;
    if options.categories.single_measure {
        write_single_measure(&mut w, audit)?;
    }
    if options.categories.no_lat_lon {
        write_no_lat_lon(&mut w, audit)?;
    }
    if options.categories.low_coverage {
        write_low_coverage(&mut w, audit)?;
    }
    if options.categories.no_control {
        write_no_control(&mut w, audit)?;
    }
    if options.categories.no_cube {
        write_no_cube(&mut w, audit)?;
    }
    if options.categories.single_cube {
        write_single_cube(&mut w, audit)?;
    }
    write_resource_faults(&mut w, audit);
    w.section();

    Ok(w.report)
}

/// One file per island listing its cataloged images; islands without any
/// cataloged image get no file.
fn write_islands(w: &mut Writer<'_>, audit: &NetworkAudit) -> Result<()> {
    for (n, island) in audit.islands.iter().enumerate() {
        let rows = w.id_rows(island.iter().filter(|id| w.catalog.contains(id)));
        if !rows.is_empty() {
            w.write_rows(&format!("Island.{}", n + 1), &rows)?;
        }
    }

    w.report.results.push(("Islands", audit.islands.len()));
    w.section();
    match audit.islands.len() {
        0 => {
            let text = format!(
                "There are no control points in the provided Control Network [{}]",
                w.options.cnet_name
            );
            w.line(text);
        }
        1 => w.line("The cubes are fully connected by the Control Network."),
        n => {
            w.line("The cubes are NOT fully connected by the Control Network.");
            w.line(format!("There are {n} disjoint sets of cubes."));
        }
    }
    Ok(())
}

fn write_single_measure(w: &mut Writer<'_>, audit: &NetworkAudit) -> Result<()> {
    let found = &audit.catalog.single_measure;
    if found.is_empty() {
        return Ok(());
    }
    let rows = w.point_rows(found);
    let path = w.write_rows("SinglePointCubes.txt", &rows)?;

    let n = found.len();
    w.report.results.push(("SingleMeasure", n));
    w.section();
    w.line(format!(
        "There {} {n} {} in Control Points with only a single Control Measure.",
        plural(n, "is", "are"),
        plural(n, "cube", "cubes"),
    ));
    w.line(format!(
        "The serial numbers of these measures are listed in [{}]",
        file_name(&path)
    ));
    Ok(())
}

fn write_no_lat_lon(w: &mut Writer<'_>, audit: &NetworkAudit) -> Result<()> {
    let Some(reproj) = audit.reprojection.as_ref() else {
        return Ok(());
    };
    if reproj.flagged.is_empty() {
        return Ok(());
    }
    let rows = w.point_rows(&reproj.flagged);
    let path = w.write_rows("NoLatLon.txt", &rows)?;

    let n = reproj.flagged.len();
    w.report.results.push(("NoLatLonCubes", n));
    w.section();
    w.line(format!(
        "There are {n} serial numbers in the Control Network which are listed in the input list and cannot compute latitude and longitudes."
    ));
    w.line(format!(
        "These serial numbers, filenames, and control points are listed in [{}]",
        file_name(&path)
    ));
    Ok(())
}

fn write_low_coverage(w: &mut Writer<'_>, audit: &NetworkAudit) -> Result<()> {
    let flagged: Vec<_> = audit.low_coverage().collect();
    if flagged.is_empty() {
        return Ok(());
    }
    let delim = w.delim().to_string();
    let rows: Vec<String> = flagged
        .iter()
        .map(|(id, f)| format!("{}{delim}{}", image_row(w.catalog, id, &delim), f.hull.fitness))
        .collect();
    let path = w.write_rows("LowCoverage.txt", &rows)?;

    w.report.results.push(("LowCoverage", flagged.len()));
    for (id, finding) in &flagged {
        w.section();
        w.line(format!(
            "Cube {id} has a convex hull / format ratio of: {}",
            finding.hull.fitness
        ));
        match finding.hull.status {
            HullStatus::Degenerate { reason } => w.line(degenerate_explanation(reason)),
            HullStatus::Measured => w.line(format!(
                "which doesn't meet the tolerance of: {}.",
                audit.tolerance
            )),
        }
    }
    w.line(format!(
        "These serial numbers and ratios are listed in [{}]",
        file_name(&path)
    ));
    Ok(())
}

fn degenerate_explanation(reason: DegenerateReason) -> String {
    match reason {
        DegenerateReason::TooFewPoints { ring_points } => format!(
            "because its measures close a ring of only {ring_points} points, fewer than {}.",
            cnet_check::MIN_RING_POINTS
        ),
        DegenerateReason::Collinear => {
            "because its measures are coincident or collinear.".to_string()
        }
        DegenerateReason::EmptyFrame => "because its frame has no samples or lines.".to_string(),
    }
}

fn write_no_control(w: &mut Writer<'_>, audit: &NetworkAudit) -> Result<()> {
    let found = &audit.catalog.no_control;
    if found.is_empty() {
        return Ok(());
    }
    let rows = w.id_rows(found);
    let path = w.write_rows("NoControl.txt", &rows)?;

    w.report.results.push(("NoControl", found.len()));
    w.section();
    w.line(format!(
        "There are {} cubes in the input list [{}] which do not exist or are ignored in the Control Network [{}]",
        found.len(),
        w.options.list_name,
        w.options.cnet_name
    ));
    w.line(format!("These cubes are listed in [{}]", file_name(&path)));
    Ok(())
}

fn write_no_cube(w: &mut Writer<'_>, audit: &NetworkAudit) -> Result<()> {
    let found = &audit.catalog.no_cube;
    if found.is_empty() {
        return Ok(());
    }
    let rows: Vec<String> = found
        .iter()
        .map(|u| format!("{} (Valid Measures: {})", u.id, u.valid_measures))
        .collect();
    let path = w.write_rows("NoCube.txt", &rows)?;

    w.report.results.push(("NoCube", found.len()));
    w.section();
    w.line(format!(
        "There are {} serial numbers in the Control Net [{}]",
        found.len(),
        w.options.cnet_name
    ));
    w.line(format!(
        "which do not exist in the input list [{}]",
        w.options.list_name
    ));
    w.line(format!(
        "These serial numbers are listed in [{}]",
        file_name(&path)
    ));
    Ok(())
}

fn write_single_cube(w: &mut Writer<'_>, audit: &NetworkAudit) -> Result<()> {
    let found = &audit.catalog.single_cube;
    if found.is_empty() {
        return Ok(());
    }
    let rows = w.id_rows(found);
    let path = w.write_rows("SingleCube.txt", &rows)?;

    w.report.results.push(("SingleCube", found.len()));
    w.section();
    w.line(format!(
        "There are {} serial numbers in the Control Net [{}] which only exist in one Control Measure.",
        found.len(),
        w.options.cnet_name
    ));
    w.line(format!(
        "These serial numbers are listed in [{}]",
        file_name(&path)
    ));
    Ok(())
}

fn write_resource_faults(w: &mut Writer<'_>, audit: &NetworkAudit) {
    if audit.resource_faults.is_empty() {
        return;
    }
    w.report
        .results
        .push(("ResourceFaults", audit.resource_faults.len()));
    w.section();
    let mut lines = vec![format!(
        "{} cubes could not be opened and were skipped by the geometric checks:",
        audit.resource_faults.len()
    )];
    lines.extend(
        audit
            .resource_faults
            .iter()
            .map(|(id, why)| format!("  {id}: {why}")),
    );
    w.line(lines.join("\n"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ImageCatalog {
        ImageCatalog::from_entries([(ImageId::from("A"), PathBuf::from("/data/a.cub"))]).unwrap()
    }

    #[test]
    fn rows_resolve_filenames_or_fall_back() {
        let cat = catalog();
        assert_eq!(image_row(&cat, &"A".into(), ","), "/data/a.cub,A");
        assert_eq!(image_row(&cat, &"Z".into(), "\t"), "UnknownFilename\tZ");
    }

    #[test]
    fn point_ids_follow_the_image_row() {
        let cat = catalog();
        let points: BTreeSet<String> = ["p2", "p1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            image_row_with_points(&cat, &"A".into(), &points, " | "),
            "/data/a.cub | A | p1 | p2"
        );
    }

    #[test]
    fn custom_delimiter_is_used_verbatim() {
        assert_eq!(Delimiter::Custom("::".to_string()).as_str(), "::");
        assert_eq!(Delimiter::Tab.as_str(), "\t");
    }

    #[test]
    fn degenerate_hulls_name_their_reason() {
        let few = degenerate_explanation(DegenerateReason::TooFewPoints { ring_points: 3 });
        assert_eq!(
            few,
            "because its measures close a ring of only 3 points, fewer than 4."
        );
        assert!(degenerate_explanation(DegenerateReason::Collinear).contains("collinear"));
        assert!(degenerate_explanation(DegenerateReason::EmptyFrame).contains("no samples or lines"));
    }
}
