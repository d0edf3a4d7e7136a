//! Image catalog: the immutable image id → backing file registry.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};

use crate::{ImageId, ImageLabel};

/// Registry of the images an audit is allowed to open.
///
/// Built once per run and passed by reference. Iteration follows insertion
/// (list) order.
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    order: Vec<ImageId>,
    files: BTreeMap<ImageId, PathBuf>,
}

impl ImageCatalog {
    /// Build from explicit `(id, path)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if an id is empty or appears more than once.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ImageId, PathBuf)>,
    {
        let mut catalog = Self::default();
        for (id, path) in entries {
            ensure!(!id.as_str().is_empty(), "empty image id for {}", path.display());
            ensure!(
                !catalog.files.contains_key(&id),
                "image id {} is listed more than once ({})",
                id,
                path.display()
            );
            catalog.order.push(id.clone());
            catalog.files.insert(id, path);
        }
        Ok(catalog)
    }

    /// Build from label files, taking each image id from its label.
    pub fn from_label_files<I, P>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut entries = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let label = ImageLabel::read(path)?;
            entries.push((label.serial_number, path.to_path_buf()));
        }
        Self::from_entries(entries)
    }

    /// Build from a list file with one label path per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. Relative paths are
    /// resolved against the list file's directory.
    pub fn from_list_file(list: &Path) -> Result<Self> {
        let text = fs::read_to_string(list)
            .with_context(|| format!("cannot read image list {}", list.display()))?;
        let base = list.parent().unwrap_or_else(|| Path::new(""));
        let paths: Vec<PathBuf> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| {
                let p = Path::new(l);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    base.join(p)
                }
            })
            .collect();
        Self::from_label_files(paths)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        self.files.contains_key(id)
    }

    /// Backing file of an image, if cataloged.
    pub fn file_name(&self, id: &ImageId) -> Option<&Path> {
        self.files.get(id).map(PathBuf::as_path)
    }

    /// Image ids in list order.
    pub fn ids(&self) -> impl Iterator<Item = &ImageId> + '_ {
        self.order.iter()
    }
}
