// CompositeDataset — one archive, several variant datasets
//
// The composite owns the parent directory and the archive inside it:
//
//   <target_dir>/gzip.zip               downloaded by CompositeDataset
//   <target_dir>/<Variant>/<member>.gz  extracted by each child IdxDataset
//
// Children are plain IdxDatasets built with `IdxDataset::composite_child`.
// The parent's directory, archive path and archive checksum are passed to
// each child explicitly when it is created; nothing is shared afterwards.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalog::CompositeDescriptor;
use crate::checksum::check_file_integrity;
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::loader::IdxDataset;

/// Options for [`CompositeDataset::variant_with`].
#[derive(Debug, Clone)]
pub struct VariantOptions {
    /// Variant directory. `None` means `<parent>/<variant name>`.
    pub target_dir: Option<PathBuf>,
    /// Archive to extract from. `None` means the parent's archive.
    pub archive: Option<PathBuf>,
    /// Extract missing or invalid files.
    pub unzip: bool,
    /// Extract every file, even valid ones. Implies `unzip`.
    pub force_unzip: bool,
    /// Load the tensors once the files are in place.
    pub load: bool,
    /// Swap the last two image axes on load. EMNIST images are stored
    /// transposed relative to MNIST, so this defaults to true.
    pub transpose: bool,
}

impl Default for VariantOptions {
    fn default() -> Self {
        Self {
            target_dir: None,
            archive: None,
            unzip: true,
            force_unzip: false,
            load: true,
            transpose: true,
        }
    }
}

impl VariantOptions {
    pub fn target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    pub fn archive(mut self, path: impl Into<PathBuf>) -> Self {
        self.archive = Some(path.into());
        self
    }

    pub fn unzip(mut self, u: bool) -> Self {
        self.unzip = u;
        self
    }

    pub fn force_unzip(mut self, f: bool) -> Self {
        self.force_unzip = f;
        self
    }

    pub fn load(mut self, l: bool) -> Self {
        self.load = l;
        self
    }

    pub fn transpose(mut self, t: bool) -> Self {
        self.transpose = t;
        self
    }
}

/// A composite dataset: the archive, and a factory for its variants.
pub struct CompositeDataset {
    descriptor: &'static CompositeDescriptor,
    target_dir: PathBuf,
    fetcher: Option<Box<dyn Fetcher>>,
}

impl fmt::Debug for CompositeDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeDataset")
            .field("name", &self.descriptor.name)
            .field("target_dir", &self.target_dir)
            .finish()
    }
}

impl CompositeDataset {
    pub fn new(descriptor: &'static CompositeDescriptor, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            descriptor,
            target_dir: target_dir.into(),
            fetcher: None,
        }
    }

    /// A composite rooted at `<tmp>/mnists/<name>`.
    pub fn in_default_dir(descriptor: &'static CompositeDescriptor) -> Self {
        Self::new(descriptor, descriptor.default_dir())
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &'static CompositeDescriptor {
        self.descriptor
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn archive_path(&self) -> PathBuf {
        self.target_dir.join(self.descriptor.archive.filename)
    }

    /// Whether the archive is on disk with the expected checksum.
    pub fn is_downloaded(&self) -> bool {
        check_file_integrity(self.archive_path(), self.descriptor.archive.md5)
    }

    /// Names of the available variants, in catalog order.
    pub fn variant_names(&self) -> impl Iterator<Item = &'static str> {
        self.descriptor.variants.iter().map(|v| v.name)
    }

    /// Fetch the archive unless it is already valid, or always with `force`.
    pub fn download(&mut self, force: bool) -> Result<()> {
        let resource = format!("{} archive", self.descriptor.name);
        fs::create_dir_all(&self.target_dir)?;
        let dest = self.archive_path();
        if !force && check_file_integrity(&dest, self.descriptor.archive.md5) {
            log::debug!("{resource} is up to date");
            return Ok(());
        }

        let fetcher: Box<dyn Fetcher> = match self.fetcher.take() {
            Some(f) => f,
            None => Box::new(HttpFetcher::new().map_err(|source| Error::Download {
                resource: resource.clone(),
                source,
            })?),
        };
        log::info!("fetching {resource} into {}", dest.display());
        let result = fetcher
            .fetch(self.descriptor.mirrors, self.descriptor.archive.filename, &dest)
            .map_err(|source| Error::Download { resource, source });
        self.fetcher = Some(fetcher);
        result
    }

    /// Build a variant with default options: extract, then load transposed.
    pub fn variant(&self, name: &str) -> Result<IdxDataset> {
        self.variant_with(name, VariantOptions::default())
    }

    /// Build a variant, then extract and load it as `options` ask.
    pub fn variant_with(&self, name: &str, options: VariantOptions) -> Result<IdxDataset> {
        let descriptor = self
            .descriptor
            .variant(name)
            .ok_or_else(|| Error::UnknownVariant(name.to_string()))?;
        let target_dir = options
            .target_dir
            .unwrap_or_else(|| self.target_dir.join(descriptor.name));
        let archive = options.archive.unwrap_or_else(|| self.archive_path());

        let mut child =
            IdxDataset::composite_child(descriptor, target_dir, archive, self.descriptor.archive.md5);
        if options.unzip || options.force_unzip {
            child.unzip(options.force_unzip)?;
        }
        if options.load {
            child.load(options.transpose)?;
        }
        Ok(child)
    }
}
