// IdxDataset — download, unzip and load one dataset described by the catalog
//
// The pipeline is gated at every step by the MD5 of the file on disk:
//
//   download(force)   fetch each resource unless it is already valid
//   unzip(force)      (archive members only) extract each resource from the
//                     parent archive unless it is already valid
//   load(transpose)   verify, decode and store all four tensors
//
// `load` is all-or-nothing. All four files are verified and decoded into
// locals, the per-split sample counts are cross-checked, and only then are
// the slots overwritten. A failed load leaves a previously loaded dataset
// exactly as it was.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use mnists_core::Tensor;

use crate::catalog::{DatasetDescriptor, ResourceKind};
use crate::checksum::check_file_integrity;
use crate::dataset::{Split, SplitView};
use crate::error::{Error, Result};
use crate::extract::{Extractor, ZipExtractor};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::idx::read_idx_file;

const DOWNLOAD_HINT: &str = "use download() to fetch it";
const UNZIP_HINT: &str = "use unzip() to extract it from the archive";
const ARCHIVE_HINT: &str = "use CompositeDataset::download() to fetch the archive";

/// Options for [`IdxDataset::open`].
#[derive(Debug, Clone)]
pub struct DatasetOptions {
    /// Where the files live. `None` means `<tmp>/mnists/<name>`.
    pub target_dir: Option<PathBuf>,
    /// Download missing or invalid files.
    pub download: bool,
    /// Download every file, even valid ones. Implies `download`.
    pub force_download: bool,
    /// Load the tensors once the files are in place.
    pub load: bool,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            target_dir: None,
            download: true,
            force_download: false,
            load: true,
        }
    }
}

impl DatasetOptions {
    pub fn target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = Some(dir.into());
        self
    }

    pub fn download(mut self, d: bool) -> Self {
        self.download = d;
        self
    }

    pub fn force_download(mut self, f: bool) -> Self {
        self.force_download = f;
        self
    }

    pub fn load(mut self, l: bool) -> Self {
        self.load = l;
        self
    }
}

/// The four tensors of a loaded dataset.
#[derive(Debug, Clone, Default)]
pub struct Splits {
    pub train_images: Option<Tensor>,
    pub train_labels: Option<Tensor>,
    pub test_images: Option<Tensor>,
    pub test_labels: Option<Tensor>,
}

impl Splits {
    pub fn is_complete(&self) -> bool {
        self.train_images.is_some()
            && self.train_labels.is_some()
            && self.test_images.is_some()
            && self.test_labels.is_some()
    }
}

/// Archive a composite child extracts its files from.
#[derive(Debug, Clone)]
struct ArchiveSource {
    path: PathBuf,
    md5: &'static str,
}

/// A dataset on disk and, once loaded, in memory.
pub struct IdxDataset {
    descriptor: &'static DatasetDescriptor,
    target_dir: PathBuf,
    archive: Option<ArchiveSource>,
    // Built on first download when not supplied.
    fetcher: Option<Box<dyn Fetcher>>,
    extractor: Box<dyn Extractor>,
    splits: Splits,
}

impl fmt::Debug for IdxDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdxDataset")
            .field("name", &self.descriptor.name)
            .field("target_dir", &self.target_dir)
            .field("archive", &self.archive)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl IdxDataset {
    /// A dataset rooted at `target_dir`. Nothing is touched on disk.
    pub fn new(descriptor: &'static DatasetDescriptor, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            descriptor,
            target_dir: target_dir.into(),
            archive: None,
            fetcher: None,
            extractor: Box::new(ZipExtractor),
            splits: Splits::default(),
        }
    }

    /// A dataset whose files are extracted from `archive` rather than
    /// downloaded. `archive_md5` is checked before every extraction.
    pub fn composite_child(
        descriptor: &'static DatasetDescriptor,
        target_dir: impl Into<PathBuf>,
        archive: impl Into<PathBuf>,
        archive_md5: &'static str,
    ) -> Self {
        let mut ds = Self::new(descriptor, target_dir);
        ds.archive = Some(ArchiveSource {
            path: archive.into(),
            md5: archive_md5,
        });
        ds
    }

    /// Construct, then download and load as `options` ask.
    ///
    /// ```no_run
    /// use mnists_data::{catalog, DatasetOptions, IdxDataset};
    /// let mnist = IdxDataset::open(&catalog::MNIST, DatasetOptions::default())?;
    /// assert_eq!(mnist.train_images()?.dims(), &[60000, 28, 28]);
    /// # Ok::<(), mnists_data::Error>(())
    /// ```
    pub fn open(descriptor: &'static DatasetDescriptor, options: DatasetOptions) -> Result<Self> {
        let target_dir = options
            .target_dir
            .unwrap_or_else(|| descriptor.default_dir());
        let mut ds = Self::new(descriptor, target_dir);
        if options.download || options.force_download {
            ds.download(options.force_download)?;
        }
        if options.load {
            ds.load(false)?;
        }
        Ok(ds)
    }

    /// Replace the fetcher used by [`download`](Self::download).
    pub fn with_fetcher(mut self, fetcher: Box<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the extractor used by [`unzip`](Self::unzip).
    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &'static DatasetDescriptor {
        self.descriptor
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn archive_path(&self) -> Option<&Path> {
        self.archive.as_ref().map(|a| a.path.as_path())
    }

    pub fn classes(&self) -> &'static [&'static str] {
        self.descriptor.classes
    }

    /// Where the file for `kind` lives on disk.
    pub fn resource_path(&self, kind: ResourceKind) -> PathBuf {
        self.target_dir.join(self.descriptor.resource(kind).filename)
    }

    // Pipeline

    /// Fetch every resource that is missing or fails its checksum, or every
    /// resource when `force` is set.
    ///
    /// Without an injected fetcher, the HTTP client is only built once a
    /// resource actually needs fetching.
    pub fn download(&mut self, force: bool) -> Result<()> {
        let descriptor = self.descriptor;
        fs::create_dir_all(&self.target_dir)?;
        for r in &descriptor.resources {
            let dest = self.target_dir.join(r.filename);
            if !force && check_file_integrity(&dest, r.md5) {
                log::debug!("{} {} is up to date", descriptor.name, r.kind.name());
                continue;
            }
            log::info!("fetching {} {} into {}", descriptor.name, r.kind.name(), dest.display());
            self.fetcher(r.kind.name())?
                .fetch(descriptor.mirrors, r.filename, &dest)
                .map_err(|source| Error::Download {
                    resource: r.kind.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn fetcher(&mut self, resource: &str) -> Result<&dyn Fetcher> {
        let fetcher: Box<dyn Fetcher> = match self.fetcher.take() {
            Some(f) => f,
            None => Box::new(HttpFetcher::new().map_err(|source| Error::Download {
                resource: resource.to_string(),
                source,
            })?),
        };
        Ok(&**self.fetcher.insert(fetcher))
    }

    /// Extract every resource that is missing or fails its checksum (or every
    /// resource when `force` is set) from the parent archive.
    ///
    /// The archive's own checksum is verified on every call.
    pub fn unzip(&mut self, force: bool) -> Result<()> {
        let archive = self
            .archive
            .as_ref()
            .ok_or_else(|| Error::NotComposite(self.descriptor.name.to_string()))?;

        fs::create_dir_all(&self.target_dir)?;
        if !check_file_integrity(&archive.path, archive.md5) {
            let filename = archive.path.file_name().unwrap_or_default().to_string_lossy();
            return Err(Error::Integrity {
                resource: format!("{} archive {filename}", self.descriptor.name),
                path: archive.path.clone(),
                hint: ARCHIVE_HINT,
            });
        }

        for r in &self.descriptor.resources {
            let dest = self.target_dir.join(r.filename);
            if !force && check_file_integrity(&dest, r.md5) {
                log::debug!("{} {} is up to date", self.descriptor.name, r.kind.name());
                continue;
            }
            self.extractor
                .extract_member(&archive.path, r.filename, &self.target_dir)
                .map_err(|source| Error::Extract {
                    resource: r.kind.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Verify and decode all four files. With `transpose`, the last two axes
    /// of both image tensors are swapped; labels are never touched.
    pub fn load(&mut self, transpose: bool) -> Result<()> {
        let mut train_images = self.read_resource(ResourceKind::TrainImages)?;
        let train_labels = self.read_resource(ResourceKind::TrainLabels)?;
        let mut test_images = self.read_resource(ResourceKind::TestImages)?;
        let test_labels = self.read_resource(ResourceKind::TestLabels)?;

        if transpose {
            train_images = train_images.swap_last_two_axes()?;
            test_images = test_images.swap_last_two_axes()?;
        }

        let name = self.descriptor.name;
        let classes = self.descriptor.classes;
        SplitView::new(name, Split::Train, &train_images, &train_labels, classes)?;
        SplitView::new(name, Split::Test, &test_images, &test_labels, classes)?;

        log::info!(
            "loaded {name}: train {} / test {}",
            train_images.shape(),
            test_images.shape()
        );
        self.splits = Splits {
            train_images: Some(train_images),
            train_labels: Some(train_labels),
            test_images: Some(test_images),
            test_labels: Some(test_labels),
        };
        Ok(())
    }

    fn read_resource(&self, kind: ResourceKind) -> Result<Tensor> {
        let r = self.descriptor.resource(kind);
        let path = self.target_dir.join(r.filename);
        if !check_file_integrity(&path, r.md5) {
            return Err(Error::Integrity {
                resource: format!("{} {}", self.descriptor.name, kind.name()),
                path,
                hint: if self.archive.is_some() {
                    UNZIP_HINT
                } else {
                    DOWNLOAD_HINT
                },
            });
        }
        log::debug!("decoding {}", path.display());
        read_idx_file(&path)
    }

    // Accessors

    pub fn is_loaded(&self) -> bool {
        self.splits.is_complete()
    }

    pub fn splits(&self) -> &Splits {
        &self.splits
    }

    pub fn train_images(&self) -> Result<&Tensor> {
        self.splits.train_images.as_ref().ok_or(Error::NotLoaded)
    }

    pub fn train_labels(&self) -> Result<&Tensor> {
        self.splits.train_labels.as_ref().ok_or(Error::NotLoaded)
    }

    pub fn test_images(&self) -> Result<&Tensor> {
        self.splits.test_images.as_ref().ok_or(Error::NotLoaded)
    }

    pub fn test_labels(&self) -> Result<&Tensor> {
        self.splits.test_labels.as_ref().ok_or(Error::NotLoaded)
    }

    /// One split as a sample-indexed [`Dataset`](crate::Dataset).
    pub fn split(&self, split: Split) -> Result<SplitView<'_>> {
        let (images, labels) = match split {
            Split::Train => (self.train_images()?, self.train_labels()?),
            Split::Test => (self.test_images()?, self.test_labels()?),
        };
        SplitView::new(self.descriptor.name, split, images, labels, self.descriptor.classes)
    }
}
