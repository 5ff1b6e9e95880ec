// Extract — pull a single member out of a zip archive
//
// Composite datasets (EMNIST) ship every variant inside one archive. Members
// are stored under a directory prefix (`gzip/emnist-digits-...`), so lookup
// matches on the final path component only. Exactly one member must match.
//
// The extracted file gets the modification time recorded in the archive. Zip
// timestamps carry no time zone and are interpreted as UTC.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use time::PrimitiveDateTime;
use zip::ZipArchive;

/// Errors from an extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No archive entry has the requested final path component.
    #[error("no member named '{member}' in {}", .archive.display())]
    NoMember { archive: PathBuf, member: String },

    /// More than one archive entry has the requested final path component.
    #[error("{count} members named '{member}' in {}", .archive.display())]
    AmbiguousMember {
        archive: PathBuf,
        member: String,
        count: usize,
    },

    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Extracts archive members to disk.
pub trait Extractor: Send + Sync {
    /// Extract the member whose final path component is `member` into
    /// `dest_dir/<member>` and return that path. `dest_dir` already exists.
    fn extract_member(
        &self,
        archive: &Path,
        member: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, ExtractError>;
}

/// [`Extractor`] for zip archives.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ZipExtractor {
    pub fn new() -> Self {
        Self
    }
}

fn basename(entry: &str) -> &str {
    entry.rsplit('/').next().unwrap_or(entry)
}

impl Extractor for ZipExtractor {
    fn extract_member(
        &self,
        archive: &Path,
        member: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, ExtractError> {
        let mut zip = ZipArchive::new(File::open(archive)?)?;

        let matches = zip
            .file_names()
            .filter(|name| !name.ends_with('/') && basename(name) == member)
            .map(str::to_string)
            .collect::<Vec<_>>();
        let entry = match matches.as_slice() {
            [] => {
                return Err(ExtractError::NoMember {
                    archive: archive.to_path_buf(),
                    member: member.to_string(),
                })
            }
            [entry] => entry,
            _ => {
                return Err(ExtractError::AmbiguousMember {
                    archive: archive.to_path_buf(),
                    member: member.to_string(),
                    count: matches.len(),
                })
            }
        };

        let mut src = zip.by_name(entry)?;
        let modified: Option<zip::DateTime> = src.last_modified().into();

        let dest = dest_dir.join(member);
        log::info!("extracting {entry} to {}", dest.display());
        let mut out = File::create(&dest)?;
        if let Err(e) = io::copy(&mut src, &mut out) {
            drop(out);
            let _ = fs::remove_file(&dest);
            return Err(e.into());
        }

        if let Some(mtime) = modified.and_then(zip_time_to_system) {
            out.set_modified(mtime)?;
        }
        Ok(dest)
    }
}

/// Convert a zip (MS-DOS) timestamp to a `SystemTime`, reading it as UTC.
///
/// `None` if the stored fields do not form a valid date and time.
fn zip_time_to_system(dt: zip::DateTime) -> Option<SystemTime> {
    let naive = PrimitiveDateTime::try_from(dt).ok()?;
    Some(naive.assume_utc().into())
}
