// Fetch — retrieve a named file from a list of mirrors
//
// Mirrors are base URLs ending in '/'. The full URL of a resource is the
// mirror joined with the filename. Mirrors are tried in order and the first
// success wins; a failing mirror is logged and the next one is tried. Only
// when every mirror has failed does the caller see an error, carrying the
// reason each mirror gave.
//
// Bytes are streamed to `<dest>.part` and renamed onto `dest` once the body
// is complete, so an interrupted transfer never leaves a partial file at the
// path the checksum gate looks at.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;

/// Why one mirror could not deliver a file.
#[derive(Debug, Clone)]
pub struct MirrorFailure {
    pub url: String,
    pub reason: String,
}

impl fmt::Display for MirrorFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.url, self.reason)
    }
}

/// Errors from a fetch operation.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The resource has no mirrors to try.
    #[error("no mirrors configured for {filename}")]
    NoMirrors { filename: String },

    /// Every mirror was tried and none delivered the file.
    #[error("all mirrors failed for {filename} ({})", join_failures(.attempts))]
    AllMirrorsFailed {
        filename: String,
        attempts: Vec<MirrorFailure>,
    },

    /// A mirror is not a valid base URL.
    #[error("invalid mirror '{mirror}': {reason}")]
    InvalidMirror { mirror: String, reason: String },

    /// The HTTP client could not be constructed.
    #[error("http client: {0}")]
    Client(#[source] reqwest::Error),

    /// Local I/O failure while writing the destination file.
    #[error("writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn join_failures(attempts: &[MirrorFailure]) -> String {
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Source of remote files.
///
/// The loader only talks to this trait, so tests can substitute a local or
/// counting implementation for the network.
pub trait Fetcher: Send + Sync {
    /// Fetch `filename` from the first mirror that serves it and write it to
    /// `dest`. `dest`'s parent directory already exists.
    fn fetch(&self, mirrors: &[&str], filename: &str, dest: &Path) -> Result<(), FetchError>;
}

/// The path a download is staged at before being renamed onto `dest`.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

/// Resolve `filename` against a mirror base URL.
pub fn mirror_url(mirror: &str, filename: &str) -> Result<Url, FetchError> {
    Url::parse(mirror)
        .and_then(|base| base.join(filename))
        .map_err(|e| FetchError::InvalidMirror {
            mirror: mirror.to_string(),
            reason: e.to_string(),
        })
}

// HttpFetcher — blocking reqwest client
//
// A single client is built once and reused for every request so connections
// to the same mirror are pooled.

/// Blocking HTTP(S) fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

/// Outcome of a single mirror attempt that did not succeed.
enum AttemptError {
    /// Remote side failed; try the next mirror.
    Remote(String),
    /// Local side failed; no mirror can help.
    Local(io::Error),
}

impl HttpFetcher {
    /// Per-request timeout used by [`HttpFetcher::new`].
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }

    /// Build a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("mnists/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    fn fetch_one(&self, url: Url, dest: &Path) -> Result<(), AttemptError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| AttemptError::Remote(e.to_string()))?;

        let part = part_path(dest);
        let mut file = File::create(&part).map_err(AttemptError::Local)?;
        if let Err(e) = response.copy_to(&mut file) {
            drop(file);
            let _ = fs::remove_file(&part);
            return Err(AttemptError::Remote(e.to_string()));
        }
        drop(file);
        fs::rename(&part, dest).map_err(AttemptError::Local)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, mirrors: &[&str], filename: &str, dest: &Path) -> Result<(), FetchError> {
        if mirrors.is_empty() {
            return Err(FetchError::NoMirrors {
                filename: filename.to_string(),
            });
        }

        let mut attempts = Vec::with_capacity(mirrors.len());
        for mirror in mirrors {
            let url = match mirror_url(mirror, filename) {
                Ok(url) => url,
                Err(e) => {
                    log::warn!("skipping mirror {mirror}: {e}");
                    attempts.push(MirrorFailure {
                        url: format!("{mirror}{filename}"),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            log::info!("downloading {url}");
            match self.fetch_one(url.clone(), dest) {
                Ok(()) => return Ok(()),
                Err(AttemptError::Remote(reason)) => {
                    log::warn!("failed to download {url}: {reason}");
                    attempts.push(MirrorFailure {
                        url: url.to_string(),
                        reason,
                    });
                }
                Err(AttemptError::Local(source)) => {
                    return Err(FetchError::Io {
                        path: dest.to_path_buf(),
                        source,
                    });
                }
            }
        }

        Err(FetchError::AllMirrorsFailed {
            filename: filename.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_url_join() {
        let url = mirror_url("https://ossci-datasets.s3.amazonaws.com/mnist/", "t10k-labels-idx1-ubyte.gz")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://ossci-datasets.s3.amazonaws.com/mnist/t10k-labels-idx1-ubyte.gz"
        );
        assert!(mirror_url("not a url", "x.gz").is_err());
    }

    #[test]
    fn test_part_path() {
        let p = part_path(Path::new("/tmp/mnists/MNIST/train-images-idx3-ubyte.gz"));
        assert_eq!(p, Path::new("/tmp/mnists/MNIST/train-images-idx3-ubyte.gz.part"));
    }

    #[test]
    fn test_no_mirrors() {
        let fetcher = HttpFetcher::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = fetcher.fetch(&[], "x.gz", &dir.path().join("x.gz")).unwrap_err();
        assert!(matches!(err, FetchError::NoMirrors { .. }));
    }

    #[test]
    fn test_all_mirrors_failed_reports_each() {
        let fetcher = HttpFetcher::with_timeout(Duration::from_secs(2)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.gz");
        // neither mirror parses as a URL, so nothing touches the network
        let err = fetcher.fetch(&["::bad", "also bad"], "x.gz", &dest).unwrap_err();
        match err {
            FetchError::AllMirrorsFailed { filename, attempts } => {
                assert_eq!(filename, "x.gz");
                assert_eq!(attempts.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dest.exists());
    }
}
