// Checksum — MD5 gate in front of every download, extraction and load
//
// A resource is considered present only if the file at its path hashes to the
// digest recorded in the catalog. Digests are compared as lowercase hex,
// case-sensitively. Files are hashed in fixed-size chunks so memory stays
// bounded regardless of file size.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest, Md5};

/// Read buffer size used while hashing.
pub const CHUNK_SIZE: usize = 1 << 20;

/// Compute the MD5 of a file, as 32 lowercase hex characters.
pub fn md5_file(path: impl AsRef<Path>) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Whether `path` is a regular file whose MD5 equals `expected`.
///
/// Missing paths, directories and unreadable files all yield `false`.
pub fn check_file_integrity(path: impl AsRef<Path>, expected: &str) -> bool {
    let path = path.as_ref();
    if !path.is_file() {
        return false;
    }
    match md5_file(path) {
        Ok(digest) => digest == expected,
        Err(e) => {
            log::debug!("could not hash {}: {e}", path.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_md5_known_vectors() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty");
        File::create(&empty).unwrap();
        assert_eq!(md5_file(&empty).unwrap(), "d41d8cd98f00b204e9800998ecf8427e");

        let abc = dir.path().join("abc");
        File::create(&abc).unwrap().write_all(b"abc").unwrap();
        assert_eq!(md5_file(&abc).unwrap(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_md5_spans_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big");
        let data = vec![b'a'; CHUNK_SIZE * 2 + 17];
        File::create(&path).unwrap().write_all(&data).unwrap();

        let expected = format!("{:x}", Md5::digest(&data));
        assert_eq!(md5_file(&path).unwrap(), expected);
    }

    #[test]
    fn test_integrity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc");
        File::create(&path).unwrap().write_all(b"abc").unwrap();

        assert!(check_file_integrity(&path, "900150983cd24fb0d6963f7d28e17f72"));
        // comparison is case-sensitive
        assert!(!check_file_integrity(&path, "900150983CD24FB0D6963F7D28E17F72"));
        assert!(!check_file_integrity(dir.path().join("missing"), "900150983cd24fb0d6963f7d28e17f72"));
        // a directory is never a valid resource
        assert!(!check_file_integrity(dir.path(), "d41d8cd98f00b204e9800998ecf8427e"));
    }

    #[test]
    fn test_one_byte_difference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abd");
        File::create(&path).unwrap().write_all(b"abd").unwrap();
        assert!(!check_file_integrity(&path, "900150983cd24fb0d6963f7d28e17f72"));
    }

    #[test]
    fn test_repeated_calls_agree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train-labels");
        let data: Vec<u8> = (0..=255u8).cycle().take(CHUNK_SIZE + 3).collect();
        File::create(&path).unwrap().write_all(&data).unwrap();

        let first = md5_file(&path).unwrap();
        let second = md5_file(&path).unwrap();
        assert_eq!(first, second);
        assert!(check_file_integrity(&path, &first));
        assert!(check_file_integrity(&path, &first));
        // reading does not touch the file
        assert_eq!(std::fs::read(&path).unwrap(), data);
    }
}
