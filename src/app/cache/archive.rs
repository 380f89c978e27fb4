//! Daily archive extraction
//!
//! Archive members are unpacked flat into the destination directory under
//! their bare file names, so every raster an archive carries becomes
//! visible to [`RasterCache::exists`](super::RasterCache::exists) whatever
//! directory layout the archive uses internally.
//!
//! Each member goes through a temp file and is renamed into place only once
//! fully written; a truncated member never appears under its final name.

use std::fs::File;
use std::path::{Path, PathBuf};

use tar::{Archive, EntryType};
use tracing::{debug, warn};

use crate::errors::{CacheError, CacheResult};

use super::path::PathGenerator;

/// Result of an extraction request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveStatus {
    /// Archive unpacked; number of regular files written
    Extracted { files: usize },
    /// Archive path did not exist, nothing was done
    Missing,
}

/// Blocking archive unpacker, run off the async runtime by the cache
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Unpack every regular file of a tar archive into `destination`
    ///
    /// A missing archive is logged and reported as [`ArchiveStatus::Missing`].
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ArchiveExtraction`] if the archive is unreadable
    /// or a member cannot be written.
    pub fn extract(archive_path: &Path, destination: &Path) -> CacheResult<ArchiveStatus> {
        if !archive_path.exists() {
            warn!(
                "Archive {} does not exist, skipping extraction",
                archive_path.display()
            );
            return Ok(ArchiveStatus::Missing);
        }

        let extraction_error = |source: std::io::Error| CacheError::ArchiveExtraction {
            path: archive_path.to_path_buf(),
            source,
        };

        std::fs::create_dir_all(destination).map_err(extraction_error)?;
        let file = File::open(archive_path).map_err(extraction_error)?;
        let mut archive = Archive::new(file);

        let mut files = 0;
        for entry in archive.entries().map_err(extraction_error)? {
            let mut entry = entry.map_err(extraction_error)?;
            if entry.header().entry_type() != EntryType::Regular {
                continue;
            }

            let member = entry.path().map_err(extraction_error)?.into_owned();
            let Some(target) = flat_target(destination, &member) else {
                debug!("Skipping archive member without file name: {}", member.display());
                continue;
            };

            let temp = PathGenerator::temp_path(&target);
            let expected = entry.size();
            if let Err(e) = entry.unpack(&temp).and_then(|_| check_size(&temp, expected)) {
                warn!("Failed to unpack {}: {}", member.display(), e);
                let _ = std::fs::remove_file(&temp);
                return Err(extraction_error(e));
            }
            if let Err(e) = std::fs::rename(&temp, &target) {
                let _ = std::fs::remove_file(&temp);
                return Err(extraction_error(e));
            }
            files += 1;
        }

        debug!(
            "Extracted {} files from {} into {}",
            files,
            archive_path.display(),
            destination.display()
        );
        Ok(ArchiveStatus::Extracted { files })
    }
}

/// Fail if fewer bytes landed on disk than the member header declares
fn check_size(path: &Path, expected: u64) -> std::io::Result<()> {
    let written = std::fs::metadata(path)?.len();
    if written != expected {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("member truncated: {} of {} bytes", written, expected),
        ));
    }
    Ok(())
}

fn flat_target(destination: &Path, member: &Path) -> Option<PathBuf> {
    member.file_name().map(|name| destination.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build_archive(path: &Path, members: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(file);
        for (name, content) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, content.as_bytes())
                .unwrap();
        }
        builder.finish().unwrap();
    }

    #[test]
    fn test_extract_missing_archive_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let status =
            ArchiveExtractor::extract(&temp_dir.path().join("absent.tar"), temp_dir.path())
                .unwrap();
        assert_eq!(status, ArchiveStatus::Missing);
    }

    #[test]
    fn test_extract_flattens_members() {
        let temp_dir = TempDir::new().unwrap();
        let archive_path = temp_dir.path().join("grs_60_asc_2024-07-22.tar");
        build_archive(
            &archive_path,
            &[
                ("202407200000_acc0060_grs.asc", "a"),
                ("nested/dir/202407200100_acc0060_grs.asc", "b"),
            ],
        );

        let out = temp_dir.path().join("out");
        let status = ArchiveExtractor::extract(&archive_path, &out).unwrap();

        assert_eq!(status, ArchiveStatus::Extracted { files: 2 });
        assert!(out.join("202407200000_acc0060_grs.asc").exists());
        assert_eq!(
            std::fs::read_to_string(out.join("202407200100_acc0060_grs.asc")).unwrap(),
            "b"
        );
        assert!(!out.join("nested").exists());
    }

    #[test]
    fn test_truncated_member_leaves_no_file() {
        let temp_dir = TempDir::new().unwrap();
        let archive_path = temp_dir.path().join("grs_60_asc_2024-07-22.tar");
        let body = "0.1 ".repeat(400);
        build_archive(
            &archive_path,
            &[
                ("202407200000_acc0060_grs.asc", "a"),
                ("202407200100_acc0060_grs.asc", body.as_str()),
            ],
        );

        // Cut inside the second member's data block
        let bytes = std::fs::read(&archive_path).unwrap();
        std::fs::write(&archive_path, &bytes[..1024 + 512 + 100]).unwrap();

        let out = temp_dir.path().join("out");
        let result = ArchiveExtractor::extract(&archive_path, &out);

        assert!(matches!(result, Err(CacheError::ArchiveExtraction { .. })));
        assert!(out.join("202407200000_acc0060_grs.asc").exists());
        let partial = out.join("202407200100_acc0060_grs.asc");
        assert!(!partial.exists());
        assert!(!PathGenerator::temp_path(&partial).exists());
    }

    #[test]
    fn test_extract_corrupt_archive_fails() {
        let temp_dir = TempDir::new().unwrap();
        let archive_path = temp_dir.path().join("broken.tar");
        std::fs::write(&archive_path, vec![0x42; 1024]).unwrap();

        let result = ArchiveExtractor::extract(&archive_path, temp_dir.path());
        assert!(matches!(result, Err(CacheError::ArchiveExtraction { .. })));
    }
}
