//! The JSON artifact bridging the scan and delete stages.
//!
//! An artifact is a pretty-printed JSON array of [`MissingAssetEntry`] values.
//! The scan writes it one entry at a time so a crash never loses entries
//! already found, and [`ArtifactWriter`] closes the array on every exit path
//! so the file always parses.

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::MissingAssetEntry;

/// File name for an artifact started at `now`.
pub fn artifact_file_name(now: DateTime<Local>) -> String {
    format!("missing_assets_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Storage behind an artifact.
///
/// Besides plain writes it must be able to cut itself back to a known length,
/// so an entry torn by a failed write can be dropped before the array is
/// closed.
pub trait ArtifactFile: Write + Send {
    /// Discard everything past the first `len` bytes; later writes continue
    /// from there.
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl ArtifactFile for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)?;
        self.seek(SeekFrom::Start(len))?;
        Ok(())
    }
}

impl ArtifactFile for Vec<u8> {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(io::Error::other)?;
        Vec::truncate(self, len);
        Ok(())
    }
}

impl<F: ArtifactFile + ?Sized> ArtifactFile for &mut F {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        (**self).truncate(len)
    }
}

/// Where scan artifacts are created.
pub trait ArtifactSink {
    type Writer: ArtifactFile;

    /// Create a new artifact called `file_name`, returning its path and a writer.
    fn create(&self, file_name: &str) -> io::Result<(PathBuf, Self::Writer)>;
}

/// Writes artifacts as files in a directory, creating it if needed.
///
/// Files are unbuffered: [`ArtifactWriter`] already issues one write per entry.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for DirectorySink {
    type Writer = File;

    fn create(&self, file_name: &str) -> io::Result<(PathBuf, Self::Writer)> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        let file = File::create(&path)?;
        Ok((path, file))
    }
}

/// Incremental writer for an artifact's JSON array.
///
/// Each entry, with its leading separator, is serialized up front and written
/// in one call. `committed` is the length of the array up to the last entry
/// that was written in full; if a write fails partway, the storage is cut back
/// to that length before anything else is written.
///
/// The closing bracket is written exactly once: by [`finish`](Self::finish)
/// on success, or by `Drop` if the writer is abandoned early.
pub struct ArtifactWriter<W: ArtifactFile> {
    inner: W,
    entries: usize,
    committed: u64,
    torn: bool,
    closed: bool,
}

impl<W: ArtifactFile> ArtifactWriter<W> {
    /// Open the array.
    pub fn begin(mut inner: W) -> io::Result<Self> {
        const OPEN: &[u8] = b"[\n";
        inner.write_all(OPEN)?;
        Ok(Self {
            inner,
            entries: 0,
            committed: OPEN.len() as u64,
            torn: false,
            closed: false,
        })
    }

    pub fn append(&mut self, entry: &MissingAssetEntry) -> io::Result<()> {
        self.repair()?;

        let mut chunk = Vec::new();
        if self.entries > 0 {
            chunk.extend_from_slice(b",\n");
        }
        serde_json::to_writer_pretty(&mut chunk, entry)?;

        if let Err(e) = self.inner.write_all(&chunk) {
            self.torn = true;
            return Err(e);
        }
        self.committed += chunk.len() as u64;
        self.entries += 1;
        Ok(())
    }

    /// Entries written in full.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Close the array and flush.
    pub fn finish(mut self) -> io::Result<()> {
        self.close()
    }

    /// Drop a partially written entry, if any.
    fn repair(&mut self) -> io::Result<()> {
        if self.torn {
            self.inner.truncate(self.committed)?;
            self.torn = false;
        }
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.repair()?;
        self.inner.write_all(b"\n]")?;
        self.inner.flush()
    }
}

impl<W: ArtifactFile> Drop for ArtifactWriter<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::error!(error = %e, "failed to close artifact array");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn entry(id: &str) -> MissingAssetEntry {
        MissingAssetEntry {
            id: id.to_string(),
            url: format!("https://dev.api.fiveincportal.com/assets/job/p1/photo/{id}"),
            asset_type: "photo".to_string(),
            parent_collection: "job".to_string(),
        }
    }

    #[test]
    fn test_file_name_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(artifact_file_name(now), "missing_assets_20240309_070501.json");
    }

    #[test]
    fn test_empty_artifact_is_valid_json() {
        let mut buf = Vec::new();
        ArtifactWriter::begin(&mut buf).unwrap().finish().unwrap();

        let parsed: Vec<MissingAssetEntry> = serde_json::from_slice(&buf).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_entries_round_trip_in_order() {
        let mut buf = Vec::new();
        let mut writer = ArtifactWriter::begin(&mut buf).unwrap();
        writer.append(&entry("a")).unwrap();
        writer.append(&entry("b")).unwrap();
        assert_eq!(writer.entries(), 2);
        writer.finish().unwrap();

        let parsed: Vec<MissingAssetEntry> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, vec![entry("a"), entry("b")]);
    }

    #[test]
    fn test_layout_is_pretty_printed() {
        let mut buf = Vec::new();
        let mut writer = ArtifactWriter::begin(&mut buf).unwrap();
        writer.append(&entry("a")).unwrap();
        writer.finish().unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("[\n{\n  \"id\": \"a\",\n"));
        assert!(text.ends_with("}\n]"));
    }

    #[test]
    fn test_drop_closes_array_once() {
        let mut buf = Vec::new();
        {
            let mut writer = ArtifactWriter::begin(&mut buf).unwrap();
            writer.append(&entry("a")).unwrap();
        }

        let text = String::from_utf8(buf.clone()).unwrap();
        assert_eq!(text.matches(']').count(), 1);
        let parsed: Vec<MissingAssetEntry> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, vec![entry("a")]);
    }

    #[test]
    fn test_directory_sink_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("nested"));

        let (path, writer) = sink.create("missing_assets_x.json").unwrap();
        ArtifactWriter::begin(writer).unwrap().finish().unwrap();

        assert_eq!(path, dir.path().join("nested").join("missing_assets_x.json"));
        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(text, "[\n\n]");
    }

    /// Buffer that behaves like a disk with `capacity` bytes: writes past it
    /// are cut short, then fail.
    struct FullDisk {
        buf: Vec<u8>,
        capacity: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            let room = self.capacity.saturating_sub(self.buf.len());
            if room == 0 {
                return Err(io::Error::other("disk full"));
            }
            let n = room.min(data.len());
            self.buf.extend_from_slice(&data[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl ArtifactFile for FullDisk {
        fn truncate(&mut self, len: u64) -> io::Result<()> {
            self.buf.truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn test_torn_entry_is_dropped_on_close() {
        let first = serde_json::to_vec_pretty(&entry("a")).unwrap();
        let mut disk = FullDisk {
            buf: Vec::new(),
            capacity: 2 + first.len() + 40,
        };

        {
            let mut writer = ArtifactWriter::begin(&mut disk).unwrap();
            writer.append(&entry("a")).unwrap();
            let err = writer.append(&entry("b")).unwrap_err();
            assert_eq!(err.to_string(), "disk full");
            assert_eq!(writer.entries(), 1);
        }

        let parsed: Vec<MissingAssetEntry> = serde_json::from_slice(&disk.buf).unwrap();
        assert_eq!(parsed, vec![entry("a")]);
    }

    #[test]
    fn test_append_after_torn_entry_resumes_cleanly() {
        let first = serde_json::to_vec_pretty(&entry("a")).unwrap();
        let mut disk = FullDisk {
            buf: Vec::new(),
            capacity: 2 + first.len() + 40,
        };

        let mut writer = ArtifactWriter::begin(&mut disk).unwrap();
        writer.append(&entry("a")).unwrap();
        writer.append(&entry("b")).unwrap_err();
        writer.inner.capacity = usize::MAX;
        writer.append(&entry("c")).unwrap();
        writer.finish().unwrap();

        let parsed: Vec<MissingAssetEntry> = serde_json::from_slice(&disk.buf).unwrap();
        assert_eq!(parsed, vec![entry("a"), entry("c")]);
    }

    #[test]
    fn test_file_truncate_rewinds_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.json");
        let mut file = File::create(&path).unwrap();

        file.write_all(b"[\n{\"torn").unwrap();
        ArtifactFile::truncate(&mut file, 2).unwrap();
        file.write_all(b"\n]").unwrap();
        drop(file);

        assert_eq!(std::fs::read_to_string(path).unwrap(), "[\n\n]");
    }
}
