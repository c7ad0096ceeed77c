//! Test doubles shared by the reconciliation integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mach5_reconcile::{
    ArtifactFile, ArtifactSink, AssetId, AssetRecord, AssetStore, Clock, Confirmation,
    ExistenceProbe, MemoryAssetStore, StoreError,
};

pub const ID_A: &str = "65a1f0c2e4b0a1b2c3d4e5a1";
pub const ID_B: &str = "65a1f0c2e4b0a1b2c3d4e5b2";
pub const ID_C: &str = "65a1f0c2e4b0a1b2c3d4e5c3";

pub fn asset(id: &str) -> AssetRecord {
    AssetRecord::new(id, "photo", "job", format!("parent-{id}"))
}

/// Store with `n` assets whose ids are 24-digit hex counters, created one
/// second apart.
pub fn numbered_store(n: usize) -> MemoryAssetStore {
    MemoryAssetStore::with_assets((0..n).map(|i| (asset(&numbered_id(i)), created_at(i as i64))))
}

pub fn numbered_id(i: usize) -> String {
    format!("{:024x}", i + 1)
}

pub fn created_at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// Probe that reports URLs ending in one of the given ids as missing and
/// records every URL it was asked about.
#[derive(Default)]
pub struct ScriptedProbe {
    missing_ids: HashSet<String>,
    visited: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn missing<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            missing_ids: ids.into_iter().map(str::to_string).collect(),
            visited: Mutex::new(Vec::new()),
        }
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExistenceProbe for ScriptedProbe {
    async fn exists(&self, url: &str) -> bool {
        self.visited.lock().unwrap().push(url.to_string());
        let id = url.rsplit('/').next().unwrap_or_default();
        !self.missing_ids.contains(id)
    }
}

pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }
}

/// Canned operator answer that counts how often it was asked.
pub struct Answer {
    yes: bool,
    asked: AtomicUsize,
}

impl Answer {
    pub fn yes() -> Self {
        Self {
            yes: true,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn no() -> Self {
        Self {
            yes: false,
            asked: AtomicUsize::new(0),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Confirmation for Answer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.yes
    }
}

/// Wraps a store, failing pages at or past `fail_from_offset` and counting
/// bulk deletes.
pub struct FlakyStore {
    pub inner: MemoryAssetStore,
    pub fail_from_offset: Option<u64>,
    pub fail_deletes: bool,
    pub delete_calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: MemoryAssetStore) -> Self {
        Self {
            inner,
            fail_from_offset: None,
            fail_deletes: false,
            delete_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl AssetStore for FlakyStore {
    async fn count_assets(&self) -> Result<u64, StoreError> {
        self.inner.count_assets().await
    }

    async fn fetch_page(&self, offset: u64, limit: u64) -> Result<Vec<AssetRecord>, StoreError> {
        if self.fail_from_offset.is_some_and(|f| offset >= f) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.fetch_page(offset, limit).await
    }

    async fn delete_assets(&self, ids: &[AssetId]) -> Result<u64, StoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.delete_assets(ids).await
    }
}

/// Artifact sink backed by a shared in-memory buffer, optionally capped to
/// act like a disk that fills up.
#[derive(Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
    capacity: Option<usize>,
}

impl MemorySink {
    /// Writes past `capacity` bytes are cut short and then fail.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Arc::default(),
            capacity: Some(capacity),
        }
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.buffer.lock().unwrap().clone()).unwrap()
    }
}

pub struct SharedWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
    capacity: Option<usize>,
}

impl Write for SharedWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buffer = self.buffer.lock().unwrap();
        let room = self
            .capacity
            .map_or(usize::MAX, |cap| cap.saturating_sub(buffer.len()));
        if room == 0 {
            return Err(io::Error::other("disk full"));
        }
        let n = room.min(data.len());
        buffer.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ArtifactFile for SharedWriter {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.buffer.lock().unwrap().truncate(len as usize);
        Ok(())
    }
}

impl ArtifactSink for MemorySink {
    type Writer = SharedWriter;

    fn create(&self, file_name: &str) -> io::Result<(PathBuf, Self::Writer)> {
        let writer = SharedWriter {
            buffer: Arc::clone(&self.buffer),
            capacity: self.capacity,
        };
        Ok((PathBuf::from(file_name), writer))
    }
}
