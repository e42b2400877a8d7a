//! Hand-written mocks shared by the engine and boot tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_io::{ErrorKind, ErrorType, Read, ReadReady, Write};
use phonebox_core::config::NodeConfig;
use phonebox_core::traits::{Indicators, IoChain};
use phonebox_core::NodeEngine;
use phonebox_hal::{FileStore, FirmwareUpdater, OpenMode, StorageError, StoragePath, StoredFile};
use phonebox_protocol::{ModuleRecord, UpdateAnnouncement, HEADER_PACKET, UPDATE_HEADER_PACKET};

// ============================================================================
// Transport
// ============================================================================

/// Scripted server connection
#[derive(Default)]
pub struct MockTransport {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub connected: bool,
    /// Results of upcoming connect attempts; empty means succeed
    pub connect_results: VecDeque<bool>,
    pub connect_attempts: usize,
    /// Largest read returned at once
    pub chunk_limit: Option<usize>,
}

impl MockTransport {
    pub fn push(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }
}

impl ErrorType for MockTransport {
    type Error = ErrorKind;
}

impl Read for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let limit = self.chunk_limit.unwrap_or(usize::MAX).min(buf.len());
        let mut n = 0;
        while n < limit {
            match self.rx.pop_front() {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl ReadReady for MockTransport {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.rx.is_empty())
    }
}

impl Write for MockTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl phonebox_hal::Transport for MockTransport {
    fn connected(&mut self) -> bool {
        self.connected
    }

    fn connect(&mut self, _host: &str, _port: u16) -> Result<(), Self::Error> {
        self.connect_attempts += 1;
        if self.connect_results.pop_front().unwrap_or(true) {
            self.connected = true;
            Ok(())
        } else {
            Err(ErrorKind::ConnectionRefused)
        }
    }
}

// ============================================================================
// File store
// ============================================================================

#[derive(Default)]
struct StoreState {
    files: BTreeMap<StoragePath, Vec<u8>>,
    deny_open_write: BTreeSet<StoragePath>,
    deny_writes: BTreeSet<StoragePath>,
    deny_close: BTreeSet<StoragePath>,
    removed: Vec<StoragePath>,
}

/// In-memory file store; writes land immediately
#[derive(Clone, Default)]
pub struct MemStore {
    state: Rc<RefCell<StoreState>>,
}

impl MemStore {
    pub fn contents(&self, path: StoragePath) -> Option<Vec<u8>> {
        self.state.borrow().files.get(&path).cloned()
    }

    pub fn put(&self, path: StoragePath, data: &[u8]) {
        self.state
            .borrow_mut()
            .files
            .insert(path, data.to_vec());
    }

    pub fn deny_open_write(&self, path: StoragePath) {
        self.state.borrow_mut().deny_open_write.insert(path);
    }

    pub fn deny_writes(&self, path: StoragePath) {
        self.state.borrow_mut().deny_writes.insert(path);
    }

    pub fn deny_close(&self, path: StoragePath) {
        self.state.borrow_mut().deny_close.insert(path);
    }

    pub fn was_removed(&self, path: StoragePath) -> bool {
        self.state.borrow().removed.contains(&path)
    }
}

pub struct MemFile {
    state: Rc<RefCell<StoreState>>,
    path: StoragePath,
    pos: usize,
}

impl StoredFile for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let state = self.state.borrow();
        let data = state.files.get(&self.path).ok_or(StorageError::NotFound)?;
        let available = data.len().saturating_sub(self.pos);
        let n = available.min(buf.len());
        buf[..n].copy_from_slice(&data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, StorageError> {
        let mut state = self.state.borrow_mut();
        if state.deny_writes.contains(&self.path) {
            return Err(StorageError::Write);
        }
        state.files.entry(self.path).or_default().extend_from_slice(data);
        Ok(data.len())
    }

    fn size(&self) -> usize {
        self.state
            .borrow()
            .files
            .get(&self.path)
            .map_or(0, Vec::len)
    }

    fn close(self) -> Result<(), StorageError> {
        if self.state.borrow().deny_close.contains(&self.path) {
            return Err(StorageError::Write);
        }
        Ok(())
    }
}

impl FileStore for MemStore {
    type File = MemFile;

    fn open(&mut self, path: StoragePath, mode: OpenMode) -> Result<MemFile, StorageError> {
        let key = path;
        {
            let mut state = self.state.borrow_mut();
            match mode {
                OpenMode::Read => {
                    if !state.files.contains_key(&key) {
                        return Err(StorageError::NotFound);
                    }
                }
                OpenMode::Write => {
                    if state.deny_open_write.contains(&key) {
                        return Err(StorageError::Open);
                    }
                    state.files.insert(key, Vec::new());
                }
            }
        }
        Ok(MemFile {
            state: Rc::clone(&self.state),
            path: key,
            pos: 0,
        })
    }

    fn remove(&mut self, path: StoragePath) -> Result<(), StorageError> {
        let mut state = self.state.borrow_mut();
        state.removed.push(path);
        state
            .files
            .remove(&path)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    fn exists(&mut self, path: StoragePath) -> bool {
        self.state.borrow().files.contains_key(&path)
    }
}

// ============================================================================
// Chain, indicators, delay, updater
// ============================================================================

/// Chain that reports a fixed input pattern
pub struct MockChain {
    pub count: u8,
    pub input_pattern: u32,
    pub driven: Vec<u32>,
    pub transfers: usize,
}

impl MockChain {
    pub fn new(count: u8, input_pattern: u32) -> Self {
        Self {
            count,
            input_pattern,
            driven: Vec::new(),
            transfers: 0,
        }
    }
}

impl IoChain for MockChain {
    fn module_count(&self) -> u8 {
        self.count
    }

    fn transfer(&mut self, records: &mut [ModuleRecord]) {
        self.transfers += 1;
        self.driven.clear();
        for record in records.iter_mut().take(self.count as usize) {
            self.driven.push(record.outputs);
            record.inputs = self.input_pattern;
        }
    }
}

#[derive(Default)]
pub struct MockIndicators {
    pub buzzer: bool,
    pub alarm: bool,
    pub status_toggles: usize,
}

impl Indicators for MockIndicators {
    fn set_buzzer(&mut self, on: bool) {
        self.buzzer = on;
    }

    fn set_alarm(&mut self, on: bool) {
        self.alarm = on;
    }

    fn toggle_status(&mut self) {
        self.status_toggles += 1;
    }
}

/// Delay that only records how long it was asked to wait
#[derive(Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl NoDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

/// Flashing primitive that copies the image into memory
#[derive(Default)]
pub struct MockUpdater {
    pub reject_begin: bool,
    pub fail_end: bool,
    pub begun_with: Option<usize>,
    pub image: Vec<u8>,
    pub ended: bool,
}

impl FirmwareUpdater for MockUpdater {
    type Error = ();

    fn begin(&mut self, size: usize) -> Result<(), ()> {
        if self.reject_begin {
            return Err(());
        }
        self.begun_with = Some(size);
        Ok(())
    }

    fn write_stream<F: StoredFile>(&mut self, source: &mut F) -> Result<usize, ()> {
        let mut buf = [0u8; 64];
        loop {
            let n = source.read(&mut buf).map_err(|_| ())?;
            if n == 0 {
                return Ok(self.image.len());
            }
            self.image.extend_from_slice(&buf[..n]);
        }
    }

    fn end(&mut self) -> Result<(), ()> {
        self.ended = true;
        if self.fail_end {
            Err(())
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Wire helpers
// ============================================================================

pub type TestEngine = NodeEngine<MockTransport, MemStore, MockChain, MockIndicators, NoDelay>;

/// Engine with default config, a connected transport and `modules` modules
pub fn engine(modules: u8, input_pattern: u32) -> (TestEngine, MemStore) {
    engine_with(NodeConfig::default(), modules, input_pattern)
}

pub fn engine_with(config: NodeConfig, modules: u8, input_pattern: u32) -> (TestEngine, MemStore) {
    let store = MemStore::default();
    let transport = MockTransport {
        connected: true,
        ..MockTransport::default()
    };
    let engine = NodeEngine::new(
        config,
        transport,
        store.clone(),
        MockChain::new(modules, input_pattern),
        MockIndicators::default(),
        NoDelay::default(),
    );
    (engine, store)
}

/// I/O frame as sent by the server
pub fn io_packet(alarm: u8, buzzer: u8, records: &[ModuleRecord]) -> Vec<u8> {
    let mut bytes = HEADER_PACKET.to_le_bytes().to_vec();
    bytes.extend_from_slice(&(records.len() as u16).to_le_bytes());
    bytes.push(alarm);
    bytes.push(buzzer);
    for record in records {
        bytes.extend_from_slice(&record.to_bytes());
    }
    bytes
}

/// Update header and announcement as sent by the server
pub fn update_packet(announcement: &UpdateAnnouncement) -> Vec<u8> {
    let mut bytes = UPDATE_HEADER_PACKET.to_le_bytes().to_vec();
    bytes.extend_from_slice(&announcement.encode());
    bytes
}
