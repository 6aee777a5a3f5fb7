//! In-process coordination store
//!
//! Behaves like a ZooKeeper ensemble as far as the client can tell: nodes
//! need an existing parent, creates on existing nodes are refused, and
//! sessions can be expired or the whole store made unreachable. Used by
//! tests and dry runs.

use crate::common::{Error, Result};
use crate::coordination::backend::{CoordinationBackend, CoordinationSession};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MemoryState {
    nodes: BTreeMap<String, Vec<u8>>,
    unreachable: bool,
    fail_next: usize,
    epoch: u64,
    writes: usize,
    connects: usize,
    ops: usize,
}

impl MemoryState {
    fn check(&mut self, epoch: u64) -> Result<()> {
        self.ops += 1;
        if self.unreachable {
            return Err(Error::Coordination("connection loss".into()));
        }
        if epoch != self.epoch {
            return Err(Error::Coordination("session expired".into()));
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(Error::Coordination("injected failure".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a node (and its ancestors) without counting it as a write.
    pub fn insert(&self, path: &str, value: &[u8]) {
        let mut state = self.lock();
        for (idx, _) in path.match_indices('/').skip(1) {
            state.nodes.entry(path[..idx].to_string()).or_default();
        }
        state.nodes.insert(path.to_string(), value.to_vec());
    }

    pub fn value(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().nodes.get(path).cloned()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().nodes.contains_key(path)
    }

    /// Every connect and operation fails while set.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// The next `n` session operations fail.
    pub fn fail_next(&self, n: usize) {
        self.lock().fail_next = n;
    }

    /// Invalidate every open session; only new sessions work afterwards.
    pub fn expire_sessions(&self) {
        self.lock().epoch += 1;
    }

    /// Successful `create`/`set` calls carrying a value.
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Sessions successfully opened.
    pub fn connect_count(&self) -> usize {
        self.lock().connects
    }

    /// Session operations attempted, including failed ones.
    pub fn op_count(&self) -> usize {
        self.lock().ops
    }
}

#[async_trait]
impl CoordinationBackend for MemoryBackend {
    async fn connect(&self, _readonly: bool) -> Result<Box<dyn CoordinationSession>> {
        let mut state = self.lock();
        if state.unreachable {
            return Err(Error::Coordination("connection refused".into()));
        }
        state.connects += 1;
        Ok(Box::new(MemorySession {
            state: self.state.clone(),
            epoch: state.epoch,
        }))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

struct MemorySession {
    state: Arc<Mutex<MemoryState>>,
    epoch: u64,
}

impl MemorySession {
    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parent(path: &str) -> Option<&str> {
    match path.rfind('/') {
        Some(0) | None => None,
        Some(idx) => Some(&path[..idx]),
    }
}

#[async_trait]
impl CoordinationSession for MemorySession {
    async fn exists(&self, path: &str) -> Result<bool> {
        let mut state = self.lock();
        state.check(self.epoch)?;
        Ok(state.nodes.contains_key(path))
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let mut state = self.lock();
        state.check(self.epoch)?;
        Ok(state.nodes.get(path).cloned())
    }

    async fn create(&self, path: &str, data: &[u8]) -> Result<bool> {
        let mut state = self.lock();
        state.check(self.epoch)?;
        if state.nodes.contains_key(path) {
            return Ok(false);
        }
        if let Some(parent) = parent(path) {
            if !state.nodes.contains_key(parent) {
                return Err(Error::Coordination(format!("no node for parent of {}", path)));
            }
        }
        state.nodes.insert(path.to_string(), data.to_vec());
        if !data.is_empty() {
            state.writes += 1;
        }
        Ok(true)
    }

    async fn set(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut state = self.lock();
        state.check(self.epoch)?;
        match state.nodes.get_mut(path) {
            Some(value) => {
                *value = data.to_vec();
                state.writes += 1;
                Ok(())
            }
            None => Err(Error::Coordination(format!("no node {}", path))),
        }
    }
}
