//! Local Sentinel configuration snapshot
//!
//! Reads every file of an include directory and keeps the groups declared
//! by `<directive> monitor <name> <host> <port> <quorum>` lines. Anything
//! else in those files is ignored.

use crate::common::utils::tokenize;
use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One monitored group as declared locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredGroup {
    pub name: String,
    pub expected_host: String,
    pub expected_port: String,
}

impl MonitoredGroup {
    pub fn new(
        name: impl Into<String>,
        expected_host: impl Into<String>,
        expected_port: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            expected_host: expected_host.into(),
            expected_port: expected_port.into(),
        }
    }

    /// `host:port` as the coordination store records it.
    pub fn expected_addr(&self) -> String {
        format!("{}:{}", self.expected_host, self.expected_port)
    }
}

/// Parse one line; `None` unless token 1 is `monitor` (any case).
pub fn parse_monitor_line(line: &str) -> Option<MonitoredGroup> {
    let tokens = tokenize(line);
    if tokens.len() < 5 || !tokens[1].eq_ignore_ascii_case("monitor") {
        return None;
    }
    Some(MonitoredGroup::new(tokens[2], tokens[3], tokens[4]))
}

/// Groups loaded from the include directory, in file-name then line order.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    groups: Vec<MonitoredGroup>,
}

impl ConfigSnapshot {
    pub fn new(groups: Vec<MonitoredGroup>) -> Self {
        Self { groups }
    }

    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            Error::Config(format!("cannot list {}: {}", dir.display(), e))
        })?;

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                Error::Config(format!("cannot list {}: {}", dir.display(), e))
            })?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            files.push(path);
        }
        files.sort();

        let mut groups = Vec::new();
        for path in files {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("cannot read {}: {}", path.display(), e))
            })?;
            let found: Vec<_> = content.lines().filter_map(parse_monitor_line).collect();
            tracing::debug!("{}: {} monitored group(s)", path.display(), found.len());
            groups.extend(found);
        }

        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[MonitoredGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
