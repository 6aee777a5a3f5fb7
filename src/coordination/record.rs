//! Master records as stored in the coordination store
//!
//! Each group has one node at `{root}/{group}/master/master` holding
//! `{"addr": "<host>:<port>", "state": "online"}`. Keys are emitted in sorted
//! order with `", "` and `": "` separators so other readers can compare raw
//! bytes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Writes `", "` between entries and `": "` after keys.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// A master endpoint reported by the failover service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub host: String,
    pub port: String,
}

impl Address {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// State of a recorded master. Only `online` is ever written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MasterState {
    Online,
    Other(String),
}

impl From<String> for MasterState {
    fn from(s: String) -> Self {
        if s == "online" {
            MasterState::Online
        } else {
            MasterState::Other(s)
        }
    }
}

impl From<MasterState> for String {
    fn from(state: MasterState) -> Self {
        match state {
            MasterState::Online => "online".to_string(),
            MasterState::Other(s) => s,
        }
    }
}

impl fmt::Display for MasterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasterState::Online => write!(f, "online"),
            MasterState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Field order is the serialized key order and must stay sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterRecord {
    pub addr: String,
    pub state: MasterState,
}

impl MasterRecord {
    pub fn online(addr: &Address) -> Self {
        Self {
            addr: addr.to_string(),
            state: MasterState::Online,
        }
    }

    /// True when this record already says `addr` is the online master.
    pub fn is_online_at(&self, addr: &Address) -> bool {
        self.state == MasterState::Online && self.addr == addr.to_string()
    }

    pub fn encode(&self) -> crate::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(48);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        self.serialize(&mut ser)?;
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> crate::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// What a read of a group's master node found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// No node at the path yet.
    Missing,
    Present(MasterRecord),
    /// A node exists but does not hold a master record.
    Corrupt(Vec<u8>),
}

impl ReadOutcome {
    pub fn from_bytes(bytes: Option<Vec<u8>>) -> Self {
        match bytes {
            None => ReadOutcome::Missing,
            Some(bytes) => match MasterRecord::decode(&bytes) {
                Ok(record) => ReadOutcome::Present(record),
                Err(_) => ReadOutcome::Corrupt(bytes),
            },
        }
    }
}

/// `{root}/{group}/master/master`
pub fn master_path(root: &str, group: &str) -> String {
    format!("{}/{}/master/master", root.trim_end_matches('/'), group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_path() {
        assert_eq!(
            master_path("/zk/redis_sentinel", "mymaster"),
            "/zk/redis_sentinel/mymaster/master/master"
        );
        assert_eq!(master_path("/", "g1"), "/g1/master/master");
    }

    #[test]
    fn test_encoding_is_sorted_and_stable() {
        let record = MasterRecord::online(&Address::new("10.0.0.1", "6379"));
        let bytes = record.encode().unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"addr": "10.0.0.1:6379", "state": "online"}"#
        );
    }

    #[test]
    fn test_encoding_matches_existing_writers() {
        // Byte-identical to what other tools put at the same path.
        let record = MasterRecord {
            addr: "127.0.0.1:6371".into(),
            state: MasterState::Other("offline".into()),
        };
        assert_eq!(
            record.encode().unwrap(),
            br#"{"addr": "127.0.0.1:6371", "state": "offline"}"#.to_vec()
        );
        assert_eq!(MasterRecord::decode(&record.encode().unwrap()).unwrap(), record);
    }

    #[test]
    fn test_decode_unknown_state() {
        let record = MasterRecord::decode(br#"{"addr":"h:1","state":"offline"}"#).unwrap();
        assert_eq!(record.state, MasterState::Other("offline".into()));
        assert!(!record.is_online_at(&Address::new("h", "1")));
    }

    #[test]
    fn test_read_outcome() {
        assert_eq!(ReadOutcome::from_bytes(None), ReadOutcome::Missing);
        assert!(matches!(
            ReadOutcome::from_bytes(Some(b"not json".to_vec())),
            ReadOutcome::Corrupt(_)
        ));
        match ReadOutcome::from_bytes(Some(br#"{"state":"online","addr":"h:1"}"#.to_vec())) {
            ReadOutcome::Present(record) => assert!(record.is_online_at(&Address::new("h", "1"))),
            other => panic!("unexpected {:?}", other),
        }
    }
}
