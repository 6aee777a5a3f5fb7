//! Queries and subscriptions against the local Sentinel

use crate::common::{Error, Result};
use crate::coordination::Address;
use crate::sentinel::events::{EventStream, RawEvent};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio_stream::StreamExt;

/// Current master of one group as the failover service sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMaster {
    pub name: String,
    /// `None` when the service knows the group but reports no master.
    pub addr: Option<Address>,
}

/// Read side of the failover service used by the refresher.
#[async_trait]
pub trait FailoverService: Send + Sync {
    /// Every group the service monitors, with its current master.
    async fn current_masters(&self) -> Result<Vec<GroupMaster>>;
}

/// Redis Sentinel reached over its client port.
#[derive(Debug, Clone)]
pub struct RedisSentinel {
    host: String,
    port: u16,
}

impl RedisSentinel {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    fn url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }

    fn client(&self) -> Result<redis::Client> {
        Ok(redis::Client::open(self.url())?)
    }

    /// Pattern-subscribe to every channel.
    pub async fn subscribe(&self) -> Result<EventStream> {
        let mut pubsub = self.client()?.get_async_pubsub().await?;
        pubsub.psubscribe("*").await?;
        tracing::info!("Subscribed to all channels on {}:{}", self.host, self.port);

        let stream = pubsub.into_on_message().map(|msg| RawEvent {
            channel: msg.get_channel_name().to_string(),
            payload: String::from_utf8_lossy(msg.get_payload_bytes()).into_owned(),
        });
        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl FailoverService for RedisSentinel {
    async fn current_masters(&self) -> Result<Vec<GroupMaster>> {
        // A fresh connection per pass, so a restarted sentinel is picked up.
        let mut conn = self.client()?.get_multiplexed_async_connection().await?;

        let masters: Vec<HashMap<String, String>> = redis::cmd("SENTINEL")
            .arg("MASTERS")
            .query_async(&mut conn)
            .await?;

        let mut result = Vec::with_capacity(masters.len());
        for master in masters {
            let name = master
                .get("name")
                .cloned()
                .ok_or_else(|| Error::Failover("SENTINEL MASTERS entry without name".into()))?;
            let addr: redis::RedisResult<Option<(String, String)>> = redis::cmd("SENTINEL")
                .arg("GET-MASTER-ADDR-BY-NAME")
                .arg(&name)
                .query_async(&mut conn)
                .await;
            result.push(resolved(
                name,
                addr.map(|a| a.map(|(host, port)| Address::new(host, port)))
                    .map_err(Error::from),
            ));
        }
        Ok(result)
    }
}

/// A failed lookup leaves the group unresolved instead of failing the pass.
fn resolved(name: String, addr: Result<Option<Address>>) -> GroupMaster {
    match addr {
        Ok(addr) => GroupMaster { name, addr },
        Err(e) => {
            tracing::warn!(group = %name, "cannot resolve master: {}", e);
            GroupMaster { name, addr: None }
        }
    }
}

/// Failover service answering from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticFailover {
    masters: Arc<Mutex<BTreeMap<String, Option<Address>>>>,
    unreachable: Arc<Mutex<bool>>,
}

impl StaticFailover {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_master(&self, group: &str, addr: Option<Address>) {
        self.masters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(group.to_string(), addr);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap_or_else(|e| e.into_inner()) = unreachable;
    }
}

#[async_trait]
impl FailoverService for StaticFailover {
    async fn current_masters(&self) -> Result<Vec<GroupMaster>> {
        if *self.unreachable.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(Error::Failover("connection refused".into()));
        }
        Ok(self
            .masters
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, addr)| GroupMaster {
                name: name.clone(),
                addr: addr.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url() {
        assert_eq!(RedisSentinel::new("127.0.0.1", 26379).url(), "redis://127.0.0.1:26379/");
    }

    #[test]
    fn test_failed_lookup_leaves_group_unresolved() {
        let ok = resolved("g1".into(), Ok(Some(Address::new("10.0.0.1", "6379"))));
        assert_eq!(ok.addr, Some(Address::new("10.0.0.1", "6379")));

        let failed = resolved("g2".into(), Err(Error::Failover("timeout".into())));
        assert_eq!(
            failed,
            GroupMaster {
                name: "g2".into(),
                addr: None
            }
        );
    }

    #[tokio::test]
    async fn test_static_failover() {
        let service = StaticFailover::new();
        service.set_master("g2", None);
        service.set_master("g1", Some(Address::new("10.0.0.1", "6379")));

        let masters = service.current_masters().await.unwrap();
        assert_eq!(masters.len(), 2);
        assert_eq!(masters[0].name, "g1");
        assert_eq!(masters[1].addr, None);

        service.set_unreachable(true);
        assert!(service.current_masters().await.is_err());
    }
}
