//! ZooKeeper backend

use crate::common::Result;
use crate::coordination::backend::{CoordinationBackend, CoordinationSession};
use async_trait::async_trait;
use std::time::Duration;
use zookeeper_client as zk;

pub struct ZkBackend {
    hosts: String,
    session_timeout: Duration,
}

impl ZkBackend {
    pub fn new(hosts: impl Into<String>, session_timeout: Duration) -> Self {
        Self {
            hosts: hosts.into(),
            session_timeout,
        }
    }
}

#[async_trait]
impl CoordinationBackend for ZkBackend {
    async fn connect(&self, readonly: bool) -> Result<Box<dyn CoordinationSession>> {
        let mut connector = zk::Client::connector();
        connector
            .session_timeout(self.session_timeout)
            .readonly(readonly);
        let client = connector.connect(&self.hosts).await?;
        Ok(Box::new(ZkSession { client }))
    }

    fn describe(&self) -> String {
        self.hosts.clone()
    }
}

struct ZkSession {
    client: zk::Client,
}

#[async_trait]
impl CoordinationSession for ZkSession {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.client.check_stat(path).await?.is_some())
    }

    async fn get(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.client.get_data(path).await {
            Ok((data, _stat)) => Ok(Some(data)),
            Err(zk::Error::NoNode) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, path: &str, data: &[u8]) -> Result<bool> {
        let options = zk::CreateMode::Persistent.with_acls(zk::Acls::anyone_all());
        match self.client.create(path, data, &options).await {
            Ok(_) => Ok(true),
            Err(zk::Error::NodeExists) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client.set_data(path, data, None).await?;
        Ok(())
    }
}
