//! Sentinel pub/sub events

use crate::common::utils::tokenize;
use crate::common::{Error, Result};
use crate::coordination::Address;
use std::pin::Pin;
use tokio_stream::Stream;

pub const ELECTED_LEADER: &str = "elected-leader";
pub const SWITCH_MASTER: &str = "switch-master";

/// A message as received from the subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub channel: String,
    pub payload: String,
}

impl RawEvent {
    pub fn new(channel: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            payload: payload.into(),
        }
    }
}

/// Endless stream of raw events; ends only when the connection closes.
pub type EventStream = Pin<Box<dyn Stream<Item = RawEvent> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentinelEvent {
    /// This sentinel was elected to run the failover of `group`.
    ElectedLeader { group: String },
    /// `group` now has `new` as master.
    SwitchMaster {
        group: String,
        old: Address,
        new: Address,
    },
    /// Any channel we do not act on.
    Other,
}

/// Decode a raw event. Sentinel prefixes channels with `+`.
pub fn decode_event(raw: &RawEvent) -> Result<SentinelEvent> {
    let channel = raw.channel.strip_prefix('+').unwrap_or(&raw.channel);
    let tokens = tokenize(&raw.payload);

    match channel {
        ELECTED_LEADER => {
            if tokens.len() < 2 {
                return Err(Error::malformed(
                    &raw.channel,
                    format!("expected at least 2 tokens, got {}", tokens.len()),
                ));
            }
            Ok(SentinelEvent::ElectedLeader {
                group: tokens[1].to_string(),
            })
        }
        SWITCH_MASTER => {
            if tokens.len() < 5 {
                return Err(Error::malformed(
                    &raw.channel,
                    format!("expected 5 tokens, got {}", tokens.len()),
                ));
            }
            Ok(SentinelEvent::SwitchMaster {
                group: tokens[0].to_string(),
                old: Address::new(tokens[1], tokens[2]),
                new: Address::new(tokens[3], tokens[4]),
            })
        }
        _ => Ok(SentinelEvent::Other),
    }
}
