//! Server configuration read from the environment.

use anyhow::Context;
use domino_core::{DEFAULT_HAND_SIZE, PLAYER_COUNT, SET_SIZE};
use std::net::SocketAddr;

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on (`SERVER_ADDR`)
    pub addr: SocketAddr,
    /// Tiles dealt to each player in new rooms (`DOMINO_HAND_SIZE`)
    pub hand_size: usize,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup("SERVER_ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.into())
            .parse()
            .context("SERVER_ADDR must be a socket address")?;

        let hand_size = match lookup("DOMINO_HAND_SIZE") {
            Some(raw) => raw
                .trim()
                .parse()
                .context("DOMINO_HAND_SIZE must be a number")?,
            None => DEFAULT_HAND_SIZE,
        };
        anyhow::ensure!(
            hand_size * PLAYER_COUNT <= SET_SIZE,
            "DOMINO_HAND_SIZE of {} leaves too few tiles to deal",
            hand_size
        );

        Ok(Self { addr, hand_size })
    }
}
