//! Stacks networks and their wire-level parameters.

use crate::error::{Result, Stx402Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network name constants for use in configuration and matching
pub mod networks {
    pub const MAINNET: &str = "mainnet";
    pub const TESTNET: &str = "testnet";
}

/// Built-in network definition (compile-time constant)
struct BuiltinNetwork {
    id: &'static str,
    display_name: &'static str,
    transaction_version: u8,
    chain_id: u32,
    /// c32 version of single-sig (P2PKH) addresses
    p2pkh_version: u8,
    /// c32 version of multi-sig (P2SH) addresses
    p2sh_version: u8,
    node_url: &'static str,
    /// Alternative identifiers seen in payment options (CAIP-2)
    aliases: &'static [&'static str],
    explorer_chain: &'static str,
}

const BUILTIN_NETWORKS: &[BuiltinNetwork] = &[
    BuiltinNetwork {
        id: networks::MAINNET,
        display_name: "Stacks Mainnet",
        transaction_version: 0x00,
        chain_id: 0x0000_0001,
        p2pkh_version: 22,
        p2sh_version: 20,
        node_url: "https://api.mainnet.hiro.so",
        aliases: &["stacks:1", "stacks", "stacks-mainnet"],
        explorer_chain: "mainnet",
    },
    BuiltinNetwork {
        id: networks::TESTNET,
        display_name: "Stacks Testnet",
        transaction_version: 0x80,
        chain_id: 0x8000_0000,
        p2pkh_version: 26,
        p2sh_version: 21,
        node_url: "https://api.testnet.hiro.so",
        aliases: &["stacks:2147483648", "stacks-testnet"],
        explorer_chain: "testnet",
    },
];

const EXPLORER_URL: &str = "https://explorer.hiro.so";

/// A Stacks network.
///
/// # Examples
///
/// ```
/// use stx402_lib::network::StacksNetwork;
///
/// let net: StacksNetwork = "stacks:2147483648".parse().unwrap();
/// assert_eq!(net, StacksNetwork::Testnet);
/// assert_eq!(net.chain_id(), 0x8000_0000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StacksNetwork {
    Mainnet,
    #[default]
    Testnet,
}

impl StacksNetwork {
    fn builtin(&self) -> &'static BuiltinNetwork {
        match self {
            StacksNetwork::Mainnet => &BUILTIN_NETWORKS[0],
            StacksNetwork::Testnet => &BUILTIN_NETWORKS[1],
        }
    }

    /// Get the string identifier for this network.
    pub fn as_str(&self) -> &'static str {
        self.builtin().id
    }

    pub fn display_name(&self) -> &'static str {
        self.builtin().display_name
    }

    /// Version byte written at the start of every transaction.
    pub fn transaction_version(&self) -> u8 {
        self.builtin().transaction_version
    }

    pub fn chain_id(&self) -> u32 {
        self.builtin().chain_id
    }

    /// Address version for single-signature accounts (`SP` / `ST`).
    pub fn p2pkh_version(&self) -> u8 {
        self.builtin().p2pkh_version
    }

    pub fn p2sh_version(&self) -> u8 {
        self.builtin().p2sh_version
    }

    /// Default Stacks node API base URL.
    pub fn default_node_url(&self) -> &'static str {
        self.builtin().node_url
    }

    /// CAIP-2 identifier (`stacks:<chain id>`).
    pub fn caip2(&self) -> &'static str {
        self.builtin().aliases[0]
    }

    pub fn is_mainnet(&self) -> bool {
        matches!(self, StacksNetwork::Mainnet)
    }

    /// Network an address version byte belongs to, if any.
    pub fn from_address_version(version: u8) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|n| n.p2pkh_version() == version || n.p2sh_version() == version)
    }

    /// Network a transaction version byte belongs to, if any.
    pub fn from_transaction_version(version: u8) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|n| n.transaction_version() == version)
    }

    /// Explorer link for a transaction id.
    pub fn tx_url(&self, txid: &str) -> String {
        let txid = txid.strip_prefix("0x").unwrap_or(txid);
        format!(
            "{EXPLORER_URL}/txid/0x{txid}?chain={}",
            self.builtin().explorer_chain
        )
    }

    pub const fn all() -> [StacksNetwork; 2] {
        [StacksNetwork::Mainnet, StacksNetwork::Testnet]
    }
}

impl FromStr for StacksNetwork {
    type Err = Stx402Error;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Self::all()
            .into_iter()
            .find(|n| n.as_str() == needle || n.builtin().aliases.contains(&needle.as_str()))
            .ok_or_else(|| Stx402Error::UnknownNetwork(s.to_string()))
    }
}

impl fmt::Display for StacksNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_parameters() {
        assert_eq!(StacksNetwork::Mainnet.transaction_version(), 0x00);
        assert_eq!(StacksNetwork::Testnet.transaction_version(), 0x80);
        assert_eq!(StacksNetwork::Mainnet.chain_id(), 1);
        assert_eq!(StacksNetwork::Testnet.chain_id(), 2_147_483_648);
        assert_eq!(StacksNetwork::Mainnet.p2pkh_version(), 22);
        assert_eq!(StacksNetwork::Testnet.p2pkh_version(), 26);
    }

    #[test]
    fn test_parse_names_and_aliases() {
        assert_eq!("mainnet".parse::<StacksNetwork>().unwrap(), StacksNetwork::Mainnet);
        assert_eq!("Testnet".parse::<StacksNetwork>().unwrap(), StacksNetwork::Testnet);
        assert_eq!("stacks:1".parse::<StacksNetwork>().unwrap(), StacksNetwork::Mainnet);
        assert_eq!(
            "stacks:2147483648".parse::<StacksNetwork>().unwrap(),
            StacksNetwork::Testnet
        );
        assert!(matches!(
            "eip155:8453".parse::<StacksNetwork>(),
            Err(Stx402Error::UnknownNetwork(_))
        ));
    }

    #[test]
    fn test_from_address_version() {
        assert_eq!(StacksNetwork::from_address_version(22), Some(StacksNetwork::Mainnet));
        assert_eq!(StacksNetwork::from_address_version(21), Some(StacksNetwork::Testnet));
        assert_eq!(StacksNetwork::from_address_version(0), None);
    }

    #[test]
    fn test_tx_url() {
        assert_eq!(
            StacksNetwork::Testnet.tx_url("abcd"),
            "https://explorer.hiro.so/txid/0xabcd?chain=testnet"
        );
        assert_eq!(
            StacksNetwork::Mainnet.tx_url("0xabcd"),
            "https://explorer.hiro.so/txid/0xabcd?chain=mainnet"
        );
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&StacksNetwork::Mainnet).unwrap();
        assert_eq!(json, "\"mainnet\"");
        let net: StacksNetwork = serde_json::from_str("\"testnet\"").unwrap();
        assert_eq!(net, StacksNetwork::Testnet);
    }
}
