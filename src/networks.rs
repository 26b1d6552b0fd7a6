//! Network registry and chain constants
//!
//! Every network the claimer can run on, with its default RPC endpoint,
//! explorer link and claim capability. All accounts in a run share the
//! network chosen at the prompt.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Token contract, deployed at the same address on every supported chain
pub const TOKEN_ADDRESS: Address = address!("0x6985884c4392d348587b19cb9eaaf157f13271cd");

/// Default fixed commission recipient
pub const DEFAULT_COMMISSION_ADDRESS: Address = address!("0x32846a9aaf5eb8533095515785643a3bd3fdb5e9");

/// Networks offered at the prompt, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkName {
    Arbitrum,
    Avalanche,
    Base,
    BSC,
    Ethereum,
    Optimism,
    Polygon,
}

impl NetworkName {
    pub const ALL: [NetworkName; 7] = [
        NetworkName::Arbitrum,
        NetworkName::Avalanche,
        NetworkName::Base,
        NetworkName::BSC,
        NetworkName::Ethereum,
        NetworkName::Optimism,
        NetworkName::Polygon,
    ];

    pub fn chain_id(&self) -> u64 {
        match self {
            NetworkName::Arbitrum => 42161,
            NetworkName::Avalanche => 43114,
            NetworkName::Base => 8453,
            NetworkName::BSC => 56,
            NetworkName::Ethereum => 1,
            NetworkName::Optimism => 10,
            NetworkName::Polygon => 137,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkName::Arbitrum => "Arbitrum",
            NetworkName::Avalanche => "Avalanche",
            NetworkName::Base => "Base",
            NetworkName::BSC => "BSC",
            NetworkName::Ethereum => "Ethereum",
            NetworkName::Optimism => "Optimism",
            NetworkName::Polygon => "Polygon",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            NetworkName::Arbitrum => "Arbitrum One",
            NetworkName::Avalanche => "Avalanche C-Chain",
            NetworkName::Base => "Base",
            NetworkName::BSC => "Binance Smart Chain",
            NetworkName::Ethereum => "Ethereum",
            NetworkName::Optimism => "Optimism",
            NetworkName::Polygon => "Polygon",
        }
    }

    fn default_rpc(&self) -> &'static str {
        match self {
            NetworkName::Arbitrum => "https://rpc.ankr.com/arbitrum",
            NetworkName::Avalanche => "https://rpc.ankr.com/avalanche",
            NetworkName::Base => "https://rpc.ankr.com/base",
            NetworkName::BSC => "https://rpc.ankr.com/bsc",
            NetworkName::Ethereum => "https://rpc.ankr.com/eth",
            NetworkName::Optimism => "https://rpc.ankr.com/optimism",
            NetworkName::Polygon => "https://polygon-rpc.com",
        }
    }

    fn explorer_tx_url(&self) -> &'static str {
        match self {
            NetworkName::Arbitrum => "https://arbiscan.io/tx/",
            NetworkName::Avalanche => "https://snowtrace.io/tx/",
            NetworkName::Base => "https://basescan.org/tx/",
            NetworkName::BSC => "https://bscscan.com/tx/",
            NetworkName::Ethereum => "https://etherscan.io/tx/",
            NetworkName::Optimism => "https://optimistic.etherscan.io/tx/",
            NetworkName::Polygon => "https://polygonscan.com/tx/",
        }
    }

    /// How a claim is submitted on this network
    pub fn claim_route(&self) -> ClaimRoute {
        match self {
            NetworkName::Arbitrum => ClaimRoute::Local {
                contract: address!("0xb09f16f625b363875e39ada56c03682088471523"),
            },
            NetworkName::Base => ClaimRoute::Remote {
                contract: address!("0xf19ccb20726eab44754a59efc4ad331e3bf4f248"),
            },
            NetworkName::Ethereum => ClaimRoute::Remote {
                contract: address!("0xc28c2b2f5a9b2af1ad5878e5b1af5f9baea2f971"),
            },
            NetworkName::Optimism => ClaimRoute::Remote {
                contract: address!("0x3ef4abdb646976c096df532377efdfe0e6391ac3"),
            },
            NetworkName::Avalanche | NetworkName::BSC | NetworkName::Polygon => ClaimRoute::Unsupported,
        }
    }
}

impl fmt::Display for NetworkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim capability of a network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimRoute {
    /// Claim contract on the token's home chain; the donation is a fixed
    /// fraction of the allocation's value.
    Local { contract: Address },
    /// Claim contract that bridges the claim to the home chain; donation and
    /// messaging fee are quoted by the contract.
    Remote { contract: Address },
    /// No claim contract; only distribution of already-held tokens works.
    Unsupported,
}

/// A resolved network selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: NetworkName,
    pub chain_id: u64,
    pub label: String,
    pub rpc_url: String,
    pub explorer_tx_url: String,
    pub claim_route: ClaimRoute,
}

impl Network {
    /// Build the selection for `name`, honouring an RPC override if present
    pub fn resolve(name: NetworkName, rpc_overrides: &HashMap<NetworkName, String>) -> Self {
        Network {
            name,
            chain_id: name.chain_id(),
            label: name.label().to_string(),
            rpc_url: rpc_overrides
                .get(&name)
                .cloned()
                .unwrap_or_else(|| name.default_rpc().to_string()),
            explorer_tx_url: name.explorer_tx_url().to_string(),
            claim_route: name.claim_route(),
        }
    }

    /// Explorer link for a transaction hash
    pub fn tx_link(&self, tx_hash: impl fmt::Display) -> String {
        format!("{}{}", self.explorer_tx_url, tx_hash)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ID: {})", self.label, self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_ids_unique() {
        let mut ids: Vec<u64> = NetworkName::ALL.iter().map(|n| n.chain_id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), NetworkName::ALL.len());
    }

    #[test]
    fn test_rpc_override() {
        let mut overrides = HashMap::new();
        overrides.insert(NetworkName::Base, "https://base.example".to_string());

        let base = Network::resolve(NetworkName::Base, &overrides);
        let eth = Network::resolve(NetworkName::Ethereum, &overrides);

        assert_eq!(base.rpc_url, "https://base.example");
        assert_eq!(eth.rpc_url, "https://rpc.ankr.com/eth");
    }

    #[test]
    fn test_claim_routes() {
        assert!(matches!(NetworkName::Arbitrum.claim_route(), ClaimRoute::Local { .. }));
        assert!(matches!(NetworkName::Optimism.claim_route(), ClaimRoute::Remote { .. }));
        assert_eq!(NetworkName::Polygon.claim_route(), ClaimRoute::Unsupported);
    }

    #[test]
    fn test_display_and_links() {
        let network = Network::resolve(NetworkName::Arbitrum, &HashMap::new());
        assert_eq!(network.to_string(), "Arbitrum One (ID: 42161)");
        assert_eq!(network.tx_link("0xabc"), "https://arbiscan.io/tx/0xabc");
    }
}
