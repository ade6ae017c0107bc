//! # Chain Registry
//!
//! Static table of the EVM networks the workflow can bind to, keyed by
//! chain selector name. The selector is the 64-bit identifier carried in
//! report contexts; the chain id is the EIP-155 id the RPC endpoint reports.

use serde::Serialize;

use crate::error::ConfigError;

/// One known EVM network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    /// Chain selector name, e.g. `ethereum-testnet-sepolia`.
    pub name: &'static str,
    /// 64-bit chain selector.
    pub selector: u64,
    /// EIP-155 chain id.
    pub chain_id: u64,
    /// Whether this is a test network.
    pub is_testnet: bool,
}

const fn chain(name: &'static str, selector: u64, chain_id: u64, is_testnet: bool) -> ChainInfo {
    ChainInfo {
        name,
        selector,
        chain_id,
        is_testnet,
    }
}

static CHAINS: &[ChainInfo] = &[
    chain("ethereum-mainnet", 5_009_297_550_715_157_269, 1, false),
    chain("ethereum-testnet-sepolia", 16_015_286_601_757_825_753, 11_155_111, true),
    chain("ethereum-testnet-sepolia-base-1", 10_344_971_235_874_465_080, 84_532, true),
    chain("ethereum-testnet-sepolia-arbitrum-1", 3_478_487_238_524_512_106, 421_614, true),
    chain("ethereum-testnet-sepolia-optimism-1", 5_224_473_277_236_331_295, 11_155_420, true),
    chain("ethereum-testnet-sepolia-worldchain-1", 5_299_555_114_858_065_850, 4_801, true),
    chain("polygon-testnet-amoy", 16_281_711_391_670_634_445, 80_002, true),
    chain("avalanche-testnet-fuji", 14_767_482_510_784_806_043, 43_113, true),
];

/// Every registered network.
pub fn all() -> &'static [ChainInfo] {
    CHAINS
}

/// Look up a network by selector name.
pub fn lookup(name: &str) -> Option<&'static ChainInfo> {
    CHAINS.iter().find(|c| c.name == name)
}

/// Resolve a selector name, requiring it to sit on the expected side of
/// the testnet/mainnet split.
pub fn resolve(name: &str, is_testnet: bool) -> Result<&'static ChainInfo, ConfigError> {
    let chain = lookup(name).ok_or_else(|| ConfigError::UnknownChain(name.to_string()))?;
    if chain.is_testnet != is_testnet {
        return Err(ConfigError::NetworkMismatch {
            chain: name.to_string(),
            expected: network_kind(is_testnet),
            actual: network_kind(chain.is_testnet),
        });
    }
    Ok(chain)
}

fn network_kind(is_testnet: bool) -> &'static str {
    if is_testnet {
        "testnet"
    } else {
        "mainnet"
    }
}
