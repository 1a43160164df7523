//! EIP-681 payment URI construction.
//!
//! Format: `ethereum:<address>@<chainId>?value=<integerSmallestUnit>`
//! with an additional `&token=<contractAddress>` for token payments.
//! Native payments omit the token parameter.

use crate::chain::tokens::{self, NATIVE_SYMBOL, TOKEN_DECIMALS};
use crate::ledger::PackageRule;

/// Mantle mainnet chain ID.
pub const MAINNET_CHAIN_ID: u64 = 5000;

/// Mantle testnet chain ID.
pub const TESTNET_CHAIN_ID: u64 = 5001;

/// Map a configured chain name to its numeric chain ID. Any name that
/// mentions "testnet" denotes the test network.
pub fn chain_id_for(chain: &str) -> u64 {
    if chain.to_ascii_lowercase().contains("testnet") {
        TESTNET_CHAIN_ID
    } else {
        MAINNET_CHAIN_ID
    }
}

/// Whether a configured chain name denotes the test network.
pub fn is_testnet(chain: &str) -> bool {
    chain_id_for(chain) == TESTNET_CHAIN_ID
}

/// Build the scannable payment URI for a rule.
///
/// The display amount is converted to the asset's smallest unit at the
/// fixed 6-decimal scale (floored). Unrecognized token symbols fall back
/// to the default token contract rather than rendering no asset.
pub fn payment_uri(rule: &PackageRule) -> String {
    let chain_id = chain_id_for(&rule.chain);
    let value = (rule.price * 10f64.powi(TOKEN_DECIMALS as i32)).floor() as u64;

    if rule.token_symbol.eq_ignore_ascii_case(NATIVE_SYMBOL) {
        return format!("ethereum:{}@{}?value={}", rule.wallet_address, chain_id, value);
    }

    let token = tokens::contract_address(&rule.token_symbol, is_testnet(&rule.chain))
        .unwrap_or_else(tokens::default_token_address);
    format!(
        "ethereum:{}@{}?value={}&token={}",
        rule.wallet_address, chain_id, value, token
    )
}
