//! Known token contract addresses on the Mantle network.

use alloy::primitives::{address, Address};

/// Symbol of the chain's native asset. Native transfers carry no token
/// contract and are verified against the transaction's own value field.
pub const NATIVE_SYMBOL: &str = "MNT";

/// Decimal scale shared by the supported stablecoins (USDT, USDC).
pub const TOKEN_DECIMALS: u32 = 6;

/// Look up the contract address for a token symbol.
///
/// Returns `None` for unsupported symbols and for testnet, where the
/// stablecoin deployments are not pinned yet.
pub fn contract_address(symbol: &str, testnet: bool) -> Option<Address> {
    if testnet {
        // TODO: pin testnet USDT/USDC deployments once published.
        return None;
    }
    match symbol.to_ascii_uppercase().as_str() {
        "USDT" => Some(address!("0x201eba5cc46d216ce6dc03f6a759e8e766e956ae")),
        "USDC" => Some(address!("0x09bc4e0d864854c6afb6eb9a9cdf58ac190d0df9")),
        _ => None,
    }
}

/// Default token contract used when a configured symbol is unrecognized
/// (payment URIs fall back to USDT rather than rendering no asset).
pub fn default_token_address() -> Address {
    address!("0x201eba5cc46d216ce6dc03f6a759e8e766e956ae")
}
