//! Centralized Contract Definitions
//!
//! Solidity interfaces used by the engine's chain collaborators, defined
//! with alloy's `sol!` macro. Each is annotated with `#[sol(rpc)]` to
//! generate contract instance types callable through any alloy Provider.
//!
//! Created: 2026-10-17

use alloy::sol;

// ── ERC20 ─────────────────────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}

// ── Uniswap-like batch query ─────────────────────────────────────────

sol! {
    /// Read-only helper deployed next to Uniswap V2 style factories.
    /// Reserve rows are `[reserve0, reserve1, blockTimestampLast]`,
    /// pair rows are `[token0, token1, pair]`.
    #[sol(rpc)]
    interface IUniswapFlashQuery {
        function getReservesByPairs(address[] calldata pairs) external view returns (uint256[3][] memory);
        function getPairsByIndexRange(address uniswapFactory, uint256 start, uint256 stop) external view returns (address[3][] memory);
    }
}
