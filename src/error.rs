use alloy::primitives::Address;

/// Errors raised while pricing tokens and valuing the treasury.
///
/// An unresolvable price or a reverted contract call is NOT an error: those
/// surface as `None`. Everything here either indicates stale configuration
/// or a condition that should abort the current block's computation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("division by zero")]
    DivisionByZero,

    #[error("token {token} is configured for pool {pool} but is not one of its on-chain tokens")]
    TokenNotInPool { pool: String, token: Address },

    #[error("handler {handler} cannot price non-member token {token}")]
    NotMember { handler: String, token: Address },

    #[error("no token metadata configured for {0}")]
    UnknownToken(Address),

    #[error("price lookup for {token} exceeded the maximum depth of {max_depth}")]
    MaxDepthExceeded { token: Address, max_depth: u8 },

    #[error("unable to resolve a USD price for {token} at block {block}")]
    Unresolved { token: String, block: u64 },

    #[error("{value} cannot be represented as an unsigned integer with {decimals} decimals")]
    Unrepresentable { value: String, decimals: u8 },

    #[error(transparent)]
    Call(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
