pub mod balancer;
pub mod curve;
pub mod erc20;
pub mod fraxswap;
pub mod staking;
pub mod v2;
pub mod v3;

pub use balancer::{IBalancerVault, IWeightedPool};
pub use curve::ICurvePool;
pub use erc20::IERC20;
pub use fraxswap::IFraxswapPair;
pub use staking::{IStakedToken, IStaking};
pub use v2::IUniswapV2Pair;
pub use v3::IUniswapV3Pool;
