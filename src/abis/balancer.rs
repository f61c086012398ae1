use alloy::sol;

sol! {
    interface IBalancerVault {
        function getPoolTokens(bytes32 poolId) external view returns (address[] tokens, uint256[] balances, uint256 lastChangeBlock);
    }

    interface IWeightedPool {
        function getNormalizedWeights() external view returns (uint256[]);
    }
}
