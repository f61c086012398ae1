use alloy::sol;

sol! {
    interface IFraxswapPair {
        function token0() external view returns (address);
        function token1() external view returns (address);
        function getReserveAfterTwamm(uint256 blockTimestamp) external view returns (uint112 _reserve0, uint112 _reserve1, uint256 lastVirtualOrderTimestamp, uint112 _twammReserve0, uint112 _twammReserve1);
    }
}
