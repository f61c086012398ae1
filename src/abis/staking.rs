use alloy::sol;

sol! {
    interface IStaking {
        function index() external view returns (uint256);
        function epoch() external view returns (uint256 length, uint256 number, uint256 end, uint256 distribute);
    }

    interface IStakedToken {
        function circulatingSupply() external view returns (uint256);
    }
}
