use bigdecimal::BigDecimal;
use serde::Serialize;

/// Daily protocol rollup, keyed by ISO date.
///
/// Staking figures are `None` on networks without staking contracts or
/// before they were deployed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMetric {
    pub date: String,
    pub block: u64,
    pub timestamp: u64,
    pub ohm_price: BigDecimal,
    pub gohm_price: Option<BigDecimal>,
    pub total_supply: BigDecimal,
    pub ohm_circulating_supply: BigDecimal,
    pub ohm_floating_supply: BigDecimal,
    pub market_cap: BigDecimal,
    pub treasury_market_value: BigDecimal,
    pub treasury_liquid_backing: BigDecimal,
    pub treasury_liquid_backing_per_ohm_floating: BigDecimal,
    pub current_index: Option<BigDecimal>,
    pub current_apy: Option<BigDecimal>,
}

impl ProtocolMetric {
    pub fn id(&self) -> String {
        self.date.clone()
    }
}
