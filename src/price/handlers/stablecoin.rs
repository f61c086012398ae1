use alloy::primitives::Address;
use bigdecimal::BigDecimal;
use once_cell::sync::Lazy;

use crate::{
    chain::Block,
    error::{Error, Result},
    price::{PriceHandler, PriceLookup, PriceLookupResult},
};

/// Liquidity reported for pegged quotes, above any real pool so the peg
/// wins the router's selection.
static PEG_LIQUIDITY: Lazy<BigDecimal> = Lazy::new(|| BigDecimal::new(1.into(), -15));

/// Prices every member token at exactly $1.
pub struct StablecoinHandler {
    id: String,
    tokens: Vec<Address>,
}

impl StablecoinHandler {
    pub fn new(id: impl Into<String>, tokens: Vec<Address>) -> Self {
        Self {
            id: id.into(),
            tokens,
        }
    }
}

impl PriceHandler for StablecoinHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, token: Address) -> bool {
        self.tokens.contains(&token)
    }

    fn price(
        &self,
        token: Address,
        _lookup: &dyn PriceLookup,
        _block: &Block,
    ) -> Result<Option<PriceLookupResult>> {
        if !self.matches(token) {
            return Err(Error::NotMember {
                handler: self.id.clone(),
                token,
            });
        }

        Ok(Some(PriceLookupResult::new(
            BigDecimal::from(1),
            PEG_LIQUIDITY.clone(),
        )))
    }
}
