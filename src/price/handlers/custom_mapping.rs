use alloy::primitives::Address;

use super::pool_id;
use crate::{
    chain::Block,
    error::{Error, Result},
    price::{PriceHandler, PriceLookup, PriceLookupResult},
};

/// Prices a derivative token (a wrapper or receipt token) as its
/// underlying, one for one.
pub struct CustomMappingHandler {
    id: String,
    derivative: Address,
    underlying: Address,
}

impl CustomMappingHandler {
    pub fn new(derivative: Address, underlying: Address) -> Self {
        Self {
            id: pool_id(&derivative),
            derivative,
            underlying,
        }
    }
}

impl PriceHandler for CustomMappingHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, token: Address) -> bool {
        token == self.derivative
    }

    fn price(
        &self,
        token: Address,
        lookup: &dyn PriceLookup,
        block: &Block,
    ) -> Result<Option<PriceLookupResult>> {
        if !self.matches(token) {
            return Err(Error::NotMember {
                handler: self.id.clone(),
                token,
            });
        }

        lookup.lookup(self.underlying, block, Some(&self.id))
    }
}
