//! Liquidity-weighted selection between handler quotes.

use alloy::primitives::Address;
use log::debug;

use super::{PriceHandler, PriceLookup, PriceLookupResult};
use crate::{
    chain::Block,
    error::{Error, Result},
};

/// Ask every matching handler for a quote and keep the most liquid one.
///
/// Handlers are consulted in registration order and a later quote only
/// replaces the running best when its liquidity is strictly greater, so
/// ties go to the earlier handler.
///
/// A handler whose own peer lookups ran past the depth limit is treated as
/// having no quote. The depth error is returned only when no other handler
/// produced one. Any other error aborts the selection.
pub fn best_price<'a, I, H>(
    token: Address,
    handlers: I,
    lookup: &dyn PriceLookup,
    block: &Block,
) -> Result<Option<PriceLookupResult>>
where
    I: IntoIterator<Item = &'a H>,
    H: PriceHandler + ?Sized + 'a,
{
    let mut best: Option<PriceLookupResult> = None;
    let mut depth_error = None;

    for handler in handlers {
        if !handler.matches(token) {
            continue;
        }

        let quote = match handler.price(token, lookup, block) {
            Ok(Some(quote)) => quote,
            Ok(None) => continue,
            Err(err @ Error::MaxDepthExceeded { .. }) => {
                debug!("Skipping {} for {token}: {err}", handler.id());
                depth_error.get_or_insert(err);
                continue;
            }
            Err(err) => return Err(err),
        };

        if best
            .as_ref()
            .map_or(true, |current| quote.liquidity > current.liquidity)
        {
            best = Some(quote);
        }
    }

    match (best, depth_error) {
        (None, Some(err)) => Err(err),
        (best, _) => Ok(best),
    }
}
