//! Exchange endpoint catalog.
//!
//! The endpoint is the caller-supplied selection parameter: it decides which
//! canonicalizer table is consulted (spot vs. derivatives) and which literal
//! exchange identifier is written into the version tag of every record.
//! Wire payloads do not self-identify their family for shared event codes,
//! so the endpoint must be passed alongside every frame.

use std::fmt;

/// A Binance stream endpoint the engine can normalize frames for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// binance.com spot streams.
    Spot,
    /// binance.com cross-margin user streams.
    SpotMargin,
    /// binance.com isolated-margin user streams.
    SpotIsolatedMargin,
    /// binance.com USD-M (linear) futures streams.
    UsdFutures,
    /// binance.com COIN-M (inverse) futures streams.
    CoinFutures,
    /// binance.us spot streams.
    Us,
    /// trbinance.com spot streams.
    Tr,
    /// binance.org chain streams. Frames from this endpoint cannot be
    /// converted and are returned unchanged.
    Chain,
}

impl Endpoint {
    /// The exchange identifier written into the version tag.
    #[must_use]
    pub const fn exchange_id(self) -> &'static str {
        match self {
            Self::Spot => "binance.com",
            Self::SpotMargin => "binance.com-margin",
            Self::SpotIsolatedMargin => "binance.com-isolated_margin",
            Self::UsdFutures => "binance.com-futures",
            Self::CoinFutures => "binance.com-coin_futures",
            Self::Us => "binance.us",
            Self::Tr => "trbinance.com",
            Self::Chain => "binance.org",
        }
    }

    /// The product family whose canonicalizer table applies, or `None` for
    /// endpoints the engine does not decode.
    #[must_use]
    pub const fn family(self) -> Option<Family> {
        match self {
            Self::Spot | Self::SpotMargin | Self::SpotIsolatedMargin | Self::Us | Self::Tr => {
                Some(Family::Spot)
            }
            Self::UsdFutures | Self::CoinFutures => Some(Family::Derivatives),
            Self::Chain => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.exchange_id())
    }
}

/// Product family grouping for event dispatch.
///
/// The same short discriminator code can mean different things in different
/// families, so the family is part of the dispatch key rather than being
/// collapsed away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Spot, margin and isolated-margin streams.
    Spot,
    /// USD-M and COIN-M futures streams.
    Derivatives,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Spot => "spot",
            Self::Derivatives => "derivatives",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_ids_are_stable() {
        assert_eq!(Endpoint::Spot.exchange_id(), "binance.com");
        assert_eq!(Endpoint::UsdFutures.exchange_id(), "binance.com-futures");
        assert_eq!(
            Endpoint::SpotIsolatedMargin.exchange_id(),
            "binance.com-isolated_margin"
        );
        assert_eq!(Endpoint::CoinFutures.exchange_id(), "binance.com-coin_futures");
    }

    #[test]
    fn families() {
        assert_eq!(Endpoint::Spot.family(), Some(Family::Spot));
        assert_eq!(Endpoint::SpotMargin.family(), Some(Family::Spot));
        assert_eq!(Endpoint::UsdFutures.family(), Some(Family::Derivatives));
        assert_eq!(Endpoint::CoinFutures.family(), Some(Family::Derivatives));
        assert_eq!(Endpoint::Chain.family(), None);
    }
}
