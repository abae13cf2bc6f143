use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::{Question, Timestamps};

/// Factory market mode, the `uint8` selector passed to `createMarket`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum MarketType {
    /// Normal market. The only mode used so far.
    #[default]
    Classic,
    Winner,
    SafeMode,
}

impl MarketType {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Classic => 0,
            Self::Winner => 1,
            Self::SafeMode => 2,
        }
    }
}

impl TryFrom<u8> for MarketType {
    type Error = MarketError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Classic),
            1 => Ok(Self::Winner),
            2 => Ok(Self::SafeMode),
            other => Err(MarketError::UnknownType(other)),
        }
    }
}

impl From<MarketType> for u8 {
    fn from(t: MarketType) -> u8 {
        t.as_u8()
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Classic => "classic",
            Self::Winner => "winner",
            Self::SafeMode => "safe-mode",
        };
        write!(f, "{} ({})", name, self.as_u8())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarketError {
    #[error("unknown market type {0}")]
    UnknownType(u8),
    #[error("market needs at least one card")]
    NoCards,
    #[error("{affiliates} card affiliates for {cards} cards")]
    CardAffiliateMismatch { cards: usize, affiliates: usize },
    #[error("timestamps out of order: {0}")]
    TimestampOrder(Timestamps),
    #[error("empty IPFS hash")]
    EmptyHash,
    #[error("empty question")]
    EmptyQuestion,
}

/// Everything `createMarket` takes, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRequest {
    pub market_type: MarketType,
    pub ipfs_hash: String,
    pub timestamps: Timestamps,
    /// One NFT metadata URI per outcome card
    pub token_uris: Vec<String>,
    pub artist: Address,
    pub affiliate: Address,
    /// One per card, zero address for none
    pub card_affiliates: Vec<Address>,
    /// Packed question, passed to the factory as-is
    pub question: String,
}

impl MarketRequest {
    pub fn card_count(&self) -> usize {
        self.token_uris.len()
    }

    /// Card affiliate list of zero addresses sized to the cards.
    pub fn no_card_affiliates(&self) -> Vec<Address> {
        vec![Address::ZERO; self.card_count()]
    }

    /// Local checks the factory would otherwise only surface as a revert.
    pub fn check(&self) -> Result<(), MarketError> {
        if self.token_uris.is_empty() {
            return Err(MarketError::NoCards);
        }
        if self.card_affiliates.len() != self.token_uris.len() {
            return Err(MarketError::CardAffiliateMismatch {
                cards: self.token_uris.len(),
                affiliates: self.card_affiliates.len(),
            });
        }
        if !self.timestamps.is_ordered() {
            return Err(MarketError::TimestampOrder(self.timestamps));
        }
        if self.ipfs_hash.trim().is_empty() {
            return Err(MarketError::EmptyHash);
        }
        if Question::decode(&self.question).text.trim().is_empty() {
            return Err(MarketError::EmptyQuestion);
        }
        Ok(())
    }
}
