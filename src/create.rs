use alloy_primitives::{Address, B256};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events;
use crate::factory::{FactoryError, MarketFactory};
use crate::market::{MarketError, MarketRequest, MarketType};

#[derive(Debug, Error)]
pub enum CreateError {
    #[error("preflight: {0}")]
    Market(#[from] MarketError),
    #[error(transparent)]
    Factory(#[from] FactoryError),
    /// Transaction mined, but neither the receipt nor the factory names a market.
    #[error("no {market_type} market found after transaction {tx_hash}")]
    NoMarket { market_type: MarketType, tx_hash: B256 },
}

/// Where the reported market address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// `LogMarketCreated1` in our own receipt
    Event,
    /// `getMostRecentMarket`, only right under serialized use
    ReadBack,
}

#[derive(Debug, Clone, Copy)]
pub struct CreateOptions {
    /// Run `MarketRequest::check` before sending
    pub preflight: bool,
    /// Cross-check the event address against `getMostRecentMarket`
    pub read_back: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            preflight: true,
            read_back: true,
        }
    }
}

/// A market the factory created for us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMarket {
    pub address: Address,
    pub block_number: u64,
    pub tx_hash: B256,
    pub source: AddressSource,
}

/// Assemble, submit, and resolve the new market's address.
///
/// The address comes from the creation event in the transaction's own
/// receipt, so concurrent creations by other writers can't be mistaken for
/// ours. Only when the receipt has no such event do we fall back to
/// `getMostRecentMarket`.
pub async fn create_market<F: MarketFactory>(
    factory: &F,
    request: &MarketRequest,
    opts: CreateOptions,
) -> Result<CreatedMarket, CreateError> {
    if opts.preflight {
        request.check()?;
    }

    info!(
        factory = %factory.address(),
        market_type = %request.market_type,
        cards = request.card_count(),
        ipfs = %request.ipfs_hash,
        times = %request.timestamps,
        "creating market"
    );
    debug!(question = %request.question, "packed question");

    let submission = factory.create_market(request).await?;
    info!(
        tx = %submission.tx_hash,
        block = submission.block_number,
        "createMarket mined"
    );

    let (address, source) = match events::market_from_logs(factory.address(), &submission.logs) {
        Some(address) => {
            if opts.read_back {
                cross_check(factory, request, address).await;
            }
            (address, AddressSource::Event)
        }
        None => {
            warn!("no creation event in receipt, reading getMostRecentMarket (wrong if another creation raced us)");
            let address = factory.most_recent_market(request.market_type).await?;
            if address == Address::ZERO {
                return Err(CreateError::NoMarket {
                    market_type: request.market_type,
                    tx_hash: submission.tx_hash,
                });
            }
            (address, AddressSource::ReadBack)
        }
    };

    Ok(CreatedMarket {
        address,
        block_number: submission.block_number,
        tx_hash: submission.tx_hash,
        source,
    })
}

async fn cross_check<F: MarketFactory>(factory: &F, request: &MarketRequest, ours: Address) {
    match factory.most_recent_market(request.market_type).await {
        Ok(latest) if latest == ours => debug!(%latest, "read-back agrees"),
        Ok(latest) => warn!(
            %ours,
            %latest,
            "getMostRecentMarket disagrees with creation event, another market was created concurrently"
        ),
        Err(e) => warn!(error = %e, "read-back failed"),
    }
}
