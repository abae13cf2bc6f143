use alloy::contract::Error as ContractError;
use alloy::network::ReceiptResponse;
use alloy::providers::Provider;
use alloy::rpc::types::TransactionReceipt;
use alloy::transports::RpcError;
use alloy_primitives::{Address, Log, B256};
use thiserror::Error;
use tracing::{debug, info};

use crate::events::IRCFactory;
use crate::market::{MarketRequest, MarketType};

/// Ways a factory interaction can fail.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("no contract deployed at {0}")]
    NoContract(Address),
    #[error("contract at {address} does not match the factory ABI: {reason}")]
    Incompatible { address: Address, reason: String },
    /// Node refused the call, usually a revert during gas estimation.
    #[error("call rejected: {0}")]
    Rejected(String),
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("receipt for {0} has no block number")]
    MissingBlock(B256),
    #[error("transport error: {0}")]
    Transport(String),
}

/// A mined `createMarket` transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub tx_hash: B256,
    pub block_number: u64,
    pub logs: Vec<Log>,
}

/// The two factory entry points this tool needs.
#[allow(async_fn_in_trait)]
pub trait MarketFactory {
    fn address(&self) -> Address;

    /// Send `createMarket` and wait for its receipt.
    async fn create_market(&self, request: &MarketRequest) -> Result<Submission, FactoryError>;

    /// `getMostRecentMarket`. Racy if another creation is in flight.
    async fn most_recent_market(&self, market_type: MarketType) -> Result<Address, FactoryError>;
}

/// Transaction overrides and confirmation depth.
#[derive(Debug, Clone, Copy)]
pub struct TxOptions {
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
    pub confirmations: u64,
}

impl Default for TxOptions {
    fn default() -> Self {
        Self {
            gas: None,
            gas_price: None,
            confirmations: 1,
        }
    }
}

/// Build the `createMarket` call in its fixed argument order.
pub fn create_market_call(request: &MarketRequest) -> IRCFactory::createMarketCall {
    IRCFactory::createMarketCall {
        marketType: request.market_type.as_u8(),
        metadataHash: request.ipfs_hash.clone(),
        timestamps: request.timestamps.to_abi(),
        tokenURIs: request.token_uris.clone(),
        artistAddress: request.artist,
        affiliateAddress: request.affiliate,
        cardAffiliateAddresses: request.card_affiliates.clone(),
        question: request.question.clone(),
    }
}

/// Factory reached over a live provider.
pub struct RcFactory<P> {
    contract: IRCFactory::IRCFactoryInstance<P>,
    options: TxOptions,
}

impl<P: Provider> RcFactory<P> {
    /// Bind to `address`, failing early if nothing is deployed there.
    pub async fn connect(address: Address, provider: P, options: TxOptions) -> Result<Self, FactoryError> {
        let code = provider
            .get_code_at(address)
            .await
            .map_err(|e| FactoryError::Transport(e.to_string()))?;

        if code.is_empty() {
            return Err(FactoryError::NoContract(address));
        }
        debug!(%address, code_len = code.len(), "factory resolved");

        Ok(Self {
            contract: IRCFactory::new(address, provider),
            options,
        })
    }
}

impl<P: Provider> MarketFactory for RcFactory<P> {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn create_market(&self, request: &MarketRequest) -> Result<Submission, FactoryError> {
        let call = create_market_call(request);
        let mut builder = self.contract.call_builder(&call);
        if let Some(gas) = self.options.gas {
            builder = builder.gas(gas);
        }
        if let Some(price) = self.options.gas_price {
            builder = builder.gas_price(price);
        }

        let pending = builder
            .send()
            .await
            .map_err(|e| classify(self.address(), e))?;
        info!(tx = %pending.tx_hash(), "createMarket sent, waiting for receipt");

        let receipt = pending
            .with_required_confirmations(self.options.confirmations.max(1))
            .get_receipt()
            .await
            .map_err(|e| FactoryError::Transport(e.to_string()))?;

        submission_from_receipt(&receipt)
    }

    async fn most_recent_market(&self, market_type: MarketType) -> Result<Address, FactoryError> {
        self.contract
            .getMostRecentMarket(market_type.as_u8())
            .call()
            .await
            .map_err(|e| classify(self.address(), e))
    }
}

fn submission_from_receipt(receipt: &TransactionReceipt) -> Result<Submission, FactoryError> {
    let tx_hash = receipt.transaction_hash();
    if !receipt.status() {
        return Err(FactoryError::Reverted(tx_hash));
    }
    let block_number = receipt
        .block_number()
        .ok_or(FactoryError::MissingBlock(tx_hash))?;

    let logs = receipt
        .inner
        .logs()
        .iter()
        .map(|log| log.inner.clone())
        .collect();

    Ok(Submission {
        tx_hash,
        block_number,
        logs,
    })
}

fn classify(address: Address, err: ContractError) -> FactoryError {
    match err {
        ContractError::TransportError(RpcError::ErrorResp(payload)) => {
            FactoryError::Rejected(payload.message.to_string())
        }
        e @ (ContractError::ZeroData(..) | ContractError::AbiError(_)) => FactoryError::Incompatible {
            address,
            reason: e.to_string(),
        },
        e => FactoryError::Transport(e.to_string()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{market_from_logs, LogMarketCreated1};
    use crate::market::sample_request;
    use alloy::providers::ProviderBuilder;
    use alloy::sol_types::{SolCall, SolEvent};
    use alloy::transports::mock::Asserter;
    use alloy_primitives::{address, b256, hex, Bytes, U256};
    use serde_json::json;

    const FACTORY: Address = address!("0xbbB5690610b33CD89Afb79595353083E1EE9205a");
    const MARKET: Address = address!("0x00000000000000000000000000000000000000aa");
    const TX: B256 = b256!("0x1111111111111111111111111111111111111111111111111111111111111111");

    fn mocked(asserter: &Asserter) -> impl Provider {
        ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone())
    }

    async fn connected(asserter: &Asserter) -> RcFactory<impl Provider> {
        asserter.push_success(&Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]));
        RcFactory::connect(FACTORY, mocked(asserter), TxOptions::default())
            .await
            .unwrap()
    }

    fn receipt(status: &str, block: serde_json::Value, logs: Vec<serde_json::Value>) -> TransactionReceipt {
        serde_json::from_value(json!({
            "type": "0x2",
            "status": status,
            "cumulativeGasUsed": "0x5208",
            "logs": logs,
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": TX,
            "transactionIndex": "0x0",
            "blockHash": b256!("0x2222222222222222222222222222222222222222222222222222222222222222"),
            "blockNumber": block,
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x1",
            "from": address!("0x3333333333333333333333333333333333333333"),
            "to": FACTORY,
            "contractAddress": null
        }))
        .unwrap()
    }

    fn creation_log_json() -> serde_json::Value {
        let ev = LogMarketCreated1 {
            contractAddress: MARKET,
            treasuryAddress: Address::ZERO,
            nftHubAddress: Address::ZERO,
            referenceContractVersion: U256::from(1),
        };
        json!({
            "address": FACTORY,
            "topics": [LogMarketCreated1::SIGNATURE_HASH],
            "data": hex::encode_prefixed(ev.encode_data()),
            "blockHash": b256!("0x2222222222222222222222222222222222222222222222222222222222222222"),
            "blockNumber": "0x65",
            "transactionHash": TX,
            "transactionIndex": "0x0",
            "logIndex": "0x0",
            "removed": false
        })
    }

    #[tokio::test]
    async fn test_connect_rejects_empty_code() {
        let asserter = Asserter::new();
        asserter.push_success(&Bytes::new());

        let result = RcFactory::connect(FACTORY, mocked(&asserter), TxOptions::default()).await;
        assert!(matches!(result, Err(FactoryError::NoContract(a)) if a == FACTORY));
    }

    #[tokio::test]
    async fn test_connect_transport_failure() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("connection refused");

        let result = RcFactory::connect(FACTORY, mocked(&asserter), TxOptions::default()).await;
        assert!(matches!(result, Err(FactoryError::Transport(_))));
    }

    #[tokio::test]
    async fn test_most_recent_market_decodes_address() {
        let asserter = Asserter::new();
        let factory = connected(&asserter).await;
        assert_eq!(factory.address(), FACTORY);

        asserter.push_success(&Bytes::copy_from_slice(MARKET.into_word().as_slice()));
        let latest = factory.most_recent_market(MarketType::Classic).await.unwrap();
        assert_eq!(latest, MARKET);
    }

    #[tokio::test]
    async fn test_revert_is_rejected() {
        let asserter = Asserter::new();
        let factory = connected(&asserter).await;

        asserter.push_failure_msg("execution reverted: Not approved");
        let err = factory.most_recent_market(MarketType::Classic).await.unwrap_err();
        match err {
            FactoryError::Rejected(msg) => assert!(msg.contains("execution reverted")),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_return_data_is_incompatible() {
        let asserter = Asserter::new();
        let factory = connected(&asserter).await;

        asserter.push_success(&Bytes::new());
        let err = factory.most_recent_market(MarketType::Classic).await.unwrap_err();
        assert!(matches!(err, FactoryError::Incompatible { address, .. } if address == FACTORY));
    }

    #[test]
    fn test_receipt_with_creation_event() {
        let receipt = receipt("0x1", json!("0x65"), vec![creation_log_json()]);
        let sub = submission_from_receipt(&receipt).unwrap();

        assert_eq!(sub.tx_hash, TX);
        assert_eq!(sub.block_number, 101);
        assert_eq!(market_from_logs(FACTORY, &sub.logs), Some(MARKET));
    }

    #[test]
    fn test_failed_receipt_is_reverted() {
        let receipt = receipt("0x0", json!("0x65"), vec![]);
        assert!(matches!(
            submission_from_receipt(&receipt),
            Err(FactoryError::Reverted(h)) if h == TX
        ));
    }

    #[test]
    fn test_receipt_without_block() {
        let receipt = receipt("0x1", serde_json::Value::Null, vec![]);
        assert!(matches!(
            submission_from_receipt(&receipt),
            Err(FactoryError::MissingBlock(h)) if h == TX
        ));
    }

    #[test]
    fn test_calldata_argument_order() {
        let req = sample_request();
        let data = create_market_call(&req).abi_encode();

        assert_eq!(&data[..4], IRCFactory::createMarketCall::SELECTOR.as_slice());

        let decoded = IRCFactory::createMarketCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.marketType, 0);
        assert_eq!(decoded.metadataHash, req.ipfs_hash);
        assert_eq!(decoded.timestamps, req.timestamps.to_abi());
        assert_eq!(decoded.tokenURIs, req.token_uris);
        assert_eq!(decoded.cardAffiliateAddresses.len(), 3);
        assert_eq!(decoded.question, req.question);
    }

    #[test]
    fn test_selector_matches_signature() {
        assert_eq!(
            IRCFactory::createMarketCall::SIGNATURE,
            "createMarket(uint8,string,uint256[3],string[],address,address,address[],string)"
        );
        assert_eq!(
            IRCFactory::getMostRecentMarketCall::SIGNATURE,
            "getMostRecentMarket(uint8)"
        );
    }

    #[test]
    fn test_default_tx_options() {
        let opts = TxOptions::default();
        assert_eq!(opts.confirmations, 1);
        assert!(opts.gas.is_none());
        assert!(opts.gas_price.is_none());
    }
}
