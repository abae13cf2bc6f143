use alloy::sol;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, Log};

// Only the parts of the RealityCards factory this tool touches.
sol! {
    #[sol(rpc, all_derives)]
    interface IRCFactory {
        /// Emitted once per market, first of the two creation events.
        event LogMarketCreated1(
            address contractAddress,
            address treasuryAddress,
            address nftHubAddress,
            uint256 referenceContractVersion
        );

        function createMarket(
            uint8 marketType,
            string metadataHash,
            uint256[3] timestamps,
            string[] tokenURIs,
            address artistAddress,
            address affiliateAddress,
            address[] cardAffiliateAddresses,
            string question
        ) external;

        function getMostRecentMarket(uint8 marketType) external view returns (address);
    }
}

pub use IRCFactory::LogMarketCreated1;

/// Market addresses announced by `factory` in these logs, in log order.
/// Logs from other contracts, or that don't decode, are skipped.
pub fn created_markets<'a>(factory: Address, logs: impl IntoIterator<Item = &'a Log>) -> Vec<Address> {
    logs.into_iter()
        .filter(|log| log.address == factory)
        .filter_map(|log| LogMarketCreated1::decode_log_data(&log.data).ok())
        .map(|ev| ev.contractAddress)
        .collect()
}

/// The market a single creation transaction made.
pub fn market_from_logs<'a>(factory: Address, logs: impl IntoIterator<Item = &'a Log>) -> Option<Address> {
    created_markets(factory, logs).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, LogData, U256};

    fn creation_log(factory: Address, market: Address) -> Log {
        let ev = LogMarketCreated1 {
            contractAddress: market,
            treasuryAddress: address!("0x1111111111111111111111111111111111111111"),
            nftHubAddress: address!("0x2222222222222222222222222222222222222222"),
            referenceContractVersion: U256::from(1),
        };
        Log {
            address: factory,
            data: ev.encode_log_data(),
        }
    }

    const FACTORY: Address = address!("0xbbB5690610b33CD89Afb79595353083E1EE9205a");
    const MARKET: Address = address!("0x00000000000000000000000000000000000000aa");

    #[test]
    fn test_market_from_creation_log() {
        let logs = vec![creation_log(FACTORY, MARKET)];
        assert_eq!(market_from_logs(FACTORY, &logs), Some(MARKET));
    }

    #[test]
    fn test_ignores_other_emitters() {
        let other = address!("0x3b557a58E5c6c4Df3e3307F9c7f5ce46472d80F7");
        let logs = vec![creation_log(other, MARKET)];
        assert_eq!(market_from_logs(FACTORY, &logs), None);
    }

    #[test]
    fn test_skips_unrelated_events() {
        let noise = Log {
            address: FACTORY,
            data: LogData::new_unchecked(vec![], vec![1, 2, 3].into()),
        };
        let logs = vec![noise, creation_log(FACTORY, MARKET)];
        assert_eq!(market_from_logs(FACTORY, &logs), Some(MARKET));
    }

    #[test]
    fn test_created_markets_keeps_order() {
        let second = address!("0x00000000000000000000000000000000000000bb");
        let logs = vec![creation_log(FACTORY, MARKET), creation_log(FACTORY, second)];
        assert_eq!(created_markets(FACTORY, &logs), vec![MARKET, second]);
    }
}
