use serde::{Deserialize, Serialize};

/// All chains a payer can spend from or a merchant can settle on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Optimism,
    Polygon,
    Base,
    #[serde(rename = "arbitrum")]
    ArbitrumOne,
    Celo,
    Unichain,
    Ink,
}

impl Chain {
    pub const ALL: [Chain; 8] = [
        Chain::Ethereum,
        Chain::Optimism,
        Chain::Polygon,
        Chain::Base,
        Chain::ArbitrumOne,
        Chain::Celo,
        Chain::Unichain,
        Chain::Ink,
    ];

    /// The chain whose legs are expensive and deferred during ranking.
    pub const MAINNET: Chain = Chain::Ethereum;

    pub const fn id(self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Optimism => 10,
            Chain::Polygon => 137,
            Chain::Base => 8453,
            Chain::ArbitrumOne => 42161,
            Chain::Celo => 42220,
            Chain::Unichain => 130,
            Chain::Ink => 57073,
        }
    }

    pub fn from_id(id: u64) -> Option<Chain> {
        Self::ALL.into_iter().find(|chain| chain.id() == id)
    }

    /// Key used by the balances and transfer-suggestion endpoints.
    pub const fn name(self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Optimism => "optimism",
            Chain::Polygon => "polygon",
            Chain::Base => "base",
            Chain::ArbitrumOne => "arbitrum",
            Chain::Celo => "celo",
            Chain::Unichain => "unichain",
            Chain::Ink => "ink",
        }
    }

    pub fn from_name(name: &str) -> Option<Chain> {
        Self::ALL
            .into_iter()
            .find(|chain| chain.name().eq_ignore_ascii_case(name))
    }

    pub const fn is_mainnet(self) -> bool {
        matches!(self, Chain::Ethereum)
    }

    pub const fn explorer_url(self) -> &'static str {
        match self {
            Chain::Ethereum => "https://etherscan.io",
            Chain::Optimism => "https://optimistic.etherscan.io",
            Chain::Polygon => "https://polygonscan.com",
            Chain::Base => "https://basescan.org",
            Chain::ArbitrumOne => "https://arbiscan.io",
            Chain::Celo => "https://celoscan.io",
            Chain::Unichain => "https://uniscan.xyz",
            Chain::Ink => "https://explorer.inkonchain.com",
        }
    }

    /// Explorer page for a transaction hash on this chain.
    pub fn tx_link(self, hash: impl std::fmt::Display) -> String {
        format!("{}/tx/{}", self.explorer_url(), hash)
    }
}

impl std::fmt::Display for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_lookup() {
        for chain in Chain::ALL {
            assert_eq!(Chain::from_id(chain.id()), Some(chain));
        }
        assert_eq!(Chain::from_id(5), None);
    }

    #[test]
    fn test_chain_name_is_case_insensitive() {
        assert_eq!(Chain::from_name("Base"), Some(Chain::Base));
        assert_eq!(Chain::from_name("ARBITRUM"), Some(Chain::ArbitrumOne));
        assert_eq!(Chain::from_name("tron"), None);
    }

    #[test]
    fn test_only_ethereum_is_mainnet() {
        let mainnets: Vec<_> = Chain::ALL.into_iter().filter(|c| c.is_mainnet()).collect();
        assert_eq!(mainnets, vec![Chain::MAINNET]);
    }
}
