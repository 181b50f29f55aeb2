use super::chains::Chain;
use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// All stablecoin variants Stablepay can spend or settle in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Stablecoin {
    #[serde(rename = "USDC")]
    Usdc,
    #[serde(rename = "USDT")]
    Usdt,
    /// Bridged USDC on L2s that predate native issuance.
    #[serde(rename = "USDCe")]
    UsdcE,
    /// Bridged USDC on Base.
    #[serde(rename = "USDbC")]
    UsdbC,
    #[serde(rename = "USDT0")]
    Usdt0,
    /// Superchain USDT.
    #[serde(rename = "oUSDT")]
    OUsdt,
}

/// On-chain deployment of a stablecoin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDeployment {
    pub address: Address,
    pub decimals: u8,
}

const fn deployment(address: Address, decimals: u8) -> Option<TokenDeployment> {
    Some(TokenDeployment { address, decimals })
}

impl Stablecoin {
    pub const ALL: [Stablecoin; 6] = [
        Stablecoin::Usdc,
        Stablecoin::Usdt,
        Stablecoin::UsdcE,
        Stablecoin::UsdbC,
        Stablecoin::Usdt0,
        Stablecoin::OUsdt,
    ];

    /// Symbol substituted when the requested token is not supported.
    pub const DEFAULT: Stablecoin = Stablecoin::Usdc;

    pub const fn symbol(self) -> &'static str {
        match self {
            Stablecoin::Usdc => "USDC",
            Stablecoin::Usdt => "USDT",
            Stablecoin::UsdcE => "USDCe",
            Stablecoin::UsdbC => "USDbC",
            Stablecoin::Usdt0 => "USDT0",
            Stablecoin::OUsdt => "oUSDT",
        }
    }

    /// Case-insensitive symbol lookup.
    pub fn from_symbol(symbol: &str) -> Option<Stablecoin> {
        Self::ALL
            .into_iter()
            .find(|coin| coin.symbol().eq_ignore_ascii_case(symbol.trim()))
    }

    /// Contract address and decimals of this stablecoin on `chain`, if deployed.
    pub const fn deployment(self, chain: Chain) -> Option<TokenDeployment> {
        match (self, chain) {
            (Stablecoin::Usdc, Chain::Ethereum) => {
                deployment(address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"), 6)
            }
            (Stablecoin::Usdc, Chain::Optimism) => {
                deployment(address!("0b2c639c533813f4aa9d7837caf62653d097ff85"), 6)
            }
            (Stablecoin::Usdc, Chain::Polygon) => {
                deployment(address!("3c499c542cef5e3811e1192ce70d8cc03d5c3359"), 6)
            }
            (Stablecoin::Usdc, Chain::Base) => {
                deployment(address!("833589fcd6edb6e08f4c7c32d4f71b54bda02913"), 6)
            }
            (Stablecoin::Usdc, Chain::ArbitrumOne) => {
                deployment(address!("af88d065e77c8cc2239327c5edb3a432268e5831"), 6)
            }
            (Stablecoin::Usdc, Chain::Celo) => {
                deployment(address!("ceba9300f2b948710d2653dd7b07f33a8b32118c"), 6)
            }
            (Stablecoin::Usdc, Chain::Unichain) => {
                deployment(address!("078d782b760474a361dda0af3839290b0ef57ad6"), 6)
            }
            (Stablecoin::Usdt, Chain::Ethereum) => {
                deployment(address!("dac17f958d2ee523a2206206994597c13d831ec7"), 6)
            }
            (Stablecoin::Usdt, Chain::Optimism) => {
                deployment(address!("94b008aa00579c1307b0ef2c499ad98a8ce58e58"), 6)
            }
            (Stablecoin::Usdt, Chain::Polygon) => {
                deployment(address!("c2132d05d31c914a87c6611c10748aeb04b58e8f"), 6)
            }
            (Stablecoin::Usdt, Chain::ArbitrumOne) => {
                deployment(address!("fd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9"), 6)
            }
            (Stablecoin::Usdt, Chain::Celo) => {
                deployment(address!("48065fbbe25f71c9282ddf5e1cd6d6a887483d5e"), 6)
            }
            (Stablecoin::UsdcE, Chain::Optimism) => {
                deployment(address!("7f5c764cbc14f9669b88837ca1490cca17c31607"), 6)
            }
            (Stablecoin::UsdcE, Chain::Polygon) => {
                deployment(address!("2791bca1f2de4661ed88a30c99a7a9449aa84174"), 6)
            }
            (Stablecoin::UsdcE, Chain::ArbitrumOne) => {
                deployment(address!("ff970a61a04b1ca14834a43f5de4533ebddb5cc8"), 6)
            }
            (Stablecoin::UsdbC, Chain::Base) => {
                deployment(address!("d9aaec86b65d86f6a7b5b1b0c42ffa531710b6ca"), 6)
            }
            (Stablecoin::Usdt0, Chain::Ink) => {
                deployment(address!("0200c29006150606b650577bbe7b6248f58470c1"), 6)
            }
            (Stablecoin::OUsdt, Chain::Optimism | Chain::Base | Chain::Unichain | Chain::Ink) => {
                deployment(address!("1217bfe6c773eec6cc4a38b5dc45b92292b6e189"), 6)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Stablecoin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(Stablecoin::from_symbol("usdc"), Some(Stablecoin::Usdc));
        assert_eq!(Stablecoin::from_symbol("USDbC"), Some(Stablecoin::UsdbC));
        assert_eq!(Stablecoin::from_symbol(" ousdt "), Some(Stablecoin::OUsdt));
        assert_eq!(Stablecoin::from_symbol("DAI"), None);
    }

    #[test]
    fn test_serde_uses_symbols() {
        let json = serde_json::to_string(&Stablecoin::UsdcE).unwrap();
        assert_eq!(json, "\"USDCe\"");
        let parsed: Stablecoin = serde_json::from_str("\"USDT0\"").unwrap();
        assert_eq!(parsed, Stablecoin::Usdt0);
    }

    #[test]
    fn test_usdc_is_deployed_where_native() {
        assert!(Stablecoin::Usdc.deployment(Chain::Base).is_some());
        assert!(Stablecoin::Usdc.deployment(Chain::Ink).is_none());
        assert!(Stablecoin::UsdbC.deployment(Chain::Optimism).is_none());
    }
}
