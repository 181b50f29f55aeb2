//! Solidity bindings for the contracts checkout actions call.

use alloy::primitives::U256;
use alloy::sol;
use stablepay_sdk::objects::intent as wire;

sol! {
    #[sol(rpc)]
    #[derive(Debug)]
    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    struct TokenAmount {
        address token;
        uint256 amount;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Call {
        address target;
        bytes data;
        uint256 value;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Route {
        bytes32 salt;
        uint256 source;
        uint256 destination;
        address inbox;
        TokenAmount[] tokens;
        Call[] calls;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Reward {
        address creator;
        address prover;
        uint256 deadline;
        uint256 nativeValue;
        TokenAmount[] tokens;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Intent {
        Route route;
        Reward reward;
    }

    /// Escrows intent rewards on the source chain.
    #[sol(rpc)]
    #[derive(Debug)]
    interface IIntentSource {
        function publishAndFund(Intent calldata intent, bool allowPartial) external payable returns (bytes32 intentHash);
    }
}

fn token_amounts(tokens: &[wire::TokenAmount]) -> Vec<TokenAmount> {
    tokens
        .iter()
        .map(|t| TokenAmount {
            token: t.token,
            amount: t.amount,
        })
        .collect()
}

impl From<&wire::Intent> for Intent {
    fn from(intent: &wire::Intent) -> Self {
        let route = &intent.route;
        let reward = &intent.reward;
        Intent {
            route: Route {
                salt: route.salt,
                source: U256::from(route.source),
                destination: U256::from(route.destination),
                inbox: route.inbox,
                tokens: token_amounts(&route.tokens),
                calls: route
                    .calls
                    .iter()
                    .map(|c| Call {
                        target: c.target,
                        data: c.data.clone(),
                        value: c.value,
                    })
                    .collect(),
            },
            reward: Reward {
                creator: reward.creator,
                prover: reward.prover,
                deadline: U256::from(reward.deadline),
                nativeValue: reward.native_value,
                tokens: token_amounts(&reward.tokens),
            },
        }
    }
}
