//! Unencoded route catalog: intent names with their example utterances.
//!
//! The catalog is what an operator edits. It is turned into a `RouteCorpus`
//! by running every utterance through an `Encoder`.

use serde::{Deserialize, Serialize};

/// One intent and the utterances that exemplify it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRoute {
    pub name: String,
    pub utterances: Vec<String>,
}

impl CatalogRoute {
    pub fn new(name: impl Into<String>, utterances: &[&str]) -> Self {
        Self {
            name: name.into(),
            utterances: utterances.iter().map(|u| (*u).to_string()).collect(),
        }
    }
}

/// Ordered list of intents. Declaration order is the classifier's tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCatalog {
    pub routes: Vec<CatalogRoute>,
}

impl RouteCatalog {
    pub fn new(routes: Vec<CatalogRoute>) -> Self {
        Self { routes }
    }

    /// The built-in DeFi assistant catalog.
    pub fn builtin() -> Self {
        Self::new(vec![
            CatalogRoute::new(
                "DefiStakeBorrowLend",
                &[
                    "I want to stake 100 pyth on pyth governance",
                    "Please borrow 100 usdc on Kamino",
                    "Lend 100 bonk on Marginify",
                    "I want to stake 100 jup on jupiter",
                    "Please lend 1123 jup on Kamino",
                    "Withdraw 0.01 sol from Kamino",
                    "Repay 123 usdc on Kamino",
                    "Deposit 100 bonk on Marginify",
                    "Supply 10000 dfl on Kamino",
                ],
            ),
            CatalogRoute::new(
                "DeFiBalance",
                &[
                    "Can you tell me my sol balance?",
                    "What is my lending usdc balance on Kamino?",
                    "How much bonk I've borrowed on Marginify?",
                    "Can you tell me my staked jup balance on jup governance?",
                    "how much jup do I have on kamino lending?",
                ],
            ),
            CatalogRoute::new(
                "DeFiTalker",
                &[
                    "How are you?",
                    "Who are you?",
                    "What is DeFi?",
                    "What is your project about?",
                    "For what can I use Kamino?",
                    "What is the purpose of Marginify?",
                    "What is SPL token?",
                    "Tell me about Pyth network",
                    "What features your product has?",
                    "What is Kamino?",
                    "What is the purpose of Jupiter?",
                    "How can I use landing on Kamino?",
                    "What does pyth do?",
                ],
            ),
            CatalogRoute::new(
                "News",
                &[
                    "What is the latest news on my followed Discords?",
                    "Summarize the latest news on my Defiland's announcements",
                    "What is the today's news on Twitter?",
                ],
            ),
            CatalogRoute::new(
                "CoinSearch",
                &[
                    "Give me list of coins which are in top 100 and are AI based",
                    "Find coins which have the same chart as Wif between 1-25 Dec 2023",
                    "Search for coins which have bullish divergence and are in top 100 market cap",
                    "Give me coins from solana ecosystem which are in top 100 market cap",
                    "What coins are similar to rndr?",
                    "Which coins have AI product?",
                ],
            ),
            CatalogRoute::new(
                "DeFiTransfer",
                &[
                    "Transfer 100 sol to 2snYEzbMckwnv85MW3s2sCaEQ1wtKZv2cj9WhbmDuuRD",
                    "Send 100 usdc to 2snYEzbMckwnv85MW3s2sCaEQ1wtKZv2cj9WhbmDuuRD",
                    "Please, send 100 bonk to ArSZESuVtg5ac7vN8mqmUUgi8Sn8HVh46vq3KmZ86UBY",
                ],
            ),
        ])
    }

    /// Route names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.name.as_str())
    }

    pub fn utterance_count(&self) -> usize {
        self.routes.iter().map(|r| r.utterances.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for RouteCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
