use {
    crate::domain::eth,
    std::{
        collections::{BTreeSet, HashMap},
        fmt::{self, Display, Formatter},
    },
    url::Url,
};

/// Name of the network to deploy to, e.g. `development` or `sepolia`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    /// Network used when neither the command line nor the config pick one.
    pub const DEFAULT: &'static str = "development";

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Name {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of networks that are not live chains.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Environments {
    /// Ephemeral chains without a real price feed. Deployments on them use a
    /// freshly deployed mock instead.
    pub local: BTreeSet<Name>,
    /// Local forks of a live chain. The live price feed exists on them but
    /// the node's unlocked accounts are used for signing.
    pub forked: BTreeSet<Name>,
}

impl Environments {
    pub fn is_local(&self, network: &Name) -> bool {
        self.local.contains(network)
    }

    /// Whether transactions on `network` are signed by the node itself.
    pub fn uses_node_accounts(&self, network: &Name) -> bool {
        self.local.contains(network) || self.forked.contains(network)
    }
}

impl Default for Environments {
    fn default() -> Self {
        Self {
            local: ["development", "ganache-local"]
                .into_iter()
                .map(Name::from)
                .collect(),
            forked: ["mainnet-fork", "mainnet-fork-dev"]
                .into_iter()
                .map(Name::from)
                .collect(),
        }
    }
}

/// Per network settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    /// JSON-RPC endpoint of the network.
    pub host: Option<Url>,
    /// Address of the ETH/USD price feed on a live network.
    pub eth_usd_price_feed: Option<eth::Address>,
    /// Whether to publish the contract source after deploying.
    pub verify: Option<bool>,
    /// Number of blocks to wait for after the deployment transaction is
    /// mined.
    pub confirmations: u64,
}

#[derive(Clone, Debug, Default)]
pub struct Networks(HashMap<Name, Settings>);

impl Networks {
    pub fn get(&self, network: &Name) -> Option<&Settings> {
        self.0.get(network)
    }

    pub fn price_feed(&self, network: &Name) -> Option<eth::Address> {
        self.get(network)?.eth_usd_price_feed
    }

    /// Verification is opt-in: a network without a `verify` setting is not
    /// verified.
    pub fn verify(&self, network: &Name) -> bool {
        self.get(network)
            .and_then(|settings| settings.verify)
            .unwrap_or(false)
    }

    pub fn confirmations(&self, network: &Name) -> u64 {
        self.get(network)
            .map(|settings| settings.confirmations)
            .unwrap_or(1)
            .max(1)
    }
}

impl FromIterator<(Name, Settings)> for Networks {
    fn from_iter<T: IntoIterator<Item = (Name, Settings)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
