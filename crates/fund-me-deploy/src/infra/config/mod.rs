use {
    crate::domain::network,
    anyhow::{Context, Result},
    std::fmt::{self, Debug, Formatter},
    url::Url,
};

pub mod file;

/// Deployment configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Network to use when none is given on the command line.
    pub default_network: Option<network::Name>,
    pub environments: network::Environments,
    pub networks: network::Networks,
    pub wallets: Wallets,
    pub mocks: Mocks,
    pub compiler: Compiler,
    pub etherscan: Etherscan,
}

/// Keys used to sign transactions on live networks.
#[derive(Clone, Default)]
pub struct Wallets {
    pub(crate) from_key: Option<String>,
}

impl Wallets {
    pub fn new(from_key: Option<String>) -> Self {
        Self { from_key }
    }

    /// The hex encoded private key of the deployer.
    pub fn from_key(&self) -> Result<String> {
        let raw = self
            .from_key
            .as_deref()
            .context("no `wallets.from-key` configured")?;
        resolve_env(raw)
    }
}

impl Debug for Wallets {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallets")
            .field("from_key", &self.from_key.as_ref().map(|_| "SECRET"))
            .finish()
    }
}

/// Parameters of the mock price feed deployed on local networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mocks {
    pub decimals: u8,
    /// Initial answer of the feed, scaled by `decimals`.
    pub starting_price: i64,
}

impl Default for Mocks {
    fn default() -> Self {
        Self {
            decimals: 8,
            starting_price: 2_000 * 10_i64.pow(8),
        }
    }
}

/// Compiler settings the contracts were built with that the build artifacts
/// do not record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compiler {
    /// Import remappings, e.g. `@chainlink=smartcontractkit/chainlink@1.1.1`.
    pub remappings: Vec<String>,
}

#[derive(Clone)]
pub struct Etherscan {
    pub url: Url,
    pub(crate) api_key: Option<String>,
}

impl Etherscan {
    pub const URL: &'static str = "https://api.etherscan.io/v2/api";

    pub fn api_key(&self) -> Result<Option<String>> {
        self.api_key.as_deref().map(resolve_env).transpose()
    }
}

impl Default for Etherscan {
    fn default() -> Self {
        Self {
            url: Url::parse(Self::URL).unwrap(),
            api_key: None,
        }
    }
}

impl Debug for Etherscan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Etherscan")
            .field("url", &self.url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "SECRET"))
            .finish()
    }
}

/// Secrets are usually injected through the environment rather than written
/// into the config file. A value of the form `%NAME` or `${NAME}` is replaced
/// by the contents of the environment variable `NAME`.
fn resolve_env(raw: &str) -> Result<String> {
    resolve_with(raw, |name| std::env::var(name))
}

fn resolve_with(
    raw: &str,
    lookup: impl FnOnce(&str) -> Result<String, std::env::VarError>,
) -> Result<String> {
    let name = raw
        .strip_prefix('%')
        .or_else(|| raw.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')));
    match name {
        Some(name) => {
            lookup(name).with_context(|| format!("environment variable {name} is not available"))
        }
        None => Ok(raw.to_owned()),
    }
}
