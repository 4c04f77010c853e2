use {
    crate::domain::{eth, network},
    serde::Deserialize,
    serde_with::serde_as,
    std::{collections::HashMap, fmt::Debug, path::Path},
    tokio::fs,
    url::Url,
};

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Config {
    /// Network to deploy to when none is given on the command line.
    #[serde(default)]
    default_network: Option<String>,

    /// Networks on which a mock price feed gets deployed.
    #[serde(default)]
    local_environments: Option<Vec<String>>,

    /// Local forks of live networks. They use the configured price feed but
    /// sign with the node's accounts.
    #[serde(default)]
    forked_environments: Option<Vec<String>>,

    #[serde(default)]
    networks: HashMap<String, Network>,

    #[serde(default)]
    wallets: Wallets,

    #[serde(default)]
    mocks: Mocks,

    #[serde(default)]
    compiler: Compiler,

    #[serde(default)]
    etherscan: Etherscan,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Network {
    /// JSON-RPC endpoint of the network.
    host: Option<Url>,

    /// Address of the ETH/USD price feed.
    #[serde(alias = "eth_usd_price_feed")]
    eth_usd_price_feed: Option<eth::Address>,

    /// Publish the contract source after deploying.
    verify: Option<bool>,

    /// Blocks to wait for after the deployment is mined.
    #[serde(default = "default_confirmations")]
    confirmations: u64,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Wallets {
    /// Private key of the deployer. Use `%NAME` to read it from the
    /// environment variable `NAME`.
    #[serde(alias = "from_key")]
    from_key: Option<String>,
}

#[serde_as]
#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Mocks {
    #[serde(default = "default_decimals")]
    decimals: u8,

    /// Initial answer of the mock feed. Either an integer or a decimal string.
    #[serde_as(as = "serde_with::PickFirst<(_, serde_with::DisplayFromStr)>")]
    #[serde(default = "default_starting_price")]
    starting_price: i64,
}

impl Default for Mocks {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
            starting_price: default_starting_price(),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Compiler {
    /// Import remappings the contracts were compiled with. Needed to verify
    /// sources that import package files.
    #[serde(default)]
    remappings: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Etherscan {
    url: Option<Url>,

    /// API key for source verification. Supports the `%NAME` syntax.
    api_key: Option<String>,
}

fn default_confirmations() -> u64 {
    1
}

fn default_decimals() -> u8 {
    super::Mocks::default().decimals
}

fn default_starting_price() -> i64 {
    super::Mocks::default().starting_price
}

/// Load the deployment configuration from a TOML file.
///
/// # Panics
///
/// This method panics if the config is invalid or on I/O errors.
pub async fn load(path: &Path) -> super::Config {
    let data = fs::read_to_string(path)
        .await
        .unwrap_or_else(|e| panic!("I/O error while reading {path:?}: {e:?}"));
    unwrap_or_log(parse(&data), &path)
}

/// Parses the TOML contents of a configuration file.
pub fn parse(data: &str) -> Result<super::Config, toml::de::Error> {
    let config: Config = toml::de::from_str(data)?;

    let defaults = network::Environments::default();
    let environments = network::Environments {
        local: config
            .local_environments
            .map(|names| names.into_iter().map(network::Name::from).collect())
            .unwrap_or(defaults.local),
        forked: config
            .forked_environments
            .map(|names| names.into_iter().map(network::Name::from).collect())
            .unwrap_or(defaults.forked),
    };

    let networks = config
        .networks
        .into_iter()
        .map(|(name, network)| {
            (
                network::Name::from(name),
                network::Settings {
                    host: network.host,
                    eth_usd_price_feed: network.eth_usd_price_feed,
                    verify: network.verify,
                    confirmations: network.confirmations,
                },
            )
        })
        .collect();

    let etherscan_defaults = super::Etherscan::default();
    Ok(super::Config {
        default_network: config.default_network.map(network::Name::from),
        environments,
        networks,
        wallets: super::Wallets::new(config.wallets.from_key),
        mocks: super::Mocks {
            decimals: config.mocks.decimals,
            starting_price: config.mocks.starting_price,
        },
        compiler: super::Compiler {
            remappings: config.compiler.remappings,
        },
        etherscan: super::Etherscan {
            url: config.etherscan.url.unwrap_or(etherscan_defaults.url),
            api_key: config.etherscan.api_key,
        },
    })
}

/// Unwraps result or logs a `TOML` parsing error.
fn unwrap_or_log<T, E, P>(result: Result<T, E>, path: &P) -> T
where
    E: Debug,
    P: Debug,
{
    result.unwrap_or_else(|err| {
        if std::env::var("TOML_TRACE_ERROR").is_ok_and(|v| v == "1") {
            panic!("failed to parse TOML config at {path:?}: {err:#?}")
        } else {
            panic!(
                "failed to parse TOML config at: {path:?}. Set TOML_TRACE_ERROR=1 to print \
                 parsing error but this may leak secrets."
            )
        }
    })
}
