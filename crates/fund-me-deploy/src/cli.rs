//! CLI arguments for the `deploy` binary.

use {
    crate::domain::network,
    clap::Parser,
    std::{
        fmt::{self, Display, Formatter},
        path::PathBuf,
    },
    url::Url,
};

/// Deploy the FundMe contract
#[derive(Parser)]
#[command(version)]
pub struct Args {
    /// The log filter.
    #[arg(long, env, default_value = "warn,fund_me_deploy=debug,contracts=debug")]
    pub log: String,

    /// Emit logs as JSON.
    #[arg(long, env, default_value = "false")]
    pub log_json: bool,

    /// Network to deploy to. Falls back to `default-network` from the config
    /// file and then to `development`.
    #[arg(long, env)]
    pub network: Option<network::Name>,

    /// Path to the deployment configuration file. This file should be in TOML
    /// format.
    #[arg(long, env, default_value = "deploy-config.toml")]
    pub config: PathBuf,

    /// Directory holding the compiled contract artifacts.
    #[arg(long, env, default_value = "build")]
    pub build_dir: PathBuf,

    /// JSON-RPC endpoint. Overrides the `host` of the selected network.
    #[arg(long, env)]
    pub node_url: Option<Url>,

    /// Etherscan API key. Overrides `etherscan.api-key` from the config file.
    #[arg(long, env = "ETHERSCAN_TOKEN")]
    pub etherscan_api_key: Option<String>,
}

// Custom Display so the arguments can be logged on start up without leaking
// the API key.
impl Display for Args {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let Self {
            log,
            log_json,
            network,
            config,
            build_dir,
            node_url,
            etherscan_api_key,
        } = self;

        writeln!(f, "log: {log}")?;
        writeln!(f, "log_json: {log_json}")?;
        display_option(f, "network", network)?;
        writeln!(f, "config: {}", config.display())?;
        writeln!(f, "build_dir: {}", build_dir.display())?;
        display_option(f, "node_url", node_url)?;
        display_option(
            f,
            "etherscan_api_key",
            &etherscan_api_key.as_ref().map(|_| "SECRET"),
        )?;
        Ok(())
    }
}

fn display_option(f: &mut Formatter, name: &str, option: &Option<impl Display>) -> fmt::Result {
    match option {
        Some(display) => writeln!(f, "{name}: {display}"),
        None => writeln!(f, "{name}: None"),
    }
}
