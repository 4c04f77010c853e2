use {
    crate::{
        cli,
        domain::{Deployed, Error, Orchestrator, network},
        infra::{accounts, blockchain, config, deployer, etherscan, mocks},
    },
    clap::Parser,
    std::{process::ExitCode, sync::Arc},
    url::Url,
};

/// Runs the `deploy` binary and maps the outcome to the process exit code.
pub async fn start(args: impl Iterator<Item = String>) -> ExitCode {
    let args = cli::Args::parse_from(args);
    observe::tracing::initialize(
        &observe::Config::new(&args.log).with_json_format(args.log_json),
    );
    tracing::info!("running deployment with validated arguments:\n{args}");

    match run(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(?err, "deployment failed");
            ExitCode::FAILURE
        }
    }
}

/// Loads the configuration, wires the chain collaborators and deploys the
/// contract once. The deployed address is reported on stdout.
pub async fn run(args: cli::Args) -> Result<Deployed, Error> {
    let config = config::file::load(&args.config).await;

    let network = args
        .network
        .or_else(|| config.default_network.clone())
        .unwrap_or_default();
    let url = node_url(&network, args.node_url, &config)?;
    tracing::info!(%network, node = %url, "selected network");

    let etherscan = args
        .etherscan_api_key
        .map(Ok)
        .or_else(|| config.etherscan.api_key().transpose())
        .transpose()
        .unwrap_or_else(|err| {
            tracing::warn!(?err, "ignoring unusable Etherscan API key");
            None
        })
        .map(|api_key| etherscan::Client::new(config.etherscan.url.clone(), api_key));

    let orchestrator = Orchestrator {
        accounts: Arc::new(accounts::Resolver::new(
            blockchain::provider(&url),
            config.environments.clone(),
            config.wallets.clone(),
        )),
        mocks: Arc::new(mocks::MockPriceFeed::new(
            url.clone(),
            args.build_dir.clone(),
            config.mocks,
        )),
        deployer: Arc::new(deployer::Deployer::new(
            url,
            args.build_dir,
            config.networks.confirmations(&network),
            config.compiler.remappings,
            etherscan,
        )),
        network,
        environments: config.environments,
        networks: config.networks,
    };

    orchestrator.deploy_contract(&mut std::io::stdout()).await
}

/// The command line wins over the network's `host`. Networks signed by the
/// node fall back to a node on localhost.
fn node_url(
    network: &network::Name,
    cli: Option<Url>,
    config: &config::Config,
) -> Result<Url, Error> {
    if let Some(url) = cli.or_else(|| {
        config
            .networks
            .get(network)
            .and_then(|settings| settings.host.clone())
    }) {
        return Ok(url);
    }
    if config.environments.uses_node_accounts(network) {
        return Url::parse(blockchain::LOCAL_NODE)
            .map_err(|err| Error::Deployment(anyhow::Error::new(err)));
    }
    Err(Error::MissingConfigKey {
        network: network.clone(),
        key: "host",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml: &str) -> config::Config {
        config::file::parse(toml).unwrap()
    }

    #[test]
    fn node_url_prefers_command_line() {
        let config = config(
            r#"
            [networks.sepolia]
            host = "https://sepolia.example.com"
            "#,
        );

        let url = node_url(
            &"sepolia".into(),
            Some("http://localhost:9545".parse().unwrap()),
            &config,
        )
        .unwrap();

        assert_eq!(url.as_str(), "http://localhost:9545/");
    }

    #[test]
    fn node_url_from_network_host() {
        let config = config(
            r#"
            [networks.sepolia]
            host = "https://sepolia.example.com"
            "#,
        );

        let url = node_url(&"sepolia".into(), None, &config).unwrap();

        assert_eq!(url.as_str(), "https://sepolia.example.com/");
    }

    #[test]
    fn local_networks_default_to_localhost() {
        let config = config("");

        let url = node_url(&"development".into(), None, &config).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8545/");

        let url = node_url(&"mainnet-fork".into(), None, &config).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn live_network_requires_host() {
        let config = config("");

        let err = node_url(&"sepolia".into(), None, &config).unwrap_err();

        assert!(matches!(
            err,
            Error::MissingConfigKey { network, key: "host" } if network.as_str() == "sepolia"
        ));
    }
}
