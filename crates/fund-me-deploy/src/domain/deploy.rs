//! Deployment of the FundMe contract.
//!
//! The procedure is a straight line with a single branch: on a local network
//! the price feed is a freshly deployed mock, on any other network it is the
//! configured ETH/USD feed. Chain access is behind the collaborator traits in
//! this module so the procedure itself only depends on its inputs.

use {
    crate::domain::{eth, network},
    std::{io::Write, sync::Arc},
};

/// Resolves the account that signs the deployment.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AccountResolving: Send + Sync {
    async fn account(&self, network: &network::Name) -> anyhow::Result<eth::Account>;
}

/// Deploys the mock contracts needed on local networks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MockDeploying: Send + Sync {
    /// Returns the address of the deployed mock price feed, or `None` if the
    /// deployment did not produce one.
    async fn deploy_mocks(&self, account: &eth::Account) -> anyhow::Result<Option<eth::Address>>;
}

/// Deploys the FundMe contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContractDeploying: Send + Sync {
    /// Deploys a contract that reads prices from `price_feed`. If `verify`
    /// is set the contract source gets published after the deployment.
    async fn deploy(
        &self,
        price_feed: eth::Address,
        options: TransactionOptions,
        verify: bool,
    ) -> anyhow::Result<Deployed>;
}

#[derive(Clone, Debug)]
pub struct TransactionOptions {
    pub from: eth::Account,
}

/// A deployed contract instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployed {
    pub address: eth::Address,
    pub transaction: eth::TxHash,
    pub block: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no signing account available: {0:#}")]
    AccountResolution(anyhow::Error),
    #[error("missing configuration key {key:?} for network {network}")]
    MissingConfigKey {
        network: network::Name,
        key: &'static str,
    },
    #[error("no mock price feed was deployed")]
    NoMockDeployed,
    #[error("deployment failed: {0:#}")]
    Deployment(anyhow::Error),
    #[error("contract deployed to {address} but reporting it failed: {source}")]
    Report {
        address: eth::Address,
        source: std::io::Error,
    },
}

pub struct Orchestrator {
    pub network: network::Name,
    pub environments: network::Environments,
    pub networks: network::Networks,
    pub accounts: Arc<dyn AccountResolving>,
    pub mocks: Arc<dyn MockDeploying>,
    pub deployer: Arc<dyn ContractDeploying>,
}

impl Orchestrator {
    /// Deploys the contract and writes `Contract deployed to <address>` to
    /// `out`.
    pub async fn deploy_contract(&self, out: &mut (impl Write + Send)) -> Result<Deployed, Error> {
        let account = self
            .accounts
            .account(&self.network)
            .await
            .map_err(Error::AccountResolution)?;
        tracing::debug!(network = %self.network, account = %account.address(), "resolved account");

        let price_feed = self.price_feed(&account).await?;

        let verify = self.networks.verify(&self.network);
        if !verify {
            tracing::debug!(network = %self.network, "source verification not requested");
        }

        let deployed = self
            .deployer
            .deploy(price_feed, TransactionOptions { from: account }, verify)
            .await
            .map_err(Error::Deployment)?;
        tracing::info!(
            address = %deployed.address,
            tx_hash = ?deployed.transaction,
            block = ?deployed.block,
            "contract deployed"
        );

        writeln!(out, "Contract deployed to {}", deployed.address).map_err(|source| {
            tracing::error!(address = %deployed.address, "contract deployed but not reported");
            Error::Report {
                address: deployed.address,
                source,
            }
        })?;
        Ok(deployed)
    }

    async fn price_feed(&self, account: &eth::Account) -> Result<eth::Address, Error> {
        if !self.environments.is_local(&self.network) {
            let feed =
                self.networks
                    .price_feed(&self.network)
                    .ok_or_else(|| Error::MissingConfigKey {
                        network: self.network.clone(),
                        key: "eth_usd_price_feed",
                    })?;
            tracing::info!(network = %self.network, %feed, "using configured price feed");
            return Ok(feed);
        }

        tracing::info!(network = %self.network, "local network, deploying mocks");
        let feed = self
            .mocks
            .deploy_mocks(account)
            .await
            .map_err(|err| Error::Deployment(err.context("failed to deploy mocks")))?
            .ok_or(Error::NoMockDeployed)?;
        tracing::info!(%feed, "using mock price feed");
        Ok(feed)
    }
}
