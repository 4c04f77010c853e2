use {
    crate::{
        domain::{deploy::AccountResolving, eth, network},
        infra::config,
    },
    alloy::{
        providers::{DynProvider, Provider},
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result},
};

/// Picks the deployer account.
///
/// Development chains and local forks sign with the first account the node
/// has unlocked. Live networks use the private key from the wallet config.
pub struct Resolver {
    node: DynProvider,
    environments: network::Environments,
    wallets: config::Wallets,
}

impl Resolver {
    pub fn new(
        node: DynProvider,
        environments: network::Environments,
        wallets: config::Wallets,
    ) -> Self {
        Self {
            node,
            environments,
            wallets,
        }
    }
}

#[async_trait::async_trait]
impl AccountResolving for Resolver {
    async fn account(&self, network: &network::Name) -> Result<eth::Account> {
        if self.environments.uses_node_accounts(network) {
            let accounts = self
                .node
                .get_accounts()
                .await
                .context("failed to fetch node accounts")?;
            let address = accounts
                .first()
                .copied()
                .with_context(|| format!("node for {network} has no unlocked accounts"))?;
            return Ok(eth::Account::Unlocked(address));
        }

        let key = self.wallets.from_key()?;
        let signer: PrivateKeySigner = key
            .trim()
            .parse()
            .context("`wallets.from-key` is not a valid private key")?;
        Ok(eth::Account::Local(signer))
    }
}
