use {
    crate::{
        domain::{
            deploy::{ContractDeploying, Deployed, TransactionOptions},
            eth,
        },
        infra::{blockchain, etherscan},
    },
    alloy::{providers::Provider, sol_types::SolConstructor},
    anyhow::{Context, Result},
    contracts::{Artifact, FundMe},
    std::path::PathBuf,
    url::Url,
};

/// Deploys FundMe from its build artifact.
pub struct Deployer {
    url: Url,
    build_dir: PathBuf,
    confirmations: u64,
    remappings: Vec<String>,
    etherscan: Option<etherscan::Client>,
}

impl Deployer {
    /// Without an Etherscan client, requested source verification is skipped.
    /// `remappings` are the import remappings the contract was compiled with.
    pub fn new(
        url: Url,
        build_dir: PathBuf,
        confirmations: u64,
        remappings: Vec<String>,
        etherscan: Option<etherscan::Client>,
    ) -> Self {
        Self {
            url,
            build_dir,
            confirmations,
            remappings,
            etherscan,
        }
    }

    /// Publishes the contract source. Returns whether it got verified,
    /// failures are only logged.
    async fn verify(
        &self,
        provider: &impl Provider,
        artifact: &Artifact,
        deployed: &Deployed,
        constructor: &FundMe::FundMe::constructorCall,
    ) -> bool {
        let Some(client) = &self.etherscan else {
            tracing::warn!(
                address = %deployed.address,
                "source verification requested but no Etherscan API key is configured"
            );
            return false;
        };

        match self
            .submit_source(client, provider, artifact, deployed, constructor)
            .await
        {
            Ok(()) => {
                tracing::info!(address = %deployed.address, "contract source verified");
                true
            }
            Err(err) => {
                tracing::warn!(
                    address = %deployed.address,
                    ?err,
                    "contract source verification failed"
                );
                false
            }
        }
    }

    async fn submit_source(
        &self,
        client: &etherscan::Client,
        provider: &impl Provider,
        artifact: &Artifact,
        deployed: &Deployed,
        constructor: &FundMe::FundMe::constructorCall,
    ) -> Result<()> {
        let chain_id = provider
            .get_chain_id()
            .await
            .context("failed to fetch chain id")?;
        let sources = contracts::sources::collect(&self.build_dir, artifact).await?;
        let submission = etherscan::Submission {
            address: deployed.address,
            artifact,
            sources: &sources,
            remappings: &self.remappings,
            constructor_arguments: constructor.abi_encode(),
        };
        client.verify(chain_id, &submission).await
    }
}

#[async_trait::async_trait]
impl ContractDeploying for Deployer {
    async fn deploy(
        &self,
        price_feed: eth::Address,
        options: TransactionOptions,
        verify: bool,
    ) -> Result<Deployed> {
        let artifact = Artifact::load(&self.build_dir, FundMe::NAME).await?;
        let constructor = FundMe::FundMe::constructorCall {
            _priceFeed: price_feed,
        };

        tracing::info!(
            %price_feed,
            from = %options.from.address(),
            confirmations = self.confirmations,
            "deploying {}",
            FundMe::NAME
        );
        let provider = blockchain::provider_for(&self.url, &options.from);
        let creation = blockchain::create(
            &provider,
            options.from.address(),
            artifact.deploy_code(&constructor),
            self.confirmations,
        )
        .await?;

        let deployed = Deployed {
            address: creation.address.with_context(|| {
                format!(
                    "transaction {:?} did not create a contract",
                    creation.transaction
                )
            })?,
            transaction: creation.transaction,
            block: creation.block,
        };

        if verify {
            self.verify(&provider, &artifact, &deployed, &constructor)
                .await;
        }

        Ok(deployed)
    }
}
