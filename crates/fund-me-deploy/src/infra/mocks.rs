use {
    crate::{
        domain::{deploy::MockDeploying, eth},
        infra::{blockchain, config},
    },
    alloy::primitives::I256,
    anyhow::{Result, anyhow},
    contracts::{Artifact, MockV3Aggregator},
    std::path::PathBuf,
    tokio::sync::Mutex,
    url::Url,
};

/// Deploys a `MockV3Aggregator` to stand in for the ETH/USD price feed.
///
/// The first mock deployed by an instance is reused by later calls.
pub struct MockPriceFeed {
    url: Url,
    build_dir: PathBuf,
    params: config::Mocks,
    deployed: Mutex<Option<eth::Address>>,
}

impl MockPriceFeed {
    pub fn new(url: Url, build_dir: PathBuf, params: config::Mocks) -> Self {
        Self {
            url,
            build_dir,
            params,
            deployed: Mutex::new(None),
        }
    }
}

#[async_trait::async_trait]
impl MockDeploying for MockPriceFeed {
    async fn deploy_mocks(&self, account: &eth::Account) -> Result<Option<eth::Address>> {
        let mut deployed = self.deployed.lock().await;
        if let Some(address) = *deployed {
            tracing::debug!(%address, "mock price feed already deployed");
            return Ok(Some(address));
        }

        let artifact = Artifact::load(&self.build_dir, MockV3Aggregator::NAME).await?;
        let initial_answer = I256::try_from(self.params.starting_price)
            .map_err(|_| anyhow!("invalid mock starting price {}", self.params.starting_price))?;
        let constructor = MockV3Aggregator::MockV3Aggregator::constructorCall {
            _decimals: self.params.decimals,
            _initialAnswer: initial_answer,
        };

        tracing::info!(
            decimals = self.params.decimals,
            starting_price = self.params.starting_price,
            "deploying mock price feed"
        );
        let provider = blockchain::provider_for(&self.url, account);
        let creation = blockchain::create(
            &provider,
            account.address(),
            artifact.deploy_code(&constructor),
            1,
        )
        .await?;

        if let Some(address) = creation.address {
            tracing::info!(%address, tx_hash = ?creation.transaction, "mock price feed deployed");
        }
        *deployed = creation.address;
        Ok(creation.address)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, alloy::primitives::address};

    const SIGNER: eth::Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
    const MOCK: eth::Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

    fn feed(build_dir: &std::path::Path) -> MockPriceFeed {
        // Nothing listens on the discard port, so any chain access fails.
        MockPriceFeed::new(
            "http://127.0.0.1:9".parse().unwrap(),
            build_dir.to_owned(),
            config::Mocks::default(),
        )
    }

    #[tokio::test]
    async fn reuses_first_deployed_mock() {
        let build_dir = tempfile::tempdir().unwrap();
        let feed = feed(build_dir.path());
        *feed.deployed.lock().await = Some(MOCK);

        let account = eth::Account::Unlocked(SIGNER);
        assert_eq!(feed.deploy_mocks(&account).await.unwrap(), Some(MOCK));
        assert_eq!(feed.deploy_mocks(&account).await.unwrap(), Some(MOCK));
    }

    #[tokio::test]
    async fn failed_deployment_is_not_remembered() {
        let build_dir = tempfile::tempdir().unwrap();
        let feed = feed(build_dir.path());

        let err = feed
            .deploy_mocks(&eth::Account::Unlocked(SIGNER))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("MockV3Aggregator"));
        assert_eq!(*feed.deployed.lock().await, None);
    }

    #[tokio::test]
    async fn unreachable_node_fails_deployment() {
        let build_dir = tempfile::tempdir().unwrap();
        let contracts = build_dir.path().join("contracts");
        std::fs::create_dir(&contracts).unwrap();
        std::fs::write(
            contracts.join("MockV3Aggregator.json"),
            r#"{ "contractName": "MockV3Aggregator", "bytecode": "0x6080" }"#,
        )
        .unwrap();
        let feed = feed(build_dir.path());

        let result = feed.deploy_mocks(&eth::Account::Unlocked(SIGNER)).await;

        assert!(result.is_err());
        assert_eq!(*feed.deployed.lock().await, None);
    }
}
