//! Etherscan contract source verification.
//!
//! <https://docs.etherscan.io/api-endpoints/contracts#verify-source-code>

use {
    crate::domain::eth,
    alloy::hex,
    anyhow::{Context, Result, bail, ensure},
    contracts::{Artifact, sources::Sources},
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        fmt::{self, Display, Formatter},
        time::Duration,
    },
    url::Url,
};

pub struct Client {
    client: reqwest::Client,
    base: Url,
    api_key: String,
    poll_interval: Duration,
    poll_attempts: usize,
}

impl Client {
    const POLL_INTERVAL: Duration = Duration::from_secs(5);
    const POLL_ATTEMPTS: usize = 24;

    pub fn new(base: Url, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base,
            api_key,
            poll_interval: Self::POLL_INTERVAL,
            poll_attempts: Self::POLL_ATTEMPTS,
        }
    }

    /// Publishes the source of a deployed contract and waits until Etherscan
    /// has processed it.
    pub async fn verify(&self, chain_id: u64, submission: &Submission<'_>) -> Result<()> {
        let form = submission.form(&self.api_key)?;
        let Some(guid) = self.submit(chain_id, &form).await? else {
            tracing::info!(address = %submission.address, "contract source already verified");
            return Ok(());
        };
        tracing::info!(%guid, address = %submission.address, "submitted contract source");

        for _ in 0..self.poll_attempts {
            tokio::time::sleep(self.poll_interval).await;
            match self.status(chain_id, &guid).await? {
                Status::Pending => tracing::debug!(%guid, "verification pending"),
                Status::Verified => return Ok(()),
                Status::Failed(reason) => bail!("verification failed: {reason}"),
            }
        }
        bail!(
            "verification still pending after {} status checks",
            self.poll_attempts
        )
    }

    /// Returns `None` if the contract is already verified.
    async fn submit(&self, chain_id: u64, form: &[(&str, String)]) -> Result<Option<Guid>> {
        let response = self
            .client
            .post(self.base.clone())
            .query(&[("chainid", chain_id)])
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        ensure!(status.is_success(), "HTTP {status} error: {text}");

        let response = serde_json::from_str::<Response>(&text)?;
        response.into_guid()
    }

    async fn status(&self, chain_id: u64, guid: &Guid) -> Result<Status> {
        let response = self
            .client
            .get(self.base.clone())
            .query(&[
                ("chainid", chain_id.to_string().as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid.0.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        ensure!(status.is_success(), "HTTP {status} error: {text}");

        let response = serde_json::from_str::<Response>(&text)?;
        Ok(Status::from_result(&response.result))
    }
}

/// A contract whose source should be published.
pub struct Submission<'a> {
    pub address: eth::Address,
    pub artifact: &'a Artifact,
    /// The contract's source file and everything it imports.
    pub sources: &'a Sources,
    pub remappings: &'a [String],
    /// ABI encoded constructor arguments.
    pub constructor_arguments: Vec<u8>,
}

impl Submission<'_> {
    /// Sources are submitted as standard JSON compiler input so imports
    /// resolve the same way they did at build time.
    fn form(&self, api_key: &str) -> Result<Vec<(&'static str, String)>> {
        let name = &self.artifact.contract_name;
        let source_path = self
            .artifact
            .source_path
            .as_deref()
            .with_context(|| format!("{name} artifact has no source path"))?;
        let compiler = self
            .artifact
            .compiler
            .as_ref()
            .with_context(|| format!("{name} artifact has no compiler settings"))?;
        let input = StandardJsonInput {
            language: "Solidity",
            sources: self
                .sources
                .iter()
                .map(|(path, content)| (path.as_str(), SourceFile { content }))
                .collect(),
            settings: Settings {
                optimizer: Optimizer {
                    enabled: compiler.optimizer.enabled,
                    runs: compiler.optimizer.runs,
                },
                evm_version: compiler.evm_version.as_deref(),
                remappings: self.remappings,
            },
        };

        Ok(vec![
            ("module", "contract".to_owned()),
            ("action", "verifysourcecode".to_owned()),
            ("apikey", api_key.to_owned()),
            ("contractaddress", self.address.to_string()),
            ("sourceCode", serde_json::to_string(&input)?),
            ("codeformat", "solidity-standard-json-input".to_owned()),
            ("contractname", format!("{source_path}:{name}")),
            (
                "compilerversion",
                format!("v{}", compiler.version.trim_start_matches('v')),
            ),
            // Sic, the API really spells it like this.
            (
                "constructorArguements",
                hex::encode(&self.constructor_arguments),
            ),
            ("licenseType", "1".to_owned()),
        ])
    }
}

#[derive(Serialize)]
struct StandardJsonInput<'a> {
    language: &'static str,
    sources: BTreeMap<&'a str, SourceFile<'a>>,
    settings: Settings<'a>,
}

#[derive(Serialize)]
struct SourceFile<'a> {
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Settings<'a> {
    optimizer: Optimizer,
    #[serde(skip_serializing_if = "Option::is_none")]
    evm_version: Option<&'a str>,
    remappings: &'a [String],
}

#[derive(Serialize)]
struct Optimizer {
    enabled: bool,
    runs: u32,
}

/// Identifier of a queued verification request.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Guid(String);

impl Display for Guid {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Envelope of every Etherscan API response.
#[derive(Debug, Deserialize)]
struct Response {
    status: String,
    message: String,
    result: String,
}

impl Response {
    fn into_guid(self) -> Result<Option<Guid>> {
        if self.status == "1" {
            return Ok(Some(Guid(self.result)));
        }
        if self.result.to_lowercase().contains("already verified") {
            return Ok(None);
        }
        bail!("verification rejected: {} ({})", self.result, self.message)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Status {
    Pending,
    Verified,
    Failed(String),
}

impl Status {
    fn from_result(result: &str) -> Self {
        match result {
            "Pending in queue" => Self::Pending,
            "Pass - Verified" => Self::Verified,
            result if result.to_lowercase().contains("already verified") => Self::Verified,
            result => Self::Failed(result.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::address,
        axum::{
            Form,
            Json,
            Router,
            extract::{Query, State},
            routing::post,
        },
        serde_json::{Value, json},
        std::{
            collections::{HashMap, VecDeque},
            sync::{
                Arc,
                Mutex,
                atomic::{AtomicUsize, Ordering},
            },
        },
    };

    const FUND_ME_SOURCE: &str = "import \"@chainlink/contracts/src/v0.6/interfaces/AggregatorV3Interface.sol\";\ncontract FundMe {}";
    const AGGREGATOR_PATH: &str = "smartcontractkit/chainlink-brownie-contracts@1.1.1/contracts/src/v0.6/interfaces/AggregatorV3Interface.sol";

    fn artifact() -> Artifact {
        Artifact::from_json(
            r#"{
                "contractName": "FundMe",
                "bytecode": "0x6080",
                "sourcePath": "contracts/FundMe.sol",
                "compiler": {
                    "version": "0.6.6+commit.6c089d02",
                    "evm_version": "istanbul",
                    "optimizer": { "enabled": true, "runs": 200 }
                }
            }"#,
        )
        .unwrap()
    }

    fn sources() -> Sources {
        Sources::from([
            ("contracts/FundMe.sol".to_owned(), FUND_ME_SOURCE.to_owned()),
            (
                AGGREGATOR_PATH.to_owned(),
                "interface AggregatorV3Interface {}".to_owned(),
            ),
        ])
    }

    fn remappings() -> Vec<String> {
        vec!["@chainlink=smartcontractkit/chainlink-brownie-contracts@1.1.1".to_owned()]
    }

    #[test]
    fn submits_imports_as_standard_json_input() {
        let artifact = artifact();
        let sources = sources();
        let remappings = remappings();
        let submission = Submission {
            address: address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            artifact: &artifact,
            sources: &sources,
            remappings: &remappings,
            constructor_arguments: vec![0xab, 0xcd],
        };

        let form: HashMap<_, _> = submission.form("KEY").unwrap().into_iter().collect();

        assert_eq!(form["module"], "contract");
        assert_eq!(form["action"], "verifysourcecode");
        assert_eq!(form["apikey"], "KEY");
        assert_eq!(
            form["contractaddress"],
            "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
        );
        assert_eq!(form["codeformat"], "solidity-standard-json-input");
        assert_eq!(form["contractname"], "contracts/FundMe.sol:FundMe");
        assert_eq!(form["compilerversion"], "v0.6.6+commit.6c089d02");
        assert_eq!(form["constructorArguements"], "abcd");

        let input: Value = serde_json::from_str(&form["sourceCode"]).unwrap();
        assert_eq!(
            input,
            json!({
                "language": "Solidity",
                "sources": {
                    "contracts/FundMe.sol": { "content": FUND_ME_SOURCE },
                    AGGREGATOR_PATH: { "content": "interface AggregatorV3Interface {}" },
                },
                "settings": {
                    "optimizer": { "enabled": true, "runs": 200 },
                    "evmVersion": "istanbul",
                    "remappings": ["@chainlink=smartcontractkit/chainlink-brownie-contracts@1.1.1"],
                },
            })
        );
    }

    #[test]
    fn requires_source_path_and_compiler() {
        let artifact =
            Artifact::from_json(r#"{ "contractName": "FundMe", "bytecode": "0x6080" }"#).unwrap();
        let sources = sources();
        let submission = Submission {
            address: eth::Address::ZERO,
            artifact: &artifact,
            sources: &sources,
            remappings: &[],
            constructor_arguments: Vec::new(),
        };

        assert!(submission.form("KEY").is_err());
    }

    #[test]
    fn submission_response() {
        let accepted: Response = serde_json::from_str(
            r#"{ "status": "1", "message": "OK", "result": "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn" }"#,
        )
        .unwrap();
        assert_eq!(
            accepted.into_guid().unwrap(),
            Some(Guid(
                "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn".to_owned()
            ))
        );

        let known: Response = serde_json::from_str(
            r#"{ "status": "0", "message": "NOTOK", "result": "Contract source code already verified" }"#,
        )
        .unwrap();
        assert_eq!(known.into_guid().unwrap(), None);

        let rejected: Response = serde_json::from_str(
            r#"{ "status": "0", "message": "NOTOK", "result": "Invalid API Key" }"#,
        )
        .unwrap();
        assert!(rejected.into_guid().is_err());
    }

    #[test]
    fn verification_status() {
        assert_eq!(Status::from_result("Pending in queue"), Status::Pending);
        assert_eq!(Status::from_result("Pass - Verified"), Status::Verified);
        assert_eq!(Status::from_result("Already Verified"), Status::Verified);
        assert_eq!(
            Status::from_result("Fail - Unable to verify"),
            Status::Failed("Fail - Unable to verify".to_owned())
        );
    }

    /// Etherscan stand-in. Submissions get `submission` as response, status
    /// checks pop the next entry of `statuses` and report pending once they
    /// run out.
    #[derive(Clone)]
    struct Etherscan {
        submission: Value,
        statuses: Arc<Mutex<VecDeque<&'static str>>>,
        submitted: Arc<Mutex<Vec<HashMap<String, String>>>>,
        checks: Arc<AtomicUsize>,
    }

    impl Etherscan {
        fn new(submission: Value, statuses: &[&'static str]) -> Self {
            Self {
                submission,
                statuses: Arc::new(Mutex::new(statuses.iter().copied().collect())),
                submitted: Default::default(),
                checks: Default::default(),
            }
        }

        async fn serve(&self, poll_attempts: usize) -> Client {
            let app = Router::new()
                .route("/api", post(submit).get(check))
                .with_state(self.clone());
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

            Client {
                poll_interval: Duration::from_millis(1),
                poll_attempts,
                ..Client::new(format!("http://{addr}/api").parse().unwrap(), "KEY".to_owned())
            }
        }

        fn checks(&self) -> usize {
            self.checks.load(Ordering::SeqCst)
        }
    }

    async fn submit(
        State(etherscan): State<Etherscan>,
        Query(query): Query<HashMap<String, String>>,
        Form(mut form): Form<HashMap<String, String>>,
    ) -> Json<Value> {
        form.extend(query);
        etherscan.submitted.lock().unwrap().push(form);
        Json(etherscan.submission.clone())
    }

    async fn check(
        State(etherscan): State<Etherscan>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        let result = if query.get("action").map(String::as_str) == Some("checkverifystatus")
            && query.get("guid").map(String::as_str) == Some("guid-1")
        {
            etherscan.checks.fetch_add(1, Ordering::SeqCst);
            etherscan
                .statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or("Pending in queue")
        } else {
            "Unknown request"
        };
        Json(json!({ "status": "1", "message": "OK", "result": result }))
    }

    fn accepted() -> Value {
        json!({ "status": "1", "message": "OK", "result": "guid-1" })
    }

    async fn verify(client: &Client) -> Result<()> {
        let artifact = artifact();
        let sources = sources();
        let submission = Submission {
            address: address!("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
            artifact: &artifact,
            sources: &sources,
            remappings: &[],
            constructor_arguments: vec![0x01],
        };
        client.verify(11155111, &submission).await
    }

    #[tokio::test]
    async fn polls_until_verified() {
        let etherscan = Etherscan::new(accepted(), &["Pending in queue", "Pass - Verified"]);
        let client = etherscan.serve(5).await;

        verify(&client).await.unwrap();

        assert_eq!(etherscan.checks(), 2);
        let submitted = etherscan.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0]["chainid"], "11155111");
        assert_eq!(submitted[0]["codeformat"], "solidity-standard-json-input");
    }

    #[tokio::test]
    async fn reports_failed_verification() {
        let etherscan = Etherscan::new(
            accepted(),
            &["Pending in queue", "Fail - Unable to verify"],
        );
        let client = etherscan.serve(5).await;

        let err = verify(&client).await.unwrap_err();

        assert!(err.to_string().contains("Fail - Unable to verify"));
        assert_eq!(etherscan.checks(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_poll_attempts() {
        let etherscan = Etherscan::new(accepted(), &[]);
        let client = etherscan.serve(3).await;

        let err = verify(&client).await.unwrap_err();

        assert!(err.to_string().contains("still pending"));
        assert_eq!(etherscan.checks(), 3);
    }

    #[tokio::test]
    async fn already_verified_contract_is_not_polled() {
        let etherscan = Etherscan::new(
            json!({ "status": "0", "message": "NOTOK", "result": "Already Verified" }),
            &[],
        );
        let client = etherscan.serve(5).await;

        verify(&client).await.unwrap();

        assert_eq!(etherscan.checks(), 0);
    }

    #[tokio::test]
    async fn rejected_submission() {
        let etherscan = Etherscan::new(
            json!({ "status": "0", "message": "NOTOK", "result": "Invalid API Key" }),
            &[],
        );
        let client = etherscan.serve(5).await;

        let err = verify(&client).await.unwrap_err();

        assert!(err.to_string().contains("Invalid API Key"));
        assert_eq!(etherscan.checks(), 0);
    }
}
