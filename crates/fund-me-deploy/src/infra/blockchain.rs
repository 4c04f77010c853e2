//! Ethereum JSON-RPC access.

use {
    crate::domain::eth,
    alloy::{
        network::{EthereumWallet, TransactionBuilder},
        primitives::Bytes,
        providers::{DynProvider, Provider, ProviderBuilder},
        rpc::types::TransactionRequest,
    },
    anyhow::{Context, Result, ensure},
    url::Url,
};

/// Endpoint of the node local networks are expected to run on.
pub const LOCAL_NODE: &str = "http://127.0.0.1:8545";

/// A provider without a wallet. Transactions sent through it are signed by
/// the node.
pub fn provider(url: &Url) -> DynProvider {
    ProviderBuilder::new().connect_http(url.clone()).erased()
}

/// A provider that sends transactions on behalf of `account`.
pub fn provider_for(url: &Url, account: &eth::Account) -> DynProvider {
    match account {
        eth::Account::Unlocked(_) => provider(url),
        eth::Account::Local(signer) => ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer.clone()))
            .connect_http(url.clone())
            .erased(),
    }
}

/// Outcome of a mined contract creation transaction.
#[derive(Clone, Copy, Debug)]
pub struct Creation {
    /// Address of the created contract. Nodes leave it empty if no contract
    /// was created.
    pub address: Option<eth::Address>,
    pub transaction: eth::TxHash,
    pub block: Option<u64>,
}

/// Sends a contract creation transaction with `code` and waits until it has
/// `confirmations` confirmations.
pub async fn create(
    provider: &DynProvider,
    from: eth::Address,
    code: Bytes,
    confirmations: u64,
) -> Result<Creation> {
    let tx = TransactionRequest::default()
        .from(from)
        .with_deploy_code(code);

    let pending = provider
        .send_transaction(tx)
        .await
        .context("failed to send contract creation transaction")?;
    let transaction = *pending.tx_hash();
    tracing::debug!(tx_hash = ?transaction, confirmations, "waiting for contract creation");

    let receipt = pending
        .with_required_confirmations(confirmations)
        .get_receipt()
        .await
        .context("failed to get contract creation receipt")?;
    ensure!(
        receipt.status(),
        "contract creation transaction {transaction:?} reverted"
    );

    Ok(Creation {
        address: receipt.contract_address,
        transaction,
        block: receipt.block_number,
    })
}
