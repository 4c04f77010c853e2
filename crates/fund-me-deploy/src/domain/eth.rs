pub use alloy::primitives::{Address, TxHash};
use alloy::signers::local::PrivateKeySigner;

/// The identity that authorizes a deployment transaction.
#[derive(Clone, Debug)]
pub enum Account {
    /// An account the connected node holds the key for and signs with
    /// (`eth_sendTransaction`).
    Unlocked(Address),
    /// A private key held by this process.
    Local(PrivateKeySigner),
}

impl Account {
    pub fn address(&self) -> Address {
        match self {
            Self::Unlocked(address) => *address,
            Self::Local(signer) => signer.address(),
        }
    }
}
