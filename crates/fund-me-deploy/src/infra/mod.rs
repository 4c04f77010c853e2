pub mod accounts;
pub mod blockchain;
pub mod config;
pub mod deployer;
pub mod etherscan;
pub mod mocks;
