pub mod deploy;
pub mod eth;
pub mod network;

pub use deploy::{Deployed, Error, Orchestrator};
