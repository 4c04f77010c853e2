//! Contract bindings and compiled build artifacts for the FundMe project.
//!
//! The ABIs are declared inline with `alloy::sol!`. The creation bytecode is
//! not baked into the bindings: it comes from the artifacts the Solidity
//! toolchain writes to the build directory, see [`Artifact`].

pub mod artifact;
pub mod bindings;
pub mod sources;

pub use {
    artifact::Artifact,
    bindings::{FundMe, MockV3Aggregator},
};
