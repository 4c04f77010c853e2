//! Compiled contract artifacts as written by the Solidity build step.
//!
//! Artifacts live at `<build-dir>/contracts/<ContractName>.json` and carry
//! the creation bytecode next to the information needed to verify the
//! source on a block explorer.

use {
    alloy::{primitives::Bytes, sol_types::SolConstructor},
    anyhow::{Context, Result, ensure},
    serde::Deserialize,
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
    tokio::fs,
};

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    /// Creation bytecode, without constructor arguments.
    pub bytecode: Bytes,
    /// Source file the contract is defined in, as written. Its imports are
    /// listed in `all_source_paths`.
    #[serde(default)]
    pub source: Option<String>,
    /// Path of `source` as the compiler saw it.
    #[serde(default)]
    pub source_path: Option<String>,
    /// Every source file of the compilation, keyed by the compiler's
    /// source id. Includes `source_path` itself.
    #[serde(default)]
    pub all_source_paths: BTreeMap<String, String>,
    #[serde(default)]
    pub compiler: Option<Compiler>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Compiler {
    /// Full solc version, e.g. `0.6.6+commit.6c089d02`.
    pub version: String,
    #[serde(default)]
    pub evm_version: Option<String>,
    #[serde(default)]
    pub optimizer: Optimizer,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct Optimizer {
    pub enabled: bool,
    #[serde(default)]
    pub runs: u32,
}

impl Artifact {
    /// Location of the artifact for `name` inside `build_dir`.
    pub fn path(build_dir: &Path, name: &str) -> PathBuf {
        build_dir.join("contracts").join(format!("{name}.json"))
    }

    /// Reads the artifact of contract `name` from the build directory.
    pub async fn load(build_dir: &Path, name: &str) -> Result<Self> {
        let path = Self::path(build_dir, name);
        let data = fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read build artifact {path:?}"))?;
        let artifact = Self::from_json(&data)
            .with_context(|| format!("malformed build artifact {path:?}"))?;
        ensure!(
            artifact.contract_name == name,
            "artifact {path:?} contains {:?} instead of {name:?}",
            artifact.contract_name,
        );
        Ok(artifact)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(data)?;
        ensure!(
            !artifact.bytecode.is_empty(),
            "{} has no creation bytecode",
            artifact.contract_name,
        );
        Ok(artifact)
    }

    /// Creation code followed by the ABI encoded constructor arguments.
    pub fn deploy_code(&self, constructor: &impl SolConstructor) -> Bytes {
        [self.bytecode.as_ref(), &constructor.abi_encode()]
            .concat()
            .into()
    }
}
