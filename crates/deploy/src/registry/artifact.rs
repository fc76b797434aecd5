//! Hardhat compilation artifacts and ABI encoding of step arguments.

use std::path::{Path, PathBuf};

use alloy_core::{
    dyn_abi::{DynSolType, DynSolValue, Specifier},
    json_abi::{JsonAbi, Param},
    primitives::Bytes,
};
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ArgValue;

/// A compiled contract, as written by Hardhat to
/// `<artifacts>/<Contract>.sol/<Contract>.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub abi: JsonAbi,
    /// Creation bytecode, 0x-prefixed hex.
    pub bytecode: String,
}

impl Artifact {
    /// Path of the artifact of `contract` under `artifacts_dir`.
    pub fn path(artifacts_dir: &Path, contract: &str) -> PathBuf {
        artifacts_dir
            .join(format!("{contract}.sol"))
            .join(format!("{contract}.json"))
    }

    /// Load the artifact of `contract`.
    pub fn load(artifacts_dir: &Path, contract: &str) -> Result<Self> {
        let path = Self::path(artifacts_dir, contract);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))
    }

    /// Creation transaction data: bytecode followed by the encoded constructor
    /// arguments.
    pub fn deploy_data(&self, args: &[ArgValue]) -> Result<Bytes> {
        let mut data = hex::decode(self.bytecode.trim_start_matches("0x"))
            .with_context(|| format!("Invalid bytecode for {}", self.contract_name))?;

        if data.is_empty() {
            anyhow::bail!(
                "{} has no bytecode (abstract contract or interface?)",
                self.contract_name
            );
        }

        let inputs: &[Param] = self
            .abi
            .constructor()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default();

        data.extend(encode_params(&self.contract_name, "constructor", inputs, args)?);
        Ok(data.into())
    }

    /// Call data for `method`, picking the overload taking `args.len()` arguments.
    pub fn call_data(&self, method: &str, args: &[ArgValue]) -> Result<Bytes> {
        let function = self
            .abi
            .function(method)
            .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
            .with_context(|| {
                format!(
                    "{} has no method `{}` taking {} argument(s)",
                    self.contract_name,
                    method,
                    args.len()
                )
            })?;

        let mut data = function.selector().to_vec();
        data.extend(encode_params(&self.contract_name, method, &function.inputs, args)?);
        Ok(data.into())
    }
}

fn encode_params(
    contract: &str,
    item: &str,
    params: &[Param],
    args: &[ArgValue],
) -> Result<Vec<u8>> {
    if params.len() != args.len() {
        anyhow::bail!(
            "{}.{} expects {} argument(s), got {}",
            contract,
            item,
            params.len(),
            args.len()
        );
    }

    let values = params
        .iter()
        .zip(args)
        .map(|(param, arg)| {
            let ty: DynSolType = param
                .resolve()
                .with_context(|| format!("Unsupported parameter type `{}`", param.ty))?;
            to_sol_value(arg, &ty).with_context(|| {
                format!("{}.{}: invalid argument `{}`", contract, item, param.name)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DynSolValue::Tuple(values).abi_encode_params())
}

/// Convert an argument to the Solidity value of the expected type.
fn to_sol_value(arg: &ArgValue, ty: &DynSolType) -> Result<DynSolValue> {
    let value = match (arg, ty) {
        (ArgValue::String(s), DynSolType::String) => DynSolValue::String(s.clone()),
        (ArgValue::Uint(n), DynSolType::Uint(bits)) => {
            if n.bit_len() > *bits {
                anyhow::bail!("{} does not fit in uint{}", n, bits);
            }
            DynSolValue::Uint(*n, *bits)
        }
        (ArgValue::Address(a), DynSolType::Address) => DynSolValue::Address(*a),
        (ArgValue::AddressList(list), DynSolType::Array(inner))
            if **inner == DynSolType::Address =>
        {
            DynSolValue::Array(list.iter().copied().map(DynSolValue::Address).collect())
        }
        (ArgValue::AddressList(list), DynSolType::FixedArray(inner, len))
            if **inner == DynSolType::Address && *len == list.len() =>
        {
            DynSolValue::FixedArray(list.iter().copied().map(DynSolValue::Address).collect())
        }
        _ => anyhow::bail!("{} does not match type {}", arg, ty.sol_type_name()),
    };
    Ok(value)
}
