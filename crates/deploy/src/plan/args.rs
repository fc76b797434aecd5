//! Step arguments and where they come from.

use std::{collections::BTreeMap, fmt};

use alloy_core::primitives::{Address, U256};
use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};

use crate::DeployError;

/// A concrete argument passed to a constructor or an initializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, From)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ArgValue {
    String(String),
    Uint(U256),
    Address(Address),
    AddressList(Vec<Address>),
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Uint(n) => write!(f, "{n}"),
            Self::Address(a) => write!(f, "{a}"),
            Self::AddressList(list) => {
                write!(f, "[")?;
                for (i, a) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Where a step argument comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgSource {
    /// A value taken from the configuration.
    Literal(ArgValue),
    /// The address of a component deployed by an earlier step.
    AddressOf(String),
}

impl ArgSource {
    pub fn literal(value: impl Into<ArgValue>) -> Self {
        Self::Literal(value.into())
    }

    pub fn address_of(component: impl Into<String>) -> Self {
        Self::AddressOf(component.into())
    }

    /// The component this argument references, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::AddressOf(component) => Some(component),
        }
    }

    /// Resolve this argument against the addresses deployed so far.
    pub fn resolve(&self, book: &AddressBook) -> Result<ArgValue, DeployError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::AddressOf(component) => {
                book.get(component)
                    .copied()
                    .map(ArgValue::Address)
                    .ok_or_else(|| {
                        DeployError::InvalidPlan(format!(
                            "component `{component}` has not been deployed"
                        ))
                    })
            }
        }
    }
}

impl fmt::Display for ArgSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::AddressOf(component) => write!(f, "{component}"),
        }
    }
}

/// Addresses of the components deployed so far, by logical name.
///
/// Owned by a single run and threaded explicitly from step to step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref)]
pub struct AddressBook(BTreeMap<String, Address>);

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a deployed component. Returns the previous address if the name was
    /// already taken.
    pub fn insert(&mut self, component: impl Into<String>, address: Address) -> Option<Address> {
        self.0.insert(component.into(), address)
    }

    /// Resolve a list of argument sources, in order.
    pub fn resolve_all(&self, sources: &[ArgSource]) -> Result<Vec<ArgValue>, DeployError> {
        sources.iter().map(|source| source.resolve(self)).collect()
    }
}

impl FromIterator<(String, Address)> for AddressBook {
    fn from_iter<I: IntoIterator<Item = (String, Address)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
