//! Contract registry trait.

use std::future::Future;

use alloy_core::primitives::Address;
use anyhow::Result;

use crate::ArgValue;

/// Gateway to the deployable contracts of a network.
///
/// Given a logical component name, a registry can construct a new instance and
/// wait for its confirmation, or attach to an existing instance and call one of
/// its methods. Every call resolves only once the underlying transaction is
/// confirmed or known to have failed; timeouts and retries belong to the
/// implementation.
pub trait ContractRegistry: Send + Sync {
    /// Deploy a new instance of `component` and return its address once confirmed.
    fn deploy_and_confirm(
        &self,
        component: &str,
        args: &[ArgValue],
    ) -> impl Future<Output = Result<Address>> + Send;

    /// Call `method` on the instance of `component` deployed at `address` and wait
    /// for the transaction to be confirmed. Reverts are errors.
    fn attach_and_call(
        &self,
        component: &str,
        address: Address,
        method: &str,
        args: &[ArgValue],
    ) -> impl Future<Output = Result<()>> + Send;
}
