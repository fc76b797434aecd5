//! The canonical factory -> token -> marketplace plan.

use crate::{DeployError, DeploymentParams};

use super::{ArgSource, DeploymentPlan};

/// Logical name of the minting-authorization factory.
pub const FACTORY: &str = "factory";
/// Logical name of the NFT contract.
pub const TOKEN: &str = "token";
/// Logical name of the marketplace contract.
pub const MARKETPLACE: &str = "marketplace";

impl DeploymentPlan {
    /// The canonical plan:
    /// 1. deploy the factory with the mint-batch limit;
    /// 2. deploy the token with its metadata and the factory address;
    /// 3. `factory.init(token)`, granting minting rights to the factory;
    /// 4. deploy the marketplace;
    /// 5. `marketplace.init(feeTo, paymentTokens)`;
    /// 6. `token.addApprovalWhitelist(marketplace)`.
    pub fn canonical(params: &DeploymentParams) -> Result<Self, DeployError> {
        Self::builder()
            .deploy(
                FACTORY,
                vec![ArgSource::literal(params.maximum_multiple_mint_items)],
            )
            .deploy(
                TOKEN,
                vec![
                    ArgSource::literal(params.token_name.as_str()),
                    ArgSource::literal(params.token_symbol.as_str()),
                    ArgSource::literal(params.base_token_uri.as_str()),
                    ArgSource::address_of(FACTORY),
                ],
            )
            .initialize(FACTORY, "init", vec![ArgSource::address_of(TOKEN)])
            .deploy(MARKETPLACE, vec![])
            .initialize(
                MARKETPLACE,
                "init",
                vec![
                    ArgSource::literal(params.fee_to),
                    ArgSource::literal(params.payment_tokens.clone()),
                ],
            )
            .initialize(
                TOKEN,
                "addApprovalWhitelist",
                vec![ArgSource::address_of(MARKETPLACE)],
            )
            .build()
    }
}
