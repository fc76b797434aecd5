//! Behaviour of deployment runs against an in-memory contract registry.
//!
//! Run with: cargo test --test orchestrator_test

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicU8, Ordering},
    },
};

use alloy_core::primitives::{Address, U256};
use anyhow::Result;
use arena_deploy::{
    ArgSource, ArgValue, ContractRegistry, DeployError, DeploymentParams, DeploymentPlan,
    FACTORY, MARKETPLACE, Orchestrator, RunReport, RunState, TOKEN, run_deployment_plan,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Deploy {
        component: String,
        args: Vec<ArgValue>,
    },
    Invoke {
        component: String,
        address: Address,
        method: String,
        args: Vec<ArgValue>,
    },
}

impl Call {
    fn label(&self) -> String {
        match self {
            Call::Deploy { component, .. } => format!("deploy {component}"),
            Call::Invoke {
                component, method, ..
            } => format!("{component}.{method}"),
        }
    }
}

/// Registry handing out sequential addresses and recording every call.
#[derive(Default)]
struct RecordingRegistry {
    next_address: AtomicU8,
    calls: Mutex<Vec<Call>>,
    failing_deploys: HashMap<String, String>,
    failing_calls: HashMap<(String, String), String>,
}

impl RecordingRegistry {
    fn new() -> Self {
        Self {
            next_address: AtomicU8::new(0x10),
            ..Default::default()
        }
    }

    fn fail_deploy(mut self, component: &str, error: &str) -> Self {
        self.failing_deploys
            .insert(component.to_string(), error.to_string());
        self
    }

    fn fail_call(mut self, component: &str, method: &str, error: &str) -> Self {
        self.failing_calls.insert(
            (component.to_string(), method.to_string()),
            error.to_string(),
        );
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn labels(&self) -> Vec<String> {
        self.calls().iter().map(Call::label).collect()
    }
}

impl ContractRegistry for RecordingRegistry {
    async fn deploy_and_confirm(&self, component: &str, args: &[ArgValue]) -> Result<Address> {
        self.calls.lock().unwrap().push(Call::Deploy {
            component: component.to_string(),
            args: args.to_vec(),
        });

        if let Some(error) = self.failing_deploys.get(component) {
            anyhow::bail!("{}", error);
        }

        Ok(Address::with_last_byte(
            self.next_address.fetch_add(1, Ordering::SeqCst),
        ))
    }

    async fn attach_and_call(
        &self,
        component: &str,
        address: Address,
        method: &str,
        args: &[ArgValue],
    ) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Invoke {
            component: component.to_string(),
            address,
            method: method.to_string(),
            args: args.to_vec(),
        });

        if let Some(error) = self
            .failing_calls
            .get(&(component.to_string(), method.to_string()))
        {
            anyhow::bail!("{}", error);
        }
        Ok(())
    }
}

fn game_nft_params() -> DeploymentParams {
    DeploymentParams {
        token_name: "GameNFT".to_string(),
        token_symbol: "GNFT".to_string(),
        base_token_uri: "https://x/".to_string(),
        fee_to: Address::repeat_byte(0xfe),
        payment_tokens: vec![Address::repeat_byte(0x01)],
        maximum_multiple_mint_items: 5,
    }
}

const CANONICAL_ORDER: [&str; 6] = [
    "deploy factory",
    "deploy token",
    "factory.init",
    "deploy marketplace",
    "marketplace.init",
    "token.addApprovalWhitelist",
];

#[tokio::test]
async fn test_canonical_plan_runs_in_order() {
    let registry = RecordingRegistry::new();
    let report = run_deployment_plan(&game_nft_params(), &registry)
        .await
        .unwrap();

    assert_eq!(registry.labels(), CANONICAL_ORDER);
    assert_eq!(*report.state(), RunState::Complete);
    assert!(report.succeeded());

    let components: Vec<_> = report
        .deployed()
        .iter()
        .map(|d| d.component.as_str())
        .collect();
    assert_eq!(components, [FACTORY, TOKEN, MARKETPLACE]);

    let factory = report.address_of(FACTORY).unwrap();
    let token = report.address_of(TOKEN).unwrap();
    let marketplace = report.address_of(MARKETPLACE).unwrap();
    assert_ne!(factory, token);
    assert_ne!(token, marketplace);
    assert_ne!(factory, marketplace);
}

#[tokio::test]
async fn test_game_nft_arguments_are_wired() {
    let registry = RecordingRegistry::new();
    let report = run_deployment_plan(&game_nft_params(), &registry)
        .await
        .unwrap();

    let factory = report.address_of(FACTORY).unwrap();
    let token = report.address_of(TOKEN).unwrap();
    let marketplace = report.address_of(MARKETPLACE).unwrap();
    let calls = registry.calls();

    assert_eq!(
        calls[0],
        Call::Deploy {
            component: FACTORY.to_string(),
            args: vec![ArgValue::Uint(U256::from(5u64))],
        }
    );
    assert_eq!(
        calls[1],
        Call::Deploy {
            component: TOKEN.to_string(),
            args: vec![
                ArgValue::from("GameNFT"),
                ArgValue::from("GNFT"),
                ArgValue::from("https://x/"),
                ArgValue::Address(factory),
            ],
        }
    );
    assert_eq!(
        calls[2],
        Call::Invoke {
            component: FACTORY.to_string(),
            address: factory,
            method: "init".to_string(),
            args: vec![ArgValue::Address(token)],
        }
    );
    assert_eq!(
        calls[3],
        Call::Deploy {
            component: MARKETPLACE.to_string(),
            args: vec![],
        }
    );
    assert_eq!(
        calls[4],
        Call::Invoke {
            component: MARKETPLACE.to_string(),
            address: marketplace,
            method: "init".to_string(),
            args: vec![
                ArgValue::Address(Address::repeat_byte(0xfe)),
                ArgValue::AddressList(vec![Address::repeat_byte(0x01)]),
            ],
        }
    );
    assert_eq!(
        calls[5],
        Call::Invoke {
            component: TOKEN.to_string(),
            address: token,
            method: "addApprovalWhitelist".to_string(),
            args: vec![ArgValue::Address(marketplace)],
        }
    );
}

#[tokio::test]
async fn test_factory_failure_aborts_everything() {
    let registry = RecordingRegistry::new().fail_deploy(FACTORY, "insufficient funds");

    let err = run_deployment_plan(&game_nft_params(), &registry)
        .await
        .unwrap_err();

    assert_eq!(registry.labels(), ["deploy factory"]);
    assert!(err.to_string().contains("insufficient funds"));

    let DeployError::Deployment {
        component, report, ..
    } = err
    else {
        panic!("expected a deployment error");
    };
    assert_eq!(component, FACTORY);
    assert!(report.deployed().is_empty());
    assert!(report.steps().is_empty());
    assert_eq!(*report.state(), RunState::Aborted);
}

#[tokio::test]
async fn test_marketplace_failure_keeps_earlier_components() {
    let registry = RecordingRegistry::new().fail_deploy(MARKETPLACE, "out of gas");

    let err = run_deployment_plan(&game_nft_params(), &registry)
        .await
        .unwrap_err();

    assert_eq!(registry.labels(), CANONICAL_ORDER[..4]);

    let report = err.partial_report().unwrap();
    assert_eq!(report.deployed().len(), 2);
    assert!(report.address_of(TOKEN).is_some());
    assert_eq!(report.address_of(MARKETPLACE), None);
    assert_eq!(report.steps().len(), 1);
    assert!(report.steps()[0].outcome.is_success());
}

#[tokio::test]
async fn test_initialization_failure_does_not_stop_the_run() {
    let registry =
        RecordingRegistry::new().fail_call(FACTORY, "init", "execution reverted: not owner");

    let report = run_deployment_plan(&game_nft_params(), &registry)
        .await
        .unwrap();

    assert_eq!(registry.labels(), CANONICAL_ORDER);
    assert!(report.is_complete());
    assert!(!report.succeeded());
    assert_eq!(report.deployed().len(), 3);
    assert_eq!(report.steps().len(), 3);

    let failed: Vec<_> = report.failed_steps().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].step.target, FACTORY);
    assert!(
        failed[0]
            .outcome
            .error()
            .unwrap()
            .contains("execution reverted: not owner")
    );
}

#[tokio::test]
async fn test_already_initialized_marketplace_still_whitelists() {
    let registry = RecordingRegistry::new().fail_call(
        MARKETPLACE,
        "init",
        "execution reverted: already initialized",
    );

    let report = run_deployment_plan(&game_nft_params(), &registry)
        .await
        .unwrap();

    assert_eq!(registry.labels().last().unwrap(), "token.addApprovalWhitelist");
    assert!(!report.steps()[1].outcome.is_success());
    assert!(report.steps()[2].outcome.is_success());
}

#[tokio::test]
async fn test_rerun_produces_same_report_shape() {
    let first = run_deployment_plan(&game_nft_params(), &RecordingRegistry::new())
        .await
        .unwrap();
    let second = run_deployment_plan(&game_nft_params(), &RecordingRegistry::new())
        .await
        .unwrap();

    let shape = |report: &RunReport| {
        (
            report
                .deployed()
                .iter()
                .map(|d| (d.component.clone(), d.sequence))
                .collect::<Vec<_>>(),
            report
                .steps()
                .iter()
                .map(|s| (s.step.clone(), s.outcome.clone()))
                .collect::<Vec<_>>(),
            report.state().clone(),
        )
    };
    assert_eq!(shape(&first), shape(&second));
}

#[test]
fn test_forward_reference_is_rejected_at_construction() {
    let plan = DeploymentPlan::builder()
        .deploy(TOKEN, vec![ArgSource::address_of(FACTORY)])
        .deploy(FACTORY, vec![])
        .build();

    assert!(matches!(plan, Err(DeployError::InvalidPlan(_))));
}

#[tokio::test]
async fn test_custom_plan_runs_through_orchestrator() {
    let plan = DeploymentPlan::builder()
        .deploy("vault", vec![ArgSource::literal("Vault")])
        .deploy("router", vec![ArgSource::address_of("vault")])
        .initialize("vault", "setRouter", vec![ArgSource::address_of("router")])
        .build()
        .unwrap();

    let registry = RecordingRegistry::new();
    let report = Orchestrator::new(&registry).run(&plan).await.unwrap();

    assert_eq!(
        registry.labels(),
        ["deploy vault", "deploy router", "vault.setRouter"]
    );
    assert!(report.succeeded());
}

#[tokio::test]
async fn test_rewire_retries_only_failed_steps() {
    let params = game_nft_params();
    let plan = DeploymentPlan::canonical(&params).unwrap();

    let failing =
        RecordingRegistry::new().fail_call(TOKEN, "addApprovalWhitelist", "execution reverted");
    let previous = Orchestrator::new(&failing).run(&plan).await.unwrap();
    assert_eq!(previous.failed_steps().count(), 1);

    let registry = RecordingRegistry::new();
    let report = Orchestrator::new(&registry)
        .rewire(&plan, &previous)
        .await
        .unwrap();

    assert_eq!(registry.labels(), ["token.addApprovalWhitelist"]);
    assert!(report.succeeded());
    assert_eq!(report.deployed(), previous.deployed());

    let Call::Invoke { address, args, .. } = &registry.calls()[0] else {
        panic!("expected an initializer call");
    };
    assert_eq!(Some(*address), previous.address_of(TOKEN));
    assert_eq!(
        args,
        &vec![ArgValue::Address(previous.address_of(MARKETPLACE).unwrap())]
    );
}

#[tokio::test]
async fn test_rewire_requires_previous_deployments() {
    let plan = DeploymentPlan::canonical(&game_nft_params()).unwrap();
    let registry = RecordingRegistry::new();

    let err = Orchestrator::new(&registry)
        .rewire(&plan, &RunReport::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::InvalidPlan(_)));
    assert!(registry.calls().is_empty());
}
