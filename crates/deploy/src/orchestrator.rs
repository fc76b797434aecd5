//! Execution of deployment plans.
//!
//! Steps run strictly one after the other: every step may need an address produced
//! by an earlier one, and each registry call only resolves once its transaction is
//! confirmed. Deployment failures abort the run, initialization failures are
//! recorded and the run moves on to the next step.

use alloy_core::primitives::Address;

use crate::{
    AddressBook, ContractRegistry, DeployError, DeploymentParams, DeploymentPlan, DeploymentSpec,
    InitializationStep, PlanStep, RunReport, RunState, StepOutcome,
};

/// Deploy the canonical factory -> token -> marketplace plan.
pub async fn run_deployment_plan<R: ContractRegistry>(
    params: &DeploymentParams,
    registry: &R,
) -> Result<RunReport, DeployError> {
    let plan = DeploymentPlan::canonical(params)?;
    Orchestrator::new(registry).run(&plan).await
}

/// Drives a [`ContractRegistry`] through a [`DeploymentPlan`].
pub struct Orchestrator<'a, R> {
    registry: &'a R,
}

impl<'a, R: ContractRegistry> Orchestrator<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    /// Execute every step of `plan` in order.
    ///
    /// Returns the complete report even if some initialization steps failed. A
    /// failed deployment aborts the run with [`DeployError::Deployment`], which
    /// carries the partial report.
    pub async fn run(&self, plan: &DeploymentPlan) -> Result<RunReport, DeployError> {
        let mut report = RunReport::new();
        let mut book = AddressBook::new();
        let mut initialization_index = 0;

        tracing::info!(steps = plan.steps().len(), "Starting deployment plan...");

        for step in plan.steps() {
            match step {
                PlanStep::Deploy(spec) => {
                    report.transition(RunState::Deploying(spec.component.clone()));

                    let address = match self.deploy(spec, &book).await {
                        Ok(address) => address,
                        Err(source) => {
                            report.transition(RunState::Aborted);
                            tracing::error!(
                                component = %spec.component,
                                error = %format!("{source:#}"),
                                "Deployment failed, aborting the remaining steps"
                            );
                            return Err(DeployError::Deployment {
                                component: spec.component.clone(),
                                report: Box::new(report),
                                source,
                            });
                        }
                    };

                    book.insert(spec.component.clone(), address);
                    report.record_deployment(&spec.component, address);
                }
                PlanStep::Initialize(init) => {
                    initialization_index += 1;
                    report.transition(RunState::Initializing(initialization_index));

                    let outcome = self.initialize(init, &book).await;
                    report.record_step(init.clone(), outcome);
                }
            }
        }

        report.transition(RunState::Complete);

        tracing::info!(
            deployed = report.deployed.len(),
            steps = report.steps.len(),
            failed_steps = report.failed_steps().count(),
            "Deployment plan complete"
        );

        Ok(report)
    }

    /// Re-run the initialization steps of a previous run that did not succeed,
    /// against the addresses recorded in `previous`.
    ///
    /// Nothing is deployed. A step is skipped only if `previous` recorded the same
    /// step at the same position as succeeded; every other step of `plan` is
    /// attempted again.
    pub async fn rewire(
        &self,
        plan: &DeploymentPlan,
        previous: &RunReport,
    ) -> Result<RunReport, DeployError> {
        let book = previous.address_book();

        if let Some(missing) = plan
            .deployments()
            .find(|spec| !book.contains_key(&spec.component))
        {
            return Err(DeployError::InvalidPlan(format!(
                "component `{}` is not part of the previous run",
                missing.component
            )));
        }

        let mut report = RunReport::resume(previous);

        for (i, init) in plan.initializations().enumerate() {
            let already_done = previous
                .steps
                .get(i)
                .is_some_and(|record| record.step == *init && record.outcome.is_success());

            if already_done {
                tracing::info!(step = %init, "Already initialized, skipping");
                report.record_step(init.clone(), StepOutcome::Succeeded);
                continue;
            }

            report.transition(RunState::Initializing(i + 1));
            let outcome = self.initialize(init, &book).await;
            report.record_step(init.clone(), outcome);
        }

        report.transition(RunState::Complete);
        Ok(report)
    }

    async fn deploy(&self, spec: &DeploymentSpec, book: &AddressBook) -> anyhow::Result<Address> {
        let args = book.resolve_all(&spec.args)?;

        tracing::info!(component = %spec.component, "Deploying component...");

        let address = self
            .registry
            .deploy_and_confirm(&spec.component, &args)
            .await?;

        tracing::info!(component = %spec.component, %address, "Component deployed");
        Ok(address)
    }

    async fn initialize(&self, init: &InitializationStep, book: &AddressBook) -> StepOutcome {
        match self.call(init, book).await {
            Ok(()) => {
                tracing::info!(step = %init, "Initialization step succeeded");
                StepOutcome::Succeeded
            }
            Err(e) => {
                let error = format!("{e:#}");
                tracing::warn!(step = %init, error = %error, "Initialization step failed, continuing");
                StepOutcome::Failed { error }
            }
        }
    }

    async fn call(&self, init: &InitializationStep, book: &AddressBook) -> anyhow::Result<()> {
        let address = book
            .get(&init.target)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("component `{}` has not been deployed", init.target))?;
        let args = book.resolve_all(&init.args)?;

        tracing::info!(step = %init, target = %address, "Calling initializer...");

        self.registry
            .attach_and_call(&init.target, address, &init.method, &args)
            .await
    }
}
