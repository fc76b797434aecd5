//! Builder validating a [`DeploymentPlan`] at construction time.

use std::collections::HashSet;

use crate::DeployError;

use super::{ArgSource, DeploymentPlan, DeploymentSpec, InitializationStep, PlanStep};

/// Builder for a [`DeploymentPlan`].
///
/// Steps are recorded in call order. [`PlanBuilder::build`] checks that:
/// - every component name is non-empty and deployed at most once;
/// - every address reference names a component deployed by a strictly earlier step;
/// - every initialization targets a component deployed by an earlier step.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    steps: Vec<PlanStep>,
}

impl PlanBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a deployment step.
    pub fn deploy(mut self, component: impl Into<String>, args: Vec<ArgSource>) -> Self {
        self.steps.push(PlanStep::Deploy(DeploymentSpec {
            component: component.into(),
            args,
        }));
        self
    }

    /// Append an initialization step.
    pub fn initialize(
        mut self,
        target: impl Into<String>,
        method: impl Into<String>,
        args: Vec<ArgSource>,
    ) -> Self {
        self.steps.push(PlanStep::Initialize(InitializationStep {
            target: target.into(),
            method: method.into(),
            args,
        }));
        self
    }

    /// Validate and build the plan.
    pub fn build(self) -> Result<DeploymentPlan, DeployError> {
        let mut deployed: HashSet<&str> = HashSet::new();

        for (index, step) in self.steps.iter().enumerate() {
            match step {
                PlanStep::Deploy(spec) => {
                    if spec.component.trim().is_empty() {
                        return Err(invalid(index, "component name is empty".to_string()));
                    }
                    // References are checked before the component itself is recorded,
                    // so a component cannot reference its own address.
                    check_references(index, &spec.args, &deployed)?;
                    if !deployed.insert(&spec.component) {
                        return Err(invalid(
                            index,
                            format!("component `{}` is deployed twice", spec.component),
                        ));
                    }
                }
                PlanStep::Initialize(init) => {
                    if init.method.trim().is_empty() {
                        return Err(invalid(index, format!("empty method name on `{}`", init.target)));
                    }
                    if !deployed.contains(init.target.as_str()) {
                        return Err(invalid(
                            index,
                            format!(
                                "`{}` targets `{}` before it is deployed",
                                init, init.target
                            ),
                        ));
                    }
                    check_references(index, &init.args, &deployed)?;
                }
            }
        }

        Ok(DeploymentPlan { steps: self.steps })
    }
}

fn check_references(
    index: usize,
    args: &[ArgSource],
    deployed: &HashSet<&str>,
) -> Result<(), DeployError> {
    for component in args.iter().filter_map(ArgSource::reference) {
        if !deployed.contains(component) {
            return Err(invalid(
                index,
                format!("references `{component}` before it is deployed"),
            ));
        }
    }
    Ok(())
}

fn invalid(index: usize, reason: String) -> DeployError {
    DeployError::InvalidPlan(format!("step {}: {}", index + 1, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_linear_chain() {
        let plan = PlanBuilder::new()
            .deploy("factory", vec![ArgSource::literal(5u64)])
            .deploy("token", vec![ArgSource::address_of("factory")])
            .initialize("factory", "init", vec![ArgSource::address_of("token")])
            .build()
            .unwrap();

        assert_eq!(plan.steps().len(), 3);
        assert_eq!(
            plan.deployments().map(|d| d.component.as_str()).collect::<Vec<_>>(),
            vec!["factory", "token"]
        );
        assert_eq!(
            plan.initializations().map(|i| i.description()).collect::<Vec<_>>(),
            vec!["factory.init(token)"]
        );
    }

    #[test]
    fn test_rejects_forward_reference() {
        let err = PlanBuilder::new()
            .deploy("token", vec![ArgSource::address_of("factory")])
            .deploy("factory", vec![])
            .build()
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidPlan(m) if m.contains("step 1") && m.contains("factory")));
    }

    #[test]
    fn test_rejects_self_reference() {
        let err = PlanBuilder::new()
            .deploy("factory", vec![ArgSource::address_of("factory")])
            .build()
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidPlan(_)));
    }

    #[test]
    fn test_rejects_initialization_before_deployment() {
        let err = PlanBuilder::new()
            .initialize("marketplace", "init", vec![])
            .deploy("marketplace", vec![])
            .build()
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidPlan(m) if m.contains("marketplace.init()")));
    }

    #[test]
    fn test_rejects_initialization_argument_forward_reference() {
        let err = PlanBuilder::new()
            .deploy("token", vec![])
            .initialize("token", "addApprovalWhitelist", vec![ArgSource::address_of("marketplace")])
            .deploy("marketplace", vec![])
            .build()
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidPlan(m) if m.contains("step 2")));
    }

    #[test]
    fn test_rejects_duplicate_component() {
        let err = PlanBuilder::new()
            .deploy("token", vec![])
            .deploy("token", vec![])
            .build()
            .unwrap_err();
        assert!(matches!(err, DeployError::InvalidPlan(m) if m.contains("twice")));
    }

    #[test]
    fn test_rejects_empty_names() {
        assert!(PlanBuilder::new().deploy("", vec![]).build().is_err());
        assert!(
            PlanBuilder::new()
                .deploy("token", vec![])
                .initialize("token", " ", vec![])
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_empty_plan_is_valid() {
        let plan = PlanBuilder::new().build().unwrap();
        assert!(plan.steps().is_empty());
    }
}
