//! Binder expansion: identity bindings become ordinary graph nodes.
//!
//! A release or cluster object that declares a `service_account` gets a
//! synthetic `<name>-binding` unit inserted in front of it. The consumer
//! gains an explicit edge onto the binding, and the binding inherits the
//! consumer's cluster reference, so its edge onto the cluster falls out of
//! normal implicit-edge inference. No special-cased ordering rule exists:
//! the graph stays the single source of truth.

use groundwork_model::{BindingSpec, ResourceUnit, UnitSpec};
use tracing::debug;

use crate::GraphError;

pub(crate) fn expand_bindings(
    units: Vec<ResourceUnit>,
) -> Result<Vec<ResourceUnit>, GraphError> {
    let mut expanded = Vec::with_capacity(units.len());
    let mut synthetic = Vec::new();

    for mut unit in units {
        if let Some(request) = unit.spec.service_account().cloned() {
            let cluster = unit
                .spec
                .cluster_ref()
                .cloned()
                .expect("kinds carrying a service_account always target a cluster");
            let binding_name = unit.name.binding_name()?;

            debug!(
                unit = %unit.name,
                binding = %binding_name,
                account = %request.account_name,
                "expanding service-account binding"
            );

            let binding = ResourceUnit::new(
                binding_name.clone(),
                UnitSpec::IdentityBinding(BindingSpec::from_request(&request, cluster)),
            );
            unit.depends_on.push(binding_name);
            synthetic.push(binding);
        }
        expanded.push(unit);
    }

    expanded.extend(synthetic);
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwork_model::{
        BindingRequest, ReleaseSpec, ResourceKind, UnitName, ValueRef,
    };

    fn release_with_binding(name: &str) -> ResourceUnit {
        ResourceUnit::new(
            UnitName::new(name).unwrap(),
            UnitSpec::PackageRelease(ReleaseSpec {
                repository: "https://aws.github.io/eks-charts".to_string(),
                chart: "aws-load-balancer-controller".to_string(),
                release: name.to_string(),
                namespace: "kube-system".to_string(),
                version: None,
                create_namespace: false,
                wait: true,
                atomic: true,
                timeout_secs: None,
                values: serde_json::Value::Null,
                cluster: ValueRef::output("eks/endpoint"),
                service_account: Some(BindingRequest {
                    namespace: "kube-system".to_string(),
                    account_name: "aws-load-balancer-controller".to_string(),
                    rules: vec![],
                    managed_policies: vec![],
                }),
            }),
        )
    }

    #[test]
    fn synthetic_binding_is_inserted() {
        let expanded = expand_bindings(vec![release_with_binding("alb")]).unwrap();
        assert_eq!(expanded.len(), 2);

        let consumer = &expanded[0];
        let binding = &expanded[1];
        assert_eq!(binding.name.as_str(), "alb-binding");
        assert_eq!(binding.kind(), ResourceKind::IdentityBinding);
        assert!(consumer.depends_on.contains(&binding.name));
    }

    #[test]
    fn binding_inherits_cluster_reference() {
        let expanded = expand_bindings(vec![release_with_binding("alb")]).unwrap();
        let binding = &expanded[1];
        assert_eq!(
            binding.spec.cluster_ref(),
            Some(&ValueRef::output("eks/endpoint"))
        );
        // Orders after the cluster through ordinary implicit inference.
        assert!(binding.consumes().contains(&"eks/endpoint".into()));
    }

    #[test]
    fn unit_without_binding_passes_through() {
        let mut unit = release_with_binding("alb");
        if let UnitSpec::PackageRelease(spec) = &mut unit.spec {
            spec.service_account = None;
        }
        let expanded = expand_bindings(vec![unit]).unwrap();
        assert_eq!(expanded.len(), 1);
    }
}
