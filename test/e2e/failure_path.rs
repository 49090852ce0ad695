//! End-to-end failure containment test.
//!
//! Fails the managed cluster mid-bootstrap and verifies:
//!
//! 1. The failure is contained: independent branches still converge
//! 2. Transitive dependents are skipped with a reason naming the origin
//! 3. Skipped units are never attempted against the provider
//! 4. The handoff is withheld after a non-converged run
//!
//! ## Running
//!
//! ```bash
//! cargo test -p groundwork-e2e --test failure_path
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use groundwork_engine::{
    ApplyState, EngineConfig, Handoff, HandoffError, HandoffSpec, Scheduler, SimProvider,
};
use groundwork_model::{
    BindingRequest, ClusterSpec, NetworkSpec, ReadinessPolicy, ReleaseSpec, ResourceUnit,
    TrustSpec, UnitName, UnitSpec, ValueRef,
};
use tokio::sync::watch;

fn name(s: &str) -> UnitName {
    UnitName::new(s).expect("valid unit name")
}

fn plan() -> Vec<ResourceUnit> {
    let vpc = ResourceUnit::new(
        name("vpc"),
        UnitSpec::Network(NetworkSpec {
            cidr: "10.0.0.0/16".to_string(),
            max_zones: 2,
            nat_gateways: 1,
            subnet_tags: BTreeMap::new(),
        }),
    )
    .produces(["vpc/id".into()]);

    let kube_admin = ResourceUnit::new(
        name("kube-admin"),
        UnitSpec::IdentityTrust(TrustSpec::Role {
            principal_arn: "arn:aws:iam::123456789012:user/operator".to_string(),
            managed_policies: vec![],
            require_mfa: true,
            role_name: None,
        }),
    )
    .produces(["kube-admin/role-arn".into()]);

    let eks = ResourceUnit::new(
        name("eks"),
        UnitSpec::ManagedCluster(ClusterSpec {
            version: "1.32".to_string(),
            network: ValueRef::output("vpc/id"),
            endpoint_allow_cidrs: vec![],
            admin_role: Some(ValueRef::output("kube-admin/role-arn")),
            default_capacity: 2,
        }),
    )
    .produces(["eks/endpoint".into()])
    .readiness(ReadinessPolicy::WaitForCondition {
        timeout_secs: 60,
        poll_interval_secs: 0,
    });

    let autoscaler = ResourceUnit::new(
        name("cluster-autoscaler"),
        UnitSpec::PackageRelease(ReleaseSpec {
            repository: "https://kubernetes.github.io/autoscaler".to_string(),
            chart: "cluster-autoscaler".to_string(),
            release: "cluster-autoscaler".to_string(),
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
                account_name: "cluster-autoscaler".to_string(),
                rules: vec![],
                managed_policies: vec![],
            }),
        }),
    );

    vec![vpc, kube_admin, eks, autoscaler]
}

fn handoff_spec() -> HandoffSpec {
    HandoffSpec {
        cluster_endpoint: "eks/endpoint".into(),
        trust_role_id: "kube-admin/role-arn".into(),
        network_id: "vpc/id".into(),
    }
}

#[tokio::test]
async fn cluster_failure_is_contained_and_handoff_withheld() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let graph = groundwork_graph::build(plan()).expect("plan builds");
    assert_eq!(graph.len(), 5);

    let provider = Arc::new(SimProvider::new().failing("eks", "insufficient capacity"));
    let config = EngineConfig {
        max_parallel: None,
        poll_floor: Duration::from_millis(10),
    };
    let scheduler = Scheduler::new(provider.clone(), config);

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let report = scheduler.run(&graph, shutdown_rx).await;
    assert!(!report.is_success());

    // Independent branches converge.
    assert_eq!(report.unit(&name("vpc")).unwrap().state, ApplyState::Ready);
    assert_eq!(
        report.unit(&name("kube-admin")).unwrap().state,
        ApplyState::Ready
    );

    // The failed unit records its cause.
    let eks = report.unit(&name("eks")).unwrap();
    assert_eq!(eks.state, ApplyState::Failed);
    assert!(eks.detail.as_deref().unwrap().contains("insufficient capacity"));

    // Every transitive dependent is skipped with a reason naming the
    // origin, including the synthetic binding.
    for skipped in ["cluster-autoscaler", "cluster-autoscaler-binding"] {
        let unit = report.unit(&name(skipped)).unwrap();
        assert_eq!(unit.state, ApplyState::Skipped, "{skipped} should be skipped");
        let reason = unit.detail.as_deref().unwrap();
        assert!(reason.contains("eks"), "reason names the origin: {reason}");
        assert!(reason.contains("insufficient capacity"));
        assert!(
            !provider.applied_units().contains(&name(skipped)),
            "{skipped} must never reach the provider"
        );
    }

    // No handoff after a failed run, even though two of its three keys
    // were published.
    let err = Handoff::from_report(&report, &handoff_spec()).unwrap_err();
    assert!(matches!(err, HandoffError::RunNotConverged(_)));
}

#[tokio::test]
async fn readiness_timeout_fails_the_unit() {
    let units: Vec<ResourceUnit> = plan()
        .into_iter()
        .filter(|u| u.name.as_str() != "cluster-autoscaler")
        .map(|u| {
            if u.name.as_str() == "eks" {
                u.readiness(ReadinessPolicy::WaitForCondition {
                    timeout_secs: 0,
                    poll_interval_secs: 0,
                })
            } else {
                u
            }
        })
        .collect();
    let graph = groundwork_graph::build(units).expect("plan builds");

    let provider = Arc::new(SimProvider::new().never_satisfied("eks"));
    let config = EngineConfig {
        max_parallel: None,
        poll_floor: Duration::from_millis(10),
    };
    let scheduler = Scheduler::new(provider.clone(), config);

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let report = scheduler.run(&graph, shutdown_rx).await;
    assert!(!report.is_success());

    let eks = report.unit(&name("eks")).unwrap();
    assert_eq!(eks.state, ApplyState::Failed);
    assert!(eks.detail.as_deref().unwrap().contains("not satisfied within 0s"));
    // A zero budget still performs exactly one check.
    assert_eq!(provider.poll_count("eks"), 1);
}
