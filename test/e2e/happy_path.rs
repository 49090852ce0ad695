//! End-to-end happy path test.
//!
//! Drives a full cluster bootstrap plan through the graph builder and the
//! scheduler against the simulated provider, verifying:
//!
//! 1. Implicit edges inferred from output consumption
//! 2. Synthetic identity-binding expansion for workload accounts
//! 3. Topological admission (no unit starts before its dependencies)
//! 4. Concurrency between independent branches
//! 5. Readiness polling for the cluster and releases
//! 6. The all-or-nothing handoff after full convergence
//!
//! ## Running
//!
//! ```bash
//! cargo test -p groundwork-e2e --test happy_path
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use groundwork_engine::{
    ApplyState, EngineConfig, Handoff, HandoffSpec, Scheduler, SimProvider,
};
use groundwork_model::{
    AccessRule, BindingRequest, ClusterSpec, NetworkSpec, ObjectSpec, ReadinessPolicy,
    ReleaseSpec, ResourceUnit, SecretStoreSpec, TrustSpec, UnitName, UnitSpec, ValueRef,
};
use tokio::sync::watch;

fn name(s: &str) -> UnitName {
    UnitName::new(s).expect("valid unit name")
}

/// The bootstrap plan: network, admin and workload trust, a managed
/// cluster, an external secret, two add-on releases (one with a workload
/// identity) and a GitOps bootstrap object.
fn bootstrap_plan() -> Vec<ResourceUnit> {
    let vpc = ResourceUnit::new(
        name("vpc"),
        UnitSpec::Network(NetworkSpec {
            cidr: "10.0.0.0/16".to_string(),
            max_zones: 2,
            nat_gateways: 1,
            subnet_tags: BTreeMap::from([(
                "kubernetes.io/role/elb".to_string(),
                "1".to_string(),
            )]),
        }),
    )
    .produces(["vpc/id".into()]);

    let kube_admin = ResourceUnit::new(
        name("kube-admin"),
        UnitSpec::IdentityTrust(TrustSpec::Role {
            principal_arn: "arn:aws:iam::123456789012:user/operator".to_string(),
            managed_policies: vec![],
            require_mfa: true,
            role_name: Some("KubeAdmin".to_string()),
        }),
    )
    .produces(["kube-admin/role-arn".into()]);

    let oidc = ResourceUnit::new(
        name("ci-deploy"),
        UnitSpec::IdentityTrust(TrustSpec::Oidc {
            issuer_url: "https://token.actions.githubusercontent.com".to_string(),
            audience: "sts.amazonaws.com".to_string(),
            subject_pattern: "repo:groundwork-dev/platform:ref:refs/heads/main".to_string(),
            thumbprints: vec!["6938fd4d98bab03faadb97b34396831e3780aea1".to_string()],
            managed_policies: vec![],
            role_name: Some("CiDeploy".to_string()),
        }),
    )
    .produces(["ci-deploy/role-arn".into()]);

    let eks = ResourceUnit::new(
        name("eks"),
        UnitSpec::ManagedCluster(ClusterSpec {
            version: "1.32".to_string(),
            network: ValueRef::output("vpc/id"),
            endpoint_allow_cidrs: vec!["203.0.113.0/24".to_string()],
            admin_role: Some(ValueRef::output("kube-admin/role-arn")),
            default_capacity: 2,
        }),
    )
    .produces(["eks/endpoint".into()])
    .readiness(ReadinessPolicy::WaitForCondition {
        timeout_secs: 60,
        poll_interval_secs: 0,
    });

    let hf_secret = ResourceUnit::new(
        name("hf-creds"),
        UnitSpec::SecretStore(SecretStoreSpec {
            secret_name: "hf/creds".to_string(),
            description: "Hugging Face pull token".to_string(),
            value_from: "HF_TOKEN".to_string(),
        }),
    );

    let metrics = ResourceUnit::new(
        name("metrics-server"),
        UnitSpec::PackageRelease(ReleaseSpec {
            repository: "https://kubernetes-sigs.github.io/metrics-server/".to_string(),
            chart: "metrics-server".to_string(),
            release: "metrics-server".to_string(),
            namespace: "kube-system".to_string(),
            version: None,
            create_namespace: false,
            wait: true,
            atomic: true,
            timeout_secs: Some(300),
            values: serde_json::Value::Null,
            cluster: ValueRef::output("eks/endpoint"),
            service_account: None,
        }),
    )
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
            timeout_secs: Some(300),
            values: serde_json::json!({ "autoDiscovery": { "clusterName": "eks" } }),
            cluster: ValueRef::output("eks/endpoint"),
            service_account: Some(BindingRequest {
                namespace: "kube-system".to_string(),
                account_name: "cluster-autoscaler".to_string(),
                rules: vec![AccessRule {
                    resources: vec!["*".to_string()],
                    actions: vec![
                        "autoscaling:DescribeAutoScalingGroups".to_string(),
                        "autoscaling:SetDesiredCapacity".to_string(),
                    ],
                }],
                managed_policies: vec![],
            }),
        }),
    )
    .readiness(ReadinessPolicy::FireAndForget);

    let argo = ResourceUnit::new(
        name("argo-bootstrap"),
        UnitSpec::ClusterObject(ObjectSpec {
            cluster: ValueRef::output("eks/endpoint"),
            manifest: serde_json::json!({
                "apiVersion": "argoproj.io/v1alpha1",
                "kind": "Application",
                "metadata": { "name": "platform", "namespace": "argocd" },
            }),
            service_account: None,
        }),
    );

    vec![vpc, kube_admin, oidc, eks, hf_secret, metrics, autoscaler, argo]
}

fn handoff_spec() -> HandoffSpec {
    HandoffSpec {
        cluster_endpoint: "eks/endpoint".into(),
        trust_role_id: "kube-admin/role-arn".into(),
        network_id: "vpc/id".into(),
    }
}

#[tokio::test]
async fn bootstrap_converges_and_hands_off() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let graph = groundwork_graph::build(bootstrap_plan()).expect("plan builds");
    // 8 declared units plus the synthetic autoscaler binding.
    assert_eq!(graph.len(), 9);
    assert!(graph.unit(&name("cluster-autoscaler-binding")).is_some());

    let provider = Arc::new(
        SimProvider::new()
            .with_apply_delay(Duration::from_millis(20))
            .satisfied_after("eks", 3)
            .satisfied_after("metrics-server", 2),
    );
    let config = EngineConfig {
        max_parallel: None,
        poll_floor: Duration::from_millis(10),
    };
    let scheduler = Scheduler::new(provider.clone(), config);

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let report = scheduler.run(&graph, shutdown_rx).await;

    assert!(report.is_success(), "run result: {}", report.result());
    for unit in &report.units {
        assert_eq!(unit.state, ApplyState::Ready, "unit {} not ready", unit.name);
    }

    // No unit started before every dependency finished.
    for (dependent, dependency) in graph.edges() {
        let finished = report.unit(&dependency).unwrap().finished_at.unwrap();
        let started = report.unit(&dependent).unwrap().started_at.unwrap();
        assert!(
            finished <= started,
            "{dependency} must be ready before {dependent} starts"
        );
    }

    // The synthetic binding runs after the cluster, before its consumer.
    let binding = report.unit(&name("cluster-autoscaler-binding")).unwrap();
    let autoscaler = report.unit(&name("cluster-autoscaler")).unwrap();
    assert!(binding.finished_at.unwrap() <= autoscaler.started_at.unwrap());

    // Independent roots overlap: the network and the admin trust both
    // start before either finishes.
    let vpc = report.unit(&name("vpc")).unwrap();
    let admin = report.unit(&name("kube-admin")).unwrap();
    assert!(vpc.started_at.unwrap() < admin.finished_at.unwrap());
    assert!(admin.started_at.unwrap() < vpc.finished_at.unwrap());

    // Readiness polling actually happened for the waiting units, and not
    // for the fire-and-forget release.
    assert_eq!(provider.poll_count("eks"), 3);
    assert_eq!(provider.poll_count("metrics-server"), 2);
    assert_eq!(provider.poll_count("cluster-autoscaler"), 0);

    let handoff = Handoff::from_report(&report, &handoff_spec()).expect("handoff");
    assert!(handoff.cluster_endpoint.starts_with("sim:eks:"));
    assert!(handoff.trust_role_id.starts_with("sim:kube-admin:"));
    assert!(handoff.network_id.starts_with("sim:vpc:"));
}

#[tokio::test]
async fn bounded_run_converges_in_order() {
    let graph = groundwork_graph::build(bootstrap_plan()).expect("plan builds");
    let provider = Arc::new(SimProvider::new());
    let config = EngineConfig {
        max_parallel: Some(1),
        poll_floor: Duration::from_millis(10),
    };
    let scheduler = Scheduler::new(provider.clone(), config);

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let report = scheduler.run(&graph, shutdown_rx).await;
    assert!(report.is_success());

    // Serial admission: applies happen one at a time, in an order where
    // every dependency precedes its dependents.
    let order = provider.applied_units();
    assert_eq!(order.len(), graph.len());
    for (dependent, dependency) in graph.edges() {
        let dep_pos = order.iter().position(|n| n == &dependency).unwrap();
        let pos = order.iter().position(|n| n == &dependent).unwrap();
        assert!(dep_pos < pos, "{dependency} applied after {dependent}");
    }
}
