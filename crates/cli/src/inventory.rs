//! Kubernetes-backed cluster inventory
//!
//! Lists deployments, pods, nodes and pod metrics through the API server and
//! converts them into the report models. Transport, auth and API failures
//! all surface as `InventoryError::Unavailable`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Node, Pod};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{Api, ApiResource, DynamicObject, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use kshow_lib::inventory::{ClusterInventory, InventoryError, Result as InventoryResult};
use kshow_lib::quantity::{parse_cpu_millicores, parse_memory_bytes, QuantityError};
use kshow_lib::{
    ContainerSpec, ContainerStatus, ContainerUsage, Instance, Labels, Phase, ReportLogger,
    ResourceAmounts, Toleration, Unit, UnitCondition, UsageSample, Workload,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Build a Kubernetes client
///
/// An explicit kubeconfig path wins; otherwise the default kubeconfig is
/// used, falling back to in-cluster service account configuration.
pub async fn connect(kubeconfig: Option<&str>, context: Option<&str>) -> Result<Client> {
    let options = KubeConfigOptions {
        context: context.map(str::to_string),
        ..Default::default()
    };

    let config = match (kubeconfig, context) {
        (Some(path), _) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path))?;
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .context("Invalid kubeconfig")?
        }
        (None, Some(_)) => Config::from_kubeconfig(&options)
            .await
            .context("Failed to load kubeconfig context")?,
        (None, None) => Config::infer()
            .await
            .context("Failed to infer Kubernetes configuration")?,
    };

    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Inventory source backed by the Kubernetes API
pub struct KubeInventory {
    client: Client,
    logger: ReportLogger,
}

impl KubeInventory {
    pub fn new(client: Client, logger: ReportLogger) -> Self {
        Self { client, logger }
    }

    fn api<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        }
    }

    fn cpu(&self, object: &str, field: &str, quantity: Option<&Quantity>) -> Option<u64> {
        let value = quantity?;
        self.parsed(object, field, &value.0, parse_cpu_millicores(&value.0))
    }

    fn memory(&self, object: &str, field: &str, quantity: Option<&Quantity>) -> Option<u64> {
        let value = quantity?;
        self.parsed(object, field, &value.0, parse_memory_bytes(&value.0))
    }

    fn parsed(
        &self,
        object: &str,
        field: &str,
        raw: &str,
        result: Result<u64, QuantityError>,
    ) -> Option<u64> {
        match result {
            Ok(v) => Some(v),
            Err(_) => {
                self.logger.log_malformed_quantity(object, field, raw);
                None
            }
        }
    }

    fn amounts(
        &self,
        object: &str,
        field: &str,
        list: Option<&BTreeMap<String, Quantity>>,
    ) -> ResourceAmounts {
        ResourceAmounts {
            cpu_millicores: self.cpu(object, field, list.and_then(|l| l.get("cpu"))),
            memory_bytes: self.memory(object, field, list.and_then(|l| l.get("memory"))),
        }
    }

    fn to_instance(&self, pod: Pod) -> Instance {
        let name = pod.metadata.name.unwrap_or_default();
        let spec = pod.spec.unwrap_or_default();
        let status = pod.status.unwrap_or_default();

        let containers = spec
            .containers
            .into_iter()
            .map(|c| {
                let resources = c.resources.unwrap_or_default();
                ContainerSpec {
                    requests: self.amounts(&name, "requests", resources.requests.as_ref()),
                    limits: self.amounts(&name, "limits", resources.limits.as_ref()),
                    name: c.name,
                }
            })
            .collect();

        let container_statuses = status
            .container_statuses
            .unwrap_or_default()
            .into_iter()
            .map(|cs| ContainerStatus {
                waiting_reason: cs
                    .state
                    .and_then(|s| s.waiting)
                    .map(|w| w.reason.unwrap_or_default()),
                name: cs.name,
                ready: cs.ready,
                restart_count: u32::try_from(cs.restart_count).unwrap_or(0),
            })
            .collect();

        Instance {
            namespace: pod.metadata.namespace.unwrap_or_default(),
            created_at: created(pod.metadata.creation_timestamp),
            phase: status.phase.as_deref().map(Phase::parse).unwrap_or(Phase::Unknown),
            node_name: spec.node_name,
            containers,
            container_statuses,
            name,
        }
    }

    fn to_unit(&self, node: Node) -> Unit {
        let name = node.metadata.name.unwrap_or_default();
        let status = node.status.unwrap_or_default();
        let allocatable = status.allocatable.unwrap_or_default();

        Unit {
            created_at: created(node.metadata.creation_timestamp),
            conditions: status
                .conditions
                .unwrap_or_default()
                .into_iter()
                .map(|c| UnitCondition {
                    condition_type: c.type_,
                    reason: c.reason,
                })
                .collect(),
            labels: Labels::from(node.metadata.labels.unwrap_or_default()),
            kubelet_version: status
                .node_info
                .map(|info| info.kubelet_version)
                .unwrap_or_default(),
            allocatable_cpu_millicores: self
                .cpu(&name, "allocatable", allocatable.get("cpu"))
                .unwrap_or(0),
            allocatable_memory_bytes: self
                .memory(&name, "allocatable", allocatable.get("memory"))
                .unwrap_or(0),
            name,
        }
    }

    fn to_sample(&self, object: DynamicObject) -> UsageSample {
        let name = object.metadata.name.unwrap_or_default();
        let containers = object.data["containers"]
            .as_array()
            .map(|list| {
                list.iter()
                    .map(|c| ContainerUsage {
                        name: c["name"].as_str().unwrap_or_default().to_string(),
                        cpu_millicores: self
                            .usage(&name, "usage.cpu", &c["usage"]["cpu"], parse_cpu_millicores),
                        memory_bytes: self.usage(
                            &name,
                            "usage.memory",
                            &c["usage"]["memory"],
                            parse_memory_bytes,
                        ),
                    })
                    .collect()
            })
            .unwrap_or_default();

        UsageSample {
            namespace: object.metadata.namespace.unwrap_or_default(),
            instance_name: name,
            containers,
        }
    }

    fn usage(
        &self,
        object: &str,
        field: &str,
        value: &Value,
        parse: fn(&str) -> Result<u64, QuantityError>,
    ) -> u64 {
        match value.as_str() {
            Some(raw) => self.parsed(object, field, raw, parse(raw)).unwrap_or(0),
            None => 0,
        }
    }
}

fn created(timestamp: Option<Time>) -> chrono::DateTime<Utc> {
    timestamp.map(|t| t.0).unwrap_or_else(Utc::now)
}

fn pod_metrics_resource() -> ApiResource {
    ApiResource {
        group: "metrics.k8s.io".to_string(),
        version: "v1beta1".to_string(),
        api_version: "metrics.k8s.io/v1beta1".to_string(),
        kind: "PodMetrics".to_string(),
        plural: "pods".to_string(),
    }
}

#[async_trait]
impl ClusterInventory for KubeInventory {
    async fn list_workloads(&self, namespace: Option<&str>) -> InventoryResult<Vec<Workload>> {
        let list = self
            .api::<Deployment>(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| InventoryError::unavailable("deployments", e))?;

        Ok(list
            .items
            .into_iter()
            .map(|d| {
                let spec = d.spec.unwrap_or_default();
                let tolerations = spec
                    .template
                    .spec
                    .and_then(|s| s.tolerations)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|t| Toleration {
                        key: t.key.unwrap_or_default(),
                        operator: t.operator.unwrap_or_default(),
                        value: t.value.unwrap_or_default(),
                        effect: t.effect.unwrap_or_default(),
                    })
                    .collect();

                Workload {
                    name: d.metadata.name.unwrap_or_default(),
                    namespace: d.metadata.namespace.unwrap_or_default(),
                    replicas: spec.replicas.and_then(|r| u32::try_from(r).ok()).unwrap_or(1),
                    tolerations,
                }
            })
            .collect())
    }

    async fn list_instances(&self, namespace: Option<&str>) -> InventoryResult<Vec<Instance>> {
        let list = self
            .api::<Pod>(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| InventoryError::unavailable("pods", e))?;

        Ok(list.items.into_iter().map(|p| self.to_instance(p)).collect())
    }

    async fn list_units(&self) -> InventoryResult<Vec<Unit>> {
        let api: Api<Node> = Api::all(self.client.clone());
        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| InventoryError::unavailable("nodes", e))?;

        Ok(list.items.into_iter().map(|n| self.to_unit(n)).collect())
    }

    async fn list_usage_samples(&self, namespace: Option<&str>) -> InventoryResult<Vec<UsageSample>> {
        let resource = pod_metrics_resource();
        let api: Api<DynamicObject> = match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        };

        let list = api
            .list(&ListParams::default())
            .await
            .map_err(|e| InventoryError::unavailable("pod metrics", e))?;

        Ok(list.items.into_iter().map(|o| self.to_sample(o)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::{
        ContainerState, ContainerStateWaiting, ContainerStatus as K8sContainerStatus, NodeCondition,
        NodeStatus, NodeSystemInfo, PodSpec, PodStatus, ResourceRequirements,
    };
    use k8s_openapi::api::core::v1::Container;
    use kube::api::ObjectMeta;

    // Conversion only; the client is never used for requests.
    fn inventory() -> KubeInventory {
        let config = Config::new("http://127.0.0.1:1".parse().unwrap());
        let client = Client::try_from(config).unwrap();
        KubeInventory::new(client, ReportLogger::default())
    }

    fn quantities(cpu: &str, memory: &str) -> BTreeMap<String, Quantity> {
        BTreeMap::from([
            ("cpu".to_string(), Quantity(cpu.to_string())),
            ("memory".to_string(), Quantity(memory.to_string())),
        ])
    }

    #[tokio::test]
    async fn test_pod_conversion() {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some("api-5f6-abc12".into()),
                namespace: Some("default".into()),
                ..Default::default()
            },
            spec: Some(PodSpec {
                node_name: Some("ip-10-0-0-1".into()),
                containers: vec![Container {
                    name: "app".into(),
                    resources: Some(ResourceRequirements {
                        requests: Some(quantities("250m", "128Mi")),
                        limits: Some(BTreeMap::from([(
                            "cpu".to_string(),
                            Quantity("bogus".into()),
                        )])),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
                ..Default::default()
            }),
            status: Some(PodStatus {
                phase: Some("Pending".into()),
                container_statuses: Some(vec![K8sContainerStatus {
                    name: "app".into(),
                    ready: false,
                    restart_count: 4,
                    state: Some(ContainerState {
                        waiting: Some(ContainerStateWaiting {
                            reason: Some("ErrImagePull".into()),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        };

        let instance = inventory().to_instance(pod);

        assert_eq!(instance.name, "api-5f6-abc12");
        assert_eq!(instance.phase, Phase::Pending);
        assert_eq!(instance.node_name.as_deref(), Some("ip-10-0-0-1"));
        assert_eq!(instance.containers[0].requests, ResourceAmounts::new(250, 134_217_728));
        assert_eq!(instance.containers[0].limits, ResourceAmounts::default());
        assert_eq!(instance.container_statuses[0].restart_count, 4);
        assert_eq!(
            instance.container_statuses[0].waiting_reason.as_deref(),
            Some("ErrImagePull")
        );
    }

    #[tokio::test]
    async fn test_node_conversion() {
        let node = Node {
            metadata: ObjectMeta {
                name: Some("ip-10-0-0-1".into()),
                labels: Some(BTreeMap::from([(
                    "kubernetes.io/hostname".to_string(),
                    "ip-10-0-0-1".to_string(),
                )])),
                ..Default::default()
            },
            status: Some(NodeStatus {
                allocatable: Some(quantities("1930m", "7220184Ki")),
                conditions: Some(vec![NodeCondition {
                    type_: "Ready".into(),
                    status: "True".into(),
                    reason: Some("KubeletReady".into()),
                    ..Default::default()
                }]),
                node_info: Some(NodeSystemInfo {
                    kubelet_version: "v1.28.3-eks-1".into(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let unit = inventory().to_unit(node);

        assert_eq!(unit.allocatable_cpu_millicores, 1930);
        assert_eq!(unit.allocatable_memory_bytes, 7_220_184 * 1024);
        assert_eq!(unit.kubelet_version, "v1.28.3-eks-1");
        assert_eq!(unit.labels.get("kubernetes.io/hostname"), Some("ip-10-0-0-1"));
        assert_eq!(unit.conditions[0].reason.as_deref(), Some("KubeletReady"));
    }

    #[tokio::test]
    async fn test_pod_metrics_conversion() {
        let mut object = DynamicObject::new("api-5f6-abc12", &pod_metrics_resource());
        object.metadata.namespace = Some("default".into());
        object.data = serde_json::json!({
            "containers": [
                { "name": "app", "usage": { "cpu": "1523441n", "memory": "52344Ki" } },
                { "name": "proxy", "usage": { "cpu": "2m" } }
            ]
        });

        let sample = inventory().to_sample(object);

        assert_eq!(sample.instance_name, "api-5f6-abc12");
        assert_eq!(sample.containers.len(), 2);
        assert_eq!(sample.containers[0].cpu_millicores, 2);
        assert_eq!(sample.containers[0].memory_bytes, 52_344 * 1024);
        assert_eq!(sample.containers[1].cpu_millicores, 2);
        assert_eq!(sample.containers[1].memory_bytes, 0);
    }

    fn kubeconfig(name: &str, port: u16) -> String {
        format!(
            r#"apiVersion: v1
kind: Config
clusters:
- name: {name}
  cluster:
    server: http://127.0.0.1:{port}
contexts:
- name: ctx-{name}
  context:
    cluster: {name}
    user: {name}
users:
- name: {name}
  user:
    token: token-{name}
current-context: ctx-{name}
"#
        )
    }

    #[tokio::test]
    async fn test_connect_merges_kubeconfig_list() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = dir.path().join("a.yaml");
        let second = dir.path().join("b.yaml");
        std::fs::write(&first, kubeconfig("a", 6443)).unwrap();
        std::fs::write(&second, kubeconfig("b", 7443)).unwrap();

        let joined = std::env::join_paths([&first, &second]).unwrap();
        std::env::set_var("KUBECONFIG", &joined);

        // Contexts from either file resolve when no explicit path is given
        assert!(connect(None, Some("ctx-a")).await.is_ok());
        assert!(connect(None, Some("ctx-b")).await.is_ok());
        assert!(connect(None, Some("ctx-missing")).await.is_err());

        // An explicit path is a single file
        assert!(connect(Some(first.to_str().unwrap()), Some("ctx-a")).await.is_ok());
        assert!(connect(joined.to_str(), None).await.is_err());
    }
}
