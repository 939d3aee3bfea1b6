///! Cluster lifecycle operations
///!
///! List, create, delete and kubeconfig retrieval, including the duplicate
///! check that makes `create` idempotent by name and the readiness poll that
///! follows a create with `wait` set.

use crate::api::Api;
use crate::error::{Error, Result};
use crate::value::{Document, RAW_BODY_KEY};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const CLUSTER_ENDPOINT: &str = "/sc/cluster";

/// Stage index at which a cluster is fully provisioned
pub const READY_STAGE: i64 = 9;

/// Backoff schedule for the readiness poll
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub multiplier: u32,
    /// Overall budget for the wait, measured from the first poll
    pub deadline: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(5),
            multiplier: 2,
            deadline: Duration::from_secs(30 * 60),
        }
    }
}

impl PollConfig {
    fn next_interval(&self, current: Duration) -> Duration {
        current
            .saturating_mul(self.multiplier.max(1))
            .min(self.max_interval)
    }
}

/// Parameters for `cluster create`
#[derive(Debug, Clone)]
pub struct CreateCluster {
    pub name: String,
    pub node_type: String,
    pub node_count: u32,
    /// Create even when a cluster with the same name exists
    pub force: bool,
    /// Block until the cluster reaches the ready stage
    pub wait: bool,
}

impl Default for CreateCluster {
    fn default() -> Self {
        Self {
            name: String::new(),
            node_type: "b1".to_string(),
            node_count: 1,
            force: false,
            wait: false,
        }
    }
}

impl CreateCluster {
    fn to_request(&self) -> Document {
        Document::new()
            .with("name", self.name.as_str())
            .with("nodeCount", self.node_count)
            .with("nodeType", self.node_type.as_str())
    }
}

fn cluster_endpoint(cluster_id: &str) -> String {
    format!("{}/{}", CLUSTER_ENDPOINT, urlencoding::encode(cluster_id))
}

pub struct ClusterService<A> {
    api: A,
    poll: PollConfig,
}

impl<A: Api> ClusterService<A> {
    pub fn new(api: A) -> Self {
        Self::with_poll_config(api, PollConfig::default())
    }

    pub fn with_poll_config(api: A, poll: PollConfig) -> Self {
        Self { api, poll }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// All clusters, or a single descriptor when an ID is given
    pub async fn list(&self, cluster_id: Option<&str>) -> Result<Document> {
        let endpoint = match cluster_id.filter(|id| !id.is_empty()) {
            Some(id) => cluster_endpoint(id),
            None => CLUSTER_ENDPOINT.to_string(),
        };
        Ok(self.api.fetch(&endpoint).await?.body)
    }

    /// First cluster in server order whose name matches
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Document>> {
        let listing = self.list(None).await?;
        let clusters = match listing.get("clusters") {
            None => return Ok(None),
            Some(v) if v.is_null() => return Ok(None),
            Some(_) => listing.require_sequence("clusters")?,
        };

        for cluster in clusters {
            let info = cluster
                .as_mapping()
                .ok_or_else(|| Error::missing_field("clusters[]", "mapping"))?;
            if info.get("name").and_then(|v| v.as_str()) == Some(name) {
                return Ok(Some(info.clone()));
            }
        }
        Ok(None)
    }

    /// Create a cluster, reusing an existing one with the same name unless
    /// `force` is set. With `wait`, polls until the cluster is ready and
    /// returns its final descriptor. `on_stage` sees every polled stage.
    pub async fn create<F>(
        &self,
        request: &CreateCluster,
        cancel: &CancellationToken,
        mut on_stage: F,
    ) -> Result<Document>
    where
        F: FnMut(i64) + Send,
    {
        let (created, submitted) = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            result = self.submit_unless_exists(request) => result?,
        };
        if !submitted || !request.wait {
            return Ok(created);
        }

        let cluster_id = created.require_str("clusterId")?.to_string();
        self.wait_until_ready(&cluster_id, cancel, &mut on_stage).await
    }

    /// The existing cluster with the requested name, or the create response.
    /// The flag tells whether a create was submitted.
    async fn submit_unless_exists(&self, request: &CreateCluster) -> Result<(Document, bool)> {
        if !request.force && !request.name.is_empty() {
            if let Some(existing) = self.find_by_name(&request.name).await? {
                tracing::info!(name = %request.name, "cluster already exists, skipping create");
                return Ok((existing, false));
            }
        }

        let created = self
            .api
            .submit(CLUSTER_ENDPOINT, Some(&request.to_request()))
            .await?
            .body;
        Ok((created, true))
    }

    async fn wait_until_ready<F>(
        &self,
        cluster_id: &str,
        cancel: &CancellationToken,
        on_stage: &mut F,
    ) -> Result<Document>
    where
        F: FnMut(i64) + Send,
    {
        let endpoint = cluster_endpoint(cluster_id);
        let started = Instant::now();
        let mut interval = self.poll.initial_interval;
        let mut last = Document::new();

        loop {
            if cancel.is_cancelled() {
                return Err(Error::WaitCancelled {
                    cluster_id: cluster_id.to_string(),
                });
            }

            let remaining = self.poll.deadline.saturating_sub(started.elapsed());
            let fetched = tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::WaitCancelled {
                        cluster_id: cluster_id.to_string(),
                    });
                }
                fetched = tokio::time::timeout(remaining, self.api.fetch(&endpoint)) => fetched,
            };
            let Ok(fetched) = fetched else {
                return Err(Error::WaitTimedOut {
                    cluster_id: cluster_id.to_string(),
                    elapsed: started.elapsed(),
                });
            };

            match fetched {
                Ok(response) => last = response.body,
                // A non-200 ends the wait; the stage check below reports it
                Err(Error::UnexpectedStatus { status, .. }) => {
                    tracing::debug!(cluster_id, status, "poll stopped on non-200 status");
                    break;
                }
                Err(e) => return Err(e),
            }

            let stage = last.optional_i64("stageIndex").unwrap_or(0);
            tracing::debug!(cluster_id, stage, "polled cluster stage");
            on_stage(stage);
            if stage >= READY_STAGE {
                break;
            }

            let elapsed = started.elapsed();
            if elapsed >= self.poll.deadline {
                return Err(Error::WaitTimedOut {
                    cluster_id: cluster_id.to_string(),
                    elapsed,
                });
            }

            let sleep_for = interval.min(self.poll.deadline - elapsed);
            tokio::select! {
                _ = cancel.cancelled() => {
                    return Err(Error::WaitCancelled {
                        cluster_id: cluster_id.to_string(),
                    });
                }
                _ = tokio::time::sleep(sleep_for) => {}
            }
            interval = self.poll.next_interval(interval);
        }

        let stage = last.optional_i64("stageIndex").unwrap_or(0);
        if stage != READY_STAGE {
            return Err(Error::ClusterNotReady {
                cluster_id: cluster_id.to_string(),
                stage,
            });
        }
        Ok(last)
    }

    pub async fn delete(&self, cluster_id: &str) -> Result<Document> {
        Ok(self.api.remove(&cluster_endpoint(cluster_id)).await?.body)
    }

    /// Raw kubeconfig file contents
    pub async fn kubeconfig(&self, cluster_id: &str) -> Result<Vec<u8>> {
        let endpoint = format!("{}/kubeconfig", cluster_endpoint(cluster_id));
        let body = self.api.fetch(&endpoint).await?.body;
        Ok(body.require_bytes(RAW_BODY_KEY)?.to_vec())
    }
}
