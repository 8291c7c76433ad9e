// Live usage collection: per-bucket du queries fanned out across a bounded
// worker pool, with each query pinned to a randomly chosen endpoint replica.

pub mod du;

use crate::config::{BackendConfig, InventoryConfig};
use crate::error::StatsError;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Duration;

/// One endpoint replica. The id feeds profile derivation when the
/// configured profile carries a `$` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replica {
    pub id: u32,
    pub url: String,
}

/// Registry of endpoint replicas for one backend. Selection is an explicit
/// uniform-random choice over the list, never positional string slicing.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    replicas: Vec<Replica>,
}

impl EndpointRegistry {
    /// Builds the registry from configured URLs. The replica id is the
    /// first digit run in the URL (e.g. 1 for https://vss-1.example:9000);
    /// URLs without one get their 1-based position.
    pub fn from_urls(urls: &[String]) -> anyhow::Result<Self> {
        anyhow::ensure!(!urls.is_empty(), "endpoint registry needs at least one URL");
        let replicas = urls
            .iter()
            .enumerate()
            .map(|(i, url)| Replica {
                id: extract_replica_id(url).unwrap_or(i as u32 + 1),
                url: url.clone(),
            })
            .collect();
        Ok(Self { replicas })
    }

    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }

    /// Uniform-random replica, to spread per-bucket queries across the
    /// available endpoints.
    pub fn choose(&self) -> &Replica {
        let idx = rand::thread_rng().gen_range(0..self.replicas.len());
        &self.replicas[idx]
    }
}

fn extract_replica_id(url: &str) -> Option<u32> {
    let digits: String = url
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// `$` in the configured profile stands for the replica id, e.g.
/// profile "banksia$" with replica 3 queries as "banksia3".
pub fn profile_for_replica(profile: &str, replica: &Replica) -> String {
    profile.replace('$', &replica.id.to_string())
}

/// Result of one per-bucket query.
#[derive(Debug, Clone)]
pub struct BucketUsage {
    pub bucket: String,
    pub bytes: u64,
    pub objects: u64,
}

pub struct InventoryRepo {
    mc_path: String,
    max_attempts: u32,
    retry_base: Duration,
}

impl InventoryRepo {
    pub fn new(config: &InventoryConfig) -> Self {
        Self {
            mc_path: config.mc_path.clone(),
            max_attempts: config.max_attempts,
            retry_base: Duration::from_millis(config.retry_base_ms),
        }
    }

    /// Queries every bucket of a backend concurrently and returns one
    /// usage entry per bucket. Workers are independent; results are joined
    /// at a single barrier. Any bucket failing after retries fails the
    /// whole collection, because a silent partial total would corrupt the
    /// reconciliation comparison.
    pub async fn collect(
        &self,
        backend: &BackendConfig,
        buckets: &[String],
    ) -> anyhow::Result<Vec<BucketUsage>> {
        let registry = EndpointRegistry::from_urls(&backend.endpoints)?;
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        tracing::info!(
            operation = "collect",
            buckets = buckets.len(),
            workers,
            replicas = registry.len(),
            "collecting bucket usage"
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut set: JoinSet<anyhow::Result<BucketUsage>> = JoinSet::new();

        for bucket in buckets {
            let bucket = bucket.clone();
            let profile = profile_for_replica(&backend.profile, registry.choose());
            let mc_path = self.mc_path.clone();
            let max_attempts = self.max_attempts;
            let retry_base = self.retry_base;
            let semaphore = semaphore.clone();

            set.spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                du_with_retry(&mc_path, &profile, &bucket, max_attempts, retry_base).await
            });
        }

        let mut usage = Vec::with_capacity(buckets.len());
        while let Some(joined) = set.join_next().await {
            let entry = joined??;
            tracing::debug!(
                operation = "collect",
                bucket = %entry.bucket,
                bytes = entry.bytes,
                objects = entry.objects,
                "bucket usage"
            );
            usage.push(entry);
        }
        Ok(usage)
    }
}

/// Bounded retry with exponential backoff around one bucket query.
async fn du_with_retry(
    mc_path: &str,
    profile: &str,
    bucket: &str,
    max_attempts: u32,
    retry_base: Duration,
) -> anyhow::Result<BucketUsage> {
    let mut delay = retry_base;
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match du::run_du(mc_path, profile, bucket).await {
            Ok(summary) => {
                return Ok(BucketUsage {
                    bucket: bucket.to_string(),
                    bytes: summary.size,
                    objects: summary.objects,
                });
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt < max_attempts {
                    tracing::warn!(
                        operation = "du_with_retry",
                        bucket,
                        attempt,
                        error = %last_error,
                        "bucket query failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    Err(StatsError::InventoryExhausted {
        bucket: bucket.to_string(),
        attempts: max_attempts,
        last_error,
    }
    .into())
}
