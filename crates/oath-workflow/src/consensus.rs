//! # Consensus Executor
//!
//! Runs one read on every executor and accepts the result only when all
//! of them produced byte-identical output. Any disagreement, failure or
//! timeout yields no value for the round; partial results are never used.
//!
//! Identity is decided on the `serde_json` encoding of each output, so two
//! values agree exactly when they serialize to the same bytes.
//!
//! [`LocalConsensus`] is the in-process implementation used by the local
//! host: executors run concurrently via `futures::future::join_all`, each
//! under its own timeout.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;

use crate::error::{ConfigError, ConsensusFailure};

/// Identity of the executor running an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeContext {
    /// Zero-based executor index.
    pub node: usize,
    /// Total executors in the round.
    pub executors: usize,
}

/// Outcome of one consensus round.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsensusResult<T> {
    /// Every executor returned this value.
    Agreed(T),
    /// The round produced no value.
    NoConsensus(ConsensusFailure),
}

impl<T> ConsensusResult<T> {
    /// The agreed value, if any.
    pub fn agreed(self) -> Option<T> {
        match self {
            Self::Agreed(v) => Some(v),
            Self::NoConsensus(_) => None,
        }
    }
}

/// Host capability: run an operation on all executors under the
/// identical-value policy.
pub trait ConsensusExecutor: Send + Sync {
    /// Run `op` once per executor and aggregate.
    fn run_identical<T, E, F, Fut>(&self, op: F) -> impl Future<Output = ConsensusResult<T>> + Send
    where
        T: Serialize + Send,
        E: Display + Send,
        F: Fn(NodeContext) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send;
}

/// Default executor count.
pub const DEFAULT_EXECUTORS: usize = 4;

/// In-process consensus over `executors` concurrent runs.
#[derive(Debug, Clone)]
pub struct LocalConsensus {
    executors: usize,
    node_timeout: Duration,
}

impl LocalConsensus {
    /// At least one executor is required.
    pub fn new(executors: usize, node_timeout: Duration) -> Result<Self, ConfigError> {
        if executors == 0 {
            return Err(ConfigError::InvalidValue {
                field: "executors",
                reason: "at least one executor is required".into(),
            });
        }
        Ok(Self {
            executors,
            node_timeout,
        })
    }

    pub fn executors(&self) -> usize {
        self.executors
    }
}

impl ConsensusExecutor for LocalConsensus {
    async fn run_identical<T, E, F, Fut>(&self, op: F) -> ConsensusResult<T>
    where
        T: Serialize + Send,
        E: Display + Send,
        F: Fn(NodeContext) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let executors = self.executors;
        let timeout = self.node_timeout;

        let runs = (0..executors).map(|node| {
            let fut = op(NodeContext { node, executors });
            async move { (node, tokio::time::timeout(timeout, fut).await) }
        });
        let outcomes = join_all(runs).await;

        let mut agreed: Option<(T, Vec<u8>)> = None;
        for (node, outcome) in outcomes {
            let value = match outcome {
                Err(_) => return ConsensusResult::NoConsensus(ConsensusFailure::Timeout { node }),
                Ok(Err(e)) => {
                    return ConsensusResult::NoConsensus(ConsensusFailure::NodeFailed {
                        node,
                        reason: e.to_string(),
                    })
                }
                Ok(Ok(value)) => value,
            };

            let bytes = match serde_json::to_vec(&value) {
                Ok(bytes) => bytes,
                Err(e) => {
                    return ConsensusResult::NoConsensus(ConsensusFailure::NodeFailed {
                        node,
                        reason: format!("output is not serializable: {e}"),
                    })
                }
            };

            match &agreed {
                None => agreed = Some((value, bytes)),
                Some((_, first)) if *first == bytes => {}
                Some(_) => return ConsensusResult::NoConsensus(ConsensusFailure::Disagreement),
            }
        }

        match agreed {
            Some((value, _)) => ConsensusResult::Agreed(value),
            // Unreachable with executors >= 1.
            None => ConsensusResult::NoConsensus(ConsensusFailure::NodeFailed {
                node: 0,
                reason: "no executors ran".into(),
            }),
        }
    }
}
