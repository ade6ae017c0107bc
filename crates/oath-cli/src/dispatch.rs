//! # Trigger Dispatch
//!
//! Drives the workflow's bindings on a local host:
//!
//! - Cron bindings fire on a `tokio::time::interval` of the binding's
//!   period. The first firing is one full period after start.
//! - Log bindings poll the watched chain for finalized logs. Each binding
//!   keeps a [`LogCursor`] starting just past the finalized head seen at
//!   startup; logs already finalized before the host started are not
//!   replayed. The cursor only advances after a successful fetch.
//!
//! Every firing runs as its own task under the execution budget. A firing
//! that overruns is dropped and reported as [`Firing::TimedOut`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use oath_workflow::{Binding, HandlerKind, HandlerOutput, Host, Trigger, TriggerEvent, Workflow};

/// Widest block range asked for in one `eth_getLogs` call.
pub const MAX_BLOCK_RANGE: u64 = 2_000;

/// Next unscanned block for one log binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogCursor {
    next_block: u64,
}

impl LogCursor {
    /// Start scanning at the block after `head`.
    pub fn after(head: u64) -> Self {
        Self {
            next_block: head.saturating_add(1),
        }
    }

    pub fn next_block(&self) -> u64 {
        self.next_block
    }

    /// Inclusive range to fetch given the finalized head, capped at
    /// [`MAX_BLOCK_RANGE`] blocks. `None` when nothing new is finalized.
    pub fn pending(&self, finalized: u64) -> Option<(u64, u64)> {
        if finalized < self.next_block {
            return None;
        }
        let to = finalized.min(self.next_block.saturating_add(MAX_BLOCK_RANGE - 1));
        Some((self.next_block, to))
    }

    /// Mark every block up to `to` as scanned.
    pub fn commit(&mut self, to: u64) {
        self.next_block = self.next_block.max(to.saturating_add(1));
    }
}

/// How one firing ended.
#[derive(Debug)]
pub enum Firing {
    Completed {
        handler: HandlerKind,
        output: HandlerOutput,
    },
    Failed {
        handler: HandlerKind,
        error: String,
    },
    TimedOut {
        handler: HandlerKind,
    },
}

/// Timing knobs for [`Dispatcher`].
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub execution_timeout: Duration,
    pub poll_interval: Duration,
}

struct LogWatch {
    binding: Binding,
    cursor: Option<LogCursor>,
}

/// Runs trigger firings against one workflow.
pub struct Dispatcher<H: Host> {
    workflow: Arc<Workflow<H>>,
    options: DispatchOptions,
    watches: Vec<LogWatch>,
    cron: Vec<(Binding, u64)>,
    tasks: JoinSet<Firing>,
}

impl<H: Host> Dispatcher<H> {
    pub fn new(workflow: Arc<Workflow<H>>, options: DispatchOptions) -> Self {
        let mut watches = Vec::new();
        let mut cron = Vec::new();
        for binding in workflow.bindings() {
            match binding.trigger {
                Trigger::Cron { interval_secs, .. } => cron.push((binding, interval_secs)),
                Trigger::EvmLog { .. } => watches.push(LogWatch {
                    binding,
                    cursor: None,
                }),
            }
        }
        Self {
            workflow,
            options,
            watches,
            cron,
            tasks: JoinSet::new(),
        }
    }

    /// Cursors of the log bindings, in binding order. `None` until the
    /// watched chain's head has been read once.
    pub fn cursors(&self) -> Vec<Option<LogCursor>> {
        self.watches.iter().map(|w| w.cursor).collect()
    }

    /// Anchor every unanchored log cursor at its chain's finalized head.
    pub async fn prime(&mut self) {
        for watch in &mut self.watches {
            if watch.cursor.is_some() {
                continue;
            }
            match self.workflow.finalized_block(watch.binding.handler).await {
                Ok(head) => {
                    tracing::debug!(handler = %watch.binding.handler, head, "log cursor anchored");
                    watch.cursor = Some(LogCursor::after(head));
                }
                Err(e) => tracing::warn!(
                    handler = %watch.binding.handler,
                    error = %e,
                    "could not read finalized head, will retry"
                ),
            }
        }
    }

    /// Spawn one firing of every cron binding.
    pub fn fire_cron(&mut self) {
        let fired_at = chrono::Utc::now();
        let handlers: Vec<_> = self.cron.iter().map(|(b, _)| b.handler).collect();
        for handler in handlers {
            self.spawn(handler, TriggerEvent::Cron { fired_at });
        }
    }

    /// Fetch newly finalized logs for every log binding and spawn one
    /// firing per log. Returns the number of firings spawned.
    pub async fn poll_logs(&mut self) -> usize {
        self.prime().await;

        let mut fired = Vec::new();
        for watch in &mut self.watches {
            let Some(cursor) = watch.cursor.as_mut() else {
                continue;
            };
            let handler = watch.binding.handler;

            let head = match self.workflow.finalized_block(handler).await {
                Ok(head) => head,
                Err(e) => {
                    tracing::warn!(%handler, error = %e, "finalized head read failed");
                    continue;
                }
            };
            let Some((from, to)) = cursor.pending(head) else {
                continue;
            };
            let Some(filter) = watch.binding.trigger.log_filter(from, to) else {
                continue;
            };

            match self.workflow.fetch_logs(handler, &filter).await {
                Ok(logs) => {
                    tracing::debug!(%handler, from, to, logs = logs.len(), "polled logs");
                    cursor.commit(to);
                    fired.extend(logs.into_iter().map(|log| (handler, log)));
                }
                Err(e) => tracing::warn!(%handler, from, to, error = %e, "log fetch failed"),
            }
        }

        let count = fired.len();
        for (handler, log) in fired {
            self.spawn(handler, TriggerEvent::Log(log));
        }
        count
    }

    fn spawn(&mut self, handler: HandlerKind, event: TriggerEvent) {
        let workflow = Arc::clone(&self.workflow);
        let budget = self.options.execution_timeout;
        tracing::info!(%handler, event = event.kind(), "trigger fired");
        self.tasks.spawn(async move {
            match tokio::time::timeout(budget, workflow.handle(handler, &event)).await {
                Ok(Ok(output)) => Firing::Completed { handler, output },
                Ok(Err(e)) => Firing::Failed {
                    handler,
                    error: format!("{e:#}"),
                },
                Err(_) => Firing::TimedOut { handler },
            }
        });
    }

    /// Wait for every in-flight firing.
    pub async fn drain(&mut self) -> Vec<Firing> {
        let mut done = Vec::new();
        while let Some(joined) = self.tasks.join_next().await {
            if let Some(firing) = report(joined) {
                done.push(firing);
            }
        }
        done
    }

    /// Serve every binding until `shutdown` resolves, then wait for
    /// in-flight firings.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        self.prime().await;

        let period = self
            .cron
            .iter()
            .map(|(_, secs)| *secs)
            .min()
            .map(Duration::from_secs);
        let mut cron = period.map(|p| {
            let mut tick = interval_at(Instant::now() + p, p);
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tick
        });
        let mut poll = interval_at(Instant::now() + self.options.poll_interval, self.options.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            cron_bindings = self.cron.len(),
            log_bindings = self.watches.len(),
            "dispatcher started"
        );

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = async {
                    match cron.as_mut() {
                        Some(tick) => { tick.tick().await; }
                        None => std::future::pending::<()>().await,
                    }
                } => self.fire_cron(),
                _ = poll.tick() => {
                    self.poll_logs().await;
                }
                Some(joined) = self.tasks.join_next() => {
                    report(joined);
                }
            }
        }

        tracing::info!(in_flight = self.tasks.len(), "shutting down, waiting for in-flight firings");
        self.drain().await;
    }
}

fn report(joined: Result<Firing, tokio::task::JoinError>) -> Option<Firing> {
    match joined {
        Ok(firing) => {
            match &firing {
                Firing::Completed { handler, output } => match serde_json::to_string(output) {
                    Ok(json) => tracing::info!(%handler, output = %json, "handler completed"),
                    Err(_) => tracing::info!(%handler, "handler completed"),
                },
                Firing::Failed { handler, error } => {
                    tracing::error!(%handler, %error, "handler failed")
                }
                Firing::TimedOut { handler } => {
                    tracing::error!(%handler, "handler exceeded its execution budget")
                }
            }
            Some(firing)
        }
        Err(e) => {
            tracing::error!(error = %e, "firing task panicked or was cancelled");
            None
        }
    }
}
