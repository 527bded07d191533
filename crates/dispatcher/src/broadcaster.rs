//! Broadcaster - fixed-interval fetch / build / fan-out loop

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use contracts::{
    eligible, FailurePolicy, SensorSource, SinkId, SinkRegistry, DEFAULT_INTERVAL_SECONDS,
    MAX_INTERVAL_SECONDS,
};
use envelope::{EnvelopeBuilder, WireFormat};
use observability::metrics as obs;

use crate::error::DispatcherError;
use crate::metrics::{BroadcastMetrics, BroadcastStats};

/// Lifecycle of one broadcaster instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting for the first tick
    Idle,
    Running,
    /// Terminal
    Stopped,
}

/// Sinks attempted in one delivered tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: Vec<SinkId>,
    pub failed: Vec<SinkId>,
}

/// What one tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// Nobody was eligible; the sensor was not called
    NoSinks,
    /// Upstream fetch failed; nothing was written
    FetchFailed,
    /// Encoding failed under the `Continue` policy; nothing was written
    EncodeFailed,
    /// Fan-out ran over the fresh eligible snapshot
    Delivered(DeliveryReport),
    /// The `Stop` policy was triggered
    Stop(DispatcherError),
}

impl TickOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::NoSinks => "no_sinks",
            Self::FetchFailed => "fetch_failed",
            Self::EncodeFailed => "encode_failed",
            Self::Delivered(_) => "delivered",
            Self::Stop(_) => "stopped",
        }
    }
}

/// One broadcaster instance
///
/// Generic over the reading source and the sink registry; the stream and
/// peer variants differ only in the registry they are built with.
pub struct Broadcaster<S, R> {
    name: String,
    source: Arc<S>,
    registry: R,
    builder: EnvelopeBuilder,
    format: WireFormat,
    interval: Duration,
    metrics: Arc<BroadcastMetrics>,
    state: LoopState,
}

impl<S, R> Broadcaster<S, R>
where
    S: SensorSource + Send + Sync,
    R: SinkRegistry + Send + Sync,
{
    pub fn new(
        name: impl Into<String>,
        source: Arc<S>,
        registry: R,
        builder: EnvelopeBuilder,
        format: WireFormat,
        interval: Duration,
    ) -> Self {
        // tokio intervals panic on a zero period, and the deadline
        // arithmetic on an unbounded one
        let interval = if interval.is_zero() {
            Duration::from_secs(DEFAULT_INTERVAL_SECONDS as u64)
        } else {
            interval.min(Duration::from_secs(MAX_INTERVAL_SECONDS as u64))
        };

        Self {
            name: name.into(),
            source,
            registry,
            builder,
            format,
            interval,
            metrics: Arc::new(BroadcastMetrics::new()),
            state: LoopState::Idle,
        }
    }

    /// Share an existing metrics handle (e.g. to read stats while running)
    pub fn with_metrics(mut self, metrics: Arc<BroadcastMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn metrics(&self) -> Arc<BroadcastMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Run until cancelled or until the `Stop` policy fires
    ///
    /// The first tick fires one interval after start. Cancellation wins over
    /// a tick that is ready at the same time, and aborts an in-flight tick.
    #[instrument(
        name = "broadcaster_run",
        skip(self, cancel),
        fields(broadcaster = %self.name, interval_ms = self.interval.as_millis() as u64)
    )]
    pub async fn run(mut self, cancel: CancellationToken) -> Result<BroadcastStats, DispatcherError> {
        let start = Instant::now();
        let first = start.checked_add(self.interval).unwrap_or(start);
        let mut ticker = interval_at(first, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(broadcaster = %self.name, "Broadcaster started");

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                _ = ticker.tick() => {}
            }

            if self.state == LoopState::Idle {
                self.state = LoopState::Running;
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                outcome = self.tick(Utc::now()) => outcome,
            };

            if let TickOutcome::Stop(err) = outcome {
                break Err(err);
            }
        };

        self.state = LoopState::Stopped;
        let stats = self.metrics.snapshot();

        match result {
            Ok(()) => {
                info!(broadcaster = %self.name, ticks = stats.ticks, "Broadcaster cancelled");
                Ok(stats)
            }
            Err(err) if err.is_disconnect() => {
                info!(broadcaster = %self.name, error = %err, "Sink went away, broadcaster stopped");
                Err(err)
            }
            Err(err) => {
                error!(broadcaster = %self.name, error = %err, "Broadcaster stopped");
                Err(err)
            }
        }
    }

    /// Execute one fetch / build / fan-out cycle
    pub async fn tick(&self, now: DateTime<Utc>) -> TickOutcome {
        self.metrics.inc_ticks();
        let outcome = self.tick_inner(now).await;
        obs::record_tick(&self.name, outcome.label());
        outcome
    }

    async fn tick_inner(&self, now: DateTime<Utc>) -> TickOutcome {
        let policy = self.registry.failure_policy();

        // 1. Skip the upstream call when nobody listens
        let ready = eligible(self.registry.snapshot());
        obs::record_eligible_sinks(&self.name, ready.len());
        if ready.is_empty() {
            trace!(broadcaster = %self.name, "No eligible sinks, tick skipped");
            self.metrics.inc_idle_ticks();
            return TickOutcome::NoSinks;
        }

        // 2. Fetch
        let reading = match self.source.fetch().await {
            Ok(reading) => reading,
            Err(e) => {
                self.metrics.inc_fetch_failures();
                warn!(
                    broadcaster = %self.name,
                    source = self.source.name(),
                    error = %e,
                    "Sensor fetch failed, tick skipped"
                );
                return TickOutcome::FetchFailed;
            }
        };

        // 3. Build + encode once for every sink
        let envelope = self.builder.build(&reading, now);
        let line = match self.format.encode(&envelope, now) {
            Ok(line) => line,
            Err(e) => {
                self.metrics.inc_encode_failures();
                return match policy {
                    FailurePolicy::Stop => {
                        TickOutcome::Stop(DispatcherError::encoder_failed(&self.name, e))
                    }
                    FailurePolicy::Continue => {
                        warn!(broadcaster = %self.name, error = %e, "Envelope encoding failed, tick skipped");
                        TickOutcome::EncodeFailed
                    }
                };
            }
        };

        // 4. Fresh snapshot right before writing
        let sinks = eligible(self.registry.snapshot());

        // 5. Sequential fan-out
        let mut report = DeliveryReport::default();
        for sink in sinks {
            match self.registry.write(&sink.id, &line).await {
                Ok(()) => {
                    self.metrics.inc_delivered();
                    obs::record_sink_write(&self.name, true);
                    debug!(
                        broadcaster = %self.name,
                        sink = %sink.id,
                        ts = envelope.ts,
                        brightness = envelope.brightness,
                        "Line delivered"
                    );
                    report.delivered.push(sink.id);
                }
                Err(e) => {
                    self.metrics.inc_write_failures();
                    obs::record_sink_write(&self.name, false);
                    match policy {
                        FailurePolicy::Stop => {
                            return TickOutcome::Stop(DispatcherError::sink_failed(
                                &self.name,
                                sink.id.as_str(),
                                e,
                            ));
                        }
                        FailurePolicy::Continue => {
                            warn!(
                                broadcaster = %self.name,
                                sink = %sink.id,
                                error = %e,
                                "Write failed"
                            );
                            self.registry.on_write_failure(&sink.id, &e).await;
                            // Continue with the next sink
                            report.failed.push(sink.id);
                        }
                    }
                }
            }
        }

        TickOutcome::Delivered(report)
    }
}
