//! # Dispatcher
//!
//! 广播循环模块。
//!
//! 负责：
//! - 每个 tick 拉取一次读数，构造 `BroadcastEnvelope`
//! - Fan-out 到 `SinkRegistry` 中所有 eligible sinks
//! - 按 `FailurePolicy` 隔离失败的 sink
//!
//! 两种 registry：
//! - [`StreamRegistry`]：单个 HTTP 流客户端，失败即终止
//! - [`PeerRegistry`]：多个 peer，失败则通知并继续

pub mod broadcaster;
pub mod error;
pub mod metrics;
pub mod notifier;
pub mod registry;

pub use broadcaster::{Broadcaster, DeliveryReport, LoopState, TickOutcome};
pub use contracts::{FailurePolicy, SinkRegistry};
pub use error::DispatcherError;
pub use metrics::{BroadcastMetrics, BroadcastStats};
pub use notifier::ErrorNotifier;
pub use registry::{PeerRegistry, StreamRegistry, StreamSender};
