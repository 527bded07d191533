//! # Observability
//!
//! 日志与指标的进程级初始化。
//!
//! - `init_tracing`: 安装 tracing subscriber，`RUST_LOG` 优先于配置的默认级别
//! - `install_prometheus`: 在指定端口暴露 `/metrics`
//! - [`metrics`]: broadcaster / sink / sensor 的指标记录函数

pub mod metrics;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub use crate::metrics::{
    describe_metrics, record_eligible_sinks, record_error_notice, record_sensor_fetch,
    record_sink_write, record_tick,
};

/// 日志输出方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 每行一个 JSON 对象，附带当前 span
    #[default]
    Json,
    Pretty,
    Compact,
}

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub log_format: LogFormat,
    /// `RUST_LOG` 未设置时使用的过滤指令
    pub default_directive: String,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            default_directive: "info".to_string(),
        }
    }
}

/// Install the global subscriber; fails if one is already set
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_directive));

    let output = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .context("tracing subscriber already installed")?;

    tracing::debug!(format = ?config.log_format, "Tracing ready");
    Ok(())
}

/// Serve Prometheus text exposition on `0.0.0.0:port`
pub fn install_prometheus(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .with_context(|| format!("Failed to start metrics exporter on port {port}"))?;
    describe_metrics();

    tracing::info!(port, "Metrics exporter listening");
    Ok(())
}
