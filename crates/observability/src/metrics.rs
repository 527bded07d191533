//! Broadcast 指标记录模块
//!
//! 所有 Prometheus 指标名集中在这里，业务 crate 只调用 `record_*` 函数。

use metrics::{counter, describe_counter, describe_gauge, gauge};

pub const TICKS_TOTAL: &str = "localsense_broadcast_ticks_total";
pub const SINK_WRITES_TOTAL: &str = "localsense_sink_writes_total";
pub const ERROR_NOTICES_TOTAL: &str = "localsense_error_notices_total";
pub const SENSOR_FETCH_TOTAL: &str = "localsense_sensor_fetch_total";
pub const ELIGIBLE_SINKS: &str = "localsense_eligible_sinks";

/// 注册指标描述 (exporter 安装后调用一次)
pub fn describe_metrics() {
    describe_counter!(TICKS_TOTAL, "Broadcast ticks by outcome");
    describe_counter!(SINK_WRITES_TOTAL, "Per-sink line writes by status");
    describe_counter!(ERROR_NOTICES_TOTAL, "Error notices sent to peers");
    describe_counter!(SENSOR_FETCH_TOTAL, "Upstream sensor fetches by status");
    describe_gauge!(ELIGIBLE_SINKS, "Eligible sinks seen at the last tick");
}

/// 记录一次 tick 结果
///
/// `outcome`: `no_sinks` / `fetch_failed` / `encode_failed` / `delivered` / `stopped`
pub fn record_tick(broadcaster: &str, outcome: &'static str) {
    counter!(
        TICKS_TOTAL,
        "broadcaster" => broadcaster.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// 记录单个 sink 写入
pub fn record_sink_write(broadcaster: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        SINK_WRITES_TOTAL,
        "broadcaster" => broadcaster.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录错误通知发送
pub fn record_error_notice(success: bool) {
    let status = if success { "sent" } else { "failed" };
    counter!(ERROR_NOTICES_TOTAL, "status" => status).increment(1);
}

/// 记录上游拉取 (`status` 取 `ok` 或 `ContractError::kind()`)
pub fn record_sensor_fetch(status: &'static str) {
    counter!(SENSOR_FETCH_TOTAL, "status" => status).increment(1);
}

/// 记录本 tick 可写 sink 数量
pub fn record_eligible_sinks(broadcaster: &str, count: usize) {
    gauge!(ELIGIBLE_SINKS, "broadcaster" => broadcaster.to_string()).set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder_is_noop() {
        // No global recorder installed: the facade discards everything.
        describe_metrics();
        record_tick("peers", "delivered");
        record_sink_write("stream", false);
        record_error_notice(true);
        record_sensor_fetch("ok");
        record_eligible_sinks("peers", 3);
    }

    #[test]
    fn test_metric_names_share_prefix() {
        for name in [
            TICKS_TOTAL,
            SINK_WRITES_TOTAL,
            ERROR_NOTICES_TOTAL,
            SENSOR_FETCH_TOTAL,
            ELIGIBLE_SINKS,
        ] {
            assert!(name.starts_with("localsense_"), "{name}");
        }
    }
}
