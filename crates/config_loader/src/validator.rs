//! 配置校验模块
//!
//! 校验规则：
//! - seller_id / label 非空，经纬度在合法范围内 (derive)
//! - 经纬度为有限值
//! - base_url 为 http:// 或 https://
//! - HTTP 端口非 0，超时时间 > 0
//! - tick 间隔不超过 `MAX_INTERVAL_SECONDS`
//! - 启用广播时 peer bind 地址可解析，写超时 > 0

use std::net::SocketAddr;

use contracts::{ContractError, NodeConfig, MAX_INTERVAL_SECONDS};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 NodeConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &NodeConfig) -> Result<(), ContractError> {
    validate_derived(config)?;
    validate_coordinates(config)?;
    validate_sensor(config)?;
    validate_http(config)?;
    validate_intervals(config)?;
    validate_peers(config)?;
    Ok(())
}

/// derive(Validate) 规则
fn validate_derived(config: &NodeConfig) -> Result<(), ContractError> {
    match config.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let (field, message) = first_error("", &errors)
                .unwrap_or_else(|| ("config".to_string(), "invalid configuration".to_string()));
            Err(ContractError::config_validation(field, message))
        }
    }
}

/// 按字段名排序取第一个错误 (保证输出稳定)
fn first_error(prefix: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    let mut entries: Vec<(String, &ValidationErrorsKind)> = errors
        .errors()
        .iter()
        .map(|(field, kind)| (field.to_string(), kind))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    for (field, kind) in entries {
        let path = if prefix.is_empty() {
            field
        } else {
            format!("{prefix}.{field}")
        };
        let found = match kind {
            ValidationErrorsKind::Field(list) => list.first().map(|e| {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (path.clone(), message)
            }),
            ValidationErrorsKind::Struct(inner) => first_error(&path, inner),
            ValidationErrorsKind::List(items) => items
                .iter()
                .find_map(|(index, inner)| first_error(&format!("{path}[{index}]"), inner)),
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// range 校验放行 NaN，这里单独拒绝
fn validate_coordinates(config: &NodeConfig) -> Result<(), ContractError> {
    let seller = &config.seller;
    if !seller.lat.is_finite() {
        return Err(ContractError::config_validation(
            "seller.lat",
            "lat must be a finite number",
        ));
    }
    if !seller.lon.is_finite() {
        return Err(ContractError::config_validation(
            "seller.lon",
            "lon must be a finite number",
        ));
    }
    Ok(())
}

/// 校验上游传感器配置
fn validate_sensor(config: &NodeConfig) -> Result<(), ContractError> {
    let base_url = config.sensor.base_url.trim();
    if base_url.is_empty() {
        return Err(ContractError::config_validation(
            "sensor.base_url",
            "base_url cannot be empty",
        ));
    }
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "sensor.base_url",
            format!("base_url must start with http:// or https://, got '{base_url}'"),
        ));
    }
    if config.sensor.timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "sensor.timeout_ms",
            "timeout_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验 HTTP 配置
fn validate_http(config: &NodeConfig) -> Result<(), ContractError> {
    if config.http.port == 0 {
        return Err(ContractError::config_validation(
            "http.port",
            "port must be > 0",
        ));
    }
    if config.http.bind_host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "http.bind_host",
            "bind_host cannot be empty",
        ));
    }
    Ok(())
}

/// 过大的间隔会溢出定时器；<= 0 由 ensure_defaults 处理
fn validate_intervals(config: &NodeConfig) -> Result<(), ContractError> {
    let intervals = [
        ("http.stream_interval_seconds", config.http.stream_interval_seconds),
        ("broadcast.interval_seconds", config.broadcast.interval_seconds),
    ];
    for (field, seconds) in intervals {
        if seconds > MAX_INTERVAL_SECONDS {
            return Err(ContractError::config_validation(
                field,
                format!("{seconds}s exceeds the maximum of {MAX_INTERVAL_SECONDS}s"),
            ));
        }
    }
    Ok(())
}

/// 校验 peer listener 配置 (仅在启用广播时)
fn validate_peers(config: &NodeConfig) -> Result<(), ContractError> {
    if !config.broadcast.enabled {
        return Ok(());
    }
    if config.peers.bind.parse::<SocketAddr>().is_err() {
        return Err(ContractError::config_validation(
            "peers.bind",
            format!("'{}' is not a socket address", config.peers.bind),
        ));
    }
    if config.peers.handshake_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "peers.handshake_timeout_ms",
            "handshake_timeout_ms must be > 0",
        ));
    }
    if config.peers.write_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "peers.write_timeout_ms",
            "write_timeout_ms must be > 0",
        ));
    }
    Ok(())
}
