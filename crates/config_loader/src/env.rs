//! 环境变量配置源
//!
//! 必填：`SELLER_ID` `PI_BASE_URL` `SELLER_LAT` `SELLER_LON` `SELLER_LABEL`；
//! 其余变量缺省或非法时回退到默认值 (整数非法时记录 warn)。
//!
//! 广播变量也接受旧名 `NEURON_*`；新旧同时设置时以 `BROADCAST_*` 为准。

use std::str::FromStr;

use tracing::warn;

use contracts::{
    BroadcastConfig, ContractError, HttpConfig, NodeConfig, PeerListenerConfig, SellerIdentity,
    SensorEndpointConfig,
};

/// 从任意 key -> value 查找函数构建配置
pub fn from_lookup<F>(lookup: F) -> Result<NodeConfig, ContractError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    let seller = SellerIdentity {
        seller_id: env.required("SELLER_ID")?,
        label: env.required("SELLER_LABEL")?,
        lat: env.required_float("SELLER_LAT")?,
        lon: env.required_float("SELLER_LON")?,
    };

    let http_defaults = HttpConfig::default();
    let peer_defaults = PeerListenerConfig::default();
    let broadcast_defaults = BroadcastConfig::default();

    let config = NodeConfig {
        seller,
        sensor: SensorEndpointConfig {
            base_url: env.required("PI_BASE_URL")?,
            timeout_ms: env.parsed_or("SENSOR_TIMEOUT_MS", 5000),
        },
        http: HttpConfig {
            bind_host: env.string_or("SELLER_BIND_HOST", &http_defaults.bind_host),
            port: env.parsed_or("SELLER_PORT", http_defaults.port),
            stream_interval_seconds: env
                .parsed_or("STREAM_INTERVAL_SECONDS", http_defaults.stream_interval_seconds),
        },
        broadcast: BroadcastConfig {
            enabled: env.bool_or(env.resolve("BROADCAST_ENABLE", "NEURON_ENABLE"), false),
            protocol_id: env.string_or(
                env.resolve("BROADCAST_PROTOCOL_ID", "NEURON_PROTOCOL_ID"),
                &broadcast_defaults.protocol_id,
            ),
            version: env.string_or(
                env.resolve("BROADCAST_VERSION", "NEURON_VERSION"),
                &broadcast_defaults.version,
            ),
            interval_seconds: env.parsed_or(
                env.resolve("BROADCAST_INTERVAL_SECONDS", "NEURON_STREAM_INTERVAL_SECONDS"),
                broadcast_defaults.interval_seconds,
            ),
            sample_kind: env.string_or(
                env.resolve("BROADCAST_SAMPLE_KIND", "NEURON_SAMPLE_KIND"),
                &broadcast_defaults.sample_kind,
            ),
        },
        peers: PeerListenerConfig {
            bind: env.string_or("PEER_BIND", &peer_defaults.bind),
            allowed_accounts: env.list("PEER_ALLOWED_ACCOUNTS"),
            handshake_timeout_ms: env
                .parsed_or("PEER_HANDSHAKE_TIMEOUT_MS", peer_defaults.handshake_timeout_ms),
            write_timeout_ms: env
                .parsed_or("PEER_WRITE_TIMEOUT_MS", peer_defaults.write_timeout_ms),
        },
    };

    Ok(config.ensure_defaults())
}

/// 宽松布尔解析 (`1/true/yes/y/on`, `0/false/no/n/off`)
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// 去掉首尾空白；空字符串视为未设置
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// `key` if it is set, otherwise the legacy name
    fn resolve<'k>(&self, key: &'k str, legacy: &'k str) -> &'k str {
        if self.get(key).is_none() && self.get(legacy).is_some() {
            legacy
        } else {
            key
        }
    }

    fn required(&self, key: &str) -> Result<String, ContractError> {
        self.get(key)
            .ok_or_else(|| ContractError::config_validation(key, format!("{key} is required")))
    }

    fn required_float(&self, key: &str) -> Result<f64, ContractError> {
        let raw = self.required(key)?;
        raw.parse::<f64>().map_err(|e| {
            ContractError::config_validation(key, format!("invalid {key} '{raw}': {e}"))
        })
    }

    fn string_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed_or<T>(&self, key: &str, default: T) -> T
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        match self.get(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, default = %default, "Invalid integer, using default");
                default
            }),
        }
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .and_then(|raw| parse_bool(&raw))
            .unwrap_or(default)
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
