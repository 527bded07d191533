//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误 (构造阶段)
///
/// 运行期的拉取失败使用 `ContractError::Fetch` / `ContractError::Decode`。
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Base URL 不可用
    #[error("invalid sensor base url '{url}': {message}")]
    InvalidBaseUrl {
        /// 配置中的 URL
        url: String,
        /// 错误消息
        message: String,
    },

    /// HTTP 客户端构建失败
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
