//! Mock 传感器源
//!
//! 按脚本返回读数或错误，用于无上游环境的测试。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use contracts::{ContractError, RawReading, SensorSource};

const MOCK_URL: &str = "mock://sensor/metrics";

/// 脚本中的一步
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockReading {
    /// 返回读数
    Reading(RawReading),
    /// 返回 `ContractError::Fetch`
    FetchError,
    /// 返回 `ContractError::Decode`
    DecodeError,
}

/// Mock 传感器源
///
/// 脚本耗尽后一直返回 `fallback`。
pub struct MockSensorSource {
    script: Mutex<VecDeque<MockReading>>,
    fallback: MockReading,
    calls: AtomicU64,
}

impl MockSensorSource {
    /// 每次都返回同一个读数
    pub fn constant(reading: RawReading) -> Self {
        Self::scripted(Vec::new(), MockReading::Reading(reading))
    }

    /// 每次都失败
    pub fn unreachable() -> Self {
        Self::scripted(Vec::new(), MockReading::FetchError)
    }

    /// 先按脚本返回，之后返回 `fallback`
    pub fn scripted(script: Vec<MockReading>, fallback: MockReading) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU64::new(0),
        }
    }

    /// `fetch` 被调用的次数
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> MockReading {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

impl SensorSource for MockSensorSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self) -> Result<RawReading, ContractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            MockReading::Reading(reading) => Ok(reading),
            MockReading::FetchError => Err(ContractError::fetch(MOCK_URL, "connection refused")),
            MockReading::DecodeError => Err(ContractError::decode(MOCK_URL, "missing field `brightness`")),
        }
    }
}
