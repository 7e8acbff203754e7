// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::CrawlerSettings;
use std::time::Duration;

/// 礼貌策略配置
///
/// 纯延迟与上限计算，不做任何I/O；调用方在受保护动作前
/// 对计算出的时长执行阻塞等待，以保证等待先于请求
#[derive(Debug, Clone)]
pub struct PolitenessPolicy {
    /// 接触同一主机前的固定等待
    pub per_host_delay: Duration,
    /// 组织之间的固定等待
    pub per_org_delay: Duration,
    /// 同一组织内种子之间的小间隔
    pub seed_pause: Duration,
    /// 每个组织每轮最多消费的种子数
    pub max_seeds_per_org: usize,
    /// 抓取重试次数
    pub retry_attempts: u32,
    /// 重试退避单位
    pub backoff_unit: Duration,
}

impl Default for PolitenessPolicy {
    fn default() -> Self {
        Self {
            per_host_delay: Duration::from_secs(2),
            per_org_delay: Duration::from_secs(2),
            seed_pause: Duration::from_millis(500),
            max_seeds_per_org: 20,
            retry_attempts: 2,
            backoff_unit: Duration::from_secs(2),
        }
    }
}

impl PolitenessPolicy {
    /// 从爬取配置构建策略
    pub fn from_settings(settings: &CrawlerSettings) -> Self {
        Self {
            per_host_delay: Duration::from_millis(settings.per_host_delay_ms),
            per_org_delay: Duration::from_millis(settings.per_org_delay_ms),
            seed_pause: Duration::from_millis(settings.seed_pause_ms),
            max_seeds_per_org: settings.max_seeds_per_org,
            retry_attempts: settings.retry_attempts,
            backoff_unit: Duration::from_millis(settings.retry_backoff_ms),
        }
    }

    /// 计算第attempt次失败后的退避时长（线性递增）
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }

    /// 是否还允许下一次尝试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.retry_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_backoff_strictly_increasing() {
        let policy = PolitenessPolicy::default();

        let first = policy.retry_backoff(1);
        let second = policy.retry_backoff(2);
        let third = policy.retry_backoff(3);

        assert_eq!(first, Duration::from_secs(2));
        assert!(second > first);
        assert!(third > second);
    }

    #[test]
    fn test_should_retry_respects_attempt_cap() {
        let policy = PolitenessPolicy::default();

        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn test_from_settings() {
        let settings = CrawlerSettings {
            per_host_delay_ms: 100,
            per_org_delay_ms: 200,
            seed_pause_ms: 50,
            max_seeds_per_org: 5,
            retry_attempts: 4,
            retry_backoff_ms: 10,
        };

        let policy = PolitenessPolicy::from_settings(&settings);

        assert_eq!(policy.per_host_delay, Duration::from_millis(100));
        assert_eq!(policy.max_seeds_per_org, 5);
        assert_eq!(policy.retry_backoff(4), Duration::from_millis(40));
    }
}
