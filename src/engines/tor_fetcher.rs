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

use crate::config::settings::Settings;
use crate::engines::politeness::PolitenessPolicy;
use crate::engines::tor_control::{CircuitControl, TorControl};
use crate::engines::tor_session::TorSession;
use crate::engines::traits::{FetchError, FetchResponse, PageFetch, PageTransport};
use crate::utils::url_utils;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 抓取编排器
///
/// 组合传输、电路控制与礼貌策略，提供"抓取一个URL"的完整操作。
/// 不做任何存储I/O
pub struct TorFetcher<T: PageTransport, C: CircuitControl> {
    transport: T,
    control: C,
    policy: PolitenessPolicy,
    rotate_circuit: bool,
    settle_delay: Duration,
}

impl TorFetcher<TorSession, TorControl> {
    /// 从配置构建生产编排器
    ///
    /// # 参数
    ///
    /// * `settings` - 应用配置
    /// * `rotate_circuit` - 每次抓取前是否请求新电路
    ///
    /// # 返回值
    ///
    /// * `Ok(TorFetcher)` - 编排器
    /// * `Err(FetchError)` - 传输构建失败
    pub fn from_settings(settings: &Settings, rotate_circuit: bool) -> Result<Self, FetchError> {
        Ok(Self::new(
            TorSession::build(&settings.tor)?,
            TorControl::from_settings(&settings.tor),
            PolitenessPolicy::from_settings(&settings.crawler),
            rotate_circuit,
            Duration::from_millis(settings.tor.settle_delay_ms),
        ))
    }
}

impl<T: PageTransport, C: CircuitControl> TorFetcher<T, C> {
    pub fn new(
        transport: T,
        control: C,
        policy: PolitenessPolicy,
        rotate_circuit: bool,
        settle_delay: Duration,
    ) -> Self {
        Self {
            transport,
            control,
            policy,
            rotate_circuit,
            settle_delay,
        }
    }
}

#[async_trait]
impl<T: PageTransport, C: CircuitControl> PageFetch for TorFetcher<T, C> {
    /// 抓取一个URL
    ///
    /// 礼貌等待每个URL只执行一次，先于第一次尝试；电路轮换为尽力而为，
    /// 失败只记录日志并在现有电路上继续；每次失败尝试后按线性退避等待，
    /// 最后一次尝试的失败原样上抛
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - 2xx响应
    /// * `Err(FetchError)` - 重试耗尽后的最后一次失败
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let host = url_utils::host_of(url).unwrap_or_else(|| "unknown".to_string());
        debug!(%host, delay = ?self.policy.per_host_delay, "politeness pause before contacting host");
        tokio::time::sleep(self.policy.per_host_delay).await;

        if self.rotate_circuit {
            match self.control.rotate().await {
                Ok(()) => {
                    info!("new circuit requested, settling");
                    tokio::time::sleep(self.settle_delay).await;
                }
                Err(e) => {
                    warn!(error = %e, "circuit rotation failed, continuing on current circuit");
                }
            }
        }

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            debug!(url, attempt, "fetch attempt");
            let failure = match self.transport.get(url).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => FetchError::BadStatus(response.status_code),
                Err(e) => e,
            };

            if self.policy.should_retry(attempt) {
                let backoff = self.policy.retry_backoff(attempt);
                warn!(url, attempt, ?backoff, error = %failure, "fetch attempt failed, backing off");
                tokio::time::sleep(backoff).await;
            } else {
                warn!(url, attempt, error = %failure, "fetch attempts exhausted");
                return Err(failure);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::tor_control::CircuitError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// 按脚本逐次吐出结果的传输替身
    struct ScriptedTransport {
        script: Mutex<Vec<Result<FetchResponse, FetchError>>>,
        calls: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<FetchResponse, FetchError>>) -> Self {
            Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageTransport for ScriptedTransport {
        async fn get(&self, _url: &str) -> Result<FetchResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script.lock().expect("script lock").remove(0)
        }
    }

    struct NoopControl;

    #[async_trait]
    impl CircuitControl for NoopControl {
        async fn rotate(&self) -> Result<(), CircuitError> {
            Ok(())
        }
    }

    struct FailingControl;

    #[async_trait]
    impl CircuitControl for FailingControl {
        async fn rotate(&self) -> Result<(), CircuitError> {
            Err(CircuitError::AuthRejected("515".to_string()))
        }
    }

    fn ok_response() -> Result<FetchResponse, FetchError> {
        Ok(FetchResponse {
            status_code: 200,
            body: "<html></html>".to_string(),
        })
    }

    fn test_policy(attempts: u32) -> PolitenessPolicy {
        PolitenessPolicy {
            per_host_delay: Duration::from_secs(2),
            per_org_delay: Duration::from_secs(2),
            seed_pause: Duration::from_millis(500),
            max_seeds_per_org: 20,
            retry_attempts: attempts,
            backoff_unit: Duration::from_secs(2),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_then_success_with_increasing_backoff() {
        let transport = ScriptedTransport::new(vec![
            Err(FetchError::BadStatus(500)),
            Err(FetchError::BadStatus(500)),
            ok_response(),
        ]);
        let fetcher = TorFetcher::new(
            transport,
            NoopControl,
            test_policy(3),
            false,
            Duration::from_millis(1500),
        );

        let started = Instant::now();
        let response = fetcher
            .fetch("http://example.onion/leak")
            .await
            .expect("third attempt should succeed");

        assert_eq!(response.status_code, 200);
        assert_eq!(fetcher.transport.calls(), 3);
        // politeness (2s) + backoff 2s*1 + backoff 2s*2
        assert_eq!(started.elapsed(), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_fail_surfaces_last_error() {
        let transport = ScriptedTransport::new(vec![
            Err(FetchError::BadStatus(503)),
            Err(FetchError::BadStatus(504)),
        ]);
        let fetcher = TorFetcher::new(
            transport,
            NoopControl,
            test_policy(2),
            false,
            Duration::from_millis(1500),
        );

        let result = fetcher.fetch("http://example.onion/leak").await;

        assert!(matches!(result, Err(FetchError::BadStatus(504))));
        assert_eq!(fetcher.transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_2xx_is_retried() {
        let transport = ScriptedTransport::new(vec![
            Ok(FetchResponse {
                status_code: 403,
                body: "denied".to_string(),
            }),
            ok_response(),
        ]);
        let fetcher = TorFetcher::new(
            transport,
            NoopControl,
            test_policy(2),
            false,
            Duration::from_millis(1500),
        );

        let response = fetcher.fetch("http://example.onion/x").await.expect("retry");

        assert_eq!(response.status_code, 200);
        assert_eq!(fetcher.transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_failure_does_not_abort_fetch() {
        let transport = ScriptedTransport::new(vec![ok_response()]);
        let fetcher = TorFetcher::new(
            transport,
            FailingControl,
            test_policy(2),
            true,
            Duration::from_millis(1500),
        );

        let response = fetcher
            .fetch("http://example.onion/x")
            .await
            .expect("fetch should proceed on current circuit");

        assert_eq!(response.status_code, 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_rotation_adds_settle_delay() {
        let transport = ScriptedTransport::new(vec![ok_response()]);
        let fetcher = TorFetcher::new(
            transport,
            NoopControl,
            test_policy(2),
            true,
            Duration::from_millis(1500),
        );

        let started = Instant::now();
        fetcher.fetch("http://example.onion/x").await.expect("ok");

        // politeness (2s) + settle (1.5s)
        assert_eq!(started.elapsed(), Duration::from_millis(3500));
    }
}
