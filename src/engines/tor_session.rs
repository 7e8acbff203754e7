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

use crate::config::settings::TorSettings;
use crate::engines::traits::{FetchError, FetchResponse, PageTransport};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;
use tracing::debug;

/// 轮换使用的User-Agent池，降低指纹识别度
const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:137.0) Gecko/20100101 Firefox/137.0",
];

const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// 瞬时服务端错误，会话内自动重试
const TRANSIENT_STATUSES: [u16; 3] = [502, 503, 504];

/// Tor传输会话
///
/// 所有流量（包括DNS解析）经由本地SOCKS代理路由的可复用HTTP客户端
pub struct TorSession {
    client: reqwest::Client,
    transient_retries: u32,
    transient_backoff: Duration,
}

impl TorSession {
    /// 构建Tor会话
    ///
    /// # 参数
    ///
    /// * `settings` - Tor传输配置
    ///
    /// # 返回值
    ///
    /// * `Ok(TorSession)` - 绑定到SOCKS端点的会话
    /// * `Err(FetchError)` - 代理端点无效或客户端构建失败
    pub fn build(settings: &TorSettings) -> Result<Self, FetchError> {
        Self::build_with_timeout(settings, Duration::from_secs(settings.request_timeout))
    }

    /// 以自定义请求超时构建Tor会话
    pub fn build_with_timeout(
        settings: &TorSettings,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let proxy = reqwest::Proxy::all(&settings.socks_proxy)
            .map_err(|e| FetchError::Proxy(e.to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HEADER));

        let client = reqwest::Client::builder()
            .proxy(proxy)
            .default_headers(headers)
            .timeout(timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            transient_retries: settings.transient_retries,
            transient_backoff: Duration::from_secs(settings.transient_backoff),
        })
    }

    fn pick_user_agent() -> &'static str {
        USER_AGENTS[rand::random_range(0..USER_AGENTS.len())]
    }
}

#[async_trait]
impl PageTransport for TorSession {
    /// 通过代理执行GET
    ///
    /// 502/503/504在会话内按线性退避重试，独立于上层编排器的重试循环；
    /// 其余响应（包括非2xx）原样返回
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResponse)` - HTTP响应
    /// * `Err(FetchError)` - 连接层失败
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let response = self
                .client
                .get(url)
                .header(USER_AGENT, Self::pick_user_agent())
                .send()
                .await?;

            let status_code = response.status().as_u16();
            if TRANSIENT_STATUSES.contains(&status_code) && attempt <= self.transient_retries {
                let backoff = self.transient_backoff * attempt;
                debug!(url, status_code, attempt, ?backoff, "transient server error, retrying");
                tokio::time::sleep(backoff).await;
                continue;
            }

            let body = response.text().await?;
            return Ok(FetchResponse { status_code, body });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> TorSettings {
        TorSettings {
            socks_proxy: "socks5h://127.0.0.1:19050".to_string(),
            request_timeout: 30,
            transient_retries: 3,
            transient_backoff: 1,
            control_port: 9051,
            control_password: None,
            control_cookie_path: None,
            rotate_circuit: false,
            settle_delay_ms: 1500,
        }
    }

    #[test]
    fn test_build_session() {
        assert!(TorSession::build(&test_settings()).is_ok());
    }

    #[test]
    fn test_build_rejects_bad_proxy() {
        let mut settings = test_settings();
        settings.socks_proxy = "::not-a-proxy::".to_string();

        assert!(matches!(
            TorSession::build(&settings),
            Err(FetchError::Proxy(_))
        ));
    }

    #[test]
    fn test_user_agent_pool() {
        for _ in 0..32 {
            assert!(USER_AGENTS.contains(&TorSession::pick_user_agent()));
        }
    }
}
