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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、Tor传输、爬取策略、种子发现和内容上限等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Tor传输与控制端口配置
    pub tor: TorSettings,
    /// 爬取策略配置
    pub crawler: CrawlerSettings,
    /// 种子发现配置
    pub discovery: DiscoverySettings,
    /// 种子文件配置
    pub seeds: SeedSettings,
    /// 存储内容上限配置
    pub limits: LimitSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Tor传输配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TorSettings {
    /// SOCKS代理端点（socks5h形式，DNS也经代理解析）
    pub socks_proxy: String,
    /// 单次请求超时时间（秒）
    pub request_timeout: u64,
    /// 瞬时服务端错误（502/503/504）的会话内重试次数
    pub transient_retries: u32,
    /// 瞬时重试的线性退避单位（秒）
    pub transient_backoff: u64,
    /// Tor控制端口
    pub control_port: u16,
    /// 控制端口密码（可选，优先于cookie认证）
    pub control_password: Option<String>,
    /// 控制认证cookie文件路径（可选）
    pub control_cookie_path: Option<String>,
    /// 每次抓取前是否请求新电路
    pub rotate_circuit: bool,
    /// 电路轮换成功后的静置时间（毫秒）
    pub settle_delay_ms: u64,
}

/// 爬取策略配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerSettings {
    /// 接触同一主机前的礼貌等待（毫秒）
    pub per_host_delay_ms: u64,
    /// 组织之间的等待（毫秒）
    pub per_org_delay_ms: u64,
    /// 同一组织内种子之间的小间隔（毫秒）
    pub seed_pause_ms: u64,
    /// 每个组织每轮最多消费的种子数
    pub max_seeds_per_org: usize,
    /// 抓取重试次数
    pub retry_attempts: u32,
    /// 抓取重试的退避单位（毫秒），实际退避为单位乘以已尝试次数
    pub retry_backoff_ms: u64,
}

/// 种子发现配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    /// 并发查询的搜索端点数
    pub workers: usize,
    /// 每个搜索端点的请求超时（秒）
    pub request_timeout: u64,
}

/// 种子文件配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct SeedSettings {
    /// 种子文件目录（每个组织一个 <org>.txt）
    pub dir: String,
}

/// 存储内容上限配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LimitSettings {
    /// 页面摘要长度（字符数）
    pub snippet_len: usize,
    /// 证据窗口半径（匹配两侧各取的字符数）
    pub evidence_radius: usize,
    /// 指标值与证据文本的存储上限（字符数）
    pub stored_field_len: usize,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从环境变量加载配置，支持默认值
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default DB settings
            .set_default("database.url", "sqlite://onionwatch.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            // Default Tor settings
            .set_default("tor.socks_proxy", "socks5h://127.0.0.1:19050")?
            .set_default("tor.request_timeout", 30)?
            .set_default("tor.transient_retries", 3)?
            .set_default("tor.transient_backoff", 1)?
            .set_default("tor.control_port", 9051)?
            .set_default("tor.rotate_circuit", false)?
            .set_default("tor.settle_delay_ms", 1500)?
            // Default crawl policy settings
            .set_default("crawler.per_host_delay_ms", 2000)?
            .set_default("crawler.per_org_delay_ms", 2000)?
            .set_default("crawler.seed_pause_ms", 500)?
            .set_default("crawler.max_seeds_per_org", 20)?
            .set_default("crawler.retry_attempts", 2)?
            .set_default("crawler.retry_backoff_ms", 2000)?
            // Default discovery settings
            .set_default("discovery.workers", 5)?
            .set_default("discovery.request_timeout", 25)?
            // Default seed settings
            .set_default("seeds.dir", "seeds")?
            // Default content limits
            .set_default("limits.snippet_len", 500)?
            .set_default("limits.evidence_radius", 60)?
            .set_default("limits.stored_field_len", 2000)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("ONIONWATCH").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::new().expect("defaults should load");

        assert_eq!(settings.tor.socks_proxy, "socks5h://127.0.0.1:19050");
        assert_eq!(settings.tor.control_port, 9051);
        assert!(settings.tor.control_password.is_none());
        assert!(!settings.tor.rotate_circuit);
        assert_eq!(settings.crawler.per_host_delay_ms, 2000);
        assert_eq!(settings.crawler.max_seeds_per_org, 20);
        assert_eq!(settings.crawler.retry_attempts, 2);
        assert_eq!(settings.discovery.workers, 5);
        assert_eq!(settings.seeds.dir, "seeds");
        assert_eq!(settings.limits.snippet_len, 500);
        assert_eq!(settings.limits.evidence_radius, 60);
    }
}
