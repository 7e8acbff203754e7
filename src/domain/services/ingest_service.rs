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

use crate::config::settings::LimitSettings;
use crate::detection::detectors::{detect_indicators, evidence_window};
use crate::detection::normalizer::{normalize_html, truncate_chars};
use crate::domain::models::records::{NewPage, NewThreat};
use crate::domain::repositories::monitor_repository::{MonitorRepository, RepositoryError};
use crate::engines::traits::{FetchError, PageFetch};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// 保存流程错误类型
#[derive(Error, Debug)]
pub enum IngestError {
    /// 存储失败，整个保存调用中止，不留下部分行
    #[error("Storage failed: {0}")]
    Storage(#[from] RepositoryError),
    /// 委托抓取失败
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// 存储内容上限
#[derive(Debug, Clone)]
pub struct ContentLimits {
    /// 页面摘要长度
    pub snippet_len: usize,
    /// 证据窗口半径
    pub evidence_radius: usize,
    /// 指标值与证据的存储上限
    pub stored_field_len: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            snippet_len: 500,
            evidence_radius: 60,
            stored_field_len: 2000,
        }
    }
}

impl ContentLimits {
    pub fn from_settings(settings: &LimitSettings) -> Self {
        Self {
            snippet_len: settings.snippet_len,
            evidence_radius: settings.evidence_radius,
            stored_field_len: settings.stored_field_len,
        }
    }
}

/// 已获取的页面内容
///
/// 由上游抓取流程传入，避免二次网络往返
#[derive(Debug, Clone)]
pub struct PageContent {
    pub html: String,
    pub status_code: Option<u16>,
}

/// 持久化编排服务
///
/// 将一次抓取结果落库：组织、可选批次、页面行与检测出的威胁行，
/// 全部以该组织为作用域
pub struct IngestService<R: MonitorRepository, F: PageFetch> {
    repo: Arc<R>,
    fetcher: Arc<F>,
    limits: ContentLimits,
}

impl<R: MonitorRepository, F: PageFetch> IngestService<R, F> {
    /// 创建持久化编排服务
    ///
    /// # 参数
    ///
    /// * `repo` - 监控数据仓库
    /// * `fetcher` - 页面抓取器（内容未传入时使用）
    /// * `limits` - 存储内容上限
    pub fn new(repo: Arc<R>, fetcher: Arc<F>, limits: ContentLimits) -> Self {
        Self {
            repo,
            fetcher,
            limits,
        }
    }

    /// 保存一次抓取
    ///
    /// 页面行先于任何引用它的威胁行写入。页面写入之后的威胁写入失败
    /// 不会丢弃已存储的页面：零威胁的页面是合法的终态
    ///
    /// # 参数
    ///
    /// * `org_name` - 组织名（精确匹配，不存在则创建）
    /// * `url` - 来源URL
    /// * `batch_label` - 批次标签（可选；每次给定都会新建批次行）
    /// * `fetched` - 已获取的内容（可选；缺省时委托抓取器）
    ///
    /// # 返回值
    ///
    /// * `Ok(i32)` - 页面行id
    /// * `Err(IngestError)` - 抓取失败或页面落库前的存储失败
    pub async fn save_page(
        &self,
        org_name: &str,
        url: &str,
        batch_label: Option<&str>,
        fetched: Option<PageContent>,
    ) -> Result<i32, IngestError> {
        let org_id = self.repo.find_or_create_org(org_name).await?;

        let batch_id = match batch_label {
            Some(label) => {
                let id = self.repo.create_batch(org_id, label).await?;
                debug!(org_id, batch_id = id, label, "created crawl batch");
                Some(id)
            }
            None => None,
        };

        let content = match fetched {
            Some(content) => content,
            None => {
                let response = self.fetcher.fetch(url).await?;
                PageContent {
                    html: response.body,
                    status_code: Some(response.status_code),
                }
            }
        };

        let document = normalize_html(&content.html, self.limits.snippet_len);
        let page_id = self
            .repo
            .insert_page(NewPage {
                org_id,
                batch_id,
                url: url.to_string(),
                status_code: content.status_code,
                content: document.pretty.clone(),
                snippet: document.snippet.clone(),
                fetched_at: Utc::now(),
            })
            .await?;
        info!(page_id, org_id, url, "stored crawled page");

        let indicators = detect_indicators(&document.text);
        if indicators.is_empty() {
            debug!(page_id, "no indicators found");
            return Ok(page_id);
        }

        let summary: Vec<String> = indicators
            .iter()
            .map(|(kind, values)| format!("{}={}", kind, values.len()))
            .collect();
        info!(page_id, detections = %summary.join(" "), "indicators found");

        for (kind, values) in indicators {
            let severity = kind.severity();
            for value in values {
                let evidence = evidence_window(&document.text, &value, self.limits.evidence_radius)
                    .unwrap_or_else(|| document.snippet.clone());
                let threat = NewThreat {
                    org_id,
                    page_id: Some(page_id),
                    kind,
                    value: truncate_chars(&value, self.limits.stored_field_len),
                    severity,
                    evidence: truncate_chars(&evidence, self.limits.stored_field_len),
                    created_at: Utc::now(),
                };
                if let Err(e) = self.repo.insert_threat(threat).await {
                    error!(page_id, kind = %kind, error = %e, "failed to store threat, page retained");
                }
            }
        }

        Ok(page_id)
    }
}
