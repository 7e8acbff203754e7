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

use crate::domain::repositories::monitor_repository::MonitorRepository;
use crate::domain::services::ingest_service::IngestService;
use crate::engines::politeness::PolitenessPolicy;
use crate::engines::traits::PageFetch;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// 种子批次的固定批次标签
const SEED_RUN_LABEL: &str = "seed-run";

/// 运行错误类型
///
/// 只有无法恢复的启动问题才会上抛；单个种子的失败从不终止整轮运行
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Seeds directory {0:?} does not exist")]
    MissingSeedsDir(PathBuf),

    #[error("Could not list seeds directory: {0}")]
    ListSeeds(std::io::Error),
}

/// 读取组织的种子列表
///
/// 每行一个绝对URL；空行与`#`开头的行被忽略，保持文件顺序
pub fn load_seeds(path: &Path) -> Result<Vec<String>, std::io::Error> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

/// 种子运行驱动
///
/// 遍历各组织的种子文件，逐个委托抓取与持久化
pub struct RunService<R: MonitorRepository, F: PageFetch> {
    ingest: Arc<IngestService<R, F>>,
    policy: PolitenessPolicy,
    seeds_dir: PathBuf,
}

impl<R: MonitorRepository, F: PageFetch> RunService<R, F> {
    pub fn new(
        ingest: Arc<IngestService<R, F>>,
        policy: PolitenessPolicy,
        seeds_dir: PathBuf,
    ) -> Self {
        Self {
            ingest,
            policy,
            seeds_dir,
        }
    }

    fn seed_file(&self, org: &str) -> PathBuf {
        self.seeds_dir.join(format!("{}.txt", org))
    }

    /// 列出种子目录中的组织名（按文件名排序）
    fn available_orgs(&self) -> Result<Vec<String>, RunError> {
        let entries = std::fs::read_dir(&self.seeds_dir).map_err(RunError::ListSeeds)?;
        let mut orgs: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        orgs.sort();
        Ok(orgs)
    }

    /// 运行所有（或指定的）组织的种子列表
    ///
    /// 每个组织最多消费配置上限个种子；单个种子失败记录日志后继续；
    /// 种子之间与组织之间分别等待配置的间隔
    ///
    /// # 参数
    ///
    /// * `selected` - 要运行的组织名（可选；缺省时运行全部）
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 运行结束
    /// * `Err(RunError)` - 种子目录缺失等启动失败
    pub async fn run_all(&self, selected: Option<&[String]>) -> Result<(), RunError> {
        if !self.seeds_dir.exists() {
            return Err(RunError::MissingSeedsDir(self.seeds_dir.clone()));
        }

        let org_list: Vec<String> = match selected {
            Some(names) => names
                .iter()
                .filter(|org| self.seed_file(org).exists())
                .cloned()
                .collect(),
            None => self.available_orgs()?,
        };
        info!(orgs = ?org_list, "starting seed run");

        for org in &org_list {
            let seeds = match load_seeds(&self.seed_file(org)) {
                Ok(seeds) => seeds,
                Err(e) => {
                    warn!(%org, error = %e, "could not read seed file, skipping organization");
                    continue;
                }
            };
            let capped = &seeds[..seeds.len().min(self.policy.max_seeds_per_org)];
            info!(
                %org,
                seeds = capped.len(),
                cap = self.policy.max_seeds_per_org,
                "running organization seeds"
            );

            for url in capped {
                if let Err(e) = self
                    .ingest
                    .save_page(org, url, Some(SEED_RUN_LABEL), None)
                    .await
                {
                    error!(%org, %url, error = %e, "seed failed");
                }
                tokio::time::sleep(self.policy.seed_pause).await;
            }

            info!(%org, "finished organization, pausing before next");
            tokio::time::sleep(self.policy.per_org_delay).await;
        }

        Ok(())
    }
}
