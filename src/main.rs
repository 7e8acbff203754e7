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

use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use onionwatch::config::settings::Settings;
use onionwatch::domain::services::ingest_service::{ContentLimits, IngestService};
use onionwatch::domain::services::run_service::RunService;
use onionwatch::engines::politeness::PolitenessPolicy;
use onionwatch::engines::tor_control::TorControl;
use onionwatch::engines::tor_fetcher::TorFetcher;
use onionwatch::engines::tor_session::TorSession;
use onionwatch::infrastructure::database::connection;
use onionwatch::infrastructure::repositories::monitor_repo_impl::MonitorRepositoryImpl;
use onionwatch::infrastructure::search::seed_finder::{write_seed_file, SeedFinder};
use onionwatch::utils::telemetry;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// 命令行接口
#[derive(Parser)]
#[command(name = "onionwatch", about = "Monitor onion sites for leaked data and abuse indicators")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 抓取单个URL并保存检测结果
    Fetch {
        /// 组织名
        org: String,
        /// 目标URL
        url: String,
        /// 批次标签（可选）
        #[arg(long)]
        batch: Option<String>,
        /// 抓取前请求新电路
        #[arg(long)]
        rotate: bool,
    },
    /// 运行种子列表（缺省为全部组织）
    Run {
        /// 限定运行的组织名
        orgs: Vec<String>,
    },
    /// 通过暗网搜索端点发现种子链接
    Discover {
        /// 搜索关键词
        keyword: String,
    },
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并执行所选命令
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();
    info!("Starting onionwatch...");

    let cli = Cli::parse();
    let settings = Settings::new()?;

    match cli.command {
        Command::Fetch {
            org,
            url,
            batch,
            rotate,
        } => {
            let ingest = build_ingest(&settings, rotate || settings.tor.rotate_circuit).await?;
            match ingest.save_page(&org, &url, batch.as_deref(), None).await {
                Ok(page_id) => info!(page_id, %org, %url, "page saved"),
                Err(e) => error!(%org, %url, error = %e, "fetch-and-save failed"),
            }
        }
        Command::Run { orgs } => {
            let ingest = build_ingest(&settings, settings.tor.rotate_circuit).await?;
            let runner = RunService::new(
                ingest,
                PolitenessPolicy::from_settings(&settings.crawler),
                PathBuf::from(&settings.seeds.dir),
            );
            let selected = if orgs.is_empty() { None } else { Some(orgs) };
            runner.run_all(selected.as_deref()).await?;
        }
        Command::Discover { keyword } => {
            let transport = TorSession::build_with_timeout(
                &settings.tor,
                Duration::from_secs(settings.discovery.request_timeout),
            )?;
            let finder = SeedFinder::new(Arc::new(transport), settings.discovery.workers);
            let links = finder.discover(&keyword).await;
            let path = write_seed_file(&PathBuf::from(&settings.seeds.dir), &keyword, &links)?;
            info!(%keyword, links = links.len(), path = %path.display(), "seeds written");
        }
    }

    Ok(())
}

/// 生产环境的持久化编排服务类型
type ProdIngest = IngestService<MonitorRepositoryImpl, TorFetcher<TorSession, TorControl>>;

/// 构建持久化编排服务及其依赖
async fn build_ingest(settings: &Settings, rotate_circuit: bool) -> anyhow::Result<Arc<ProdIngest>> {
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    Migrator::up(db.as_ref(), None).await?;

    let repo = Arc::new(MonitorRepositoryImpl::new(db));
    let fetcher = Arc::new(TorFetcher::from_settings(settings, rotate_circuit)?);
    Ok(Arc::new(IngestService::new(
        repo,
        fetcher,
        ContentLimits::from_settings(&settings.limits),
    )))
}
