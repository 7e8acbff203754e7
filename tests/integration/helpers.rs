// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use migration::{Migrator, MigratorTrait};
use onionwatch::engines::traits::{FetchError, FetchResponse, PageFetch};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// 建立带完整schema的内存数据库
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // 单连接，避免每个池连接各自拿到一个空的内存库
    options.max_connections(1);
    let db = Database::connect(options).await.expect("in-memory sqlite");
    Migrator::up(&db, None).await.expect("migrations");
    db
}

/// 返回固定页面的抓取替身
pub struct StubFetcher {
    pub html: String,
    pub status_code: u16,
}

#[async_trait]
impl PageFetch for StubFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchResponse, FetchError> {
        Ok(FetchResponse {
            status_code: self.status_code,
            body: self.html.clone(),
        })
    }
}

/// 始终失败的抓取替身
pub struct UnreachableFetcher;

#[async_trait]
impl PageFetch for UnreachableFetcher {
    async fn fetch(&self, _url: &str) -> Result<FetchResponse, FetchError> {
        Err(FetchError::BadStatus(502))
    }
}
