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

use crate::domain::models::records::{NewPage, NewThreat};
use async_trait::async_trait;
use thiserror::Error;

/// 仓库层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("未找到数据")]
    NotFound,
}

impl From<sea_orm::DbErr> for RepositoryError {
    fn from(err: sea_orm::DbErr) -> Self {
        RepositoryError::DatabaseError(err.to_string())
    }
}

/// 监控数据仓库特质
///
/// 所有写入都以组织为作用域，没有跨组织读取
#[async_trait]
pub trait MonitorRepository: Send + Sync {
    /// 按名称精确查找组织，不存在则创建
    async fn find_or_create_org(&self, name: &str) -> Result<i32, RepositoryError>;

    /// 为组织创建一个新的爬取批次
    async fn create_batch(&self, org_id: i32, label: &str) -> Result<i32, RepositoryError>;

    /// 插入已抓取页面
    async fn insert_page(&self, page: NewPage) -> Result<i32, RepositoryError>;

    /// 插入威胁指标
    async fn insert_threat(&self, threat: NewThreat) -> Result<i32, RepositoryError>;
}
