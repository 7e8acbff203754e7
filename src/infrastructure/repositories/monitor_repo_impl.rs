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
use crate::domain::repositories::monitor_repository::{MonitorRepository, RepositoryError};
use crate::infrastructure::database::entities::{crawl_batch, crawled_page, org, threat};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::info;

/// 监控数据仓库实现
///
/// 基于SeaORM实现的监控数据访问层
#[derive(Clone)]
pub struct MonitorRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl MonitorRepositoryImpl {
    /// 创建新的仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MonitorRepository for MonitorRepositoryImpl {
    async fn find_or_create_org(&self, name: &str) -> Result<i32, RepositoryError> {
        if let Some(existing) = org::Entity::find()
            .filter(org::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await?
        {
            return Ok(existing.id);
        }

        let inserted = org::ActiveModel {
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        info!(org_id = inserted.id, name, "created organization");
        Ok(inserted.id)
    }

    async fn create_batch(&self, org_id: i32, label: &str) -> Result<i32, RepositoryError> {
        let inserted = crawl_batch::ActiveModel {
            org_id: Set(org_id),
            label: Set(Some(label.to_string())),
            status: Set("created".to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        Ok(inserted.id)
    }

    async fn insert_page(&self, page: NewPage) -> Result<i32, RepositoryError> {
        let inserted = crawled_page::ActiveModel {
            org_id: Set(page.org_id),
            batch_id: Set(page.batch_id),
            url: Set(page.url),
            status_code: Set(page.status_code.map(i32::from)),
            content: Set(page.content),
            content_snippet: Set(page.snippet),
            fetched_at: Set(page.fetched_at.into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        Ok(inserted.id)
    }

    async fn insert_threat(&self, new_threat: NewThreat) -> Result<i32, RepositoryError> {
        let inserted = threat::ActiveModel {
            org_id: Set(new_threat.org_id),
            crawled_page_id: Set(new_threat.page_id),
            indicator_type: Set(new_threat.kind.to_string()),
            indicator: Set(new_threat.value),
            severity: Set(new_threat.severity.to_string()),
            evidence: Set(new_threat.evidence),
            created_at: Set(new_threat.created_at.into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;
        Ok(inserted.id)
    }
}
