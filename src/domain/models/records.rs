// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::indicator::{IndicatorType, Severity};
use chrono::{DateTime, Utc};

/// 待插入的已抓取页面行
#[derive(Debug, Clone)]
pub struct NewPage {
    pub org_id: i32,
    pub batch_id: Option<i32>,
    pub url: String,
    pub status_code: Option<u16>,
    pub content: String,
    pub snippet: String,
    pub fetched_at: DateTime<Utc>,
}

/// 待插入的威胁指标行
#[derive(Debug, Clone)]
pub struct NewThreat {
    pub org_id: i32,
    pub page_id: Option<i32>,
    pub kind: IndicatorType,
    pub value: String,
    pub severity: Severity,
    pub evidence: String,
    pub created_at: DateTime<Utc>,
}
