// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::test_db;
use onionwatch::domain::repositories::monitor_repository::MonitorRepository;
use onionwatch::infrastructure::database::entities::{crawl_batch, org};
use onionwatch::infrastructure::repositories::monitor_repo_impl::MonitorRepositoryImpl;
use sea_orm::{EntityTrait, PaginatorTrait};
use std::sync::Arc;

#[tokio::test]
async fn test_find_or_create_org_is_idempotent() {
    let db = Arc::new(test_db().await);
    let repo = MonitorRepositoryImpl::new(Arc::clone(&db));

    let first = repo.find_or_create_org("acme").await.expect("create");
    let second = repo.find_or_create_org("acme").await.expect("find");

    assert_eq!(first, second);
    let rows = org::Entity::find()
        .count(db.as_ref())
        .await
        .expect("count");
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_org_names_are_case_sensitive() {
    let db = Arc::new(test_db().await);
    let repo = MonitorRepositoryImpl::new(Arc::clone(&db));

    let lower = repo.find_or_create_org("acme").await.expect("create");
    let upper = repo.find_or_create_org("Acme").await.expect("create");

    assert_ne!(lower, upper);
}

#[tokio::test]
async fn test_batches_are_not_deduplicated_by_label() {
    let db = Arc::new(test_db().await);
    let repo = MonitorRepositoryImpl::new(Arc::clone(&db));
    let org_id = repo.find_or_create_org("acme").await.expect("org");

    let first = repo.create_batch(org_id, "seed-run").await.expect("batch");
    let second = repo.create_batch(org_id, "seed-run").await.expect("batch");

    assert_ne!(first, second);
    let rows = crawl_batch::Entity::find()
        .count(db.as_ref())
        .await
        .expect("count");
    assert_eq!(rows, 2);

    let stored = crawl_batch::Entity::find_by_id(first)
        .one(db.as_ref())
        .await
        .expect("query")
        .expect("batch row");
    assert_eq!(stored.org_id, org_id);
    assert_eq!(stored.label.as_deref(), Some("seed-run"));
    assert_eq!(stored.status, "created");
}
