// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::helpers::{test_db, StubFetcher, UnreachableFetcher};
use onionwatch::domain::services::ingest_service::{ContentLimits, IngestService, PageContent};
use onionwatch::infrastructure::database::entities::{crawled_page, org, threat};
use onionwatch::infrastructure::repositories::monitor_repo_impl::MonitorRepositoryImpl;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use std::sync::Arc;

fn ingest_with<F: onionwatch::engines::traits::PageFetch>(
    db: &Arc<DatabaseConnection>,
    fetcher: F,
) -> IngestService<MonitorRepositoryImpl, F> {
    IngestService::new(
        Arc::new(MonitorRepositoryImpl::new(Arc::clone(db))),
        Arc::new(fetcher),
        ContentLimits::default(),
    )
}

const LEAK_PAGE: &str = concat!(
    "<html><body>",
    "<p>send funds to 1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2</p>",
    "<div>payload union select secrets</div>",
    "</body></html>"
);

#[tokio::test]
async fn test_end_to_end_leak_page() {
    let db = Arc::new(test_db().await);
    let ingest = ingest_with(
        &db,
        StubFetcher {
            html: LEAK_PAGE.to_string(),
            status_code: 200,
        },
    );

    let page_id = ingest
        .save_page("acme", "http://example.onion/leak", None, None)
        .await
        .expect("save");

    let acme = org::Entity::find()
        .filter(org::Column::Name.eq("acme"))
        .one(db.as_ref())
        .await
        .expect("query")
        .expect("org row");

    let pages = crawled_page::Entity::find()
        .all(db.as_ref())
        .await
        .expect("pages");
    assert_eq!(pages.len(), 1);
    let page = &pages[0];
    assert_eq!(page.id, page_id);
    assert_eq!(page.org_id, acme.id);
    assert_eq!(page.url, "http://example.onion/leak");
    assert_eq!(page.status_code, Some(200));
    assert!(page.batch_id.is_none());

    let threats = threat::Entity::find()
        .all(db.as_ref())
        .await
        .expect("threats");
    assert_eq!(threats.len(), 2);
    for row in &threats {
        assert_eq!(row.severity, "medium");
        assert_eq!(row.org_id, acme.id);
        assert_eq!(row.crawled_page_id, Some(page_id));
    }
    let mut kinds: Vec<&str> = threats.iter().map(|t| t.indicator_type.as_str()).collect();
    kinds.sort();
    assert_eq!(kinds, vec!["btc-address", "sqli-signature"]);
}

#[tokio::test]
async fn test_snippet_is_normalized_prefix() {
    let db = Arc::new(test_db().await);
    let ingest = ingest_with(
        &db,
        StubFetcher {
            html: "<p>Lots   OF\n\nWhitespace and CAPITALS here</p>".to_string(),
            status_code: 200,
        },
    );

    ingest
        .save_page("acme", "http://example.onion/page", None, None)
        .await
        .expect("save");

    let page = crawled_page::Entity::find()
        .one(db.as_ref())
        .await
        .expect("query")
        .expect("page row");
    assert_eq!(page.content_snippet, "lots of whitespace and capitals here");
    assert_eq!(page.content_snippet, page.content_snippet.to_lowercase());
    assert!(!page.content_snippet.contains("  "));
}

#[tokio::test]
async fn test_clean_page_has_zero_threats() {
    let db = Arc::new(test_db().await);
    let ingest = ingest_with(
        &db,
        StubFetcher {
            html: "<p>nothing to see on this page</p>".to_string(),
            status_code: 200,
        },
    );

    ingest
        .save_page("acme", "http://example.onion/benign", None, None)
        .await
        .expect("a page with zero threats is a valid terminal state");

    let pages = crawled_page::Entity::find()
        .count(db.as_ref())
        .await
        .expect("count");
    let threats = threat::Entity::find()
        .count(db.as_ref())
        .await
        .expect("count");
    assert_eq!(pages, 1);
    assert_eq!(threats, 0);
}

#[tokio::test]
async fn test_fetch_failure_leaves_no_rows() {
    let db = Arc::new(test_db().await);
    let ingest = ingest_with(&db, UnreachableFetcher);

    let result = ingest
        .save_page("acme", "http://example.onion/down", None, None)
        .await;

    assert!(result.is_err());
    // 组织在抓取前已建立，但不能留下页面或威胁行
    let pages = crawled_page::Entity::find()
        .count(db.as_ref())
        .await
        .expect("count");
    let threats = threat::Entity::find()
        .count(db.as_ref())
        .await
        .expect("count");
    assert_eq!(pages, 0);
    assert_eq!(threats, 0);
}

#[tokio::test]
async fn test_supplied_content_skips_network() {
    let db = Arc::new(test_db().await);
    let ingest = ingest_with(&db, UnreachableFetcher);

    let page_id = ingest
        .save_page(
            "acme",
            "http://example.onion/prefetched",
            Some("manual"),
            Some(PageContent {
                html: "<p>prefetched body</p>".to_string(),
                status_code: Some(201),
            }),
        )
        .await
        .expect("supplied content must not hit the transport");

    let page = crawled_page::Entity::find_by_id(page_id)
        .one(db.as_ref())
        .await
        .expect("query")
        .expect("page row");
    assert_eq!(page.status_code, Some(201));
    assert!(page.batch_id.is_some());
}
