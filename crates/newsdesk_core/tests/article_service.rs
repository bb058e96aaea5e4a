use chrono::{Duration, TimeZone, Utc};
use newsdesk_core::db::open_db_in_memory;
use newsdesk_core::{
    ArticleListParams, ArticlePatch, ArticleService, ArticleServiceError, ArticleStore,
    ArticleValidationError, Clock, ManualClock, MemoryArticleStore, NewArticle, SequenceIdGenerator,
    SqliteArticleStore, UuidGenerator,
};
use std::collections::HashSet;

fn start_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
}

fn source_params(source: &str) -> ArticleListParams {
    ArticleListParams {
        source: Some(source.to_string()),
        published_after: None,
    }
}

#[test]
fn create_update_list_delete_scenario() {
    let conn = open_db_in_memory().expect("open in-memory db");
    let store = SqliteArticleStore::try_new(&conn).expect("store over migrated db");
    let clock = start_clock();
    let service = ArticleService::new(store, &clock, UuidGenerator);

    let created = service
        .create_article(NewArticle::new("A", "B", "wire"))
        .expect("create article");
    assert!(!created.id.is_empty());
    assert_eq!(created.published_at, clock.now());
    assert_eq!(created.updated_at, None);
    assert_eq!(created.author, None);

    clock.advance(Duration::seconds(30));
    let updated = service
        .update_article(&created.id, &ArticlePatch::default().body("B2"))
        .expect("update article");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "A");
    assert_eq!(updated.body, "B2");
    let updated_at = updated.updated_at.unwrap();
    assert!(updated_at >= updated.published_at);
    assert_eq!(updated.published_at, created.published_at);

    let wire = service.list_articles(&source_params("wire")).expect("list articles");
    assert!(wire.iter().any(|article| article.id == created.id));
    let other = service.list_articles(&source_params("other")).expect("list articles");
    assert!(other.is_empty());

    let removed = service.delete_article(&created.id).expect("delete article");
    assert_eq!(removed, updated);
    let err = service.delete_article(&created.id).unwrap_err();
    assert!(matches!(err, ArticleServiceError::NotFound(ref id) if *id == created.id));
}

#[test]
fn create_rejects_missing_or_empty_required_fields() {
    let store = MemoryArticleStore::new();
    let service = ArticleService::new(&store, start_clock(), SequenceIdGenerator::new("n"));

    for (input, field) in [
        (
            NewArticle {
                title: None,
                ..NewArticle::new("", "b", "s")
            },
            "title",
        ),
        (NewArticle::new("t", "", "s"), "body"),
        (
            NewArticle {
                source: None,
                ..NewArticle::new("t", "b", "s")
            },
            "source",
        ),
    ] {
        let err = service.create_article(input).unwrap_err();
        assert!(
            matches!(err, ArticleServiceError::Validation(ArticleValidationError::MissingField(f)) if f == field),
            "unexpected error for {field}: {err}"
        );
    }
    assert!(store.is_empty());
}

#[test]
fn empty_author_is_stored_as_absent() {
    let store = MemoryArticleStore::new();
    let service = ArticleService::new(&store, start_clock(), SequenceIdGenerator::new("n"));

    let created = service
        .create_article(NewArticle::new("t", "b", "s").with_author(""))
        .expect("create article");
    assert_eq!(created.author, None);

    let named = service
        .create_article(NewArticle::new("t", "b", "s").with_author("kim"))
        .expect("create article");
    assert_eq!(named.author.as_deref(), Some("kim"));
}

#[test]
fn many_creates_never_share_an_id() {
    let conn = open_db_in_memory().expect("open in-memory db");
    let store = SqliteArticleStore::try_new(&conn).expect("store over migrated db");
    let service = ArticleService::new(store, start_clock(), UuidGenerator);

    let mut ids = HashSet::new();
    for n in 0..200 {
        let article = service
            .create_article(NewArticle::new(format!("t{n}"), "b", "s"))
            .expect("create article");
        assert!(ids.insert(article.id));
    }
    assert_eq!(service.store().values().unwrap().len(), 200);
}

#[test]
fn update_only_touches_patched_fields() {
    let store = MemoryArticleStore::new();
    let clock = start_clock();
    let service = ArticleService::new(&store, &clock, SequenceIdGenerator::new("n"));

    let created = service
        .create_article(NewArticle::new("A", "B", "wire").with_author("kim"))
        .expect("create article");
    clock.advance(Duration::minutes(1));

    let updated = service
        .update_article(&created.id, &ArticlePatch::default().title("X"))
        .expect("update article");
    assert_eq!(updated.title, "X");
    assert_eq!(updated.body, created.body);
    assert_eq!(updated.source, created.source);
    assert_eq!(updated.author, created.author);
    assert_eq!(updated.updated_at, Some(clock.now()));

    assert_eq!(store.get(&created.id).unwrap(), Some(updated));
}

#[test]
fn update_ignores_conflicting_id_in_payload() {
    let store = MemoryArticleStore::new();
    let service = ArticleService::new(&store, start_clock(), SequenceIdGenerator::new("n"));
    let created = service
        .create_article(NewArticle::new("A", "B", "wire"))
        .expect("create article");

    let patch: ArticlePatch = serde_json::from_value(serde_json::json!({
        "id": "hijacked",
        "publishedAt": "garbage",
        "updatedAt": "2000-01-01T00:00:00Z",
        "title": "T2"
    }))
    .expect("patch json");
    let updated = service.update_article(&created.id, &patch).expect("update article");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.published_at, created.published_at);
    assert!(updated.updated_at.unwrap() >= created.published_at);
    assert_eq!(store.get("hijacked").unwrap(), None);
    assert_eq!(store.len(), 1);
}

#[test]
fn repeated_updates_restamp_updated_at() {
    let store = MemoryArticleStore::new();
    let clock = start_clock();
    let service = ArticleService::new(&store, &clock, SequenceIdGenerator::new("n"));
    let created = service
        .create_article(NewArticle::new("A", "B", "wire"))
        .expect("create article");

    clock.advance(Duration::seconds(1));
    let first = service
        .update_article(&created.id, &ArticlePatch::default())
        .expect("update article");
    clock.advance(Duration::seconds(1));
    let second = service
        .update_article(&created.id, &ArticlePatch::default().source("blog"))
        .expect("update article");

    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.source, "blog");
}

#[test]
fn update_that_empties_required_field_is_rejected_without_write() {
    let store = MemoryArticleStore::new();
    let service = ArticleService::new(&store, start_clock(), SequenceIdGenerator::new("n"));
    let created = service
        .create_article(NewArticle::new("A", "B", "wire"))
        .expect("create article");

    let err = service
        .update_article(&created.id, &ArticlePatch::default().title(""))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(store.get(&created.id).unwrap(), Some(created));
}

#[test]
fn update_and_get_of_missing_id_report_not_found() {
    let store = MemoryArticleStore::new();
    let service = ArticleService::new(&store, start_clock(), SequenceIdGenerator::new("n"));

    assert!(matches!(
        service
            .update_article("nope", &ArticlePatch::default().title("x"))
            .unwrap_err(),
        ArticleServiceError::NotFound(_)
    ));
    assert!(matches!(
        service.get_article("nope").unwrap_err(),
        ArticleServiceError::NotFound(_)
    ));
    assert!(store.is_empty());
}

#[test]
fn list_filters_by_threshold_and_source_in_id_order() {
    let store = MemoryArticleStore::new();
    let clock = start_clock();
    let service = ArticleService::new(&store, &clock, SequenceIdGenerator::new("n"));

    let early = service
        .create_article(NewArticle::new("early", "b", "wire"))
        .expect("create article");
    clock.advance(Duration::hours(2));
    let late_blog = service
        .create_article(NewArticle::new("late", "b", "blog"))
        .expect("create article");
    let late_wire = service
        .create_article(NewArticle::new("late", "b", "wire"))
        .expect("create article");

    let threshold = late_blog.published_at.to_rfc3339();
    let after = service
        .list_articles(&ArticleListParams {
            source: None,
            published_after: Some(threshold.clone()),
        })
        .expect("list articles");
    assert_eq!(after, vec![late_blog.clone(), late_wire.clone()]);

    let both = service
        .list_articles(&ArticleListParams {
            source: Some("wire".to_string()),
            published_after: Some(threshold),
        })
        .expect("list articles");
    assert_eq!(both, vec![late_wire.clone()]);

    let all = service.list_articles(&ArticleListParams::default()).expect("list articles");
    assert_eq!(all, vec![early, late_blog, late_wire]);
}

#[test]
fn list_with_unparseable_threshold_fails_visibly() {
    let store = MemoryArticleStore::new();
    let service = ArticleService::new(&store, start_clock(), SequenceIdGenerator::new("n"));
    service
        .create_article(NewArticle::new("t", "b", "wire"))
        .expect("create article");

    let err = service
        .list_articles(&ArticleListParams {
            source: Some("wire".to_string()),
            published_after: Some("not a date".to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, ArticleServiceError::Query(_)));
    assert!(err.to_string().contains("publishedAfter"));
}

#[test]
fn source_filter_does_not_fold_case() {
    let store = MemoryArticleStore::new();
    let service = ArticleService::new(&store, start_clock(), SequenceIdGenerator::new("n"));
    service
        .create_article(NewArticle::new("t", "b", "Wire"))
        .expect("create article");

    assert!(service
        .list_articles(&source_params("wire"))
        .expect("list articles")
        .is_empty());
    assert_eq!(service.list_articles(&source_params("Wire")).expect("list articles").len(), 1);
}

#[test]
fn clock_skew_never_puts_updated_before_published() {
    let store = MemoryArticleStore::new();
    let clock = start_clock();
    let service = ArticleService::new(&store, &clock, SequenceIdGenerator::new("n"));
    let created = service
        .create_article(NewArticle::new("A", "B", "wire"))
        .expect("create article");

    clock.advance(Duration::minutes(-10));
    let updated = service
        .update_article(&created.id, &ArticlePatch::default().body("B2"))
        .expect("update article");
    assert_eq!(updated.updated_at, Some(created.published_at));
}
