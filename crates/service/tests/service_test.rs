//! End-to-end tests for the recommendation service.
//!
//! The catalog has four categories and a mix of fresh and stale articles;
//! users 1..=6 have overlapping histories, user 999 has none.

use model_store::{ArticleId, ArticleMeta, CategoryId, ModelStore, UserId, parser};
use service::{EngineConfig, RecommendRequest, RecommendationItem, RecommendationService, RecommendError};
use std::collections::HashSet;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const DAY_MS: i64 = 86_400_000;
const NOW: i64 = 20_000 * DAY_MS;

/// (article_id, category_id, age_days, popularity)
const CATALOG: &[(ArticleId, CategoryId, i64, f32)] = &[
    (1, 1, 0, 0.95),
    (2, 1, 1, 0.90),
    (3, 1, 2, 0.85),
    (4, 1, 3, 0.80),
    (5, 1, 4, 0.75),
    (6, 2, 2, 0.60),
    (7, 2, 5, 0.55),
    (8, 3, 6, 0.50),
    (9, 3, 8, 0.45),
    (10, 4, 10, 0.40),
    (11, 4, 13, 0.35),
    (12, 2, 30, 0.99),
    (13, 3, 90, 0.98),
];

const HISTORIES: &[(UserId, &[ArticleId])] = &[
    (1, &[1, 6]),
    (2, &[1, 6, 8, 12]),
    (3, &[1, 2, 6, 9]),
    (4, &[6, 7, 10]),
    (5, &[2, 3, 11]),
    (6, &[8, 9, 13]),
];

fn embedding_for(article_id: ArticleId, category_id: CategoryId) -> Vec<f32> {
    let mut v = vec![0.1; 4];
    v[(category_id - 1) as usize] = 1.0;
    v[(article_id % 4) as usize] += 0.2;
    v
}

fn build_store() -> ModelStore {
    let mut builder = ModelStore::builder();
    for &(article_id, category_id, age_days, popularity) in CATALOG {
        builder = builder
            .article(ArticleMeta {
                article_id,
                category_id,
                publisher_id: article_id % 3,
                words_count: 150 + article_id * 10,
                created_at_ts: NOW - age_days * DAY_MS,
            })
            .popularity(article_id, popularity)
            .embedding(article_id, embedding_for(article_id, category_id));
    }
    for &(user_id, history) in HISTORIES {
        for (i, &article_id) in history.iter().enumerate() {
            builder = builder
                .interaction(user_id, article_id, (i + 1) as f32)
                .weighted_interaction(user_id, article_id, 1.0 / (i + 1) as f32);
        }
        builder = builder.history(user_id, history.to_vec());
    }
    builder.build().unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn create_service() -> RecommendationService {
    init_tracing();
    RecommendationService::with_store(Arc::new(build_store()), EngineConfig::default()).unwrap()
}

fn ids(items: &[RecommendationItem]) -> Vec<ArticleId> {
    items.iter().map(|i| i.article_id).collect()
}

fn categories(items: &[RecommendationItem]) -> HashSet<CategoryId> {
    items.iter().map(|i| i.category_id).collect()
}

fn age_days(item: &RecommendationItem) -> f64 {
    (NOW - item.created_at_ts) as f64 / DAY_MS as f64
}

#[test]
fn test_cold_start_returns_exactly_five_fresh_items() {
    let service = create_service();
    let request = RecommendRequest::new(999).at(NOW);

    let items = service.recommend(&request).unwrap();

    assert_eq!(items.len(), 5);
    // Temporal only: the stale but very popular articles 12 and 13 never show up
    for item in &items {
        assert!(age_days(item) <= 14.0);
    }
    // Diversity spreads the cold-start list beyond the dominant category
    assert!(categories(&items).len() > 1);
}

#[test]
fn test_identical_calls_are_deterministic() {
    let service = create_service();
    for user_id in [1, 3, 5, 999] {
        let request = RecommendRequest::new(user_id).with_count(8).at(NOW);
        let first = service.recommend(&request).unwrap();
        let second = service.recommend(&request).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_count_contract() {
    let service = create_service();
    for user_id in [1, 2, 3, 4, 5, 6, 999] {
        for n in [1, 3, 5, 9] {
            for use_diversity in [true, false] {
                let request = RecommendRequest::new(user_id)
                    .with_count(n)
                    .with_diversity(use_diversity)
                    .at(NOW);
                let items = service.recommend(&request).unwrap();

                assert!(items.len() <= n);
                let unique: HashSet<ArticleId> = ids(&items).into_iter().collect();
                assert_eq!(unique.len(), items.len());
            }
        }
    }

    // The fresh catalog has 11 articles, the largest history is 4
    let items = service.recommend(&RecommendRequest::new(2).with_count(7).at(NOW)).unwrap();
    assert_eq!(items.len(), 7);
}

#[test]
fn test_history_is_never_recommended() {
    let service = create_service();
    for &(user_id, history) in HISTORIES {
        let request = RecommendRequest::new(user_id).with_count(10).at(NOW);
        let items = service.recommend(&request).unwrap();
        for item in &items {
            assert!(!history.contains(&item.article_id), "user {} got {}", user_id, item.article_id);
        }
    }
}

#[test]
fn test_hype_window_for_temporal_only_requests() {
    let service = create_service();
    for max_age in [0.0, 1.5, 5.0, 14.0] {
        let request = RecommendRequest::new(4)
            .with_weights(0.0, 0.0, 1.0)
            .with_count(10)
            .with_max_age_days(max_age)
            .at(NOW);
        let items = service.recommend(&request).unwrap();

        for item in &items {
            assert!(age_days(item) <= max_age, "article {} is too old for {}", item.article_id, max_age);
        }
    }
}

#[test]
fn test_diversity_does_not_reduce_category_count() {
    let service = create_service();
    for user_id in [1, 2, 3, 4, 5, 6, 999] {
        for n in 2..=6 {
            let base = RecommendRequest::new(user_id).with_count(n).at(NOW);
            let plain = service.recommend(&base.clone().with_diversity(false)).unwrap();
            let diverse = service.recommend(&base.with_diversity(true)).unwrap();

            if categories(&plain).len() > 1 {
                assert!(categories(&diverse).len() > 1);
            }
            assert!(categories(&diverse).len() >= categories(&plain).len());
        }
    }
}

#[test]
fn test_warm_user_mixes_signals() {
    let service = create_service();
    let collab_only = service
        .recommend(&RecommendRequest::new(1).with_weights(1.0, 0.0, 0.0).with_count(3).at(NOW))
        .unwrap();
    let trend_only = service
        .recommend(&RecommendRequest::new(1).with_weights(0.0, 0.0, 1.0).with_count(3).at(NOW))
        .unwrap();

    assert!(!collab_only.is_empty());
    assert!(!trend_only.is_empty());
    assert_ne!(ids(&collab_only), ids(&trend_only));
}

#[test]
fn test_caller_errors() {
    let service = create_service();

    let result = service.recommend(&RecommendRequest::new(1).with_count(0));
    assert!(matches!(result, Err(RecommendError::InvalidParameter { .. })));

    let result = service.recommend(&RecommendRequest::new(1).with_count(51));
    assert!(matches!(result, Err(RecommendError::InvalidParameter { .. })));

    let result = service.recommend(&RecommendRequest::new(1).with_weights(0.0, 0.0, 0.0));
    assert!(matches!(result, Err(RecommendError::InvalidWeights { .. })));

    let result = service.recommend(&RecommendRequest::new(1).with_weights(-0.5, 1.0, 1.0));
    assert!(matches!(result, Err(RecommendError::InvalidWeights { .. })));

    let unloaded = RecommendationService::new(EngineConfig::default()).unwrap();
    assert!(matches!(
        unloaded.recommend(&RecommendRequest::new(1)),
        Err(RecommendError::ModelNotLoaded)
    ));
    assert!(matches!(unloaded.trending(5, None, None), Err(RecommendError::ModelNotLoaded)));
}

fn write_artifacts(dir: &TempDir) {
    let mut interactions = String::new();
    let mut histories = String::new();
    for &(user_id, history) in HISTORIES {
        for &article_id in history {
            interactions.push_str(&format!("{}::{}::1\n", user_id, article_id));
        }
        let list: Vec<String> = history.iter().map(|id| id.to_string()).collect();
        histories.push_str(&format!("{}::{}\n", user_id, list.join(",")));
    }

    let mut articles = String::new();
    let mut popularity = String::new();
    let mut embeddings = String::new();
    for &(article_id, category_id, age_days, score) in CATALOG {
        articles.push_str(&format!(
            "{}::{}::0::200::{}\n",
            article_id,
            category_id,
            NOW - age_days * DAY_MS
        ));
        popularity.push_str(&format!("{}::{}\n", article_id, score));
        let vector: Vec<String> = embedding_for(article_id, category_id)
            .iter()
            .map(|v| v.to_string())
            .collect();
        embeddings.push_str(&format!("{}::{}\n", article_id, vector.join(",")));
    }

    fs::write(dir.path().join(parser::INTERACTIONS_FILE), interactions).unwrap();
    fs::write(dir.path().join(parser::HISTORIES_FILE), histories).unwrap();
    fs::write(dir.path().join(parser::ARTICLES_FILE), articles).unwrap();
    fs::write(dir.path().join(parser::POPULARITY_FILE), popularity).unwrap();
    fs::write(dir.path().join(parser::EMBEDDINGS_FILE), embeddings).unwrap();
}

#[test]
fn test_load_and_reload_from_disk() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    write_artifacts(&dir);

    let service = RecommendationService::load(dir.path(), EngineConfig::default()).unwrap();
    let items = service.recommend(&RecommendRequest::new(1).at(NOW)).unwrap();
    assert_eq!(items.len(), 5);

    // A broken reload leaves the running store in place
    fs::remove_file(dir.path().join(parser::POPULARITY_FILE)).unwrap();
    assert!(matches!(service.reload_from(dir.path()), Err(RecommendError::Load(_))));
    let again = service.recommend(&RecommendRequest::new(1).at(NOW)).unwrap();
    assert_eq!(items, again);
}

#[test]
fn test_trending_matches_cold_start_without_diversity() {
    let service = create_service();
    let trending = service.trending(4, Some(NOW), None).unwrap();
    let cold = service
        .recommend(&RecommendRequest::new(999).with_count(4).with_diversity(false).at(NOW))
        .unwrap();

    assert_eq!(trending, cold);
    assert_eq!(ids(&trending), vec![1, 2, 3, 4]);
}

/// Articles 1..=5 are fresh with metadata; ids 100.. are popularity-only and
/// outrank all of them
fn build_store_with_undated_popularity(undated: u32) -> ModelStore {
    let mut builder = ModelStore::builder();
    for article_id in 1..=5 {
        builder = builder
            .article(ArticleMeta {
                article_id,
                category_id: article_id % 2 + 1,
                publisher_id: 0,
                words_count: 200,
                created_at_ts: NOW - article_id as i64 * DAY_MS,
            })
            .popularity(article_id, 0.5);
    }
    for article_id in 100..100 + undated {
        builder = builder.popularity(article_id, 0.9);
    }
    builder.build().unwrap()
}

#[test]
fn test_cold_start_skips_popularity_entries_without_metadata() {
    init_tracing();
    let store = Arc::new(build_store_with_undated_popularity(15));
    let service = RecommendationService::with_store(store, EngineConfig::default()).unwrap();

    let items = service.recommend(&RecommendRequest::new(999).at(NOW)).unwrap();
    let mut returned = ids(&items);
    returned.sort_unstable();
    assert_eq!(returned, vec![1, 2, 3, 4, 5]);

    let trending = service.trending(5, Some(NOW), None).unwrap();
    assert_eq!(ids(&trending), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_warm_user_gets_full_count_when_top_sources_lack_metadata() {
    init_tracing();
    let mut builder = ModelStore::builder();
    for article_id in 1..=6 {
        let mut vector = vec![0.0; 4];
        vector[(article_id % 3 + 1) as usize] = 1.0;
        builder = builder
            .article(ArticleMeta {
                article_id,
                category_id: article_id % 3 + 1,
                publisher_id: 0,
                words_count: 200,
                created_at_ts: NOW - article_id as i64 * DAY_MS,
            })
            .popularity(article_id, 0.3)
            .embedding(article_id, vector);
    }
    // Undated ids look like article 1, are read heavily by the neighbours
    // and are the most popular entries
    for article_id in 100..110 {
        builder = builder
            .popularity(article_id, 0.99)
            .embedding(article_id, vec![0.0, 0.0, 1.0, 0.0]);
        for user_id in [2, 3] {
            builder = builder.interaction(user_id, article_id, 5.0);
        }
    }
    for user_id in [1, 2, 3] {
        builder = builder.interaction(user_id, 1, 1.0);
    }
    builder = builder.interaction(2, 2, 1.0).interaction(3, 3, 1.0).history(1, vec![1]);

    let config = EngineConfig {
        warm_headroom: 1,
        ..EngineConfig::default()
    };
    let service = RecommendationService::with_store(Arc::new(builder.build().unwrap()), config).unwrap();

    for use_diversity in [true, false] {
        let request = RecommendRequest::new(1)
            .with_count(4)
            .with_diversity(use_diversity)
            .at(NOW);
        let items = service.recommend(&request).unwrap();

        assert_eq!(items.len(), 4);
        assert!(ids(&items).iter().all(|&id| (2..=6).contains(&id)));
    }
}

#[test]
fn test_extreme_reference_timestamps_do_not_panic() {
    let service = create_service();

    // Every article counts as brand new
    for user_id in [1, 999] {
        let items = service.recommend(&RecommendRequest::new(user_id).at(i64::MIN)).unwrap();
        assert_eq!(items.len(), 5);
    }

    // Nothing is inside the hype window any more
    let cold = service.recommend(&RecommendRequest::new(999).at(i64::MAX)).unwrap();
    assert!(cold.is_empty());
    assert!(service.recommend(&RecommendRequest::new(1).at(i64::MAX)).is_ok());
    assert!(service.trending(5, Some(i64::MAX), None).unwrap().is_empty());
}

#[test]
fn test_huge_headroom_is_accepted() {
    init_tracing();
    let config = EngineConfig {
        cold_start_headroom: usize::MAX,
        warm_headroom: usize::MAX,
        ..EngineConfig::default()
    };
    let service = RecommendationService::with_store(Arc::new(build_store()), config).unwrap();

    for user_id in [1, 999] {
        let request = RecommendRequest::new(user_id).with_count(50).at(NOW);
        let items = service.recommend(&request).unwrap();
        assert!(!items.is_empty());
        assert!(items.len() <= 50);
    }
}
