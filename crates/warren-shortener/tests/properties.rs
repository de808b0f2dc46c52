use std::collections::{BTreeSet, HashSet};
use warren_shortener::{
    Direction, ShortCode, ShortenParams, Shortener, ShortenerError, ShortenerService,
    ShortenerSettings,
};
use warren_store::{Database, MemoryStore};

async fn open() -> ShortenerService<MemoryStore> {
    ShortenerService::open(Database::new(MemoryStore::new()), ShortenerSettings::default())
        .await
        .unwrap()
}

fn codes(list: &[&str]) -> BTreeSet<ShortCode> {
    list.iter().map(|c| ShortCode::new(*c).unwrap()).collect()
}

/// Creates `a`..`g` style URLs under generated codes B..H and resolves the
/// i-th code i times.
async fn seven_codes_with_skewed_traffic(
    service: &ShortenerService<MemoryStore>,
) -> Vec<ShortCode> {
    let mut created = Vec::new();
    for (i, c) in "abcdefg".chars().enumerate() {
        let url = c.to_string().repeat(i + 1);
        created.push(service.create(ShortenParams::new(url)).await.unwrap());
    }
    for (i, code) in created.iter().enumerate() {
        for _ in 0..i {
            service.resolve(code).await.unwrap();
        }
    }
    created
}

#[tokio::test]
async fn sequential_generated_codes_are_distinct() {
    let service = open().await;
    let mut seen = HashSet::new();

    for i in 0..500 {
        let code = service
            .create(ShortenParams::new(format!("https://example.com/{i}")))
            .await
            .unwrap();
        assert!(seen.insert(code), "duplicate code at iteration {i}");
    }
}

#[tokio::test]
async fn generated_codes_skip_aliases() {
    let service = open().await;
    service
        .create(ShortenParams::new("https://alias.example").with_alias("C"))
        .await
        .unwrap();

    let first = service
        .create(ShortenParams::new("https://1.example"))
        .await
        .unwrap();
    let second = service
        .create(ShortenParams::new("https://2.example"))
        .await
        .unwrap();

    assert_eq!(first.as_str(), "B");
    assert_eq!(second.as_str(), "D");
    assert_eq!(
        service.resolve(&ShortCode::new("C").unwrap()).await.unwrap(),
        "https://alias.example"
    );
}

#[tokio::test]
async fn registered_code_resolves_to_its_url_with_zero_count() {
    let service = open().await;
    let code = service
        .create(ShortenParams::new("full_url").with_alias("short"))
        .await
        .unwrap();

    assert_eq!(service.count_of(&code).await.unwrap(), 0);
    assert_eq!(service.resolve(&code).await.unwrap(), "full_url");
}

#[tokio::test]
async fn counts_track_successful_resolves() {
    let service = open().await;
    let created = seven_codes_with_skewed_traffic(&service).await;

    for (i, code) in created.iter().enumerate() {
        assert_eq!(service.count_of(code).await.unwrap(), i as u64);
    }
    assert!(service.audit().await.unwrap().is_empty());
}

#[tokio::test]
async fn ranking_finds_both_extremes() {
    let service = open().await;
    let created = seven_codes_with_skewed_traffic(&service).await;

    let names: Vec<&str> = created.iter().map(ShortCode::as_str).collect();
    assert_eq!(names, vec!["B", "C", "D", "E", "F", "G", "H"]);

    let most = service.rank(Direction::Most).await.unwrap();
    assert_eq!(most.count, 6);
    assert_eq!(most.codes, codes(&["H"]));

    let least = service.rank(Direction::Least).await.unwrap();
    assert_eq!(least.count, 0);
    assert_eq!(least.codes, codes(&["B"]));

    let dump = service.dump().await.unwrap();
    assert_eq!(dump.cursor, 7);
}

#[tokio::test]
async fn ranking_returns_every_tied_code() {
    let service = open().await;
    let created = seven_codes_with_skewed_traffic(&service).await;

    // G has 5 accesses; one more ties it with H at 6
    service.resolve(&created[5]).await.unwrap();

    let most = service.rank(Direction::Most).await.unwrap();
    assert_eq!(most.count, 6);
    assert_eq!(most.codes, codes(&["G", "H"]));
}

#[tokio::test]
async fn leaderboard_lists_top_codes() {
    let service = open().await;
    seven_codes_with_skewed_traffic(&service).await;

    let top: Vec<(String, u64)> = service
        .leaderboard(Direction::Most, 3)
        .await
        .unwrap()
        .into_iter()
        .map(|entry| (entry.code.to_string(), entry.count))
        .collect();
    assert_eq!(
        top,
        vec![
            ("H".to_string(), 6),
            ("G".to_string(), 5),
            ("F".to_string(), 4)
        ]
    );
}

#[tokio::test]
async fn used_and_reserved_aliases_are_duplicates() {
    let service = open().await;
    service
        .create(ShortenParams::new("full_url").with_alias("short"))
        .await
        .unwrap();

    let err = service
        .create(ShortenParams::new("full_url").with_alias("short"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShortenerError::DuplicateCode(_)));

    let err = service
        .create(ShortenParams::new("full_url").with_alias("stats"))
        .await
        .unwrap_err();
    assert!(matches!(err, ShortenerError::DuplicateCode(_)));
}

#[tokio::test]
async fn failed_resolve_counts_nothing() {
    let service = open().await;
    let err = service
        .resolve(&ShortCode::new("missing").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(err, ShortenerError::NotFound(_)));
    assert!(service.dump().await.unwrap().counters.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_resolves_lose_no_updates() {
    let service = open().await;
    let code = service
        .create(ShortenParams::new("https://hot.example"))
        .await
        .unwrap();

    let tasks = 16;
    let per_task = 25;
    let mut handles = Vec::new();
    for _ in 0..tasks {
        let service = service.clone();
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..per_task {
                assert_eq!(service.resolve(&code).await.unwrap(), "https://hot.example");
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(service.count_of(&code).await.unwrap(), tasks * per_task);
    assert!(service.audit().await.unwrap().is_empty());

    let dump = service.dump().await.unwrap();
    assert_eq!(dump.index.len(), 1);
    assert_eq!(dump.index[0].count, tasks * per_task);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_creates_allocate_distinct_codes() {
    let service = open().await;

    let mut handles = Vec::new();
    for task in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let mut created = Vec::new();
            for i in 0..20 {
                let url = format!("https://example.com/{task}/{i}");
                created.push(service.create(ShortenParams::new(url)).await.unwrap());
            }
            created
        }));
    }

    let mut all = HashSet::new();
    for handle in handles {
        for code in handle.await.unwrap() {
            assert!(all.insert(code));
        }
    }

    assert_eq!(all.len(), 320);
    assert!(service.audit().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn rankings_stay_consistent_under_traffic() {
    let service = open().await;
    let mut created = Vec::new();
    for i in 0..4 {
        created.push(
            service
                .create(ShortenParams::new(format!("https://{i}.example")))
                .await
                .unwrap(),
        );
    }

    let mut writers = Vec::new();
    for code in created.clone() {
        let service = service.clone();
        writers.push(tokio::spawn(async move {
            for _ in 0..50 {
                service.resolve(&code).await.unwrap();
            }
        }));
    }

    let reader = {
        let service = service.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                let most = service.rank(Direction::Most).await.unwrap();
                // both scans ran against one consistent state
                assert!(!most.codes.is_empty());
                tokio::task::yield_now().await;
            }
        })
    };

    for writer in writers {
        writer.await.unwrap();
    }
    reader.await.unwrap();

    let most = service.rank(Direction::Most).await.unwrap();
    assert_eq!(most.count, 50);
    assert_eq!(most.codes.len(), 4);
    assert!(service.audit().await.unwrap().is_empty());
}
