use chrono::Duration;
use ora_core::model::{
    ActivityKind, AssetId, Badge, BucketKey, LearnerProgress, LessonId, NewAsset, ProfileId,
};
use ora_core::time::fixed_now;
use storage::repository::{ActivityRepository, AssetRepository, ProgressRepository};
use storage::sqlite::SqliteRepository;

fn profile(key: &str) -> ProfileId {
    ProfileId::new(key).unwrap()
}

fn lesson(slug: &str) -> LessonId {
    LessonId::new(slug).unwrap()
}

#[tokio::test]
async fn sqlite_roundtrip_preserves_ledger_order_and_badges() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut progress = LearnerProgress::default();
    for (i, slug) in ["intro", "prompts", "ethics"].iter().enumerate() {
        progress
            .record_completion(
                lesson(slug),
                format!("Lesson {slug}"),
                80 + i as i32,
                fixed_now() + Duration::minutes(i as i64),
            )
            .unwrap();
    }
    assert_eq!(progress.badges().len(), 2); // first + three

    let who = profile("learner-1");
    repo.save_progress(&who, &progress).await.unwrap();

    let loaded = repo
        .load_progress(&who, progress.catalog_size())
        .await
        .expect("load")
        .expect("saved profile");
    assert_eq!(loaded, progress);
    assert_eq!(
        loaded.completed().iter().map(|c| c.lesson_id.as_str()).collect::<Vec<_>>(),
        vec!["intro", "prompts", "ethics"]
    );
    assert_eq!(loaded.badges(), &[Badge::FirstLesson, Badge::ThreeLessons]);
}

#[tokio::test]
async fn sqlite_save_replaces_prior_rows() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_replace?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let who = profile("learner-2");
    let mut progress = LearnerProgress::default();
    progress
        .record_completion(lesson("intro"), "Intro", 50, fixed_now())
        .unwrap();
    repo.save_progress(&who, &progress).await.unwrap();

    progress
        .record_completion(lesson("quiz"), "Quiz", 100, fixed_now())
        .unwrap();
    repo.save_progress(&who, &progress).await.unwrap();

    let loaded = repo
        .load_progress(&who, 11)
        .await
        .unwrap()
        .expect("profile");
    assert_eq!(loaded.total_points(), 200);
    assert_eq!(loaded.completed().len(), 2);
}

#[tokio::test]
async fn sqlite_counters_read_and_overwrite() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_counts?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let day = fixed_now().date_naive();
    let key = BucketKey::new(day, ActivityKind::QuizAttempt);

    assert_eq!(repo.fetch_count(&key).await.unwrap(), 0);
    repo.store_count(&key, 3).await.unwrap();
    repo.store_count(&key, 5).await.unwrap();
    assert_eq!(repo.fetch_count(&key).await.unwrap(), 5);

    repo.store_count(&BucketKey::new(day, ActivityKind::PageView), 9)
        .await
        .unwrap();
    let counts = repo.counts_for_day(day).await.unwrap();
    assert_eq!(
        counts,
        vec![(ActivityKind::PageView, 9), (ActivityKind::QuizAttempt, 5)]
    );

    let other_day = day.succ_opt().unwrap();
    assert!(repo.counts_for_day(other_day).await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_assets_insert_list_delete() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_assets?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let older = NewAsset::validate("Workbook", "workbook.pdf", "application/pdf", 1024)
        .unwrap()
        .into_asset(AssetId::generate(), fixed_now());
    let newer = NewAsset::validate("Welcome", "welcome.mp4", "video/mp4", 4096)
        .unwrap()
        .into_asset(AssetId::generate(), fixed_now() + Duration::hours(1));

    repo.insert_asset(&older).await.unwrap();
    repo.insert_asset(&newer).await.unwrap();

    let err = repo.insert_asset(&older).await.unwrap_err();
    assert!(matches!(err, storage::StorageError::Conflict));

    let listed = repo.list_assets().await.unwrap();
    assert_eq!(listed, vec![newer.clone(), older.clone()]);

    let fetched = repo.get_asset(older.id).await.unwrap().expect("row");
    assert_eq!(fetched, older);

    assert!(repo.delete_asset(older.id).await.unwrap());
    assert!(!repo.delete_asset(older.id).await.unwrap());
    assert!(repo.get_asset(older.id).await.unwrap().is_none());
}
