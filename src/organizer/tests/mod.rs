use super::*;
use serde_json::json;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Write a metadata document and raw photos into `dir`
async fn seed_work_dir(dir: &Path, metadata: serde_json::Value, photos: &[&str]) {
    tokio::fs::create_dir_all(dir).await.unwrap();
    tokio::fs::write(dir.join("item.json"), metadata.to_string())
        .await
        .unwrap();
    for name in photos {
        tokio::fs::write(dir.join(name), name.as_bytes()).await.unwrap();
    }
}

fn red_coat() -> serde_json::Value {
    json!({"title": "Red Coat", "user": {"login": "alice"}})
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn organizer() -> FileOrganizer {
    FileOrganizer::new(OrganizerConfig::default())
}

#[tokio::test]
async fn photos_are_numbered_sequentially() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    seed_work_dir(
        work,
        red_coat(),
        &["photo_1.webp", "photo_2.webp", "photo_3.webp"],
    )
    .await;

    let result = organizer().organize(work).await;

    assert!(result.success, "errors: {:?}", result.errors);
    assert!(result.errors.is_empty());
    assert_eq!(result.moved_files.len(), 3);

    let folder = work.join("closet").join("alice");
    assert_eq!(result.user_folder.as_deref(), Some(folder.as_path()));
    assert_eq!(result.final_location.as_deref(), Some(folder.as_path()));
    assert_eq!(
        files_in(&folder),
        vec!["Red_Coat_001.webp", "Red_Coat_002.webp", "Red_Coat_003.webp"]
    );

    // Contents follow the sorted source order
    let first = tokio::fs::read(folder.join("Red_Coat_001.webp")).await.unwrap();
    assert_eq!(first, b"photo_1.webp");
    assert_eq!(result.moved_files[0].new_name, "Red_Coat_001.webp");
    assert_eq!(result.moved_files[0].from, work.join("photo_1.webp"));

    assert!(!work.join("photo_1.webp").exists(), "photos are moved, not copied");
}

#[tokio::test]
async fn ordering_is_lexicographic() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    seed_work_dir(work, red_coat(), &["photo_2.jpg", "photo_10.jpg", "photo_1.jpg"]).await;

    let result = organizer().organize(work).await;

    let sources: Vec<String> = result
        .moved_files
        .iter()
        .map(|f| f.from.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(sources, vec!["photo_1.jpg", "photo_10.jpg", "photo_2.jpg"]);
}

#[tokio::test]
async fn original_extensions_are_kept() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    seed_work_dir(work, red_coat(), &["photo_1.jpeg", "photo_2.png"]).await;

    let result = organizer().organize(work).await;

    assert!(result.success);
    assert_eq!(
        files_in(&work.join("closet").join("alice")),
        vec!["Red_Coat_001.jpeg", "Red_Coat_002.png"]
    );
}

#[tokio::test]
async fn non_photo_files_are_left_alone() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    seed_work_dir(
        work,
        red_coat(),
        &["photo_1.webp", "photo_2.gif", "avatar.jpg", "photo_3.WEBP", "notes.txt"],
    )
    .await;
    tokio::fs::create_dir(work.join("photo_dir.webp")).await.unwrap();

    let result = organizer().organize(work).await;

    assert_eq!(result.moved_files.len(), 1);
    assert!(work.join("photo_2.gif").exists());
    assert!(work.join("avatar.jpg").exists());
    assert!(work.join("photo_3.WEBP").exists());
    assert!(work.join("photo_dir.webp").is_dir());
}

#[tokio::test]
async fn second_run_gains_dup_suffixes() {
    let temp_dir = TempDir::new().unwrap();
    let closet = temp_dir.path().join("closet");
    let config = OrganizerConfig {
        closet_dir: Some(closet.clone()),
        ..Default::default()
    };
    let organizer = FileOrganizer::new(config);

    let first = temp_dir.path().join("work_1");
    let second = temp_dir.path().join("work_2");
    seed_work_dir(&first, red_coat(), &["photo_1.webp", "photo_2.webp"]).await;
    seed_work_dir(&second, red_coat(), &["photo_1.webp", "photo_2.webp"]).await;

    let r1 = organizer.organize(&first).await;
    let r2 = organizer.organize(&second).await;

    assert!(r1.success && r2.success);
    assert_eq!(
        files_in(&closet),
        vec![
            "Red_Coat_001.webp",
            "Red_Coat_001_dup1.webp",
            "Red_Coat_002.webp",
            "Red_Coat_002_dup1.webp",
        ]
    );
    assert_eq!(r2.moved_files[0].new_name, "Red_Coat_001_dup1.webp");
    assert_eq!(
        files_in(&closet).len(),
        r1.moved_count() + r2.moved_count(),
        "every moved file is still on disk"
    );
}

#[tokio::test]
async fn repeated_collisions_count_up() {
    let temp_dir = TempDir::new().unwrap();
    let closet = temp_dir.path().join("closet");
    let organizer = FileOrganizer::new(OrganizerConfig {
        closet_dir: Some(closet.clone()),
        ..Default::default()
    });

    for run in 0..3 {
        let work = temp_dir.path().join(format!("work_{run}"));
        seed_work_dir(&work, red_coat(), &["photo_1.webp"]).await;
        assert!(organizer.organize(&work).await.success);
    }

    assert_eq!(
        files_in(&closet.join("alice")),
        vec!["Red_Coat_001.webp", "Red_Coat_001_dup1.webp", "Red_Coat_001_dup2.webp"]
    );
}

#[tokio::test]
async fn missing_metadata_touches_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    tokio::fs::write(work.join("photo_1.webp"), b"x").await.unwrap();

    let result = organizer().organize(work).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("metadata document not found"));
    assert!(result.user_folder.is_none());
    assert!(!work.join("closet").exists());
    assert!(work.join("photo_1.webp").exists());
}

#[tokio::test]
async fn malformed_metadata_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    tokio::fs::write(work.join("item.json"), b"{ not json").await.unwrap();

    let result = organizer().organize(work).await;

    assert!(!result.success);
    assert!(result.errors[0].starts_with("invalid metadata document"));
    assert!(!work.join("closet").exists());
}

#[tokio::test]
async fn missing_identity_reports_all_errors_without_mutation() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    seed_work_dir(work, json!({"price": "10.00"}), &["photo_1.webp"]).await;

    let result = organizer().organize(work).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 2, "errors: {:?}", result.errors);
    assert!(result.errors[0].contains("seller username not found"));
    assert_eq!(result.errors[1], "title not found in metadata");
    assert!(result.moved_files.is_empty());
    assert!(!work.join("closet").exists());
    assert!(work.join("photo_1.webp").exists());
}

#[tokio::test]
async fn missing_title_alone_stops_before_mutation() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    seed_work_dir(work, json!({"login": "bob"}), &["photo_1.webp"]).await;

    let result = organizer().organize(work).await;

    assert!(!result.success);
    assert_eq!(result.errors, vec!["title not found in metadata".to_string()]);
    assert!(!work.join("closet").exists());
}

#[tokio::test]
async fn zero_photos_is_not_success() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    seed_work_dir(work, red_coat(), &[]).await;

    let result = organizer().organize(work).await;

    assert!(!result.success);
    assert!(result.errors[0].starts_with("no photo files found"));
    assert!(result.final_location.is_none());
    // The seller folder is created before photos are listed
    assert!(work.join("closet").join("alice").is_dir());
}

#[tokio::test]
async fn names_are_normalized_and_raw_values_reported() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    seed_work_dir(
        work,
        json!({"title": "Giacca  di pelle (nera)!", "seller": {"login": "mario.rossi_88"}}),
        &["photo_1.webp"],
    )
    .await;

    let result = organizer().organize(work).await;

    assert!(result.success);
    assert_eq!(result.username.as_deref(), Some("mario.rossi_88"));
    assert_eq!(result.title.as_deref(), Some("Giacca  di pelle (nera)!"));
    assert_eq!(
        files_in(&work.join("closet").join("mariorossi_88")),
        vec!["Giacca_di_pelle_nera_001.webp"]
    );
}

#[tokio::test]
async fn unusable_names_fall_back_to_unknown() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    seed_work_dir(
        work,
        json!({"title": "!!!", "user": {"login": "***"}}),
        &["photo_1.webp"],
    )
    .await;

    let result = organizer().organize(work).await;

    assert!(result.success);
    assert_eq!(
        files_in(&work.join("closet").join("unknown")),
        vec!["unknown_001.webp"]
    );
}

#[tokio::test]
async fn existing_seller_folder_is_merged_into() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    let folder = work.join("closet").join("alice");
    tokio::fs::create_dir_all(&folder).await.unwrap();
    tokio::fs::write(folder.join("Old_Bag_001.jpg"), b"old").await.unwrap();
    seed_work_dir(work, red_coat(), &["photo_1.webp"]).await;

    let result = organizer().organize(work).await;

    assert!(result.success);
    assert_eq!(files_in(&folder), vec!["Old_Bag_001.jpg", "Red_Coat_001.webp"]);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn per_file_failure_does_not_abort_remaining_files() {
    let temp_dir = TempDir::new().unwrap();
    let work = temp_dir.path();
    // 247 + "_001.png" is exactly 255 bytes; the ".webp" name is one byte too long
    let title = "a".repeat(247);
    seed_work_dir(
        work,
        json!({"title": &title, "login": "alice"}),
        &["photo_1.png", "photo_2.webp", "photo_3.png"],
    )
    .await;
    let organizer = FileOrganizer::new(OrganizerConfig {
        max_name_length: 300,
        ..Default::default()
    });

    let result = organizer.organize(work).await;

    assert!(result.success, "partial failure still completes");
    assert_eq!(result.moved_files.len(), 3);
    assert_eq!(result.moved_count(), 2);
    assert_eq!(result.failed_count(), 1);

    let failed = &result.moved_files[1];
    assert!(failed.is_failed());
    assert!(failed.to.starts_with("ERROR: "));
    assert_eq!(failed.new_name, "ERROR");
    assert_eq!(result.errors.len(), 1);

    assert!(work.join("photo_2.webp").exists(), "failed file stays in place");
    assert_eq!(result.moved_files[2].new_name, format!("{title}_003.png"));
}
