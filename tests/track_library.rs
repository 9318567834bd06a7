//! End-to-end tests over the on-disk track library.

use std::fs;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rstest::*;

use soundtrack::library::{slug, LibraryError, TrackLibrary, INDEX_FILE};

#[fixture]
fn workspace() -> (tempfile::TempDir, TrackLibrary) {
    let dir = tempfile::tempdir().expect("tempdir");
    let lib = TrackLibrary::open(dir.path().to_path_buf()).expect("open library");
    (dir, lib)
}

#[rstest]
#[case("Boss Fight!", "boss-fight")]
#[case("Tavern", "tavern")]
#[case("épée Duel", "épée-duel")]
#[case("a  b", "a-b")]
fn slugs_are_filesystem_safe(#[case] title: &str, #[case] expected: &str) {
    assert_eq!(slug(title), expected);
}

#[rstest]
#[tokio::test]
async fn full_lifecycle_survives_reopen(workspace: (tempfile::TempDir, TrackLibrary)) {
    let (dir, lib) = workspace;

    lib.add("Tavern", b"intro-bytes", b"loop-bytes", Duration::from_secs(3))
        .await
        .unwrap();
    lib.add("Boss Fight", b"i2", b"l2", Duration::ZERO)
        .await
        .unwrap();
    lib.rename("Boss Fight", "Final Boss").await.unwrap();
    lib.remove("Tavern").await.unwrap();

    // Reload from disk as a fresh process would.
    let reopened = TrackLibrary::open(dir.path().to_path_buf()).unwrap();
    assert_eq!(reopened.len().await, 1);

    let entry = reopened.entry("Final Boss").await.unwrap();
    assert_eq!(fs::read(&entry.intro).unwrap(), b"i2");
    assert_eq!(fs::read(&entry.loop_file).unwrap(), b"l2");
    assert!(reopened.entry("Tavern").await.is_none());
    assert!(reopened.entry("Boss Fight").await.is_none());

    // Only the surviving track's blobs remain next to the index.
    let mut files: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(
        files,
        vec![
            "final-boss_intro.mp3".to_owned(),
            "final-boss_loop.mp3".to_owned(),
            INDEX_FILE.to_owned(),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn index_is_yaml_keyed_by_title(workspace: (tempfile::TempDir, TrackLibrary)) {
    let (dir, lib) = workspace;
    lib.add("Tavern", b"i", b"l", Duration::from_secs(5))
        .await
        .unwrap();

    let raw = fs::read_to_string(dir.path().join(INDEX_FILE)).unwrap();
    let parsed: serde_yaml::Value = serde_yaml::from_str(&raw).unwrap();
    let entry = &parsed["Tavern"];

    assert_eq!(entry["delay"].as_str(), Some("5s"));
    assert!(entry["intro"]
        .as_str()
        .unwrap()
        .ends_with("tavern_intro.mp3"));
    assert!(entry["loop"].as_str().unwrap().ends_with("tavern_loop.mp3"));
}

#[rstest]
#[tokio::test]
async fn titles_sharing_a_slug_cannot_clobber_each_other(
    workspace: (tempfile::TempDir, TrackLibrary),
) {
    let (_dir, lib) = workspace;
    let boss = lib
        .add("Boss Fight", b"boss-intro", b"boss-loop", Duration::ZERO)
        .await
        .unwrap();
    lib.add("Tavern", b"t-i", b"t-l", Duration::ZERO).await.unwrap();

    // Both mutation paths reject a second title with the same slug.
    assert!(matches!(
        lib.add("boss fight!", b"x", b"y", Duration::ZERO).await,
        Err(LibraryError::SlugCollision { ref existing, .. }) if existing == "Boss Fight"
    ));
    assert!(matches!(
        lib.rename("Tavern", "BOSS-FIGHT").await,
        Err(LibraryError::SlugCollision { ref existing, .. }) if existing == "Boss Fight"
    ));

    // The original audio is untouched and removing one title can never
    // take another title's files with it.
    lib.remove("Tavern").await.unwrap();
    assert_eq!(fs::read(&boss.intro).unwrap(), b"boss-intro");
    assert_eq!(fs::read(&boss.loop_file).unwrap(), b"boss-loop");
}

#[rstest]
#[tokio::test]
async fn errors_carry_the_offending_title(workspace: (tempfile::TempDir, TrackLibrary)) {
    let (_dir, lib) = workspace;
    lib.add("Tavern", b"i", b"l", Duration::ZERO).await.unwrap();

    let err = lib.add("Tavern", b"i", b"l", Duration::ZERO).await;
    assert!(
        matches!(err, Err(LibraryError::DuplicateTitle(ref t)) if t == "Tavern"),
        "unexpected: {err:?}"
    );

    let err = lib.remove("Missing").await;
    assert!(matches!(err, Err(LibraryError::NotFound(ref t)) if t == "Missing"));
}
