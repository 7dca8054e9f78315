#![allow(missing_docs)]

mod support;

use platter::{ApiError, StagingArea, images::staged_extension};
use support::{bytes_stream, cleanup, dir_is_empty, temp_root};

#[test]
fn extension_defaults_to_jpg() {
    assert_eq!(staged_extension(None), "jpg");
    assert_eq!(staged_extension(Some("photo")), "jpg");
    assert_eq!(staged_extension(Some("photo.")), "jpg");
}

#[test]
fn extension_is_sanitized_and_lowercased() {
    assert_eq!(staged_extension(Some("photo.PNG")), "png");
    assert_eq!(staged_extension(Some("archive.tar.gz")), "gz");
    assert_eq!(staged_extension(Some("..\\evil?.P~NG")), "png");
    assert_eq!(staged_extension(Some("shot.???")), "jpg");
}

#[tokio::test]
async fn staged_names_are_prefixed_and_carry_the_extension() {
    let root = temp_root("names");
    let staging = StagingArea::new(&root, 1024);

    let staged = staging
        .stage(None, bytes_stream(vec![b"bytes".to_vec()]))
        .await
        .expect("staging should succeed");

    let file_name = staged
        .path()
        .file_name()
        .and_then(|name| name.to_str())
        .expect("staged file name should be valid UTF-8")
        .to_owned();
    assert!(file_name.starts_with("menu-item-"));
    assert!(file_name.ends_with(".jpg"));
    assert!(!file_name.contains(".."));

    staged.remove().await;
    cleanup(root).await;
}

#[tokio::test]
async fn staged_contents_read_back_verbatim() {
    let root = temp_root("read");
    let staging = StagingArea::new(&root, 1024);

    let staged = staging
        .stage(
            Some("split.png"),
            bytes_stream(vec![b"first-".to_vec(), b"second".to_vec()]),
        )
        .await
        .expect("staging should succeed");

    assert_eq!(staged.size(), 12);
    let contents = staged.read().await.expect("read should succeed");
    assert_eq!(contents, b"first-second");

    staged.remove().await;
    assert!(dir_is_empty(&root).await);
    cleanup(root).await;
}

#[tokio::test]
async fn ceiling_is_enforced_mid_stream_and_partial_file_removed() {
    let root = temp_root("ceiling");
    let staging = StagingArea::new(&root, 8);

    let err = staging
        .stage(
            Some("big.png"),
            bytes_stream(vec![vec![0u8; 5], vec![0u8; 5]]),
        )
        .await
        .expect_err("oversize staging should fail");

    assert!(matches!(err, ApiError::PayloadTooLarge { max_bytes: 8 }));
    assert!(dir_is_empty(&root).await, "partial file should be removed");
    cleanup(root).await;
}

#[tokio::test]
async fn dropping_a_staged_file_removes_it() {
    let root = temp_root("drop");
    let staging = StagingArea::new(&root, 1024);

    let staged = staging
        .stage(None, bytes_stream(vec![b"bytes".to_vec()]))
        .await
        .expect("staging should succeed");
    let path = staged.path().to_path_buf();
    assert!(path.exists());

    drop(staged);
    assert!(!path.exists(), "drop should remove the staged file");
    cleanup(root).await;
}

#[tokio::test]
async fn stream_errors_propagate_and_leave_nothing_behind() {
    let root = temp_root("stream-error");
    let staging = StagingArea::new(&root, 1024);

    let chunks: Vec<Result<bytes::Bytes, ApiError>> = vec![
        Ok(bytes::Bytes::from_static(b"partial")),
        Err(ApiError::Multipart("connection reset".to_owned())),
    ];
    let err = staging
        .stage(Some("torn.png"), futures::stream::iter(chunks))
        .await
        .expect_err("staging a failing stream should fail");

    assert!(matches!(err, ApiError::Multipart(_)));
    assert!(dir_is_empty(&root).await, "partial file should be removed");
    cleanup(root).await;
}
