mod common;

use aws_sdk_s3::primitives::ByteStream;
use common::*;
use pretty_assertions::assert_eq;
use storage_gateway::RemoveObjectsOutcome;

async fn upload(ctx: &TestContext, key: &str, data: &'static [u8]) {
    let uploaded = ctx
        .gateway
        .put_object(
            &ctx.bucket_name,
            key,
            ByteStream::from_static(data),
            Some("text/plain"),
        )
        .await
        .expect("Failed to upload object");
    assert!(uploaded, "upload of {key} should succeed");
}

#[tokio::test]
async fn test_put_then_stat_reports_size() {
    let ctx = TestContext::with_bucket().await;
    let data = b"hello object storage";

    upload(&ctx, "k", data).await;

    let stat = ctx
        .gateway
        .stat_object(&ctx.bucket_name, "k")
        .await
        .unwrap()
        .expect("object should exist");
    assert_eq!(stat.size, data.len() as u64);
    assert_eq!(stat.content_type.as_deref(), Some("text/plain"));
}

#[tokio::test]
async fn test_put_object_default_content_type() {
    let ctx = TestContext::with_bucket().await;

    assert!(ctx
        .gateway
        .put_object(
            &ctx.bucket_name,
            "blob.bin",
            ByteStream::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            None,
        )
        .await
        .unwrap());

    let stat = ctx
        .gateway
        .stat_object(&ctx.bucket_name, "blob.bin")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stat.content_type.as_deref(), Some("application/octet-stream"));
}

#[tokio::test]
async fn test_put_object_missing_bucket_returns_false() {
    let ctx = TestContext::new().await;

    let uploaded = ctx
        .gateway
        .put_object(
            &ctx.bucket_name,
            "k",
            ByteStream::from_static(b"data"),
            None,
        )
        .await
        .unwrap();
    assert!(!uploaded);
}

#[tokio::test]
async fn test_get_object_roundtrip_and_missing() {
    let ctx = TestContext::with_bucket().await;
    upload(&ctx, "greeting.txt", b"hello world").await;

    let stream = ctx
        .gateway
        .get_object(&ctx.bucket_name, "greeting.txt")
        .await
        .unwrap()
        .expect("object should be readable");
    let bytes = stream.collect().await.unwrap().into_bytes();
    assert_eq!(bytes.as_ref(), b"hello world");

    assert!(ctx
        .gateway
        .get_object(&ctx.bucket_name, "missing.txt")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_get_object_range() {
    let ctx = TestContext::with_bucket().await;
    upload(&ctx, "greeting.txt", b"hello world").await;

    let stream = ctx
        .gateway
        .get_object_range(&ctx.bucket_name, "greeting.txt", 6, Some(5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stream.collect().await.unwrap().into_bytes().as_ref(), b"world");

    let stream = ctx
        .gateway
        .get_object_range(&ctx.bucket_name, "greeting.txt", 6, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stream.collect().await.unwrap().into_bytes().as_ref(), b"world");
}

#[tokio::test]
async fn test_download_object_to_file() {
    let ctx = TestContext::with_bucket().await;
    upload(&ctx, "report.csv", b"id,value\n1,42\n").await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");

    assert!(ctx
        .gateway
        .download_object(&ctx.bucket_name, "report.csv", &path)
        .await
        .unwrap());
    assert_eq!(std::fs::read(&path).unwrap(), b"id,value\n1,42\n");

    let missing = dir.path().join("missing.csv");
    assert!(!ctx
        .gateway
        .download_object(&ctx.bucket_name, "missing.csv", &missing)
        .await
        .unwrap());
    assert!(!missing.exists());
}

#[tokio::test]
async fn test_list_object_names() {
    let ctx = TestContext::with_bucket().await;
    upload(&ctx, "a.txt", b"a").await;
    upload(&ctx, "nested/b.txt", b"b").await;

    let mut names = ctx
        .gateway
        .list_object_names(&ctx.bucket_name)
        .await
        .unwrap();
    names.sort();
    assert_eq!(names, vec!["a.txt".to_string(), "nested/b.txt".to_string()]);

    let missing = unique_bucket_name();
    assert!(ctx.gateway.list_object_names(&missing).await.unwrap().is_empty());
    assert_eq!(ctx.gateway.list_objects(&missing).await.unwrap(), None);
}

#[tokio::test]
async fn test_remove_object() {
    let ctx = TestContext::with_bucket().await;
    upload(&ctx, "a.txt", b"a").await;

    assert!(ctx.gateway.remove_object(&ctx.bucket_name, "a.txt").await.unwrap());
    assert!(ctx
        .gateway
        .stat_object(&ctx.bucket_name, "a.txt")
        .await
        .unwrap()
        .is_none());

    // No object existence check
    assert!(ctx
        .gateway
        .remove_object(&ctx.bucket_name, "never-existed.txt")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_remove_objects() {
    let ctx = TestContext::with_bucket().await;
    upload(&ctx, "k1", b"one").await;
    upload(&ctx, "k2", b"two").await;

    let outcome = ctx
        .gateway
        .remove_objects(&ctx.bucket_name, ["k1", "k2"])
        .await
        .unwrap();
    assert_eq!(outcome, RemoveObjectsOutcome::Completed { failed: vec![] });
    assert!(ctx
        .gateway
        .list_object_names(&ctx.bucket_name)
        .await
        .unwrap()
        .is_empty());

    // S3 treats deleting an absent key as success
    upload(&ctx, "k2", b"two").await;
    let outcome = ctx
        .gateway
        .remove_objects(&ctx.bucket_name, ["k1", "k2"])
        .await
        .unwrap();
    assert!(outcome.failed_keys().is_empty());
}

#[tokio::test]
async fn test_remove_objects_missing_bucket() {
    let ctx = TestContext::new().await;

    let outcome = ctx
        .gateway
        .remove_objects(&ctx.bucket_name, ["k1"])
        .await
        .unwrap();
    assert_eq!(outcome, RemoveObjectsOutcome::BucketMissing);
}

#[tokio::test]
async fn test_object_url() {
    let ctx = TestContext::with_bucket().await;

    let url = ctx
        .gateway
        .object_url(&ctx.bucket_name, "images/cat.png")
        .await
        .unwrap();
    assert_eq!(
        url,
        Some(format!(
            "{LOCALSTACK_ENDPOINT}/{}/images/cat.png",
            ctx.bucket_name
        ))
    );

    let missing = unique_bucket_name();
    assert_eq!(ctx.gateway.object_url(&missing, "a").await.unwrap(), None);
}
