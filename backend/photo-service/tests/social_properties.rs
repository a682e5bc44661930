/// Store and service behaviour over the in-memory backend
mod common;

use std::time::Duration;
use uuid::Uuid;

use photo_service::db::SocialGraphRepository;
use photo_service::models::Principal;
use photo_service::services::UploadFile;
use photo_service::validators::RegisterInput;
use photo_service::AppError;

#[tokio::test]
async fn test_second_registration_with_same_email_fails() {
    let ctx = common::setup().await;
    let input = |username: &str| RegisterInput {
        username: username.to_string(),
        email: "same@example.com".to_string(),
        password: "hunter22".to_string(),
    };

    ctx.state.credentials.register(input("first")).await.unwrap();
    let err = ctx.state.credentials.register(input("second")).await.unwrap_err();
    assert!(err.is_duplicate_credential());
}

#[tokio::test]
async fn test_toggle_like_flips_and_restores() {
    let ctx = common::setup().await;
    let alice = common::seed_principal(&ctx.store, "alice").await;
    let photo = ctx.store.create_photo(alice.user_id, "cat_1.png").await.unwrap();

    let first = ctx.state.photos.toggle_like(&alice, photo.id).await.unwrap();
    assert!(first.liked);
    assert!(ctx.store.has_liked(alice.user_id, photo.id).await.unwrap());

    let second = ctx.state.photos.toggle_like(&alice, photo.id).await.unwrap();
    assert!(!second.liked);
    assert!(!ctx.store.has_liked(alice.user_id, photo.id).await.unwrap());
    assert_eq!(ctx.store.count_likes(photo.id).await.unwrap(), 0);
}

/// Toggle from `n` separate tasks and count how many ended liked
async fn spawn_toggles(
    ctx: &common::TestContext,
    viewer: &Principal,
    photo_id: Uuid,
    n: usize,
) -> usize {
    let handles: Vec<_> = (0..n)
        .map(|_| {
            let photos = ctx.state.photos.clone();
            let viewer = viewer.clone();
            tokio::spawn(async move { photos.toggle_like(&viewer, photo_id).await })
        })
        .collect();

    let mut liked = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().liked {
            liked += 1;
        }
    }
    liked
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_toggles_never_duplicate() {
    let ctx = common::setup().await;
    let alice = common::seed_principal(&ctx.store, "alice").await;
    let photo = ctx.store.create_photo(alice.user_id, "cat_1.png").await.unwrap();

    // One of them liked, the other undid it
    assert_eq!(spawn_toggles(&ctx, &alice, photo.id, 2).await, 1);
    assert_eq!(ctx.store.count_likes(photo.id).await.unwrap(), 0);

    // Odd count leaves exactly one like behind
    assert_eq!(spawn_toggles(&ctx, &alice, photo.id, 9).await, 5);
    assert_eq!(ctx.store.count_likes(photo.id).await.unwrap(), 1);
    assert!(ctx.store.has_liked(alice.user_id, photo.id).await.unwrap());
}

#[tokio::test]
async fn test_delete_removes_likes_and_comments() {
    let ctx = common::setup().await;
    let alice = common::seed_principal(&ctx.store, "alice").await;
    let bob = common::seed_principal(&ctx.store, "bob").await;

    let photo = ctx
        .state
        .photos
        .upload(
            &alice,
            vec![UploadFile {
                original_name: "cat.png".into(),
                bytes: bytes::Bytes::from_static(b"meow"),
            }],
        )
        .await
        .unwrap()
        .remove(0);

    ctx.state.photos.toggle_like(&bob, photo.id).await.unwrap();
    ctx.state.photos.add_comment(&bob, photo.id, "nice!").await.unwrap();

    ctx.state.photos.delete_photo(&alice, photo.id).await.unwrap();

    assert_eq!(ctx.store.count_likes(photo.id).await.unwrap(), 0);
    assert!(ctx.store.list_comments(photo.id).await.unwrap().is_empty());
    assert!(!ctx.media.path_for(&photo.file_name).exists());
}

#[tokio::test]
async fn test_non_owner_delete_is_forbidden() {
    let ctx = common::setup().await;
    let alice = common::seed_principal(&ctx.store, "alice").await;
    let bob = common::seed_principal(&ctx.store, "bob").await;
    let photo = ctx.store.create_photo(alice.user_id, "cat_1.png").await.unwrap();

    let err = ctx.state.photos.delete_photo(&bob, photo.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert!(ctx.store.find_photo(photo.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_photos_listed_newest_first() {
    let ctx = common::setup().await;
    let alice = common::seed_principal(&ctx.store, "alice").await;

    let mut created = Vec::new();
    for name in ["t1.png", "t2.png", "t3.png"] {
        created.push(ctx.store.create_photo(alice.user_id, name).await.unwrap().id);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let listed: Vec<Uuid> = ctx
        .store
        .list_photos_by_recency()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    created.reverse();
    assert_eq!(listed, created);
}

#[tokio::test]
async fn test_comment_visible_to_owner_and_author() {
    let ctx = common::setup().await;
    let alice = common::seed_principal(&ctx.store, "alice").await;
    let bob = common::seed_principal(&ctx.store, "bob").await;
    let photo = ctx.store.create_photo(alice.user_id, "cat_1.png").await.unwrap();

    ctx.state.photos.add_comment(&bob, photo.id, "nice!").await.unwrap();

    let for_alice = ctx.state.feed.build_feed(alice.user_id).await.unwrap();
    let for_bob = ctx.state.feed.build_feed(bob.user_id).await.unwrap();

    assert_eq!(for_alice[0].comments, for_bob[0].comments);
    assert_eq!(for_alice[0].comments[0].content, "nice!");
    assert_eq!(for_alice[0].comments[0].author_id, bob.user_id);
    assert_eq!(for_alice[0].comments[0].author_username, "bob");
}
