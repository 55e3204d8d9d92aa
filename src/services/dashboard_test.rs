use super::*;
use crate::services::item::ItemStore as _;
use crate::state::test_helpers;

async fn create_plain(state: &crate::state::AppState, owner: Uuid, title: &str, description: &str) -> Vec<ItemView> {
    create(state, owner, title.to_owned(), description.to_owned(), None)
        .await
        .expect("create should succeed")
}

fn upload(filename: &str, bytes: &[u8]) -> Upload {
    Upload { filename: filename.to_owned(), bytes: bytes.to_vec() }
}

#[tokio::test]
async fn create_without_file_yields_item_with_no_image() {
    let (state, _items, _media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    let view = create_plain(&state, owner, "Learn to sail", "Summer course").await;
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].title, "Learn to sail");
    assert_eq!(view[0].description, "Summer course");
    assert!(view[0].image_url.is_none());

    let listed = refresh(&state, owner).await.expect("refresh should succeed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, view[0].id);
}

#[tokio::test]
async fn create_with_file_uploads_under_owner_namespace_and_resolves_url() {
    let (state, _items, media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    let view = create(
        &state,
        owner,
        "Visit Japan".to_owned(),
        "Cherry blossom season".to_owned(),
        Some(upload("sakura.jpg", b"jpegbytes")),
    )
    .await
    .expect("create should succeed");

    let key = format!("media/{owner}/sakura.jpg");
    assert_eq!(media.stored(&key).as_deref(), Some(b"jpegbytes".as_slice()));

    assert_eq!(view.len(), 1);
    let url = view[0].image_url.as_deref().expect("image should resolve to a URL");
    assert!(url.contains(&key), "signed URL should address the object key: {url}");
}

#[tokio::test]
async fn delete_removes_exactly_that_item() {
    let (state, _items, _media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    let view = create_plain(&state, owner, "First", "one").await;
    let first = view[0].id;
    let view = create_plain(&state, owner, "Second", "two").await;
    assert_eq!(view.len(), 2);
    let second = view.iter().find(|i| i.title == "Second").expect("second item").id;

    let after = remove(&state, owner, first).await.expect("delete should succeed");
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, second);
}

#[tokio::test]
async fn delete_of_foreign_id_is_rejected_and_set_unchanged() {
    let (state, _items, _media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    create_plain(&state, owner, "Mine", "keep out").await;
    let theirs = create_plain(&state, other, "Theirs", "untouchable").await[0].id;

    let result = remove(&state, owner, theirs).await;
    assert!(matches!(result, Err(DashboardError::Items(ItemError::NotFound(_)))));

    let mine = refresh(&state, owner).await.expect("refresh should succeed");
    assert_eq!(mine.len(), 1);
    let still_theirs = refresh(&state, other).await.expect("refresh should succeed");
    assert_eq!(still_theirs.len(), 1);
    assert_eq!(still_theirs[0].id, theirs);
}

#[tokio::test]
async fn failed_resolution_publishes_no_partial_list() {
    let (state, _items, media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    create_plain(&state, owner, "No image", "plain").await;
    create(
        &state,
        owner,
        "With image".to_owned(),
        "resolves".to_owned(),
        Some(upload("photo.png", b"png")),
    )
    .await
    .expect("create should succeed");

    media.fail_signed_urls(true);
    let result = refresh(&state, owner).await;
    assert!(matches!(result, Err(DashboardError::Media(_))));

    // Nothing new was published; the pre-failure view is intact.
    let dashboards = state.dashboards.read().await;
    let dash = dashboards.get(&owner).expect("dashboard state should exist");
    assert_eq!(dash.items.len(), 2, "failed load must not publish a partial list");
    assert!(dash.items.iter().any(|i| i.image_url.is_some()));
}

#[tokio::test]
async fn stale_load_does_not_clobber_newer_publish() {
    let (state, _items, media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    let view = create(
        &state,
        owner,
        "Summit".to_owned(),
        "will be deleted mid-load".to_owned(),
        Some(upload("peak.jpg", b"jpeg")),
    )
    .await
    .expect("create should succeed");
    let item_id = view[0].id;

    // Start a load and hold it open inside image resolution, after it has
    // taken its sequence number and fetched the old one-item list.
    let gate = media.gate_next_resolution();
    let stale = tokio::spawn({
        let state = state.clone();
        async move { refresh(&state, owner).await }
    });
    gate.wait_reached().await;

    // A newer operation completes while the old load is still in flight.
    let newer = remove(&state, owner, item_id).await.expect("delete should publish the newer list");
    assert!(newer.is_empty());

    // The old load finishes last; its result must be discarded and the
    // newer published view returned instead.
    gate.release();
    let stale_view = stale
        .await
        .expect("stale load task should not panic")
        .expect("stale load should succeed");
    assert!(stale_view.is_empty(), "stale load must return the newer published view");

    let dashboards = state.dashboards.read().await;
    let dash = dashboards.get(&owner).expect("dashboard state should exist");
    assert!(dash.items.is_empty(), "stale load must not clobber the newer publish");
    assert_eq!(dash.published_seq, 3, "delete's re-list should remain the published load");
}

#[tokio::test]
async fn upload_failure_leaves_record_with_dangling_reference() {
    let (state, items, media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    media.fail_puts(true);
    let result = create(
        &state,
        owner,
        "Dangling".to_owned(),
        "upload will fail".to_owned(),
        Some(upload("lost.jpg", b"bytes")),
    )
    .await;
    assert!(matches!(result, Err(DashboardError::Media(_))));

    // The record persisted with its image reference; the object never landed.
    let rows = items.list(owner).await.expect("list should succeed");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].image.as_deref(), Some("lost.jpg"));
    assert!(media.stored(&format!("media/{owner}/lost.jpg")).is_none());
}

#[tokio::test]
async fn delete_leaves_stored_object_behind() {
    let (state, _items, media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    let view = create(
        &state,
        owner,
        "Orphan".to_owned(),
        "object outlives record".to_owned(),
        Some(upload("orphan.png", b"png")),
    )
    .await
    .expect("create should succeed");

    let after = remove(&state, owner, view[0].id).await.expect("delete should succeed");
    assert!(after.is_empty());
    assert!(
        media.stored(&format!("media/{owner}/orphan.png")).is_some(),
        "delete must not touch the object store"
    );
}

#[tokio::test]
async fn reset_drops_dashboard_state() {
    let (state, _items, _media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    create_plain(&state, owner, "Ephemeral", "view").await;
    assert!(state.dashboards.read().await.contains_key(&owner));

    reset(&state, owner).await;
    assert!(!state.dashboards.read().await.contains_key(&owner));
}

#[tokio::test]
async fn bucket_list_scenario_create_create_delete() {
    let (state, _items, _media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    let view = create_plain(&state, owner, "Climb Kilimanjaro", "2026, $5000 budget").await;
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].title, "Climb Kilimanjaro");
    assert_eq!(view[0].description, "2026, $5000 budget");
    assert!(view[0].image_url.is_none());

    let view = create(
        &state,
        owner,
        "Visit Japan".to_owned(),
        "Cherry blossom season".to_owned(),
        Some(upload("sakura.jpg", b"jpeg")),
    )
    .await
    .expect("create should succeed");
    assert_eq!(view.len(), 2);
    assert_eq!(view[1].title, "Visit Japan");
    assert!(view[1].image_url.is_some());

    let kilimanjaro = view.iter().find(|i| i.title == "Climb Kilimanjaro").expect("item").id;
    let view = remove(&state, owner, kilimanjaro).await.expect("delete should succeed");
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].title, "Visit Japan");
}

#[tokio::test]
async fn refresh_with_no_items_publishes_empty_list() {
    let (state, _items, _media) = test_helpers::test_app_state();
    let owner = Uuid::new_v4();

    let view = refresh(&state, owner).await.expect("refresh should succeed");
    assert!(view.is_empty());

    let dashboards = state.dashboards.read().await;
    let dash = dashboards.get(&owner).expect("dashboard state should exist");
    assert_eq!(dash.published_seq, 1);
}
