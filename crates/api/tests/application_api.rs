//! HTTP-level integration tests for the application lifecycle: submission,
//! owner CRUD, and the staff workflow transitions.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_admin, create_user, delete_auth, fake_png, get_auth, login,
    post_json_auth, post_multipart_auth, put_multipart_auth, seed_application, seed_category,
    MultipartForm,
};
use sqlx::PgPool;
use atelier_db::repositories::ApplicationRepo;

/// A valid create form for the given category.
fn application_form(category_id: i64) -> MultipartForm {
    MultipartForm::new()
        .text("title", "Kitchen redesign")
        .text("category_id", &category_id.to_string())
        .text("description", "Scandinavian style, light wood")
        .file("image", "kitchen.png", "image/png", &fake_png())
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_returns_201_with_status_new(pool: PgPool) {
    let _user = create_user(&pool, "maria").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let token = login(build_test_app(pool.clone()), "maria").await;

    let app = build_test_app(pool);
    let response =
        post_multipart_auth(app, "/api/v1/applications", application_form(category.id), &token)
            .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["title"], "Kitchen redesign");
    assert_eq!(json["status"], "new");
    assert!(json["admin_comment"].is_null());
    assert!(json["design_image_path"].is_null());
    assert!(
        json["image_path"].as_str().unwrap().contains("maria"),
        "upload path should be namespaced by owner"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_without_image_is_rejected(pool: PgPool) {
    let _user = create_user(&pool, "noimage").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let token = login(build_test_app(pool.clone()), "noimage").await;

    let form = MultipartForm::new()
        .text("title", "No picture")
        .text("category_id", &category.id.to_string())
        .text("description", "");
    let app = build_test_app(pool.clone());
    let response = post_multipart_auth(app, "/api/v1/applications", form, &token).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["fields"]["image"].is_array());

    // Nothing was persisted.
    let filter = Default::default();
    let all = ApplicationRepo::report(&pool, &filter).await.unwrap();
    assert!(all.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn oversize_image_is_rejected(pool: PgPool) {
    let _user = create_user(&pool, "bigfile").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let token = login(build_test_app(pool.clone()), "bigfile").await;

    let oversized = vec![0u8; 2 * 1024 * 1024 + 1];
    let form = MultipartForm::new()
        .text("title", "Too big")
        .text("category_id", &category.id.to_string())
        .text("description", "")
        .file("image", "big.png", "image/png", &oversized);
    let app = build_test_app(pool);
    let response = post_multipart_auth(app, "/api/v1/applications", form, &token).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["fields"]["image"].is_array());
}

#[sqlx::test(migrations = "../../migrations")]
async fn unsupported_image_type_is_rejected(pool: PgPool) {
    let _user = create_user(&pool, "gifuser").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let token = login(build_test_app(pool.clone()), "gifuser").await;

    let form = MultipartForm::new()
        .text("title", "Animated")
        .text("category_id", &category.id.to_string())
        .text("description", "")
        .file("image", "anim.gif", "image/gif", &fake_png());
    let app = build_test_app(pool);
    let response = post_multipart_auth(app, "/api/v1/applications", form, &token).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_with_unknown_category_returns_404(pool: PgPool) {
    let _user = create_user(&pool, "badcat").await;
    let token = login(build_test_app(pool.clone()), "badcat").await;

    let app = build_test_app(pool);
    let response =
        post_multipart_auth(app, "/api/v1/applications", application_form(9999), &token).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_requires_authentication(pool: PgPool) {
    let category = seed_category(&pool, "Кухни", "kitchens").await;

    let app = build_test_app(pool);
    let response =
        post_multipart_auth(app, "/api/v1/applications", application_form(category.id), "garbage")
            .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Dashboard and detail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn dashboard_shows_only_own_applications(pool: PgPool) {
    let alice = create_user(&pool, "alice").await;
    let bob = create_user(&pool, "bob").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    seed_application(&pool, alice.id, category.id, "Alice kitchen").await;
    seed_application(&pool, bob.id, category.id, "Bob kitchen").await;

    let token = login(build_test_app(pool.clone()), "alice").await;
    let app = build_test_app(pool);
    let response = get_auth(app, "/api/v1/applications", &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], "Alice kitchen");
}

#[sqlx::test(migrations = "../../migrations")]
async fn dashboard_status_filter_and_unknown_status(pool: PgPool) {
    let user = create_user(&pool, "filterer").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let first = seed_application(&pool, user.id, category.id, "First").await;
    seed_application(&pool, user.id, category.id, "Second").await;
    ApplicationRepo::set_in_progress(&pool, first.id, "Taking this one")
        .await
        .unwrap()
        .unwrap();

    let token = login(build_test_app(pool.clone()), "filterer").await;

    let app = build_test_app(pool.clone());
    let response = get_auth(app, "/api/v1/applications?status=in_progress", &token).await;
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["title"], "First");

    // Unknown status values fall back to the unfiltered listing.
    let app = build_test_app(pool);
    let response = get_auth(app, "/api/v1/applications?status=bogus", &token).await;
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn detail_is_visible_to_owner_and_admin_only(pool: PgPool) {
    let owner = create_user(&pool, "owner").await;
    let _other = create_user(&pool, "stranger").await;
    let _admin = create_admin(&pool, "boss").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let application = seed_application(&pool, owner.id, category.id, "Private").await;
    let path = format!("/api/v1/applications/{}", application.id);

    let owner_token = login(build_test_app(pool.clone()), "owner").await;
    let response = get_auth(build_test_app(pool.clone()), &path, &owner_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let admin_token = login(build_test_app(pool.clone()), "boss").await;
    let response = get_auth(build_test_app(pool.clone()), &path, &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let stranger_token = login(build_test_app(pool.clone()), "stranger").await;
    let response = get_auth(build_test_app(pool), &path, &stranger_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_application_returns_404(pool: PgPool) {
    let _user = create_user(&pool, "seeker").await;
    let token = login(build_test_app(pool.clone()), "seeker").await;

    let response = get_auth(build_test_app(pool), "/api/v1/applications/424242", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Owner edit and delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn owner_can_edit_while_new(pool: PgPool) {
    let user = create_user(&pool, "editor").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let application = seed_application(&pool, user.id, category.id, "Old title").await;
    let token = login(build_test_app(pool.clone()), "editor").await;

    let form = MultipartForm::new()
        .text("title", "New title")
        .text("category_id", &category.id.to_string())
        .text("description", "updated");
    let path = format!("/api/v1/applications/{}", application.id);
    let response = put_multipart_auth(build_test_app(pool), &path, form, &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["title"], "New title");
    // No new image in the form keeps the existing upload.
    assert_eq!(json["image_path"], application.image_path.unwrap().as_str());
}

#[sqlx::test(migrations = "../../migrations")]
async fn edit_after_acceptance_returns_409(pool: PgPool) {
    let user = create_user(&pool, "lateedit").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let application = seed_application(&pool, user.id, category.id, "Locked").await;
    ApplicationRepo::set_in_progress(&pool, application.id, "In work")
        .await
        .unwrap()
        .unwrap();
    let token = login(build_test_app(pool.clone()), "lateedit").await;

    let form = MultipartForm::new()
        .text("title", "Changed")
        .text("category_id", &category.id.to_string())
        .text("description", "");
    let path = format!("/api/v1/applications/{}", application.id);
    let response = put_multipart_auth(build_test_app(pool), &path, form, &token).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../migrations")]
async fn only_the_owner_may_edit(pool: PgPool) {
    let owner = create_user(&pool, "realowner").await;
    let _other = create_user(&pool, "impostor").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let application = seed_application(&pool, owner.id, category.id, "Mine").await;
    let token = login(build_test_app(pool.clone()), "impostor").await;

    let form = MultipartForm::new()
        .text("title", "Hijacked")
        .text("category_id", &category.id.to_string())
        .text("description", "");
    let path = format!("/api/v1/applications/{}", application.id);
    let response = put_multipart_auth(build_test_app(pool), &path, form, &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../migrations")]
async fn owner_can_delete_while_new_but_not_after(pool: PgPool) {
    let user = create_user(&pool, "deleter").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let fresh = seed_application(&pool, user.id, category.id, "Fresh").await;
    let taken = seed_application(&pool, user.id, category.id, "Taken").await;
    ApplicationRepo::set_in_progress(&pool, taken.id, "Started")
        .await
        .unwrap()
        .unwrap();
    let token = login(build_test_app(pool.clone()), "deleter").await;

    let path = format!("/api/v1/applications/{}", fresh.id);
    let response = delete_auth(build_test_app(pool.clone()), &path, &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let path = format!("/api/v1/applications/{}", taken.id);
    let response = delete_auth(build_test_app(pool), &path, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

/// Replacing the image during an edit removes the superseded file from the
/// media store.
#[sqlx::test(migrations = "../../migrations")]
async fn replacing_the_image_removes_the_old_file(pool: PgPool) {
    let _user = create_user(&pool, "swapper").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let config = common::test_config();
    let media_root = config.media_root.clone();
    let app = common::build_test_app_with(pool, config);
    let token = login(app.clone(), "swapper").await;

    let response = post_multipart_auth(
        app.clone(),
        "/api/v1/applications",
        application_form(category.id),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    let old_rel = created["image_path"].as_str().unwrap().to_string();
    assert!(media_root.join(&old_rel).exists());

    let form = MultipartForm::new()
        .text("title", "Kitchen redesign")
        .text("category_id", &category.id.to_string())
        .text("description", "better photo")
        .file("image", "kitchen2.png", "image/png", &fake_png());
    let response = put_multipart_auth(
        app.clone(),
        &format!("/api/v1/applications/{id}"),
        form,
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    let new_rel = updated["image_path"].as_str().unwrap();

    assert_ne!(new_rel, old_rel);
    assert!(media_root.join(new_rel).exists());
    assert!(
        !media_root.join(&old_rel).exists(),
        "replaced upload must be removed"
    );
}

/// Deleting an application removes its stored image with it.
#[sqlx::test(migrations = "../../migrations")]
async fn deleting_an_application_removes_its_file(pool: PgPool) {
    let _user = create_user(&pool, "shredder").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let config = common::test_config();
    let media_root = config.media_root.clone();
    let app = common::build_test_app_with(pool, config);
    let token = login(app.clone(), "shredder").await;

    let response = post_multipart_auth(
        app.clone(),
        "/api/v1/applications",
        application_form(category.id),
        &token,
    )
    .await;
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    let rel = created["image_path"].as_str().unwrap().to_string();
    assert!(media_root.join(&rel).exists());

    let response = delete_auth(app, &format!("/api/v1/applications/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(
        !media_root.join(&rel).exists(),
        "the stored image must go with the application"
    );
}

// ---------------------------------------------------------------------------
// Workflow: accept
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn accept_requires_admin(pool: PgPool) {
    let user = create_user(&pool, "member").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let application = seed_application(&pool, user.id, category.id, "Pending").await;
    let token = login(build_test_app(pool.clone()), "member").await;

    let path = format!("/api/v1/applications/{}/accept", application.id);
    let body = serde_json::json!({ "admin_comment": "I accept my own request" });
    let response = post_json_auth(build_test_app(pool), &path, body, &token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../migrations")]
async fn accept_requires_a_comment(pool: PgPool) {
    let user = create_user(&pool, "quiet").await;
    let _admin = create_admin(&pool, "chief").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let application = seed_application(&pool, user.id, category.id, "Uncommented").await;
    let token = login(build_test_app(pool.clone()), "chief").await;

    let path = format!("/api/v1/applications/{}/accept", application.id);
    let body = serde_json::json!({ "admin_comment": "   " });
    let response = post_json_auth(build_test_app(pool.clone()), &path, body, &token).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["fields"]["admin_comment"].is_array());

    // The status did not move.
    let row = ApplicationRepo::find_by_id(&pool, application.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "new");
}

#[sqlx::test(migrations = "../../migrations")]
async fn accept_moves_new_to_in_progress_exactly_once(pool: PgPool) {
    let user = create_user(&pool, "applicant").await;
    let _admin = create_admin(&pool, "manager").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let application = seed_application(&pool, user.id, category.id, "Accept me").await;
    let token = login(build_test_app(pool.clone()), "manager").await;

    let path = format!("/api/v1/applications/{}/accept", application.id);
    let body = serde_json::json!({ "admin_comment": "Starting next week" });
    let response = post_json_auth(build_test_app(pool.clone()), &path, body.clone(), &token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "in_progress");
    assert_eq!(json["admin_comment"], "Starting next week");

    // Accepting again is a state conflict, not a silent success.
    let response = post_json_auth(build_test_app(pool), &path, body, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Workflow: complete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn complete_requires_in_progress(pool: PgPool) {
    let user = create_user(&pool, "hasty").await;
    let _admin = create_admin(&pool, "director").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let application = seed_application(&pool, user.id, category.id, "Still new").await;
    let token = login(build_test_app(pool.clone()), "director").await;

    let form = MultipartForm::new().file("design_image", "design.png", "image/png", &fake_png());
    let path = format!("/api/v1/applications/{}/complete", application.id);
    let response = post_multipart_auth(build_test_app(pool), &path, form, &token).await;

    // A new application cannot jump straight to done.
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../migrations")]
async fn complete_requires_a_design_image(pool: PgPool) {
    let user = create_user(&pool, "waiting").await;
    let _admin = create_admin(&pool, "finisher").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;
    let application = seed_application(&pool, user.id, category.id, "In work").await;
    ApplicationRepo::set_in_progress(&pool, application.id, "On it")
        .await
        .unwrap()
        .unwrap();
    let token = login(build_test_app(pool.clone()), "finisher").await;

    let form = MultipartForm::new();
    let path = format!("/api/v1/applications/{}/complete", application.id);
    let response = post_multipart_auth(build_test_app(pool), &path, form, &token).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["fields"]["design_image"].is_array());
}

/// The full lifecycle: member submits, admin accepts with a comment, admin
/// completes with a finished design, member sees the result.
#[sqlx::test(migrations = "../../migrations")]
async fn full_lifecycle_from_submission_to_done(pool: PgPool) {
    let _member = create_user(&pool, "customer").await;
    let _admin = create_admin(&pool, "designer").await;
    let category = seed_category(&pool, "Кухни", "kitchens").await;

    let member_token = login(build_test_app(pool.clone()), "customer").await;
    let admin_token = login(build_test_app(pool.clone()), "designer").await;

    // Submit.
    let response = post_multipart_auth(
        build_test_app(pool.clone()),
        "/api/v1/applications",
        application_form(category.id),
        &member_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();

    // Accept.
    let response = post_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/applications/{id}/accept"),
        serde_json::json!({ "admin_comment": "In work, ready in two weeks" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Complete.
    let form = MultipartForm::new().file("design_image", "final.jpg", "image/jpeg", &fake_png());
    let response = post_multipart_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/applications/{id}/complete"),
        form,
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let done = body_json(response).await;
    assert_eq!(done["status"], "done");
    assert!(done["design_image_path"].is_string());

    // The owner sees the finished state.
    let response = get_auth(
        build_test_app(pool),
        &format!("/api/v1/applications/{id}"),
        &member_token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["status"], "done");
    assert_eq!(json["admin_comment"], "In work, ready in two weeks");
}
