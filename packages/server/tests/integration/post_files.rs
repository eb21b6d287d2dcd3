use serde_json::json;

use crate::common::{ADMIN_TOKEN, TestApp, routes};

mod save_files {
    use super::*;

    #[tokio::test]
    async fn saves_rows_with_protected_files() {
        let app = TestApp::spawn().await;
        let field = app.managed_field();
        let a = app.upload(&field, "a.pdf").await;
        let b = app.upload(&field, "b.pdf").await;

        let res = app
            .put_with_token(
                &routes::post_files(1),
                &json!({"rows": [
                    {"title": "First", "desc": "Read me", "file": a},
                    {"file": b},
                ]}),
                ADMIN_TOKEN,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["post_id"], 1);
        assert_eq!(res.body["rows"], 2);
    }

    #[tokio::test]
    async fn rejects_file_outside_protected_directory() {
        let app = TestApp::spawn().await;
        let protected = app.upload(&app.managed_field(), "ok.pdf").await;
        let public = app.upload("field_cover_image", "public.pdf").await;

        let res = app
            .put_with_token(
                &routes::post_files(2),
                &json!({"rows": [{"file": protected}, {"file": public}]}),
                ADMIN_TOKEN,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(
            res.body["message"],
            "This file is not in the protected_uploads directory and may not be protected. \
             Please upload a new file or choose one from the protected_uploads directory."
        );
        assert_eq!(res.body["errors"][0]["row"], 1);
        assert_eq!(res.body["errors"][0]["field"], "file");

        // Nothing was stored, not even the valid row.
        let listed = app.get_without_token(&routes::post_files(2)).await;
        assert_eq!(listed.body["files"], json!([]));
    }

    #[tokio::test]
    async fn rejects_file_moved_out_after_upload() {
        let app = TestApp::spawn().await;
        let id = app.upload(&app.managed_field(), "moved.pdf").await;
        app.state.media.relocate(
            id,
            app.upload_dir().join("moved.pdf"),
            "https://example.com/uploads/moved.pdf".into(),
        );

        let res = app
            .put_with_token(
                &routes::post_files(3),
                &json!({"rows": [{"file": id}]}),
                ADMIN_TOKEN,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .contains("not in the protected_uploads directory")
        );
    }

    #[tokio::test]
    async fn rejects_unknown_attachment() {
        let app = TestApp::spawn().await;

        let res = app
            .put_with_token(
                &routes::post_files(4),
                &json!({"rows": [{"file": 999}]}),
                ADMIN_TOKEN,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["message"],
            "Attachment 999 does not exist. Please upload a new file."
        );
    }

    #[tokio::test]
    async fn missing_file_reports_required_not_membership() {
        let app = TestApp::spawn().await;

        let res = app
            .put_with_token(
                &routes::post_files(5),
                &json!({"rows": [{"title": "No file"}]}),
                ADMIN_TOKEN,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "A file is required.");
    }

    #[tokio::test]
    async fn collects_every_invalid_row() {
        let app = TestApp::spawn().await;

        let res = app
            .put_with_token(
                &routes::post_files(6),
                &json!({"rows": [{"title": "x"}, {"file": 998}]}),
                ADMIN_TOKEN,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "2 fields failed validation");
        assert_eq!(res.body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn optional_file_rows_are_stored_but_not_listed() {
        let app = TestApp::spawn_with(|config| config.fields.file_required = false).await;
        let id = app.upload(&app.managed_field(), "kept.pdf").await;

        let res = app
            .put_with_token(
                &routes::post_files(7),
                &json!({"rows": [{"title": "Placeholder"}, {"file": id}]}),
                ADMIN_TOKEN,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["rows"], 2);

        let listed = app.get_without_token(&routes::post_files(7)).await;
        let files = listed.body["files"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["file_id"], id);
    }

    #[tokio::test]
    async fn requires_token() {
        let app = TestApp::spawn().await;

        let res = app
            .put_without_token(&routes::post_files(8), &json!({"rows": []}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .put_with_token(
                &routes::post_files(9),
                &json!({"rows": [{"file": "not-an-id"}]}),
                ADMIN_TOKEN,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod list_files {
    use super::*;

    #[tokio::test]
    async fn lists_saved_rows_with_urls() {
        let app = TestApp::spawn().await;
        let field = app.managed_field();
        let file = app.upload(&field, "guide.pdf").await;
        let image = app.upload("field_cover_image", "cover.png").await;

        let res = app
            .put_with_token(
                &routes::post_files(10),
                &json!({"rows": [{"title": "Guide", "desc": "Chapter 1", "image": image, "file": file}]}),
                ADMIN_TOKEN,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app.get_without_token(&routes::post_files(10)).await;

        assert_eq!(res.status, 200);
        assert_eq!(
            res.body["files"],
            json!([{
                "title": "Guide",
                "desc": "Chapter 1",
                "file_id": file,
                "file_url": "https://example.com/uploads/protected_uploads/guide.pdf",
                "extension": "pdf",
                "image_url": "https://example.com/uploads/cover.png",
            }])
        );
    }

    #[tokio::test]
    async fn untitled_rows_use_file_name() {
        let app = TestApp::spawn().await;
        let file = app.upload(&app.managed_field(), "minutes.docx").await;

        app.put_with_token(
            &routes::post_files(11),
            &json!({"rows": [{"title": "  ", "file": file}]}),
            ADMIN_TOKEN,
        )
        .await;

        let res = app.get_without_token(&routes::post_files(11)).await;
        assert_eq!(res.body["files"][0]["title"], "minutes.docx");
        assert_eq!(res.body["files"][0]["desc"], serde_json::Value::Null);
        assert_eq!(res.body["files"][0]["extension"], "docx");
    }

    #[tokio::test]
    async fn resaving_replaces_previous_rows() {
        let app = TestApp::spawn().await;
        let field = app.managed_field();
        let a = app.upload(&field, "a.pdf").await;
        let b = app.upload(&field, "b.pdf").await;

        app.put_with_token(
            &routes::post_files(12),
            &json!({"rows": [{"file": a}, {"file": b}]}),
            ADMIN_TOKEN,
        )
        .await;
        app.put_with_token(
            &routes::post_files(12),
            &json!({"rows": [{"file": b}]}),
            ADMIN_TOKEN,
        )
        .await;

        let res = app.get_without_token(&routes::post_files(12)).await;
        let files = res.body["files"].as_array().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0]["file_id"], b);
    }

    #[tokio::test]
    async fn unknown_post_has_no_files() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(&routes::post_files(404)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!({"post_id": 404, "files": []}));
    }
}
