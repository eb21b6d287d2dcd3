use crate::common::{ADMIN_TOKEN, TestApp};

mod upload_location {
    use super::*;

    #[tokio::test]
    async fn managed_field_uploads_land_in_protected_directory() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_with_token(
                &app.managed_field(),
                "handbook.pdf",
                b"%PDF-1.4".to_vec(),
                ADMIN_TOKEN,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["filename"], "handbook.pdf");
        assert_eq!(
            res.body["url"],
            "https://example.com/uploads/protected_uploads/handbook.pdf"
        );
        assert_eq!(res.body["content_type"], "application/pdf");
        assert_eq!(res.body["size"], 8);

        let stored = app.protected_dir().join("handbook.pdf");
        assert_eq!(std::fs::read(stored).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn other_fields_keep_default_location() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_with_token("field_cover_image", "cover.png", b"PNG".to_vec(), ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["url"], "https://example.com/uploads/cover.png");
        assert!(app.upload_dir().join("cover.png").is_file());
        assert!(!app.protected_dir().join("cover.png").exists());
    }

    #[tokio::test]
    async fn duplicate_names_get_a_suffix() {
        let app = TestApp::spawn().await;
        let field = app.managed_field();

        app.upload(&field, "notes.pdf").await;
        let res = app
            .upload_with_token(&field, "notes.pdf", b"second".to_vec(), ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["filename"], "notes-1.pdf");
        assert_eq!(
            std::fs::read(app.protected_dir().join("notes-1.pdf")).unwrap(),
            b"second"
        );
    }

    #[tokio::test]
    async fn upload_recreates_missing_protected_directory() {
        let app = TestApp::spawn().await;
        std::fs::remove_dir_all(app.protected_dir()).unwrap();

        let id = app.upload(&app.managed_field(), "late.pdf").await;

        assert!(id > 0);
        assert!(app.protected_dir().join("late.pdf").is_file());
        assert_eq!(
            std::fs::read_to_string(app.protected_dir().join(".htaccess")).unwrap(),
            app.state.reconciler.expected_rules()
        );
        assert!(app.protected_dir().join("index.php").is_file());
    }

    #[tokio::test]
    async fn concurrent_same_name_uploads_keep_both_files() {
        let app = TestApp::spawn().await;
        let field = app.managed_field();

        let (a, b) = tokio::join!(
            app.upload_with_token(&field, "doc.pdf", b"first".to_vec(), ADMIN_TOKEN),
            app.upload_with_token(&field, "doc.pdf", b"second".to_vec(), ADMIN_TOKEN),
        );
        assert_eq!(a.status, 201, "{}", a.text);
        assert_eq!(b.status, 201, "{}", b.text);
        assert_ne!(a.body["filename"], b.body["filename"]);

        let mut contents = vec![
            std::fs::read(app.protected_dir().join("doc.pdf")).unwrap(),
            std::fs::read(app.protected_dir().join("doc-1.pdf")).unwrap(),
        ];
        contents.sort();
        assert_eq!(contents, vec![b"first".to_vec(), b"second".to_vec()]);
    }
}

mod upload_validation {
    use super::*;

    #[tokio::test]
    async fn requires_token() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_with_token(&app.managed_field(), "a.pdf", b"x".to_vec(), "wrong-token")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
        assert!(!app.protected_dir().join("a.pdf").exists());
    }

    #[tokio::test]
    async fn rejects_hidden_filenames() {
        let app = TestApp::spawn().await;

        let res = app
            .upload_with_token(&app.managed_field(), ".htaccess", b"x".to_vec(), ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        // The rules written at startup are untouched.
        let rules = std::fs::read_to_string(app.protected_dir().join(".htaccess")).unwrap();
        assert!(rules.starts_with("RewriteEngine On"));
    }

    #[tokio::test]
    async fn enforces_allowed_extensions_on_managed_field() {
        let app = TestApp::spawn_with(|config| {
            config.fields.allowed_extensions = vec!["pdf".into()];
        })
        .await;

        let res = app
            .upload_with_token(&app.managed_field(), "tool.exe", b"MZ".to_vec(), ADMIN_TOKEN)
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().contains("pdf"));

        let res = app
            .upload_with_token(&app.managed_field(), "Guide.PDF", b"x".to_vec(), ADMIN_TOKEN)
            .await;
        assert_eq!(res.status, 201);

        // Unmanaged fields are not restricted.
        let res = app
            .upload_with_token("field_other", "tool.exe", b"MZ".to_vec(), ADMIN_TOKEN)
            .await;
        assert_eq!(res.status, 201);
    }
}
