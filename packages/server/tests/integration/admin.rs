use std::fs;

use crate::common::{ADMIN_TOKEN, TestApp, routes};

const EXPECTED_RULES: &str = "RewriteEngine On\n\
    RewriteCond %{HTTP_REFERER} !^https://example.com/.*$ [NC]\n\
    RewriteRule .* - [NC,L,F]\n";

mod protection_status {
    use super::*;

    #[tokio::test]
    async fn startup_installs_protection_files() {
        let app = TestApp::spawn().await;
        let dir = app.protected_dir();

        assert!(dir.is_dir());
        assert_eq!(
            fs::read_to_string(dir.join(".htaccess")).unwrap(),
            EXPECTED_RULES
        );
        assert_eq!(
            fs::read_to_string(dir.join("index.php")).unwrap(),
            "<?php\n// Silence is golden."
        );
    }

    #[tokio::test]
    async fn reports_directory_and_last_check() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::PROTECTION, ADMIN_TOKEN).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["directory_name"], "protected_uploads");
        assert_eq!(
            res.body["directory_url"],
            "https://example.com/uploads/protected_uploads"
        );
        assert_eq!(res.body["expected_rules"], EXPECTED_RULES);
        assert!(res.body["last_checked"].is_string());
    }

    #[tokio::test]
    async fn requires_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::PROTECTION).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn extension_policy_is_reflected_in_rules() {
        let app = TestApp::spawn_with(|config| {
            config.protection.rule_policy = server::config::RulePolicy::DenyExtensions {
                extensions: vec!["pdf".into(), "docx".into()],
            };
        })
        .await;

        let rules = fs::read_to_string(app.protected_dir().join(".htaccess")).unwrap();
        assert!(rules.ends_with("RewriteRule \\.(pdf|docx)$ - [NC,L,F]\n"));
    }
}

mod reconcile {
    use super::*;

    #[tokio::test]
    async fn forced_pass_restores_deleted_files() {
        let app = TestApp::spawn().await;
        let dir = app.protected_dir();
        fs::remove_file(dir.join(".htaccess")).unwrap();
        fs::remove_file(dir.join("index.php")).unwrap();

        let res = app
            .post_with_token(routes::PROTECTION_RECONCILE, ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "verified");
        assert_eq!(
            res.body["changes"],
            serde_json::json!(["created_rules", "created_sentinel"])
        );
        assert_eq!(
            fs::read_to_string(dir.join(".htaccess")).unwrap(),
            EXPECTED_RULES
        );
        assert!(dir.join("index.php").is_file());
    }

    #[tokio::test]
    async fn forced_pass_repairs_drifted_rules() {
        let app = TestApp::spawn().await;
        let rules = app.protected_dir().join(".htaccess");
        fs::write(&rules, "RewriteEngine Off").unwrap();

        let res = app
            .post_with_token(routes::PROTECTION_RECONCILE, ADMIN_TOKEN)
            .await;

        assert_eq!(res.body["status"], "verified");
        assert_eq!(res.body["changes"], serde_json::json!(["repaired_rules"]));
        assert_eq!(fs::read_to_string(rules).unwrap(), EXPECTED_RULES);
    }

    #[tokio::test]
    async fn reports_failures() {
        let app = TestApp::spawn().await;
        let rules = app.protected_dir().join(".htaccess");
        fs::remove_file(&rules).unwrap();
        fs::create_dir(&rules).unwrap();

        let res = app
            .post_with_token(routes::PROTECTION_RECONCILE, ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "failed");
        assert_eq!(res.body["failures"][0]["file"], "rules");
    }

    #[tokio::test]
    async fn fresh_check_is_not_redone_by_admin_requests() {
        let app = TestApp::spawn().await;
        let sentinel = app.protected_dir().join("index.php");
        fs::remove_file(&sentinel).unwrap();

        let res = app.get_with_token(routes::PROTECTION, ADMIN_TOKEN).await;

        assert_eq!(res.status, 200);
        assert!(!sentinel.exists());
    }

    #[tokio::test]
    async fn expired_check_is_redone_by_any_admin_request() {
        let app = TestApp::spawn_with(|config| config.protection.check_ttl_secs = 0).await;
        let sentinel = app.protected_dir().join("index.php");
        fs::remove_file(&sentinel).unwrap();

        let res = app.get_with_token(routes::PROTECTION, ADMIN_TOKEN).await;

        assert_eq!(res.status, 200);
        assert!(sentinel.is_file());
    }

    #[tokio::test]
    async fn public_requests_do_not_trigger_checks() {
        let app = TestApp::spawn_with(|config| config.protection.check_ttl_secs = 0).await;
        let sentinel = app.protected_dir().join("index.php");
        fs::remove_file(&sentinel).unwrap();

        let res = app.get_without_token(&routes::post_files(1)).await;

        assert_eq!(res.status, 200);
        assert!(!sentinel.exists());
    }
}
