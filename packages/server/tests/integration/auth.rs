use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn valid_credentials_return_a_token_and_profile() {
        let app = TestApp::spawn().await;
        app.create_user("ada@example.com", false).await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].as_str().is_some_and(|t| !t.is_empty()));
        assert_eq!(res.body["user"]["email"], "ada@example.com");
        assert_eq!(res.body["user"]["is_admin"], false);
        assert!(res.body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_user("ada@example.com", false).await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": "wrong"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_is_rejected_the_same_way() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"email": "ghost@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn malformed_email_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::LOGIN, &json!({"email": "nope", "password": ""}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["fields"]["email"].is_string());
        assert!(res.body["fields"]["password"].is_string());
    }

    #[tokio::test]
    async fn non_json_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::LOGIN))
            .body("email=ada@example.com")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 400);
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_current_user() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("root@example.com", true).await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["email"], "root@example.com");
        assert_eq!(res.body["name"], "root");
        assert_eq!(res.body["is_admin"], true);
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn session_cookie_authenticates_until_logout() {
        let app = TestApp::spawn().await;
        app.create_user("ada@example.com", false).await;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .unwrap();

        let login = client
            .post(app.url(routes::LOGIN))
            .json(&json!({"email": "ada@example.com", "password": PASSWORD}))
            .send()
            .await
            .unwrap();
        assert_eq!(login.status().as_u16(), 200);

        let me = client.get(app.url(routes::ME)).send().await.unwrap();
        assert_eq!(me.status().as_u16(), 200);

        let logout = client.post(app.url(routes::LOGOUT)).send().await.unwrap();
        assert_eq!(logout.status().as_u16(), 204);

        let me = client.get(app.url(routes::ME)).send().await.unwrap();
        assert_eq!(me.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn logout_requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app.post_json(routes::LOGOUT, &json!({})).await;

        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn bearer_logout_succeeds() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app.post_with_token(routes::LOGOUT, &token).await;

        assert_eq!(res.status, 204);
    }
}
