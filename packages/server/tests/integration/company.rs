use crate::common::{CompanyFields, JPEG, MAX_LOGO_SIZE, PNG, TestApp, file_count, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn requires_authentication() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(app.url(routes::COMPANIES))
            .multipart(reqwest::multipart::Form::new().text("name", "Acme"))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn minimal_company_is_owned_by_the_caller() {
        let app = TestApp::spawn().await;
        let user_id = app.create_user("ada@example.com", false).await;
        let token = app.login("ada@example.com").await;

        let res = app
            .create_company_with(
                CompanyFields::named("Acme")
                    .text("email", "hello@acme.test")
                    .text("website", "https://acme.test")
                    .text("logo_url", ""),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["name"], "Acme");
        assert_eq!(res.body["email"], "hello@acme.test");
        assert_eq!(res.body["website"], "https://acme.test");
        assert!(res.body["logo"].is_null());
        assert!(res.body["logo_url"].is_null());
        assert_eq!(res.body["created_by"], user_id);
    }

    #[tokio::test]
    async fn uploaded_logo_is_stored_and_served() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app
            .create_company_with(CompanyFields::named("Acme").logo(PNG, "acme.png"), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let logo = res.logo();
        assert!(logo.starts_with("companies/"), "{logo}");
        assert!(logo.ends_with(".png"), "{logo}");
        assert!(app.stored(&logo));
        assert_eq!(res.body["logo_url"], format!("/storage/{logo}"));

        let served = app
            .client
            .get(app.url(&format!("/storage/{logo}")))
            .send()
            .await
            .unwrap();
        assert_eq!(served.status().as_u16(), 200);
        assert_eq!(served.bytes().await.unwrap().as_ref(), PNG);
    }

    #[tokio::test]
    async fn jpeg_logo_gets_jpg_extension() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app
            .create_company_with(CompanyFields::named("Acme").logo(JPEG, "photo.jpeg"), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.logo().ends_with(".jpg"));
    }

    #[tokio::test]
    async fn logo_url_is_recorded_verbatim() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app
            .create_company_with(
                CompanyFields::named("Acme").text("logo_url", "https://cdn.test/acme.png"),
                &token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["logo"], "https://cdn.test/acme.png");
        assert_eq!(res.body["logo_url"], "https://cdn.test/acme.png");
        assert_eq!(file_count(&app.module_dir()), 0);
    }

    #[tokio::test]
    async fn invalid_fields_are_reported_together() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app
            .create_company_with(
                CompanyFields::default()
                    .text("email", "not-an-email")
                    .text("website", "acme.test"),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["fields"]["name"].is_string());
        assert!(res.body["fields"]["email"].is_string());
        assert!(res.body["fields"]["website"].is_string());
    }

    #[tokio::test]
    async fn duplicate_values_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        let first = app
            .create_company_with(
                CompanyFields::named("Acme").text("website", "https://acme.test"),
                &token,
            )
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app
            .create_company_with(
                CompanyFields::named("Acme").text("website", "https://acme.test"),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["fields"]["name"], "The name has already been taken");
        assert_eq!(
            res.body["fields"]["website"],
            "The website has already been taken"
        );
    }

    #[tokio::test]
    async fn non_image_logo_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app
            .create_company_with(
                CompanyFields::named("Acme").logo(b"%PDF-1.7 not an image", "logo.png"),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["logo"].is_string());
        assert_eq!(file_count(&app.module_dir()), 0);
    }

    #[tokio::test]
    async fn oversized_logo_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        let mut big = PNG.to_vec();
        big.resize(MAX_LOGO_SIZE as usize + 1, 0);

        let res = app
            .create_company_with(CompanyFields::named("Acme").logo(&big, "big.png"), &token)
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(res.body["fields"]["logo"].is_string());
    }

    #[tokio::test]
    async fn file_and_url_logo_together_are_rejected() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app
            .create_company_with(
                CompanyFields::named("Acme")
                    .logo(PNG, "acme.png")
                    .text("logo_url", "https://cdn.test/acme.png"),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["logo"].is_string());
    }

    #[tokio::test]
    async fn unprovisionable_storage_persists_nothing() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        std::fs::write(app.module_dir(), b"in the way").unwrap();

        let res = app
            .create_company_with(CompanyFields::named("Acme").logo(PNG, "acme.png"), &token)
            .await;

        assert_eq!(res.status, 500, "{}", res.text);
        assert_eq!(res.body["code"], "STORAGE_UNAVAILABLE");

        let list = app.get_with_token(routes::COMPANIES, &token).await;
        assert_eq!(list.body["pagination"]["total"], 0);

        // Companies without an upload never touch storage.
        let res = app
            .create_company_with(CompanyFields::named("Acme"), &token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn create_form_describes_constraints() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app.get_with_token(routes::COMPANY_CREATE_FORM, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["max_name_length"], 255);
        assert_eq!(res.body["max_logo_size"], MAX_LOGO_SIZE);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn creator_and_admin_can_view_but_others_cannot() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("owner@example.com", false).await;
        let other = app.create_authenticated_user("other@example.com", false).await;
        let admin = app.create_authenticated_user("admin@example.com", true).await;
        let id = app.create_company(&owner, "Acme").await;

        assert_eq!(app.get_with_token(&routes::company(id), &owner).await.status, 200);
        assert_eq!(app.get_with_token(&routes::company(id), &admin).await.status, 200);

        let res = app.get_with_token(&routes::company(id), &other).await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn missing_company_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("admin@example.com", true).await;

        let res = app.get_with_token(&routes::company(9999), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn edit_form_follows_update_rules() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("owner@example.com", false).await;
        let other = app.create_authenticated_user("other@example.com", false).await;
        let id = app.create_company(&owner, "Acme").await;

        let res = app.get_with_token(&routes::company_edit(id), &owner).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["company"]["name"], "Acme");
        assert_eq!(res.body["form"]["max_logo_size"], MAX_LOGO_SIZE);

        let res = app.get_with_token(&routes::company_edit(id), &other).await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn list_paginates_and_sorts() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        for name in ["Delta", "Alpha", "Echo", "Charlie", "Bravo"] {
            app.create_company(&token, name).await;
        }

        let res = app
            .get_with_token(
                &format!("{}?page=2&per_page=2&sort_by=name&sort_order=asc", routes::COMPANIES),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 5);
        assert_eq!(res.body["pagination"]["page"], 2);
        assert_eq!(res.body["pagination"]["per_page"], 2);
        assert_eq!(res.body["pagination"]["last_page"], 3);
        let names: Vec<_> = res.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Charlie", "Delta"]);
    }

    #[tokio::test]
    async fn list_defaults_to_fifteen_per_page() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app.get_with_token(routes::COMPANIES, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["per_page"], 15);
        assert_eq!(res.body["pagination"]["last_page"], 1);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn list_page_beyond_the_end_is_empty() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        app.create_company(&token, "Acme").await;

        let res = app
            .get_with_token(
                &format!("{}?page={}&per_page=15", routes::COMPANIES, u64::MAX),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["pagination"]["last_page"], 1);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn list_rejects_unknown_sort_column() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;

        let res = app
            .get_with_token(&format!("{}?sort_by=password", routes::COMPANIES), &token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn replacing_the_logo_removes_the_old_file() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        let created = app
            .create_company_with(CompanyFields::named("Acme").logo(PNG, "one.png"), &token)
            .await;
        let first = created.logo();

        let res = app
            .update_company_with(
                created.id(),
                CompanyFields::named("Acme").logo(JPEG, "two.jpg"),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let second = res.logo();
        assert_ne!(first, second);
        assert!(!app.stored(&first));
        assert!(app.stored(&second));
        assert_eq!(file_count(&app.module_dir()), 1);
    }

    #[tokio::test]
    async fn omitting_the_logo_keeps_it() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        let created = app
            .create_company_with(
                CompanyFields::named("Acme")
                    .text("email", "hello@acme.test")
                    .logo(PNG, "one.png"),
                &token,
            )
            .await;

        let res = app
            .update_company_with(created.id(), CompanyFields::named("Acme Corp"), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Acme Corp");
        assert!(res.body["email"].is_null());
        assert_eq!(res.logo(), created.logo());
        assert!(app.stored(&created.logo()));
    }

    #[tokio::test]
    async fn keeping_own_unique_values_is_allowed() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        let created = app
            .create_company_with(
                CompanyFields::named("Acme").text("email", "hello@acme.test"),
                &token,
            )
            .await;
        app.create_company(&token, "Globex").await;

        let res = app
            .update_company_with(
                created.id(),
                CompanyFields::named("Acme").text("email", "hello@acme.test"),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let res = app
            .update_company_with(created.id(), CompanyFields::named("Globex"), &token)
            .await;
        assert_eq!(res.status, 400);
        assert!(res.body["fields"]["name"].is_string());
    }

    #[tokio::test]
    async fn non_creator_cannot_update_and_nothing_changes() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("owner@example.com", false).await;
        let other = app.create_authenticated_user("other@example.com", false).await;
        let created = app
            .create_company_with(CompanyFields::named("Acme").logo(PNG, "one.png"), &owner)
            .await;

        let res = app
            .update_company_with(
                created.id(),
                CompanyFields::named("Hijacked").logo(JPEG, "two.jpg"),
                &other,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
        let current = app.get_with_token(&routes::company(created.id()), &owner).await;
        assert_eq!(current.body["name"], "Acme");
        assert_eq!(current.logo(), created.logo());
        assert_eq!(file_count(&app.module_dir()), 1);
    }

    #[tokio::test]
    async fn admin_can_update_any_company_without_taking_ownership() {
        let app = TestApp::spawn().await;
        let owner_id = app.create_user("owner@example.com", false).await;
        let owner = app.login("owner@example.com").await;
        let admin = app.create_authenticated_user("admin@example.com", true).await;
        let id = app.create_company(&owner, "Acme").await;

        let res = app
            .update_company_with(id, CompanyFields::named("Acme Renamed"), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Acme Renamed");
        assert_eq!(res.body["created_by"], owner_id);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn full_lifecycle_across_users() {
        let app = TestApp::spawn().await;
        let owner = app.create_authenticated_user("a@example.com", false).await;
        let other = app.create_authenticated_user("b@example.com", false).await;
        let admin = app.create_authenticated_user("admin@example.com", true).await;

        let created = app
            .create_company_with(CompanyFields::named("Acme").logo(PNG, "file1.png"), &owner)
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        let id = created.id();
        let first = created.logo();

        let updated = app
            .update_company_with(id, CompanyFields::named("Acme").logo(PNG, "file2.png"), &owner)
            .await;
        assert_eq!(updated.status, 200, "{}", updated.text);
        let second = updated.logo();
        assert!(!app.stored(&first));

        let denied = app
            .update_company_with(id, CompanyFields::named("Acme"), &other)
            .await;
        assert_eq!(denied.status, 403);

        let denied = app.delete_with_token(&routes::company(id), &other).await;
        assert_eq!(denied.status, 403);
        assert!(app.stored(&second));

        let res = app.delete_with_token(&routes::company(id), &admin).await;
        assert_eq!(res.status, 204);
        assert!(!app.stored(&second));

        let res = app.get_with_token(&routes::company(id), &admin).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn deleting_a_url_logo_company_leaves_storage_alone() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        let keep = app
            .create_company_with(CompanyFields::named("Keep").logo(PNG, "keep.png"), &token)
            .await;
        let remote = app
            .create_company_with(
                CompanyFields::named("Remote").text("logo_url", "https://cdn.test/r.png"),
                &token,
            )
            .await;

        let res = app
            .delete_with_token(&routes::company(remote.id()), &token)
            .await;

        assert_eq!(res.status, 204);
        assert!(app.stored(&keep.logo()));
        assert_eq!(file_count(&app.module_dir()), 1);
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("ada@example.com", false).await;
        let id = app.create_company(&token, "Acme").await;

        assert_eq!(app.delete_with_token(&routes::company(id), &token).await.status, 204);
        assert_eq!(app.delete_with_token(&routes::company(id), &token).await.status, 404);
    }
}
