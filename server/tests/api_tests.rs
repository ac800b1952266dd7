//! End-to-end flows through the router against an in-memory database.

use bytes::Bytes;
use chrono::Utc;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::{Value, json};

use foodie::AppState;
use foodie::database::{open_in_memory, users};
use foodie::handlers::http::{Router, build_api_router};
use foodie::security::{TokenCodec, hash_password};
use shared::config::LiveConfig;
use shared::types::server_config::AppConfig;
use shared::types::{Plan, Product, Recipe, User};

const SECRET: &[u8] = b"integration-test-secret-0123456789";

struct TestApp {
    router: Router,
    state: AppState,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(AppConfig::default()).await
    }

    async fn with_config(config: AppConfig) -> Self {
        let db = open_in_memory().await.unwrap();
        let state = AppState::new(db, TokenCodec::new(SECRET), LiveConfig::new(config), "admin");
        Self {
            router: build_api_router(),
            state,
        }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let payload = body.map(|b| b.to_string()).unwrap_or_default();
        let req = builder.body(Full::new(Bytes::from(payload))).unwrap();

        let res = self.router.route(req, self.state.clone()).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Register through the API; returns the access token and the user.
    async fn register(&self, name: &str) -> (String, User) {
        let (status, body) = self
            .call(
                Method::POST,
                "/register",
                None,
                Some(json!({ "name": name, "password": "pass1234" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let token = body["access_token"].as_str().unwrap().to_string();
        let user: User = serde_json::from_value(body["user"].clone()).unwrap();
        (token, user)
    }

    /// Seed the root administrator directly and mint a token for it.
    async fn root_admin(&self) -> (String, User) {
        let hash = hash_password("rootpass").unwrap();
        let user = users::insert_user(&self.state.db, "admin", &hash, true)
            .await
            .unwrap();
        let token = self.state.tokens.issue(user.id, true, Utc::now()).unwrap();
        (token, user)
    }

    async fn product(&self, admin: &str, name: &str) -> Product {
        let (status, body) = self
            .call(
                Method::POST,
                "/products",
                Some(admin),
                Some(json!({
                    "name": name,
                    "serving": { "type": "grams", "size": 100, "calories": 250 }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        serde_json::from_value(body).unwrap()
    }
}

fn recipe_body(lines: &[(&Product, i64)]) -> Value {
    json!({
        "name": "Toast",
        "description": "Bread with butter",
        "products": lines
            .iter()
            .map(|(p, q)| json!({ "product_id": p.id, "quantity": q }))
            .collect::<Vec<_>>(),
    })
}

fn plan_body(recipe: &Recipe, quantity: i64) -> Value {
    json!({
        "name": "Week",
        "description": "Breakfasts",
        "recipes": [{ "recipe_id": recipe.id, "quantity": quantity }],
    })
}

#[tokio::test]
async fn recipe_plan_and_usage_veto() {
    let app = TestApp::new().await;
    let (admin, _) = app.root_admin().await;
    let bread = app.product(&admin, "Bread").await;
    let butter = app.product(&admin, "Butter").await;
    let (alice, alice_user) = app.register("alice").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/recipes",
            Some(&alice),
            Some(recipe_body(&[(&bread, 2), (&butter, 1)])),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let recipe: Recipe = serde_json::from_value(body).unwrap();
    assert_eq!(recipe.user_id, alice_user.id);
    assert_eq!(recipe.products.len(), 2);

    // Invalid quantity is rejected before anything is written.
    let (status, body) = app
        .call(Method::POST, "/plans", Some(&alice), Some(plan_body(&recipe, 0)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ATTRIBUTE");
    assert_eq!(body["attribute"], "recipes[0].quantity");
    let (_, plans) = app.call(Method::GET, "/plans", Some(&alice), None).await;
    assert_eq!(plans, json!([]));

    let (status, body) = app
        .call(Method::POST, "/plans", Some(&alice), Some(plan_body(&recipe, 3)))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let plan: Plan = serde_json::from_value(body).unwrap();

    // Product used by the recipe, recipe used by the plan.
    let (status, body) = app
        .call(Method::DELETE, &format!("/products/{}", bread.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "product in use");

    let (status, body) = app
        .call(Method::DELETE, &format!("/recipes/{}", recipe.id), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "recipe in use");

    // Unwind: plan, recipe, then the product is free.
    let (status, body) = app
        .call(Method::DELETE, &format!("/plans/{}", plan.id), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "success" }));

    let (status, _) = app
        .call(Method::DELETE, &format!("/recipes/{}", recipe.id), Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(Method::DELETE, &format!("/products/{}", bread.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn missing_product_leaves_no_recipe() {
    let app = TestApp::new().await;
    let (admin, _) = app.root_admin().await;
    let bread = app.product(&admin, "Bread").await;
    let (alice, _) = app.register("alice").await;

    let ghost = app.product(&admin, "Ghost").await;
    app.call(Method::DELETE, &format!("/products/{}", ghost.id), Some(&admin), None)
        .await;

    let (status, body) = app
        .call(
            Method::POST,
            "/recipes",
            Some(&alice),
            Some(recipe_body(&[(&bread, 1), (&ghost, 1)])),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "DEPENDENCY_NOT_FOUND");

    let (_, recipes) = app.call(Method::GET, "/recipes", None, None).await;
    assert_eq!(recipes, json!([]));
}

#[tokio::test]
async fn update_replaces_the_product_set() {
    let app = TestApp::new().await;
    let (admin, _) = app.root_admin().await;
    let a = app.product(&admin, "A").await;
    let b = app.product(&admin, "B").await;
    let c = app.product(&admin, "C").await;
    let (alice, _) = app.register("alice").await;

    let (_, body) = app
        .call(
            Method::POST,
            "/recipes",
            Some(&alice),
            Some(recipe_body(&[(&a, 1), (&b, 2)])),
        )
        .await;
    let recipe: Recipe = serde_json::from_value(body).unwrap();

    let (status, body) = app
        .call(
            Method::PATCH,
            &format!("/recipes/{}", recipe.id),
            Some(&alice),
            Some(recipe_body(&[(&b, 3), (&c, 1)])),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, body) = app
        .call(Method::GET, &format!("/recipes/{}", recipe.id), None, None)
        .await;
    let stored: Recipe = serde_json::from_value(body).unwrap();
    let mut lines: Vec<_> = stored
        .products
        .iter()
        .map(|line| (line.product_id, line.quantity))
        .collect();
    lines.sort();
    let mut expected = vec![(b.id, Decimal::from(3)), (c.id, Decimal::from(1))];
    expected.sort();
    assert_eq!(lines, expected);
}

#[tokio::test]
async fn protected_routes_need_a_valid_token() {
    let app = TestApp::new().await;
    let (alice, _) = app.register("alice").await;
    let product = json!({
        "name": "Salt",
        "serving": { "type": "grams", "size": 1, "calories": 0 }
    });

    let (status, body) = app
        .call(Method::POST, "/recipes", None, Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app
        .call(Method::GET, "/users/me", Some("not.a.token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(Method::POST, "/products", Some(&alice), Some(product))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // Public reads need nothing.
    let (status, _) = app.call(Method::GET, "/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleted_account_token_stops_working() {
    let app = TestApp::new().await;
    let (alice, _) = app.register("alice").await;

    let (status, _) = app.call(Method::GET, "/users/me", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(Method::DELETE, "/users/me", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.call(Method::GET, "/users/me", Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_checks_the_password() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "name": "alice", "password": "wrong-one" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": "nobody", "password": "pass1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "name": "alice", "password": "pass1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap();

    let (status, me) = app.call(Method::GET, "/users/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["name"], "alice");
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = TestApp::new().await;
    app.register("alice").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/register",
            None,
            Some(json!({ "name": "alice", "password": "other-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn password_change_requires_the_old_password() {
    let app = TestApp::new().await;
    let (alice, _) = app.register("alice").await;

    let (status, _) = app
        .call(
            Method::PATCH,
            "/users/me",
            Some(&alice),
            Some(json!({ "old_password": "guess", "password": "newpass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::PATCH,
            "/users/me",
            Some(&alice),
            Some(json!({ "old_password": "pass1234", "password": "newpass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "name": "alice", "password": "newpass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn only_owner_updates_but_admin_may_delete() {
    let app = TestApp::new().await;
    let (admin, _) = app.root_admin().await;
    let a = app.product(&admin, "A").await;
    let b = app.product(&admin, "B").await;
    let (alice, _) = app.register("alice").await;
    let (bob, _) = app.register("bob").await;

    let (_, body) = app
        .call(
            Method::POST,
            "/recipes",
            Some(&alice),
            Some(recipe_body(&[(&a, 1), (&b, 1)])),
        )
        .await;
    let recipe: Recipe = serde_json::from_value(body).unwrap();
    let path = format!("/recipes/{}", recipe.id);

    let (status, _) = app
        .call(
            Method::PATCH,
            &path,
            Some(&bob),
            Some(recipe_body(&[(&a, 9), (&b, 9)])),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::DELETE, &path, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::DELETE, &path, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call(Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn root_admin_cannot_be_deleted() {
    let app = TestApp::new().await;
    let (admin, root) = app.root_admin().await;

    let (status, _) = app
        .call(Method::DELETE, &format!("/users/{}", root.id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::DELETE, "/users/me", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.call(Method::GET, "/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn ratings_are_one_per_user() {
    let app = TestApp::new().await;
    let (admin, _) = app.root_admin().await;
    let a = app.product(&admin, "A").await;
    let b = app.product(&admin, "B").await;
    let (alice, _) = app.register("alice").await;

    let (_, body) = app
        .call(
            Method::POST,
            "/recipes",
            Some(&alice),
            Some(recipe_body(&[(&a, 1), (&b, 1)])),
        )
        .await;
    let recipe: Recipe = serde_json::from_value(body).unwrap();
    let path = format!("/recipes/{}/ratings", recipe.id);
    let rating = json!({ "score": 4.5, "comment": "tasty" });

    let (status, body) = app
        .call(Method::POST, &path, Some(&alice), Some(rating.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = app
        .call(Method::POST, &path, Some(&alice), Some(rating.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.call(Method::GET, &path, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let unknown = format!("/recipes/{}/ratings", shared::types::RecipeId::generate());
    let (status, _) = app
        .call(Method::POST, &unknown, Some(&alice), Some(rating))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_requests_are_rejected() {
    let mut config = AppConfig::default();
    config.server.max_body_bytes = 64;
    let app = TestApp::with_config(config).await;

    let (status, body) = app.call(Method::GET, "/nowhere", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, body) = app.call(Method::GET, "/recipes/42", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, body) = app
        .call(
            Method::POST,
            "/register",
            None,
            Some(json!({ "name": "x".repeat(100), "password": "pass1234" })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");

    let (status, body) = app
        .call(Method::POST, "/login", None, Some(json!({ "name": 7 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_BODY");
}

#[tokio::test]
async fn version_and_health_are_public() {
    let app = TestApp::new().await;

    let (status, body) = app.call(Method::GET, "/version", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let (status, body) = app.call(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["health"], "ok");
}

#[tokio::test]
async fn account_whose_recipe_is_planned_elsewhere_stays() {
    let app = TestApp::new().await;
    let (admin, _) = app.root_admin().await;
    let a = app.product(&admin, "A").await;
    let b = app.product(&admin, "B").await;
    let (alice, alice_user) = app.register("alice").await;
    let (bob, _) = app.register("bob").await;

    let (_, body) = app
        .call(
            Method::POST,
            "/recipes",
            Some(&alice),
            Some(recipe_body(&[(&a, 1), (&b, 1)])),
        )
        .await;
    let recipe: Recipe = serde_json::from_value(body).unwrap();
    let (status, _) = app
        .call(Method::POST, "/plans", Some(&bob), Some(plan_body(&recipe, 1)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(Method::DELETE, "/users/me", Some(&alice), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "user in use");

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/users/{}", alice_user.id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.call(Method::GET, "/users/me", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rating_can_be_revised_by_its_author() {
    let app = TestApp::new().await;
    let (admin, _) = app.root_admin().await;
    let a = app.product(&admin, "A").await;
    let b = app.product(&admin, "B").await;
    let (alice, _) = app.register("alice").await;
    let (bob, _) = app.register("bob").await;

    let (_, body) = app
        .call(
            Method::POST,
            "/recipes",
            Some(&alice),
            Some(recipe_body(&[(&a, 1), (&b, 1)])),
        )
        .await;
    let recipe: Recipe = serde_json::from_value(body).unwrap();
    let path = format!("/recipes/{}/ratings", recipe.id);

    let (status, _) = app
        .call(
            Method::PATCH,
            &path,
            Some(&bob),
            Some(json!({ "score": 3, "comment": "fine" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::POST,
            &path,
            Some(&bob),
            Some(json!({ "score": 3, "comment": "fine" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call(
            Method::PATCH,
            &path,
            Some(&bob),
            Some(json!({ "score": 5, "comment": "grew on me" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["comment"], "grew on me");

    let (status, body) = app
        .call(
            Method::PATCH,
            &path,
            Some(&bob),
            Some(json!({ "score": 9, "comment": "off the scale" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ATTRIBUTE");

    let (_, body) = app.call(Method::GET, &path, None, None).await;
    let ratings = body.as_array().unwrap();
    assert_eq!(ratings.len(), 1);
    assert_eq!(ratings[0]["score"], "5");
}

#[tokio::test]
async fn guarded_route_rejects_before_reading_the_body() {
    let mut config = AppConfig::default();
    config.server.max_body_bytes = 64;
    let app = TestApp::with_config(config).await;
    let oversized = json!({ "name": "x".repeat(200) });

    let (status, body) = app
        .call(Method::POST, "/recipes", None, Some(oversized.clone()))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (alice, _) = app.register("al").await;
    let (status, body) = app
        .call(Method::POST, "/recipes", Some(&alice), Some(oversized))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}
