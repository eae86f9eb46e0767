use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use calculator::{app::build_app, state::AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

const PASSWORD: &str = "TestPass123!";

fn app() -> Router {
    build_app(AppState::fake())
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.expect("router is infallible")
}

async fn body_text(res: Response) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(res: Response) -> Value {
    serde_json::from_str(&body_text(res).await).unwrap()
}

fn location(res: &Response) -> Option<&str> {
    res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok())
}

fn form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn page(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn api(method: Method, uri: &str, cookie: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn register_body(username: &str, password: &str, confirm: &str) -> String {
    format!(
        "first_name=Test&last_name=User&email={username}%40example.com&username={username}\
         &password={password}&confirm_password={confirm}"
    )
}

async fn register(app: &Router, username: &str) {
    let res = send(app, form("/register", &register_body(username, PASSWORD, PASSWORD))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));
}

/// Logs in through the form and returns the `name=value` session cookie.
async fn login(app: &Router, username: &str) -> String {
    let res = send(
        app,
        form("/login", &format!("username={username}&password={PASSWORD}")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/dashboard"));
    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .expect("session cookie");
    assert!(set_cookie.contains("HttpOnly"));
    set_cookie.split(';').next().unwrap().to_string()
}

async fn signed_in(app: &Router, username: &str) -> String {
    register(app, username).await;
    login(app, username).await
}

async fn create(app: &Router, cookie: &str, kind: &str, inputs: &str) -> Response {
    send(
        app,
        api(
            Method::POST,
            "/api/calculations",
            cookie,
            Some(json!({ "type": kind, "inputs": inputs })),
        ),
    )
    .await
}

async fn row_count(app: &Router, cookie: &str) -> usize {
    let res = send(app, page("/dashboard", cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    body_text(res).await.matches("<tr data-id=").count()
}

#[tokio::test]
async fn pages_render_for_guests() {
    let app = app();
    for uri in ["/register", "/login"] {
        let res = send(&app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains("<form"));
        assert!(!html.contains("{{"));
    }

    let res = send(&app, Request::builder().uri("/static/app.js").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/javascript"));
}

#[tokio::test]
async fn dashboard_layout_is_responsive() {
    let app = app();
    let cookie = signed_in(&app, "mobile_user").await;
    let html = body_text(send(&app, page("/dashboard", &cookie)).await).await;
    assert!(html.contains(r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#));
    assert!(html.contains("@media (max-width: 600px)"));
    assert!(html.contains(r#"id="calculationForm""#));
    assert!(!html.contains(r#"id="calculateBtn" disabled"#));
}

#[tokio::test]
async fn registration_errors_rerender_the_form() {
    let app = app();

    let res = send(
        &app,
        form(
            "/register",
            "first_name=Test&last_name=User&email=&username=nomail&password=TestPass123!&confirm_password=TestPass123!",
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(location(&res).is_none());
    let html = body_text(res).await;
    assert!(html.contains("Email is required"));
    assert!(html.contains(r#"value="nomail""#));

    let res = send(
        &app,
        form("/register", &register_body("mismatch", PASSWORD, "DifferentPass123!")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(location(&res).is_none());
    assert!(body_text(res).await.contains("Passwords do not match"));
}

#[tokio::test]
async fn registration_has_no_length_or_charset_rules() {
    let app = app();

    let res = send(&app, form("/register", &register_body("shortpw", "abc", "abc"))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));

    let res = send(&app, form("/register", &register_body("jo", PASSWORD, PASSWORD))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));

    let res = send(&app, form("/login", "username=shortpw&password=abc")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/dashboard"));
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    register(&app, "dupe_user").await;

    let res = send(&app, form("/register", &register_body("dupe_user", PASSWORD, PASSWORD))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(body_text(res).await.contains("already exists"));
}

#[tokio::test]
async fn bad_login_shows_error() {
    let app = app();
    register(&app, "wrong_pw").await;

    let res = send(&app, form("/login", "username=wrong_pw&password=WrongPass999!")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    let html = body_text(res).await;
    assert!(html.contains(r#"id="errorAlert""#));
    assert!(html.contains("Invalid username or password"));
}

#[tokio::test]
async fn protected_pages_redirect_to_login() {
    let app = app();
    for uri in ["/", "/dashboard", "/dashboard/rows"] {
        let res = send(&app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{uri}");
    }
    let res = send(&app, page("/dashboard", "access_token=garbage")).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));
}

#[tokio::test]
async fn api_requires_a_session() {
    let app = app();
    let res = send(
        &app,
        Request::builder().uri("/api/calculations").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(res).await["detail"].is_string());
}

#[tokio::test]
async fn calculations_compute_each_operation() {
    let app = app();
    let cookie = signed_in(&app, "calc_user").await;

    for (kind, inputs, expected) in [
        ("addition", "5, 10, 15", 30.0),
        ("subtraction", "100, 30, 10", 60.0),
        ("multiplication", "2, 3, 4", 24.0),
        ("division", "100, 2, 5", 10.0),
        ("addition", "1,2,3,4,5,6,7,8,9,10", 55.0),
    ] {
        let res = create(&app, &cookie, kind, inputs).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = body_json(res).await;
        assert_eq!(body["type"], kind);
        assert_eq!(body["result"].as_f64(), Some(expected));
    }

    let res = send(&app, api(Method::GET, "/api/calculations", &cookie, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let list = body_json(res).await;
    assert_eq!(list.as_array().map(Vec::len), Some(5));
    assert_eq!(list[0]["result"].as_f64(), Some(55.0));
    assert_eq!(row_count(&app, &cookie).await, 5);
}

#[tokio::test]
async fn invalid_calculations_are_rejected() {
    let app = app();
    let cookie = signed_in(&app, "bad_input").await;

    let res = create(&app, &cookie, "division", "100, 0").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["detail"].as_str().unwrap().contains("zero"));

    let res = create(&app, &cookie, "addition", "5").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = create(&app, &cookie, "addition", "5, abc").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(row_count(&app, &cookie).await, 0);
}

#[tokio::test]
async fn missing_calculation_shows_error_state() {
    let app = app();
    let cookie = signed_in(&app, "viewer").await;

    for uri in [
        "/dashboard/view/00000000-0000-0000-0000-000000000000",
        "/dashboard/view/99999",
        "/dashboard/edit/not-a-uuid",
    ] {
        let res = send(&app, page(uri, &cookie)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
        assert!(body_text(res).await.contains(r#"id="errorState""#));
    }
}

#[tokio::test]
async fn view_edit_and_delete_a_calculation() {
    let app = app();
    let cookie = signed_in(&app, "editor").await;

    let created = body_json(create(&app, &cookie, "multiplication", "2, 3, 4").await).await;
    let id = created["id"].as_str().unwrap().to_string();

    let res = send(&app, page(&format!("/dashboard/view/{id}"), &cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = body_text(res).await;
    assert!(html.contains("2 × 3 × 4"));
    assert!(html.contains("24"));

    let res = send(&app, page(&format!("/dashboard/edit/{id}"), &cookie)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_text(res).await.contains(r#"value="2, 3, 4""#));

    let uri = format!("/api/calculations/{id}");
    let res = send(
        &app,
        api(Method::PUT, &uri, &cookie, Some(json!({ "type": "addition", "inputs": "10, 20" }))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await;
    assert_eq!(updated["result"].as_f64(), Some(30.0));
    assert_eq!(updated["id"], created["id"]);

    let res = send(
        &app,
        api(Method::PUT, &uri, &cookie, Some(json!({ "type": "division", "inputs": "10, 0" }))),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = send(&app, api(Method::GET, &uri, &cookie, None)).await;
    assert_eq!(body_json(res).await["result"].as_f64(), Some(30.0));

    create(&app, &cookie, "addition", "1, 1").await;
    assert_eq!(row_count(&app, &cookie).await, 2);

    let res = send(&app, api(Method::DELETE, &uri, &cookie, None)).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(row_count(&app, &cookie).await, 1);

    let res = send(&app, api(Method::DELETE, &uri, &cookie, None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn calculations_are_private_to_their_owner() {
    let app = app();
    let alice = signed_in(&app, "alice").await;
    let bob = signed_in(&app, "bob_user").await;

    let created = body_json(create(&app, &alice, "addition", "1, 2").await).await;
    let id = created["id"].as_str().unwrap();

    let res = send(&app, api(Method::GET, &format!("/api/calculations/{id}"), &bob, None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = send(&app, page(&format!("/dashboard/view/{id}"), &bob)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(row_count(&app, &bob).await, 0);
}

#[tokio::test]
async fn preview_reports_input_status() {
    let app = app();
    let cookie = signed_in(&app, "previewer").await;

    let preview = |inputs: &'static str| {
        api(
            Method::POST,
            "/api/calculations/preview",
            &cookie,
            Some(json!({ "type": "addition", "inputs": inputs })),
        )
    };

    let body = body_json(send(&app, preview("5")).await).await;
    assert_eq!(body["status"], "warning");
    assert_eq!(body["count"], 1);

    let body = body_json(send(&app, preview("5, 10")).await).await;
    assert_eq!(body["status"], "valid");
    assert_eq!(body["display"], "15");

    let body = body_json(send(&app, preview("")).await).await;
    assert_eq!(body["status"], "empty");
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let app = app();
    let cookie = signed_in(&app, "leaver").await;

    let res = send(&app, api(Method::POST, "/api/auth/logout", &cookie, None)).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let set_cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("access_token="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn api_login_and_refresh_issue_tokens() {
    let app = app();
    register(&app, "token_user").await;

    let res = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "username": "token_user", "password": PASSWORD }).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let tokens = body_json(res).await;
    assert_eq!(tokens["user"]["username"], "token_user");
    let access = tokens["access_token"].as_str().unwrap();
    let refresh = tokens["refresh_token"].as_str().unwrap();

    let res = send(
        &app,
        Request::builder()
            .uri("/api/me")
            .header(header::AUTHORIZATION, format!("Bearer {access}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["email"], "token_user@example.com");

    let res = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/auth/refresh")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "refresh_token": refresh }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body_json(res).await["access_token"].is_string());

    let res = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/auth/refresh")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "refresh_token": access }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}
