#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use mongodb::bson::doc;
use tower::ServiceExt; // for oneshot

use ficore::models::PersonalDetails;
use ficore::routes;
use ficore::session::SESSION_COOKIE_NAME;
use ficore::state::{
    SIGNUP_BONUS_COINS, complete_personal_setup, create_session, find_user, get_balance,
    spend_coins,
};

fn form_request(path: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = cookie {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE_NAME}={token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(token) = cookie {
        builder = builder.header(header::COOKIE, format!("{SESSION_COOKIE_NAME}={token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

fn app(state: &ficore::state::AppState) -> Router {
    routes::app(Arc::new(state.clone()))
}

#[tokio::test]
async fn signup_creates_user_with_bonus_and_redirects_to_wizard() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    let response = app(state)
        .oneshot(form_request(
            "/signup",
            "username=amina&email=amina%40example.com&password=s3cretpass&role=trader&language=en",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert_eq!(location, "/setup/business");
    assert!(
        response.headers().get(header::SET_COOKIE).is_some(),
        "signup must start a session"
    );

    let user = find_user(state, "amina").await.unwrap().expect("user exists");
    assert_eq!(user.coin_balance, SIGNUP_BONUS_COINS);
    assert!(!user.setup_complete);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn duplicate_username_is_rejected_with_the_form_reshown() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    let body =
        "username=bello&email=bello%40example.com&password=s3cretpass&role=personal&language=ha";
    let first = app(state).oneshot(form_request("/signup", body, None)).await.unwrap();
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let second = app(state)
        .oneshot(form_request(
            "/signup",
            "username=bello&email=other%40example.com&password=s3cretpass&role=personal&language=en",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let body = body_string(second).await;
    assert!(body.contains("Username already exists"), "got: {body}");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn incomplete_setup_gates_protected_pages() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    app(state)
        .oneshot(form_request(
            "/signup",
            "username=dauda&email=dauda%40example.com&password=s3cretpass&role=personal&language=en",
            None,
        ))
        .await
        .unwrap();
    let token = create_session(state, "dauda", false).await.unwrap();

    let gated = app(state)
        .oneshot(get_request("/dashboard", Some(&token)))
        .await
        .unwrap();
    assert_eq!(gated.status(), StatusCode::SEE_OTHER);
    let location = gated
        .headers()
        .get(header::LOCATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, "/setup/personal");

    complete_personal_setup(
        state,
        "dauda",
        &PersonalDetails {
            first_name: "Dauda".to_string(),
            last_name: "Musa".to_string(),
            phone_number: "08011111111".to_string(),
            address: "Kano".to_string(),
        },
    )
    .await
    .unwrap();

    let dashboard = app(state)
        .oneshot(get_request("/dashboard", Some(&token)))
        .await
        .unwrap();
    assert_eq!(dashboard.status(), StatusCode::OK);
    let body = body_string(dashboard).await;
    assert!(body.contains("Coin balance"), "got: {body}");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn metered_record_creation_is_denied_without_coins() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    app(state)
        .oneshot(form_request(
            "/signup",
            "username=efe&email=efe%40example.com&password=s3cretpass&role=trader&language=en",
            None,
        ))
        .await
        .unwrap();
    complete_personal_setup(
        state,
        "efe",
        &PersonalDetails {
            first_name: "Efe".to_string(),
            last_name: String::new(),
            phone_number: String::new(),
            address: String::new(),
        },
    )
    .await
    .unwrap();
    spend_coins(state, "efe", SIGNUP_BONUS_COINS, "SPEND_drain")
        .await
        .unwrap();

    let token = create_session(state, "efe", false).await.unwrap();
    let response = app(state)
        .oneshot(form_request(
            "/records",
            "record_type=debtor&name=Ngozi&amount_owed=500",
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    assert_eq!(location, "/coins", "broke users are sent to purchase coins");

    let created = state
        .records
        .count_documents(doc! { "user_id": "efe" })
        .await
        .unwrap();
    assert_eq!(created, 0, "no record written for a refused metered action");
    assert_eq!(get_balance(state, "efe").await.unwrap().unwrap(), 0);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn record_creation_spends_one_coin_and_renders_in_the_index() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    app(state)
        .oneshot(form_request(
            "/signup",
            "username=zara&email=zara%40example.com&password=s3cretpass&role=trader&language=en",
            None,
        ))
        .await
        .unwrap();
    complete_personal_setup(
        state,
        "zara",
        &PersonalDetails {
            first_name: "Zara".to_string(),
            last_name: String::new(),
            phone_number: String::new(),
            address: String::new(),
        },
    )
    .await
    .unwrap();
    let token = create_session(state, "zara", false).await.unwrap();

    let response = app(state)
        .oneshot(form_request(
            "/records",
            "record_type=debtor&name=Chidi&contact=08022222222&amount_owed=2500",
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(
        get_balance(state, "zara").await.unwrap().unwrap(),
        SIGNUP_BONUS_COINS - 1
    );
    let spends = state
        .coin_transactions
        .count_documents(doc! { "user_id": "zara", "type": "spend", "amount": -1 })
        .await
        .unwrap();
    assert_eq!(spends, 1);

    let index = app(state)
        .oneshot(get_request("/records?type=debtor", Some(&token)))
        .await
        .unwrap();
    assert_eq!(index.status(), StatusCode::OK);
    let body = body_string(index).await;
    assert!(body.contains("Chidi"), "got: {body}");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn balance_endpoint_returns_json_and_requires_a_session() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    let anonymous = app(state)
        .oneshot(get_request("/coins/balance", None))
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::SEE_OTHER);

    app(state)
        .oneshot(form_request(
            "/signup",
            "username=femi&email=femi%40example.com&password=s3cretpass&role=personal&language=en",
            None,
        ))
        .await
        .unwrap();
    let token = create_session(state, "femi", false).await.unwrap();
    let response = app(state)
        .oneshot(get_request("/coins/balance", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("\"balance\":10"), "got: {body}");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn anonymous_budget_submission_persists_with_a_sid_cookie() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    let response = app(state)
        .oneshot(form_request(
            "/personal/budget",
            "income=100000&housing=20000&food=15000&transport=5000&dependents=0&miscellaneous=0&others=0&savings_goal=10000",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().get(header::SET_COOKIE).is_some(),
        "anonymous visitors get a sid cookie"
    );
    let body = body_string(response).await;
    assert!(body.contains("₦60,000.00"), "surplus rendered: {body}");

    let stored = state.budgets.count_documents(doc! {}).await.unwrap();
    assert_eq!(stored, 1);
    let budget = state.budgets.find_one(doc! {}).await.unwrap().unwrap();
    assert_eq!(budget.surplus_deficit, 60000.0);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn zero_income_health_score_is_rejected_and_not_persisted() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    let response = app(state)
        .oneshot(form_request(
            "/personal/financial-health",
            "first_name=Tunde&income=0&expenses=5000&debt=0&interest_rate=0",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(
        body.contains("Income must be greater than zero"),
        "got: {body}"
    );

    let stored = state
        .financial_health_scores
        .count_documents(doc! {})
        .await
        .unwrap();
    assert_eq!(stored, 0);

    common::teardown(Some(ctx)).await;
}
