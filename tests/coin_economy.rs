#[path = "common/mod.rs"]
mod common;

use mongodb::bson::doc;

use ficore::error::AppError;
use ficore::i18n::Lang;
use ficore::models::{CashflowType, CoinTxKind, PaymentMethod, RecordType, UserRole};
use ficore::state::{
    CoinCredit, SIGNUP_BONUS_COINS, create_cashflow, create_inventory_item, create_record,
    credit_coins, delete_user_cascade, find_user, get_balance, signup_user, spend_coins,
};

async fn make_user(state: &ficore::state::AppState, username: &str) {
    signup_user(
        state,
        username,
        &format!("{username}@example.com"),
        "$2b$12$abcdefghijklmnopqrstuv",
        UserRole::Trader,
        Lang::En,
    )
    .await
    .expect("signup failed");
}

#[tokio::test]
async fn signup_grants_exactly_ten_bonus_coins() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    make_user(state, "bala").await;

    let user = find_user(state, "bala").await.unwrap().expect("user exists");
    assert_eq!(user.coin_balance, SIGNUP_BONUS_COINS);

    let credits = state
        .coin_transactions
        .count_documents(doc! { "user_id": "bala", "type": "credit", "amount": SIGNUP_BONUS_COINS })
        .await
        .unwrap();
    assert_eq!(credits, 1, "exactly one signup bonus entry");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn admin_credit_raises_balance_and_logs_one_transaction() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    make_user(state, "hassan").await;
    let before = get_balance(state, "hassan").await.unwrap().unwrap();

    credit_coins(
        state,
        CoinCredit {
            user_id: "hassan",
            amount: 50,
            kind: CoinTxKind::AdminCredit,
            reference: "ADMIN_CREDIT_test",
            actor: "admin",
            payment_method: None,
            facilitated_by_agent: None,
        },
    )
    .await
    .expect("credit failed");

    let after = get_balance(state, "hassan").await.unwrap().unwrap();
    assert_eq!(after, before + 50);

    let entries = state
        .coin_transactions
        .count_documents(doc! { "user_id": "hassan", "amount": 50 })
        .await
        .unwrap();
    assert_eq!(entries, 1);

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn credit_to_unknown_user_is_rejected() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    let err = credit_coins(
        state,
        CoinCredit {
            user_id: "ghost",
            amount: 10,
            kind: CoinTxKind::Credit,
            reference: "CREDIT_test",
            actor: "system",
            payment_method: None,
            facilitated_by_agent: None,
        },
    )
    .await
    .expect_err("credit to a missing user must fail");
    assert!(matches!(err, AppError::UserNotFound));

    let entries = state
        .coin_transactions
        .count_documents(doc! { "user_id": "ghost" })
        .await
        .unwrap();
    assert_eq!(entries, 0, "no transaction log for failed credit");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn spend_is_refused_below_cost_and_balance_is_untouched() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    make_user(state, "ladi").await;
    // Drain the signup bonus.
    spend_coins(state, "ladi", SIGNUP_BONUS_COINS, "SPEND_drain")
        .await
        .expect("drain failed");
    assert_eq!(get_balance(state, "ladi").await.unwrap().unwrap(), 0);

    let err = spend_coins(state, "ladi", 1, "SPEND_refused")
        .await
        .expect_err("spend below balance must fail");
    assert!(matches!(err, AppError::InsufficientCoins));

    assert_eq!(get_balance(state, "ladi").await.unwrap().unwrap(), 0);
    let refused = state
        .coin_transactions
        .count_documents(doc! { "user_id": "ladi", "ref": "SPEND_refused" })
        .await
        .unwrap();
    assert_eq!(refused, 0, "refused spend leaves no log entry");

    common::teardown(Some(ctx)).await;
}

#[tokio::test]
async fn deleting_a_user_cascades_over_owned_collections() {
    let ctx = match common::setup_state().await {
        Some(c) => c,
        None => return,
    };
    let state = &ctx.state;

    make_user(state, "uche").await;
    create_record(
        state,
        "uche",
        RecordType::Debtor,
        "Musa",
        Some("08012345678".to_string()),
        None,
        1500.0,
    )
    .await
    .unwrap();
    create_cashflow(
        state,
        "uche",
        CashflowType::Receipt,
        "Customer A",
        2000.0,
        Some(PaymentMethod::Cash),
        None,
        None,
        None,
    )
    .await
    .unwrap();
    create_inventory_item(state, "uche", "Rice 50kg", 10, None, Some(40000.0), Some(45000.0), None)
        .await
        .unwrap();

    assert!(delete_user_cascade(state, "uche").await.unwrap());

    assert!(find_user(state, "uche").await.unwrap().is_none());
    for collection in ["records", "cashflows", "inventory", "coin_transactions"] {
        let left = state
            .db
            .collection::<mongodb::bson::Document>(collection)
            .count_documents(doc! { "user_id": "uche" })
            .await
            .unwrap();
        assert_eq!(left, 0, "{collection} entries must be removed");
    }
    let audit_left = state
        .audit_logs
        .count_documents(doc! { "details.user_id": "uche" })
        .await
        .unwrap();
    assert_eq!(audit_left, 0, "audit entries referencing the user are removed");

    common::teardown(Some(ctx)).await;
}
