//! End-to-end tests for the registry HTTP API.
//!
//! Each test spawns a real server on an ephemeral port with an
//! in-memory ledger. Verification paths run against a canned verifier;
//! everything else uses the RPC-backed one over an unreachable endpoint,
//! on paths that bail out before any RPC.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use latte_registry::chain::{ChainClient, ChainVerifier, TransactionVerifier, Verification};
use latte_registry::config::RegistryConfig;
use latte_registry::http::{build_router, AppState};
use latte_registry::ledger::PaymentLedger;
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Answers every verify call with the same canned result.
struct StaticVerifier {
    verification: Verification,
}

#[async_trait]
impl TransactionVerifier for StaticVerifier {
    async fn verify(
        &self,
        _tx_hash: &str,
        _expected_recipient: &str,
        _expected_amount: f64,
        _token_address: Option<Address>,
    ) -> Verification {
        self.verification.clone()
    }
}

async fn spawn_with_verifier(verifier: Arc<dyn TransactionVerifier>) -> String {
    let state = AppState {
        ledger: Arc::new(PaymentLedger::in_memory()),
        verifier,
        config: Arc::new(RegistryConfig::default()),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

async fn spawn_app() -> String {
    // RPC-backed verifier over an unreachable endpoint; routes that would
    // hit the chain are only exercised on paths that bail out first.
    let mut config = RegistryConfig::default();
    config.blockchain.rpc_url = "http://127.0.0.1:1".to_string();
    let client = ChainClient::new(config.blockchain.clone()).expect("chain client");
    spawn_with_verifier(Arc::new(ChainVerifier::new(client))).await
}

async fn post_json(base: &str, path: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .json(&body)
        .send()
        .await
        .expect("request");
    let status = response.status().as_u16();
    (status, response.json().await.expect("json body"))
}

async fn get_json(base: &str, path: &str) -> (u16, Value) {
    let response = reqwest::get(format!("{base}{path}")).await.expect("request");
    let status = response.status().as_u16();
    (status, response.json().await.expect("json body"))
}

#[tokio::test]
async fn health_reports_service_and_version() {
    let base = spawn_app().await;
    let (status, body) = get_json(&base, "/").await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);
    assert_eq!(body["service"], "Latte Registry");
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let base = spawn_app().await;
    let response = reqwest::get(format!("{base}/")).await.unwrap();
    let id = response.headers().get("x-request-id").expect("request id");
    assert!(!id.to_str().unwrap().is_empty());
}

#[tokio::test]
async fn upsert_requires_a_name() {
    let base = spawn_app().await;
    let (status, body) = post_json(&base, "/packages", json!({ "price": 5.0 })).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"], "Package name is required");
}

#[tokio::test]
async fn priced_rule_requires_a_valid_wallet() {
    let base = spawn_app().await;
    let (status, _) = post_json(
        &base,
        "/packages",
        json!({ "name": "pro-lib", "price": 5.0, "walletAddress": "not-an-address" }),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) =
        post_json(&base, "/packages", json!({ "name": "pro-lib", "price": -1.0 })).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn rule_round_trip_and_defaults() {
    let base = spawn_app().await;

    // Unknown packages answer with a zero-price default rule.
    let (status, body) = get_json(&base, "/packages/unknown/rules").await;
    assert_eq!(status, 200);
    assert_eq!(body["price"], 0.0);
    assert_eq!(body["required"], false);

    let (status, body) = post_json(
        &base,
        "/packages",
        json!({
            "name": "pro-lib",
            "price": 9.99,
            "required": true,
            "walletAddress": "0x201eba5cc46d216ce6dc03f6a759e8e766e956ae"
        }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);
    assert_eq!(body["rules"]["price"], 9.99);
    // Chain and token fall back to configured defaults.
    assert_eq!(body["rules"]["chain"], "Mantle");
    assert_eq!(body["rules"]["tokenSymbol"], "USDT");

    let (_, body) = get_json(&base, "/packages/pro-lib/rules").await;
    assert_eq!(body["price"], 9.99);
    assert_eq!(body["required"], true);

    let (_, body) = get_json(&base, "/packages").await;
    assert_eq!(body["packages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn payment_status_requires_both_params() {
    let base = spawn_app().await;
    let (status, _) = get_json(&base, "/payments/status?pkg=only-pkg").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn mark_paid_flips_payment_status() {
    let base = spawn_app().await;

    let (_, body) = get_json(&base, "/payments/status?pkg=pro-lib&userId=u1").await;
    assert_eq!(body["paid"], false);

    let (status, body) = post_json(
        &base,
        "/payments/mark-paid",
        json!({ "pkg": "pro-lib", "userId": "u1", "amount": 5.0 }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);

    let (_, body) = get_json(&base, "/payments/status?pkg=pro-lib&userId=u1").await;
    assert_eq!(body["paid"], true);

    // Other users remain unpaid.
    let (_, body) = get_json(&base, "/payments/status?pkg=pro-lib&userId=u2").await;
    assert_eq!(body["paid"], false);
}

#[tokio::test]
async fn verified_transaction_records_a_confirmed_payment() {
    let base = spawn_with_verifier(Arc::new(StaticVerifier {
        verification: Verification {
            verified: true,
            confirmations: 3,
            ..Verification::default()
        },
    }))
    .await;

    post_json(
        &base,
        "/packages",
        json!({
            "name": "pro-lib",
            "price": 5.0,
            "required": true,
            "walletAddress": "0x201eba5cc46d216ce6dc03f6a759e8e766e956ae"
        }),
    )
    .await;

    let (status, body) = post_json(
        &base,
        "/payments/verify",
        json!({ "pkg": "pro-lib", "userId": "u1", "txHash": "0xfeed" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);
    assert_eq!(body["verified"], true);
    assert_eq!(body["confirmations"], 3);

    let (_, body) = get_json(&base, "/payments/status?pkg=pro-lib&userId=u1").await;
    assert_eq!(body["paid"], true);

    // Recorded at the rule's price, against the submitted hash.
    let (_, body) = get_json(&base, "/packages/pro-lib/donations").await;
    assert_eq!(body["totalDonations"], 5.0);
    assert_eq!(body["donations"][0]["txHash"], "0xfeed");
    assert_eq!(body["donations"][0]["confirmed"], true);
}

#[tokio::test]
async fn unverified_transaction_records_nothing() {
    let base = spawn_with_verifier(Arc::new(StaticVerifier {
        verification: Verification::unverified(),
    }))
    .await;

    post_json(
        &base,
        "/packages",
        json!({
            "name": "pro-lib",
            "price": 5.0,
            "walletAddress": "0x201eba5cc46d216ce6dc03f6a759e8e766e956ae"
        }),
    )
    .await;

    let (status, body) = post_json(
        &base,
        "/payments/verify",
        json!({ "pkg": "pro-lib", "userId": "u1", "txHash": "0xdead" }),
    )
    .await;
    assert_eq!(status, 200, "an unverified transaction is not an error");
    assert_eq!(body["ok"], false);
    assert_eq!(body["verified"], false);
    assert_eq!(body["message"], "Transaction could not be verified");

    let (_, body) = get_json(&base, "/payments/status?pkg=pro-lib&userId=u1").await;
    assert_eq!(body["paid"], false);
}

#[tokio::test]
async fn verify_without_a_rule_is_not_found() {
    let base = spawn_app().await;
    let (status, body) = post_json(
        &base,
        "/payments/verify",
        json!({ "pkg": "ghost", "userId": "u1", "txHash": "0xabc" }),
    )
    .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"], "Package not found");
}

#[tokio::test]
async fn donations_and_stats_aggregate_payments() {
    let base = spawn_app().await;

    post_json(
        &base,
        "/packages",
        json!({
            "name": "pro-lib",
            "price": 5.0,
            "walletAddress": "0x201eba5cc46d216ce6dc03f6a759e8e766e956ae"
        }),
    )
    .await;
    post_json(
        &base,
        "/payments/mark-paid",
        json!({ "pkg": "pro-lib", "userId": "u1", "amount": 5.0, "txHash": "0x01" }),
    )
    .await;
    post_json(
        &base,
        "/payments/mark-paid",
        json!({ "pkg": "pro-lib", "userId": "u2", "amount": 2.5, "txHash": "0x02" }),
    )
    .await;

    let (status, body) = get_json(&base, "/packages/pro-lib/donations").await;
    assert_eq!(status, 200);
    assert_eq!(body["package"], "pro-lib");
    assert_eq!(body["donationCount"], 2);
    assert_eq!(body["totalDonations"], 7.5);

    let (status, body) = get_json(&base, "/stats").await;
    assert_eq!(status, 200);
    assert_eq!(body["totalPackages"], 1);
    assert_eq!(body["packagesWithDonations"], 1);
    assert_eq!(body["packages"][0]["totalDonations"], 7.5);
}
