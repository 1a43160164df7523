//! Registry API handlers.
//!
//! Thin layer over PaymentLedger and ChainVerifier: request parsing,
//! validation, and response shaping live here; invariants live in the
//! stores.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::chain::{is_valid_address, tokens, TransactionVerifier as _};
use crate::gate::uri::is_testnet;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::ledger::{PackageRule, Payment};

#[derive(Serialize)]
pub struct Health {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        ok: true,
        service: "Latte Registry",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBody {
    pub price: f64,
    pub required: bool,
    pub wallet_address: String,
    pub chain: String,
    pub token_symbol: String,
}

/// GET /packages/{name}/rules. Unset rules answer with zero/false defaults.
pub async fn get_rules(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<RuleBody> {
    let defaults = &state.config.payments;
    let body = match state.ledger.rule(&name) {
        Some(rule) => RuleBody {
            price: rule.price,
            required: rule.required,
            wallet_address: rule.wallet_address,
            chain: rule.chain,
            token_symbol: rule.token_symbol,
        },
        None => RuleBody {
            price: 0.0,
            required: false,
            wallet_address: String::new(),
            chain: defaults.default_chain.clone(),
            token_symbol: defaults.default_token.clone(),
        },
    };
    Json(body)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRuleRequest {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub required: Option<bool>,
    pub wallet_address: Option<String>,
    pub chain: Option<String>,
    pub token_symbol: Option<String>,
}

#[derive(Serialize)]
pub struct UpsertRuleResponse {
    pub ok: bool,
    pub rules: PackageRule,
}

/// POST /packages: insert-or-replace a package's payment rule.
pub async fn upsert_rule(
    State(state): State<AppState>,
    Json(request): Json<UpsertRuleRequest>,
) -> Result<Json<UpsertRuleResponse>, ApiError> {
    let name = request
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("Package name is required".into()))?;

    let price = request.price.unwrap_or(0.0);
    if price < 0.0 {
        return Err(ApiError::Validation("Price must be non-negative".into()));
    }
    let wallet_address = request.wallet_address.unwrap_or_default();
    if price > 0.0 && !is_valid_address(&wallet_address) {
        return Err(ApiError::Validation(
            "Valid wallet address is required when setting a price".into(),
        ));
    }

    let defaults = &state.config.payments;
    let rule = state.ledger.upsert_rule(PackageRule {
        name,
        price,
        required: request.required.unwrap_or(false),
        wallet_address,
        chain: request.chain.unwrap_or_else(|| defaults.default_chain.clone()),
        token_symbol: request
            .token_symbol
            .unwrap_or_else(|| defaults.default_token.clone()),
    })?;

    Ok(Json(UpsertRuleResponse { ok: true, rules: rule }))
}

#[derive(Serialize)]
pub struct PackagesBody {
    pub packages: Vec<PackageRule>,
}

/// GET /packages: all rules, sorted by name.
pub async fn list_packages(State(state): State<AppState>) -> Json<PackagesBody> {
    Json(PackagesBody {
        packages: state.ledger.all_rules(),
    })
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub pkg: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct StatusBody {
    pub paid: bool,
}

/// GET /payments/status?pkg=&userId=
pub async fn payment_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusBody>, ApiError> {
    let (pkg, user_id) = match (query.pkg, query.user_id) {
        (Some(pkg), Some(user)) => (pkg, user),
        _ => {
            return Err(ApiError::Validation(
                "pkg and userId query params required".into(),
            ))
        }
    };
    Ok(Json(StatusBody {
        paid: state.ledger.is_paid(&pkg, &user_id),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkPaidRequest {
    pub pkg: Option<String>,
    pub user_id: Option<String>,
    pub amount: Option<f64>,
    pub tx_hash: Option<String>,
}

#[derive(Serialize)]
pub struct OkBody {
    pub ok: bool,
}

/// POST /payments/mark-paid: manual override.
///
/// Marks the triple confirmed without any on-chain verification. This is
/// a support/testing escape hatch and bypasses the verification
/// invariant; it is logged accordingly.
pub async fn mark_paid(
    State(state): State<AppState>,
    Json(request): Json<MarkPaidRequest>,
) -> Result<Json<OkBody>, ApiError> {
    let (pkg, user_id) = match (request.pkg, request.user_id) {
        (Some(pkg), Some(user)) if !pkg.is_empty() && !user.is_empty() => (pkg, user),
        _ => return Err(ApiError::Validation("pkg and userId required".into())),
    };

    tracing::warn!(
        package = %pkg,
        user = %user_id,
        "Marking payment confirmed without verification (manual override)"
    );
    state.ledger.record_payment(Payment::new(
        pkg,
        user_id,
        request.amount.unwrap_or(0.0),
        request.tx_hash,
        true,
    ))?;

    Ok(Json(OkBody { ok: true }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub pkg: Option<String>,
    pub user_id: Option<String>,
    pub tx_hash: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyBody {
    pub ok: bool,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /payments/verify: run the chain verifier against the package's
/// rule and, on success, record a confirmed payment.
pub async fn verify_payment(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyBody>, ApiError> {
    let (pkg, user_id, tx_hash) = match (request.pkg, request.user_id, request.tx_hash) {
        (Some(pkg), Some(user), Some(tx)) => (pkg, user, tx),
        _ => {
            return Err(ApiError::Validation(
                "pkg, userId, and txHash required".into(),
            ))
        }
    };

    let rule = state
        .ledger
        .rule(&pkg)
        .ok_or_else(|| ApiError::NotFound("Package not found".into()))?;

    let token_address = if rule.token_symbol.eq_ignore_ascii_case(tokens::NATIVE_SYMBOL) {
        None
    } else {
        tokens::contract_address(&rule.token_symbol, is_testnet(&rule.chain))
    };

    let verification = state
        .verifier
        .verify(&tx_hash, &rule.wallet_address, rule.price, token_address)
        .await;

    if !verification.verified {
        return Ok(Json(VerifyBody {
            ok: false,
            verified: false,
            confirmations: None,
            message: Some("Transaction could not be verified".into()),
        }));
    }

    state.ledger.record_payment(Payment::new(
        pkg.clone(),
        user_id,
        rule.price,
        Some(tx_hash),
        true,
    ))?;
    tracing::info!(
        package = %pkg,
        confirmations = verification.confirmations,
        "Payment verified and recorded"
    );

    Ok(Json(VerifyBody {
        ok: true,
        verified: true,
        confirmations: Some(verification.confirmations),
        message: None,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationsBody {
    pub package: String,
    pub total_donations: f64,
    pub donation_count: usize,
    pub donations: Vec<Payment>,
}

/// GET /packages/{name}/donations
pub async fn get_donations(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<DonationsBody> {
    let donations = state.ledger.payments_for(&name);
    Json(DonationsBody {
        total_donations: state.ledger.donations_total(&name),
        donation_count: donations.len(),
        donations,
        package: name,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsEntry {
    pub name: String,
    pub price: f64,
    pub required: bool,
    pub total_donations: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBody {
    pub total_packages: usize,
    pub packages_with_donations: usize,
    pub packages: Vec<StatsEntry>,
}

/// GET /stats: platform-wide summary.
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsBody> {
    let rules = state.ledger.all_rules();
    Json(StatsBody {
        total_packages: rules.len(),
        packages_with_donations: rules.iter().filter(|r| r.price > 0.0).count(),
        packages: rules
            .into_iter()
            .map(|r| StatsEntry {
                total_donations: state.ledger.donations_total(&r.name),
                name: r.name,
                price: r.price,
                required: r.required,
            })
            .collect(),
    })
}
