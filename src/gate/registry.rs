//! Registry HTTP boundary consumed by the gate and CLI.
//!
//! The trait seam exists so the workflow can be driven by fakes in
//! tests; the one production implementation speaks JSON over reqwest.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::gate::types::{RegistryError, VerifyResponse};
use crate::ledger::PackageRule;

/// Operations the gate needs from the registry.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Fetch the payment rule for a package. `None` when the registry
    /// has no priced rule for it.
    async fn package_rule(&self, name: &str) -> Result<Option<PackageRule>, RegistryError>;

    /// Whether a confirmed payment exists for the pair.
    async fn payment_status(&self, package: &str, user_id: &str) -> Result<bool, RegistryError>;

    /// Ask the registry to verify a submitted transaction hash.
    async fn verify_payment(
        &self,
        package: &str,
        user_id: &str,
        tx_hash: &str,
    ) -> Result<VerifyResponse, RegistryError>;

    /// Create or replace a package's payment rule.
    async fn upsert_rule(&self, rule: &PackageRule) -> Result<PackageRule, RegistryError>;
}

/// reqwest-backed registry client.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleResponse {
    price: f64,
    required: bool,
    #[serde(default)]
    wallet_address: String,
    #[serde(default)]
    chain: String,
    #[serde(default)]
    token_symbol: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    paid: bool,
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    rules: PackageRule,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    pkg: &'a str,
    user_id: &'a str,
    tx_hash: &'a str,
}

impl RegistryClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base.trim_end_matches('/'), path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RegistryError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(RegistryError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl RegistryApi for RegistryClient {
    async fn package_rule(&self, name: &str) -> Result<Option<PackageRule>, RegistryError> {
        let response = self
            .http
            .get(self.url(&format!("/packages/{name}/rules")))
            .send()
            .await?;
        let rule: RuleResponse = Self::check(response).await?.json().await?;
        // Zero price means no payment configured; callers treat that the
        // same as no rule at all.
        if rule.price <= 0.0 {
            return Ok(None);
        }
        Ok(Some(PackageRule {
            name: name.to_string(),
            price: rule.price,
            required: rule.required,
            wallet_address: rule.wallet_address,
            chain: rule.chain,
            token_symbol: rule.token_symbol,
        }))
    }

    async fn payment_status(&self, package: &str, user_id: &str) -> Result<bool, RegistryError> {
        let response = self
            .http
            .get(self.url("/payments/status"))
            .query(&[("pkg", package), ("userId", user_id)])
            .send()
            .await?;
        let status: StatusResponse = Self::check(response).await?.json().await?;
        Ok(status.paid)
    }

    async fn verify_payment(
        &self,
        package: &str,
        user_id: &str,
        tx_hash: &str,
    ) -> Result<VerifyResponse, RegistryError> {
        let response = self
            .http
            .post(self.url("/payments/verify"))
            .json(&VerifyRequest {
                pkg: package,
                user_id,
                tx_hash,
            })
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn upsert_rule(&self, rule: &PackageRule) -> Result<PackageRule, RegistryError> {
        let response = self
            .http
            .post(self.url("/packages"))
            .json(rule)
            .send()
            .await?;
        let upserted: UpsertResponse = Self::check(response).await?.json().await?;
        Ok(upserted.rules)
    }
}
