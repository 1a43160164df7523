//! Per-install payment decision workflow.
//!
//! # States
//! ```text
//! NoPaymentNeeded → (install proceeds)
//! OptionalOffered → (request displayed, install proceeds)
//! RequiredPending → poll status every interval
//!     → Confirmed (first positive poll)
//!     → TimedOut  (attempt budget exhausted; install aborts)
//! ```
//!
//! # Design Decisions
//! - The registry is injected behind a trait so tests can substitute
//!   fakes; the gate holds no persistent state of its own
//! - Poll failures count as "not yet paid", never as fatal errors
//! - A registry that cannot produce a rule gates nothing: installs of
//!   unpriced packages never depend on registry availability

use std::sync::Arc;
use std::time::Duration;

use crate::config::PaymentsConfig;
use crate::gate::registry::RegistryApi;
use crate::gate::types::{GateDecision, GateOutcome, PaymentRequest};
use crate::gate::uri::payment_uri;
use crate::ledger::PackageRule;
use crate::resilience::poll::poll_until;

/// Orchestrates the payment decision for one package install.
pub struct PaymentGate {
    registry: Arc<dyn RegistryApi>,
    config: PaymentsConfig,
}

impl PaymentGate {
    pub fn new(registry: Arc<dyn RegistryApi>, config: PaymentsConfig) -> Self {
        Self { registry, config }
    }

    /// Decide whether `user_id` may install `package`.
    ///
    /// Returns once the outcome is terminal; for required payments this
    /// blocks for up to the configured confirmation timeout.
    pub async fn clear(&self, package: &str, user_id: &str) -> GateDecision {
        let rule = match self.registry.package_rule(package).await {
            Ok(rule) => rule,
            Err(e) => {
                tracing::warn!(package, error = %e, "Rule lookup failed; treating as unpriced");
                None
            }
        };

        let Some(rule) = rule.filter(|r| r.price > 0.0) else {
            tracing::debug!(package, "No payment configured");
            return GateDecision {
                outcome: GateOutcome::NoPaymentNeeded,
                request: None,
            };
        };

        let request = build_request(&rule);
        tracing::info!(
            package,
            amount = rule.price,
            token = %rule.token_symbol,
            chain = %rule.chain,
            required = rule.required,
            uri = %request.uri,
            "Payment requested"
        );

        if !rule.required {
            // Donations are advisory; never block on one.
            return GateDecision {
                outcome: GateOutcome::OptionalOffered,
                request: Some(request),
            };
        }

        let outcome = if self.wait_for_confirmation(package, user_id).await {
            GateOutcome::Confirmed
        } else {
            tracing::warn!(
                package,
                user = user_id,
                timeout_secs = self.config.confirm_timeout_secs,
                "Required payment not confirmed in time"
            );
            GateOutcome::TimedOut
        };
        GateDecision {
            outcome,
            request: Some(request),
        }
    }

    /// Poll the registry's payment status until paid or out of budget.
    async fn wait_for_confirmation(&self, package: &str, user_id: &str) -> bool {
        let interval = Duration::from_secs(self.config.poll_interval_secs);
        let max_attempts = (self.config.confirm_timeout_secs / self.config.poll_interval_secs)
            .max(1) as u32;

        poll_until(interval, max_attempts, || async {
            self.registry
                .payment_status(package, user_id)
                .await
                .map(|paid| paid.then_some(()))
        })
        .await
        .is_some()
    }
}

fn build_request(rule: &PackageRule) -> PaymentRequest {
    PaymentRequest {
        package_name: rule.name.clone(),
        amount: rule.price,
        token_symbol: rule.token_symbol.clone(),
        chain: rule.chain.clone(),
        recipient: rule.wallet_address.clone(),
        uri: payment_uri(rule),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::types::{RegistryError, VerifyResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeRegistry {
        rule: Option<PackageRule>,
        /// Status polls return true starting from this attempt (0 = never).
        paid_after: u32,
        polls: AtomicU32,
        fail_status: bool,
    }

    impl FakeRegistry {
        fn new(rule: Option<PackageRule>, paid_after: u32) -> Self {
            Self {
                rule,
                paid_after,
                polls: AtomicU32::new(0),
                fail_status: false,
            }
        }
    }

    #[async_trait]
    impl RegistryApi for FakeRegistry {
        async fn package_rule(&self, _name: &str) -> Result<Option<PackageRule>, RegistryError> {
            Ok(self.rule.clone())
        }

        async fn payment_status(&self, _pkg: &str, _user: &str) -> Result<bool, RegistryError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_status {
                return Err(RegistryError::Status {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(self.paid_after != 0 && n >= self.paid_after)
        }

        async fn verify_payment(
            &self,
            _pkg: &str,
            _user: &str,
            _tx: &str,
        ) -> Result<VerifyResponse, RegistryError> {
            unimplemented!("not used by the workflow")
        }

        async fn upsert_rule(&self, rule: &PackageRule) -> Result<PackageRule, RegistryError> {
            Ok(rule.clone())
        }
    }

    fn priced_rule(required: bool) -> PackageRule {
        PackageRule {
            name: "pro-lib".into(),
            price: 5.0,
            required,
            wallet_address: "0x201EBa5CC46D216Ce6DC03F6a759e8E766e956aE".into(),
            chain: "Mantle".into(),
            token_symbol: "USDT".into(),
        }
    }

    fn gate(registry: FakeRegistry) -> (PaymentGate, Arc<FakeRegistry>) {
        let registry = Arc::new(registry);
        (
            PaymentGate::new(registry.clone(), PaymentsConfig::default()),
            registry,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn no_rule_means_no_payment_needed() {
        let (gate, registry) = gate(FakeRegistry::new(None, 0));
        let decision = gate.clear("left-pad", "anonymous").await;
        assert_eq!(decision.outcome, GateOutcome::NoPaymentNeeded);
        assert!(decision.request.is_none());
        assert_eq!(registry.polls.load(Ordering::SeqCst), 0, "no polling without a rule");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_price_rule_means_no_payment_needed() {
        let mut rule = priced_rule(true);
        rule.price = 0.0;
        let (gate, _) = gate(FakeRegistry::new(Some(rule), 0));
        let decision = gate.clear("pro-lib", "u1").await;
        assert_eq!(decision.outcome, GateOutcome::NoPaymentNeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn optional_payment_never_blocks() {
        let (gate, registry) = gate(FakeRegistry::new(Some(priced_rule(false)), 0));
        let decision = gate.clear("pro-lib", "u1").await;
        assert_eq!(decision.outcome, GateOutcome::OptionalOffered);
        assert!(decision.allows_install());
        let request = decision.request.unwrap();
        assert!(request.uri.starts_with("ethereum:"));
        assert_eq!(registry.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn required_payment_confirms_on_first_positive_poll() {
        let (gate, registry) = gate(FakeRegistry::new(Some(priced_rule(true)), 3));
        let decision = gate.clear("pro-lib", "u1").await;
        assert_eq!(decision.outcome, GateOutcome::Confirmed);
        assert_eq!(registry.polls.load(Ordering::SeqCst), 3, "stops at first paid poll");
    }

    #[tokio::test(start_paused = true)]
    async fn required_payment_times_out_after_thirty_attempts() {
        // interval 2s, timeout 60s ⇒ 30 attempts, then abort.
        let (gate, registry) = gate(FakeRegistry::new(Some(priced_rule(true)), 0));
        let decision = gate.clear("pro-lib", "u1").await;
        assert_eq!(decision.outcome, GateOutcome::TimedOut);
        assert!(!decision.allows_install());
        assert_eq!(registry.polls.load(Ordering::SeqCst), 30);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_errors_are_swallowed_until_budget_exhausted() {
        let mut registry = FakeRegistry::new(Some(priced_rule(true)), 0);
        registry.fail_status = true;
        let (gate, registry) = gate(registry);
        let decision = gate.clear("pro-lib", "u1").await;
        assert_eq!(decision.outcome, GateOutcome::TimedOut);
        assert_eq!(
            registry.polls.load(Ordering::SeqCst),
            30,
            "errors must not stop the loop early"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn registry_failure_on_rule_lookup_unblocks_install() {
        struct DownRegistry;
        #[async_trait]
        impl RegistryApi for DownRegistry {
            async fn package_rule(&self, _: &str) -> Result<Option<PackageRule>, RegistryError> {
                Err(RegistryError::Status {
                    status: 502,
                    body: "bad gateway".into(),
                })
            }
            async fn payment_status(&self, _: &str, _: &str) -> Result<bool, RegistryError> {
                unreachable!()
            }
            async fn verify_payment(
                &self,
                _: &str,
                _: &str,
                _: &str,
            ) -> Result<VerifyResponse, RegistryError> {
                unreachable!()
            }
            async fn upsert_rule(&self, r: &PackageRule) -> Result<PackageRule, RegistryError> {
                Ok(r.clone())
            }
        }

        let gate = PaymentGate::new(Arc::new(DownRegistry), PaymentsConfig::default());
        let decision = gate.clear("left-pad", "anonymous").await;
        assert_eq!(decision.outcome, GateOutcome::NoPaymentNeeded);
    }
}
