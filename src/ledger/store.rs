//! Durable payment ledger.
//!
//! # Responsibilities
//! - Own the persisted store of package rules and payment rows
//! - Enforce the write invariants at the storage layer, not in callers:
//!   rule upserts replace whole rows; payment upserts may only advance
//!   `confirmed`, never rewrite amount or identity
//! - Persist after every mutation; propagate storage failures
//!
//! # Design Decisions
//! - In-memory DashMaps with a JSON file behind them. Writes are
//!   single-row upserts scoped to a unique key; the keyed upsert itself
//!   is the concurrency-correctness mechanism, so concurrent confirms of
//!   one triple collapse to one logical write.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::ledger::types::{LedgerError, PackageRule, Payment, PaymentKey};

/// On-disk shape of the ledger file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    rules: BTreeMap<String, PackageRule>,
    payments: Vec<Payment>,
}

/// Thread-safe rules + payments store with file persistence.
#[derive(Debug, Default)]
pub struct PaymentLedger {
    rules: DashMap<String, PackageRule>,
    payments: DashMap<PaymentKey, Payment>,
    path: Option<PathBuf>,
}

impl PaymentLedger {
    /// An in-memory ledger with no persistence (tests, ephemeral runs).
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a ledger backed by `path`, loading existing data if present.
    /// A missing file is an empty ledger, not an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref().to_path_buf();
        let ledger = Self {
            rules: DashMap::new(),
            payments: DashMap::new(),
            path: Some(path.clone()),
        };
        if path.exists() {
            let file = File::open(&path)?;
            let data: LedgerFile = serde_json::from_reader(BufReader::new(file))?;
            for (name, rule) in data.rules {
                ledger.rules.insert(name, rule);
            }
            for payment in data.payments {
                ledger.payments.insert(payment.key(), payment);
            }
            tracing::info!(
                path = %path.display(),
                rules = ledger.rules.len(),
                payments = ledger.payments.len(),
                "Ledger loaded"
            );
        }
        Ok(ledger)
    }

    /// Insert-or-replace a rule keyed by name. Replacement overwrites
    /// every field atomically.
    pub fn upsert_rule(&self, rule: PackageRule) -> Result<PackageRule, LedgerError> {
        self.rules.insert(rule.name.clone(), rule.clone());
        self.persist()?;
        Ok(rule)
    }

    /// Fetch the rule for a package, if one exists.
    pub fn rule(&self, name: &str) -> Option<PackageRule> {
        self.rules.get(name).map(|r| r.value().clone())
    }

    /// All rules, sorted by package name.
    pub fn all_rules(&self) -> Vec<PackageRule> {
        let mut rules: Vec<_> = self.rules.iter().map(|r| r.value().clone()).collect();
        rules.sort_by(|a, b| a.name.cmp(&b.name));
        rules
    }

    /// Insert-or-update a payment keyed by its triple.
    ///
    /// On conflict only `confirmed` may advance (false → true). Amount,
    /// identity fields and the creation timestamp stay as first written,
    /// so a buggy or malicious retry cannot rewrite payment terms.
    pub fn record_payment(&self, payment: Payment) -> Result<Payment, LedgerError> {
        let stored = match self.payments.entry(payment.key()) {
            Entry::Occupied(mut entry) => {
                let row = entry.get_mut();
                if payment.confirmed {
                    row.confirmed = true;
                }
                row.clone()
            }
            Entry::Vacant(entry) => entry.insert(payment).clone(),
        };
        self.persist()?;
        Ok(stored)
    }

    /// Confirm payment rows for a (package, user) pair.
    ///
    /// With a `tx_hash` only the matching row is touched. Without one,
    /// every row for the pair is confirmed; that broader form is the
    /// manual-override path and is logged accordingly.
    pub fn mark_confirmed(
        &self,
        package_name: &str,
        user_id: &str,
        tx_hash: Option<&str>,
    ) -> Result<bool, LedgerError> {
        if tx_hash.is_none() {
            tracing::warn!(
                package = package_name,
                user = user_id,
                "Confirming all payment rows for pair (manual override)"
            );
        }
        let mut changed = false;
        for mut entry in self.payments.iter_mut() {
            let row = entry.value_mut();
            if row.package_name == package_name
                && row.user_id == user_id
                && tx_hash.map_or(true, |h| row.tx_hash.as_deref() == Some(h))
                && !row.confirmed
            {
                row.confirmed = true;
                changed = true;
            }
        }
        if changed {
            self.persist()?;
        }
        Ok(changed)
    }

    /// True iff at least one confirmed row exists for the pair. This is
    /// the single source of truth behind the payment-status endpoint.
    pub fn is_paid(&self, package_name: &str, user_id: &str) -> bool {
        self.payments.iter().any(|p| {
            p.package_name == package_name && p.user_id == user_id && p.confirmed
        })
    }

    /// Sum of confirmed amounts for a package.
    pub fn donations_total(&self, package_name: &str) -> f64 {
        self.payments
            .iter()
            .filter(|p| p.package_name == package_name && p.confirmed)
            .map(|p| p.amount)
            .sum()
    }

    /// All payment rows for a package, newest first.
    pub fn payments_for(&self, package_name: &str) -> Vec<Payment> {
        let mut rows: Vec<_> = self
            .payments
            .iter()
            .filter(|p| p.package_name == package_name)
            .map(|p| p.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.key().cmp(&b.key())));
        rows
    }

    fn persist(&self) -> Result<(), LedgerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mut data = LedgerFile {
            rules: self
                .rules
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect(),
            payments: self.payments.iter().map(|p| p.value().clone()).collect(),
        };
        data.payments.sort_by_key(Payment::key);
        let file = File::create(path)?;
        serde_json::to_writer(BufWriter::new(file), &data)?;
        Ok(())
    }
}
