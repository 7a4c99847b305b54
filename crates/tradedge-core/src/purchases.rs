//! Purchased-package derivation.
//!
//! A package counts as purchased when the first entry of its payment history
//! paid exactly the declared price and is marked completed. Later entries
//! (refunds, installments, retries) are deliberately not consulted.

use serde::{Deserialize, Serialize};

use crate::models::{PaymentStatus, TransactionRecord};

/// Ordered, duplicate-free set of purchased package ids.
///
/// Order follows the first qualifying record in the input, which keeps the
/// output reproducible for a given input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchasedPackages(Vec<String>);

impl PurchasedPackages {
    pub fn contains(&self, package_id: &str) -> bool {
        self.0.iter().any(|id| id == package_id)
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<'a> IntoIterator for &'a PurchasedPackages {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Whether a single record qualifies as purchased.
pub fn is_purchased(record: &TransactionRecord) -> bool {
    if record.package_id().is_none() {
        return false;
    }
    match record.first_payment() {
        Some(first) => {
            first.amount.numeric_eq(&record.declared_price())
                && first.status == PaymentStatus::Completed
        }
        None => false,
    }
}

/// Derive the purchased package ids from a transaction list.
pub fn derive(transactions: &[TransactionRecord]) -> PurchasedPackages {
    let mut ids: Vec<String> = Vec::new();
    for record in transactions.iter().filter(|r| is_purchased(r)) {
        let Some(id) = record.package_id() else {
            continue;
        };
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    PurchasedPackages(ids)
}
