//! Checkout-options factory.
//!
//! Every options object handed to the payment widget is built here, so the
//! anti-refund metadata and the gateway's 15-entry notes limit are applied in
//! exactly one place instead of being re-derived per call site.

use serde::Serialize;
use uuid::Uuid;

use crate::api_subs::dtos::pay::CustomerInfo;

/// Hard limit the gateway imposes on the notes map.
pub const NOTES_LIMIT: usize = 15;

/// Keys that must survive truncation: the no-refund markers and the
/// per-attempt transaction id.
pub const RESERVED_NOTE_KEYS: [&str; 4] = [
    "is_non_refundable",
    "refund_status",
    "refund_policy",
    "transaction_id",
];

pub fn new_transaction_id() -> String {
    format!("TXN_{}", Uuid::new_v4().simple())
}

/// Priority-ordered checkout metadata.
///
/// Reserved entries are seeded on construction and cannot be displaced;
/// everything else keeps insertion order and is dropped from the tail when
/// the map would exceed [`NOTES_LIMIT`].
#[derive(Debug, Clone)]
pub struct CheckoutNotes {
    entries: Vec<(String, String)>,
}

impl CheckoutNotes {
    pub fn new(transaction_id: &str) -> Self {
        CheckoutNotes {
            entries: vec![
                ("is_non_refundable".to_string(), "true".to_string()),
                ("refund_status".to_string(), "none".to_string()),
                ("refund_policy".to_string(), "no-refund".to_string()),
                ("transaction_id".to_string(), transaction_id.to_string()),
            ],
        }
    }

    /// Sets `key` to `value`, replacing an existing entry in place so a
    /// rewrite never changes an entry's priority.
    pub fn push(&mut self, key: &str, value: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            self.entries.push((key.to_string(), value.to_string()));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries that will actually be sent: reserved keys first, then the
    /// highest-priority extras up to the limit.
    pub fn truncated(&self) -> Vec<(String, String)> {
        let mut kept: Vec<(String, String)> = self
            .entries
            .iter()
            .filter(|(k, _)| RESERVED_NOTE_KEYS.contains(&k.as_str()))
            .cloned()
            .collect();

        for (key, value) in &self.entries {
            if kept.len() >= NOTES_LIMIT {
                break;
            }
            if !RESERVED_NOTE_KEYS.contains(&key.as_str()) {
                kept.push((key.clone(), value.clone()));
            }
        }

        kept
    }

    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .truncated()
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::String(v)))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Autopay token parameters: the gateway will not charge more than
/// `max_amount` (paise) across the remaining `payment_count` cycles.
#[derive(Debug, Clone, Serialize)]
pub struct RecurringToken {
    pub max_amount: i64,
    pub payment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutPrefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// The widget-ready options object. Transient: logged, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOptions {
    pub key: String,
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub description: String,
    pub order_id: String,
    pub prefill: CheckoutPrefill,
    pub notes: serde_json::Value,
    pub is_one_time: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_token: Option<RecurringToken>,
}

#[allow(clippy::too_many_arguments)]
pub fn build_checkout_options(
    key_id: &str,
    amount_paise: i64,
    currency: &str,
    name: &str,
    description: &str,
    order_id: &str,
    customer: &CustomerInfo,
    notes: CheckoutNotes,
    is_one_time: bool,
    recurring_token: Option<RecurringToken>,
) -> CheckoutOptions {
    let options = CheckoutOptions {
        key: key_id.to_string(),
        amount: amount_paise,
        currency: currency.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        order_id: order_id.to_string(),
        prefill: CheckoutPrefill {
            name: customer.name.clone(),
            email: customer.email.clone(),
            contact: customer.contact.clone().unwrap_or_default(),
        },
        notes: notes.to_json(),
        is_one_time,
        recurring_token,
    };

    log::info!(
        "Built checkout options: order={} amount={} {} one_time={}",
        options.order_id,
        options.amount,
        options.currency,
        options.is_one_time
    );

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notes_seed_reserved_entries() {
        let notes = CheckoutNotes::new("TXN_abc");
        assert_eq!(notes.len(), 4);
        let json = notes.to_json();
        assert_eq!(json["is_non_refundable"], "true");
        assert_eq!(json["refund_policy"], "no-refund");
        assert_eq!(json["transaction_id"], "TXN_abc");
    }

    #[test]
    fn oversized_notes_truncate_but_keep_reserved_keys() {
        let mut notes = CheckoutNotes::new("TXN_abc");
        for i in 0..20 {
            notes.push(&format!("extra_{i}"), "v");
        }
        assert_eq!(notes.len(), 24);

        let kept = notes.truncated();
        assert!(kept.len() <= NOTES_LIMIT);
        for key in RESERVED_NOTE_KEYS {
            assert!(
                kept.iter().any(|(k, _)| k == key),
                "reserved key {key} was dropped"
            );
        }
    }

    #[test]
    fn truncation_drops_lowest_priority_extras() {
        let mut notes = CheckoutNotes::new("TXN_abc");
        for i in 0..20 {
            notes.push(&format!("extra_{i}"), "v");
        }
        let kept = notes.truncated();
        // 4 reserved + the first 11 extras
        assert!(kept.iter().any(|(k, _)| k == "extra_0"));
        assert!(kept.iter().any(|(k, _)| k == "extra_10"));
        assert!(!kept.iter().any(|(k, _)| k == "extra_11"));
    }

    #[test]
    fn push_replaces_in_place() {
        let mut notes = CheckoutNotes::new("TXN_abc");
        notes.push("package_id", "a");
        notes.push("package_id", "b");
        assert_eq!(notes.len(), 5);
        assert_eq!(notes.to_json()["package_id"], "b");
    }

    #[test]
    fn transaction_ids_are_unique_per_attempt() {
        assert_ne!(new_transaction_id(), new_transaction_id());
        assert!(new_transaction_id().starts_with("TXN_"));
    }
}
