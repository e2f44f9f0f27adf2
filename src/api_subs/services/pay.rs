//! Pricing math and checkout authorization.
//!
//! These functions are the single source of truth for amounts: the authorize
//! endpoint and the autopay poller both go through them, and clients only
//! echo what the server returned. All figures are integer INR until
//! [`to_paise`] at the gateway boundary.

use sqlx::PgPool;
use uuid::Uuid;

use crate::api_subs::dtos::pay::CustomerInfo;
use crate::api_subs::models::sub::{BillingCycle, PaymentType, SubscriptionPackage};
use crate::api_subs::services::checkout::{self, CheckoutNotes, CheckoutOptions};
use crate::api_subs::services::package;
use crate::common::error::Res;
use crate::common::razorpay::RazorpayClient;

pub const CURRENCY: &str = "INR";

pub fn to_paise(amount: i64) -> i64 {
    amount * 100
}

/// Number of whole yearly billing cycles a package spans. A 13-month package
/// still bills a second year.
fn yearly_cycles(duration_months: i32) -> i64 {
    ((duration_months + 11) / 12) as i64
}

/// The amount to charge right now for a checkout attempt.
///
/// One-time packages charge the full price plus the setup fee up front.
/// Recurring monthly packages charge the setup fee plus any advance months;
/// recurring yearly packages charge the setup fee, plus the first year's
/// price only when an advance was configured.
pub fn calculate_initial_payment(pkg: &SubscriptionPackage, _enable_auto_pay: bool) -> i64 {
    match pkg.kind() {
        PaymentType::OneTime => pkg.price + pkg.setup_fee,
        PaymentType::Recurring => match pkg.cycle() {
            BillingCycle::Monthly => {
                pkg.setup_fee + pkg.advance_payment_months as i64 * pkg.monthly_price_or_default()
            }
            BillingCycle::Yearly => {
                if pkg.advance_payment_months > 0 {
                    pkg.setup_fee + pkg.price
                } else {
                    pkg.setup_fee
                }
            }
        },
    }
}

/// Total cost of the package over its full duration, setup fee included.
pub fn calculate_total_package_price(pkg: &SubscriptionPackage) -> i64 {
    match pkg.kind() {
        PaymentType::OneTime => pkg.price + pkg.setup_fee,
        PaymentType::Recurring => match pkg.cycle() {
            BillingCycle::Monthly => {
                pkg.setup_fee + pkg.monthly_price_or_default() * pkg.duration_months as i64
            }
            BillingCycle::Yearly => pkg.setup_fee + pkg.price * yearly_cycles(pkg.duration_months),
        },
    }
}

/// What is still owed after the initial payment. Sizes the autopay token's
/// max_amount; never enforced against a ledger.
pub fn calculate_remaining_amount(pkg: &SubscriptionPackage, enable_auto_pay: bool) -> i64 {
    let remaining =
        calculate_total_package_price(pkg) - calculate_initial_payment(pkg, enable_auto_pay);
    remaining.max(0)
}

/// The per-cycle charge for a recurring package. Zero for one-time packages.
pub fn calculate_recurring_payment_amount(pkg: &SubscriptionPackage) -> i64 {
    match pkg.kind() {
        PaymentType::OneTime => 0,
        PaymentType::Recurring => match pkg.cycle() {
            BillingCycle::Monthly => pkg.monthly_price_or_default(),
            BillingCycle::Yearly => pkg.price,
        },
    }
}

/// How many billing events remain after the initial payment.
pub fn calculate_recurring_payment_count(pkg: &SubscriptionPackage) -> i64 {
    match pkg.kind() {
        PaymentType::OneTime => 0,
        PaymentType::Recurring => match pkg.cycle() {
            BillingCycle::Monthly => {
                (pkg.duration_months as i64 - pkg.advance_payment_months as i64).max(0)
            }
            BillingCycle::Yearly => {
                let prepaid = if pkg.advance_payment_months > 0 { 1 } else { 0 };
                (yearly_cycles(pkg.duration_months) - prepaid).max(0)
            }
        },
    }
}

/// Server-side authorization of a checkout attempt.
///
/// Loads the package from the catalog (client-supplied package data is not
/// trusted), computes the amount, creates a gateway order and returns the
/// widget-ready options. Nothing is persisted; the subscription row is only
/// written when the capture callback arrives.
pub async fn authorize_checkout(
    pool: &PgPool,
    gateway: &RazorpayClient,
    package_id: Uuid,
    user_id: Uuid,
    customer: &CustomerInfo,
    use_one_time_preferred: bool,
    enable_auto_pay: bool,
) -> Res<CheckoutOptions> {
    let pkg = package::get_active_package(pool, package_id).await?;

    // A recurring package bought with the one-time preference is charged in
    // full up front and behaves as one-time from then on.
    let is_one_time = pkg.kind() == PaymentType::OneTime || use_one_time_preferred;
    let amount = if is_one_time {
        calculate_total_package_price(&pkg)
    } else {
        calculate_initial_payment(&pkg, enable_auto_pay)
    };

    let transaction_id = checkout::new_transaction_id();
    let mut notes = CheckoutNotes::new(&transaction_id);
    notes.push("package_id", &pkg.id.to_string());
    notes.push("package_title", &pkg.title);
    notes.push("user_id", &user_id.to_string());
    notes.push("customer_email", &customer.email);
    notes.push("payment_type", if is_one_time { "one-time" } else { "recurring" });

    let order = gateway
        .create_order(to_paise(amount), CURRENCY, &transaction_id, &notes.to_json())
        .await?;

    let recurring = (!is_one_time && enable_auto_pay).then(|| checkout::RecurringToken {
        max_amount: to_paise(calculate_remaining_amount(&pkg, enable_auto_pay)),
        payment_count: calculate_recurring_payment_count(&pkg),
    });

    Ok(checkout::build_checkout_options(
        gateway.key_id(),
        to_paise(amount),
        CURRENCY,
        &pkg.title,
        &pkg.description,
        &order.id,
        customer,
        notes,
        is_one_time,
        recurring,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn package(payment_type: &str, billing_cycle: &str) -> SubscriptionPackage {
        let now = Utc::now().naive_utc();
        SubscriptionPackage {
            id: Uuid::new_v4(),
            title: "Growth".to_string(),
            description: String::new(),
            price: 1000,
            monthly_price: None,
            setup_fee: 200,
            duration_months: 12,
            billing_cycle: billing_cycle.to_string(),
            payment_type: payment_type.to_string(),
            advance_payment_months: 0,
            features: serde_json::json!([]),
            dashboard_sections: serde_json::json!([]),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn one_time_initial_payment_is_price_plus_setup_fee() {
        let pkg = package("one-time", "monthly");
        assert_eq!(calculate_initial_payment(&pkg, false), 1200);
    }

    #[test]
    fn yearly_recurring_without_advance_charges_setup_fee_only() {
        let pkg = package("recurring", "yearly");
        assert_eq!(calculate_initial_payment(&pkg, true), 200);
    }

    #[test]
    fn yearly_recurring_with_advance_charges_first_year() {
        let mut pkg = package("recurring", "yearly");
        pkg.advance_payment_months = 12;
        assert_eq!(calculate_initial_payment(&pkg, true), 1200);
    }

    #[test]
    fn monthly_recurring_charges_advance_months() {
        let mut pkg = package("recurring", "monthly");
        pkg.monthly_price = Some(100);
        pkg.advance_payment_months = 3;
        assert_eq!(calculate_initial_payment(&pkg, true), 500);
    }

    #[test]
    fn total_is_initial_plus_remaining() {
        for (payment_type, cycle, advance) in [
            ("one-time", "monthly", 0),
            ("recurring", "monthly", 2),
            ("recurring", "yearly", 0),
            ("recurring", "yearly", 12),
        ] {
            let mut pkg = package(payment_type, cycle);
            pkg.monthly_price = Some(100);
            pkg.advance_payment_months = advance;
            assert_eq!(
                calculate_total_package_price(&pkg),
                calculate_initial_payment(&pkg, true) + calculate_remaining_amount(&pkg, true),
                "inconsistent totals for {payment_type}/{cycle}/advance={advance}"
            );
        }
    }

    #[test]
    fn monthly_total_covers_full_duration() {
        let mut pkg = package("recurring", "monthly");
        pkg.monthly_price = Some(100);
        assert_eq!(calculate_total_package_price(&pkg), 200 + 100 * 12);
    }

    #[test]
    fn yearly_cycles_round_up() {
        let mut pkg = package("recurring", "yearly");
        pkg.duration_months = 13;
        assert_eq!(calculate_total_package_price(&pkg), 200 + 1000 * 2);
    }

    #[test]
    fn recurring_count_excludes_advance_months() {
        let mut pkg = package("recurring", "monthly");
        pkg.advance_payment_months = 3;
        assert_eq!(calculate_recurring_payment_count(&pkg), 9);

        let mut yearly = package("recurring", "yearly");
        yearly.advance_payment_months = 12;
        assert_eq!(calculate_recurring_payment_count(&yearly), 0);
        yearly.advance_payment_months = 0;
        assert_eq!(calculate_recurring_payment_count(&yearly), 1);
    }

    #[test]
    fn one_time_has_no_recurring_charges() {
        let pkg = package("one-time", "monthly");
        assert_eq!(calculate_recurring_payment_amount(&pkg), 0);
        assert_eq!(calculate_recurring_payment_count(&pkg), 0);
    }

    #[test]
    fn paise_conversion_is_integer() {
        assert_eq!(to_paise(1200), 120_000);
    }
}
