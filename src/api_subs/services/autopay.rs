//! Autopay poller.
//!
//! A background task that periodically scans for active recurring
//! subscriptions whose next billing date has elapsed and pushes each one
//! through the same pricing/order path as a user-initiated checkout. Runs in
//! a single process; there is no cross-instance lock, so exactly one
//! deployment of this service should have the poller enabled.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::api_subs::models::sub::Subscription;
use crate::api_subs::services::{checkout, pay, sub};
use crate::common::error::Res;
use crate::common::razorpay::RazorpayClient;

pub struct AutopayPoller {
    pool: Arc<PgPool>,
    gateway: Arc<RazorpayClient>,
    interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl AutopayPoller {
    pub fn new(pool: Arc<PgPool>, gateway: Arc<RazorpayClient>, interval: Duration) -> Self {
        AutopayPoller {
            pool,
            gateway,
            interval,
            handle: Mutex::new(None),
        }
    }

    /// Starts the poll loop. Idempotent: a second call while the loop is
    /// running is logged and ignored, so there is never more than one timer.
    /// Returns whether a new loop was started.
    pub fn start(&self) -> bool {
        let mut guard = self.handle.lock().expect("autopay poller lock poisoned");
        if guard.is_some() {
            log::warn!("Autopay poller already running, start() ignored");
            return false;
        }

        let pool = self.pool.clone();
        let gateway = self.gateway.clone();
        let interval = self.interval;

        log::info!("Starting autopay poller (interval {:?})", interval);
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // consume the immediate first tick so the loop waits one full
            // interval before its first scan
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = run_billing_cycle(&pool, &gateway).await {
                    log::error!("Autopay cycle failed: {}", e);
                }
            }
        }));

        true
    }

    /// Stops the poll loop. Returns whether a running loop was stopped.
    pub fn stop(&self) -> bool {
        let mut guard = self.handle.lock().expect("autopay poller lock poisoned");
        match guard.take() {
            Some(handle) => {
                handle.abort();
                log::info!("Autopay poller stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .expect("autopay poller lock poisoned")
            .is_some()
    }
}

impl Drop for AutopayPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One scan: charge every due subscription. Per-subscription failures are
/// logged and left for the next tick; they do not abort the cycle.
async fn run_billing_cycle(pool: &PgPool, gateway: &RazorpayClient) -> Res<()> {
    let due = due_subscriptions(pool).await?;
    if due.is_empty() {
        log::debug!("Autopay cycle: nothing due");
        return Ok(());
    }

    log::info!("Autopay cycle: {} subscription(s) due", due.len());
    for subscription in due {
        match charge_renewal(pool, gateway, &subscription).await {
            Ok(renewed) => log::info!(
                "Autopay charged subscription {} ({}), next billing {:?}",
                renewed.id,
                renewed.package_name,
                renewed.next_billing_date
            ),
            Err(e) => log::error!(
                "Autopay charge failed for subscription {}: {}",
                subscription.id,
                e
            ),
        }
    }

    Ok(())
}

async fn due_subscriptions(pool: &PgPool) -> Res<Vec<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        "SELECT * FROM user_subscriptions
         WHERE status = 'active' AND payment_type = 'recurring'
           AND next_billing_date IS NOT NULL AND next_billing_date <= $1",
    )
    .bind(Utc::now().naive_utc())
    .fetch_all(pool)
    .await
    .map_err(crate::common::error::AppError::from)
}

/// Creates the renewal order against the gateway, then advances the record's
/// billing schedule. The order id doubles as the invoice reference.
async fn charge_renewal(
    pool: &PgPool,
    gateway: &RazorpayClient,
    subscription: &Subscription,
) -> Res<Subscription> {
    let transaction_id = checkout::new_transaction_id();
    let mut notes = checkout::CheckoutNotes::new(&transaction_id);
    notes.push("renewal", "true");
    notes.push("subscription_id", &subscription.id.to_string());
    notes.push("package_name", &subscription.package_name);
    notes.push("user_id", &subscription.user_id.to_string());

    let order = gateway
        .create_order(
            pay::to_paise(subscription.recurring_amount),
            pay::CURRENCY,
            &transaction_id,
            &notes.to_json(),
        )
        .await?;

    sub::renew_subscription(pool, subscription.id, &order.id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poller() -> AutopayPoller {
        let pool = Arc::new(
            PgPool::connect_lazy("postgres://localhost/spotlink_test")
                .expect("lazy pool construction cannot fail"),
        );
        let gateway = Arc::new(RazorpayClient::new(
            "https://api.razorpay.test",
            "rzp_test_key",
            "secret",
        ));
        // long interval so no tick fires during the test
        AutopayPoller::new(pool, gateway, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let poller = poller();
        assert!(poller.start());
        assert!(!poller.start());
        assert!(poller.is_running());
        assert!(poller.stop());
    }

    #[tokio::test]
    async fn stop_clears_the_timer() {
        let poller = poller();
        assert!(!poller.stop());
        assert!(poller.start());
        assert!(poller.stop());
        assert!(!poller.is_running());
        // restart after stop is a fresh loop
        assert!(poller.start());
        assert!(poller.stop());
    }
}
