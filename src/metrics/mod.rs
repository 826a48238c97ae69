use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

// ============================================================================
// Metrics Module - Prometheus counters for the fulfillment engine
// ============================================================================
//
// Counts the things operators actually page on:
// - Status transitions and emitted lifecycle events
// - Stock applications, already-applied repeats, and skipped ingredients
// - Ledger postings and guarded duplicates
// - Subscriber failures and notification outcomes
//
// The registry is exposed for whatever scrape surface the hosting process
// wires up; this crate itself carries no HTTP endpoint.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub orders_created: IntCounter,
    pub status_transitions: IntCounterVec,
    pub events_emitted: IntCounterVec,
    pub subscriber_failures: IntCounterVec,

    pub stock_applications: IntCounter,
    pub stock_already_applied: IntCounter,
    pub stock_skips: IntCounterVec,

    pub ledger_postings: IntCounterVec,
    pub ledger_already_posted: IntCounterVec,

    pub notifications: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_created =
            IntCounter::new("orders_created_total", "Total orders accepted at intake")?;
        registry.register(Box::new(orders_created.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new(
                "order_status_transitions_total",
                "Effective order status transitions",
            ),
            &["to_status"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        let events_emitted = IntCounterVec::new(
            Opts::new("events_emitted_total", "Lifecycle events emitted on the bus"),
            &["event"],
        )?;
        registry.register(Box::new(events_emitted.clone()))?;

        let subscriber_failures = IntCounterVec::new(
            Opts::new(
                "subscriber_failures_total",
                "Subscriber errors contained at the bus boundary",
            ),
            &["subscriber", "event"],
        )?;
        registry.register(Box::new(subscriber_failures.clone()))?;

        let stock_applications = IntCounter::new(
            "stock_applications_total",
            "Orders whose stock consumption was applied",
        )?;
        registry.register(Box::new(stock_applications.clone()))?;

        let stock_already_applied = IntCounter::new(
            "stock_already_applied_total",
            "Stock applications short-circuited by the idempotency guard",
        )?;
        registry.register(Box::new(stock_already_applied.clone()))?;

        let stock_skips = IntCounterVec::new(
            Opts::new(
                "stock_skips_total",
                "Ingredients skipped during stock application",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(stock_skips.clone()))?;

        let ledger_postings = IntCounterVec::new(
            Opts::new("ledger_postings_total", "Cash movements posted"),
            &["category"],
        )?;
        registry.register(Box::new(ledger_postings.clone()))?;

        let ledger_already_posted = IntCounterVec::new(
            Opts::new(
                "ledger_already_posted_total",
                "Ledger postings short-circuited by the idempotency guard",
            ),
            &["category"],
        )?;
        registry.register(Box::new(ledger_already_posted.clone()))?;

        let notifications = IntCounterVec::new(
            Opts::new("notifications_total", "Notification dispatch outcomes"),
            &["outcome"],
        )?;
        registry.register(Box::new(notifications.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            status_transitions,
            events_emitted,
            subscriber_failures,
            stock_applications,
            stock_already_applied,
            stock_skips,
            ledger_postings,
            ledger_already_posted,
            notifications,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_transition(&self, to_status: &str) {
        self.status_transitions
            .with_label_values(&[to_status])
            .inc();
    }

    pub fn record_event(&self, event: &str) {
        self.events_emitted.with_label_values(&[event]).inc();
    }

    pub fn record_subscriber_failure(&self, subscriber: &str, event: &str) {
        self.subscriber_failures
            .with_label_values(&[subscriber, event])
            .inc();
    }

    pub fn record_stock_skip(&self, reason: &str) {
        self.stock_skips.with_label_values(&[reason]).inc();
    }

    pub fn record_ledger_posting(&self, category: &str) {
        self.ledger_postings.with_label_values(&[category]).inc();
    }

    pub fn record_notification(&self, outcome: &str) {
        self.notifications.with_label_values(&[outcome]).inc();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
