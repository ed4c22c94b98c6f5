use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use billrun::gateways::{ChargeOutcome, ChargeRequest, PaymentGateway};

/// Gateway answering from a script and recording every call
pub struct ScriptedGateway {
    default: ChargeOutcome,
    scripted: Mutex<HashMap<i64, ChargeOutcome>>,
    delay: Option<Duration>,
    calls: Mutex<Vec<ChargeRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    pub fn answering(default: ChargeOutcome) -> Self {
        Self {
            default,
            scripted: Mutex::new(HashMap::new()),
            delay: None,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn paying() -> Self {
        Self::answering(ChargeOutcome::Paid)
    }

    /// Take `delay` to answer each charge
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn script(self, invoice_id: i64, outcome: ChargeOutcome) -> Self {
        self.scripted.lock().unwrap().insert(invoice_id, outcome);
        self
    }

    pub fn calls(&self) -> Vec<ChargeRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, invoice_id: i64) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.invoice_id == invoice_id)
            .count()
    }

    /// Highest number of charges that were in progress at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn charge(&self, request: &ChargeRequest) -> ChargeOutcome {
        self.calls.lock().unwrap().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.scripted
            .lock()
            .unwrap()
            .get(&request.invoice_id)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
