use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::config::BillingConfig;
use crate::core::{AppError, Clock};
use crate::modules::billing::models::{BillingError, CycleSummary, InvoiceOutcome};
use crate::modules::customers::repositories::CustomerRepository;
use crate::modules::gateways::services::{ChargeOutcome, ChargeRequest, PaymentGateway};
use crate::modules::invoices::models::InvoiceStatus;
use crate::modules::invoices::repositories::{InvoiceRepository, StatusTransition};

/// Drives due invoices through the charge workflow, one cycle at a time
///
/// A cycle selects every PENDING invoice whose schedule date has passed and
/// processes each one independently:
///
/// 1. re-read the invoice and stop unless it is still PENDING
/// 2. load the customer
/// 3. claim the invoice (PENDING -> PROCESSING, compare-and-set)
/// 4. currency mismatch -> FAILED without charging
/// 5. charge once; PAID, FAILED on decline, or back to PENDING with a later
///    schedule date when the gateway is unreachable
///
/// At most `max_concurrency` invoices are in flight; the cycle returns only
/// after all of them finished.
#[derive(Clone)]
pub struct BillingService {
    invoices: Arc<dyn InvoiceRepository>,
    customers: Arc<dyn CustomerRepository>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    config: BillingConfig,
    span: Span,
}

impl BillingService {
    pub fn new(
        invoices: Arc<dyn InvoiceRepository>,
        customers: Arc<dyn CustomerRepository>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        config: BillingConfig,
    ) -> Self {
        Self {
            invoices,
            customers,
            gateway,
            clock,
            config,
            span: info_span!("billing"),
        }
    }

    /// Record every cycle under the given span instead of the default `billing` span
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Run one billing cycle over all due invoices
    pub async fn run_cycle(&self) -> CycleSummary {
        let cycle_id = Uuid::new_v4();
        let span = info_span!(parent: &self.span, "billing_cycle", %cycle_id);

        self.sweep(cycle_id).instrument(span).await
    }

    async fn sweep(&self, cycle_id: Uuid) -> CycleSummary {
        let mut summary = CycleSummary::new(cycle_id);
        let now = self.clock.now();

        info!(now = %now, "Starting billing cycle");

        let due = match self.invoices.fetch_due_pending(now).await {
            Ok(due) => due,
            Err(e) => {
                error!(error = %e, "Failed to fetch due invoices, skipping cycle");
                return summary;
            }
        };

        if due.is_empty() {
            info!("No invoices due");
            return summary;
        }

        summary.candidates = due.len();
        info!(
            candidates = due.len(),
            max_concurrency = self.config.max_concurrency,
            "Processing due invoices"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut invoice_ids = Vec::with_capacity(due.len());
        let mut handles = Vec::with_capacity(due.len());

        for invoice in due {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(error = %e, "Billing worker pool closed");
                    break;
                }
            };

            let service = self.clone();
            let invoice_id = invoice.id;
            let span = info_span!("invoice", invoice_id);

            invoice_ids.push(invoice_id);
            handles.push(tokio::spawn(
                async move {
                    let outcome = service.process_invoice(invoice_id).await;
                    drop(permit);
                    outcome
                }
                .instrument(span),
            ));
        }

        for (invoice_id, joined) in invoice_ids.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    error!(
                        invoice_id,
                        error = %e,
                        "Invoice task aborted, manual intervention required"
                    );
                    summary.errored += 1;
                }
            }
        }

        info!(
            candidates = summary.candidates,
            paid = summary.paid,
            rescheduled = summary.rescheduled,
            failed = summary.failed,
            skipped = summary.skipped,
            not_found = summary.not_found,
            errored = summary.errored,
            "Billing cycle complete"
        );

        summary
    }

    /// Run the charge workflow for a single invoice and log how it ended
    pub async fn process_invoice(&self, invoice_id: i64) -> InvoiceOutcome {
        debug!(invoice_id, "Processing invoice");

        let outcome = self.attempt(invoice_id).await;
        log_outcome(invoice_id, &outcome);
        outcome
    }

    async fn attempt(&self, invoice_id: i64) -> InvoiceOutcome {
        let invoice = match self.invoices.find_by_id(invoice_id).await {
            Ok(Some(invoice)) => invoice,
            Ok(None) => return InvoiceOutcome::NotFound(BillingError::InvoiceNotFound(invoice_id)),
            Err(source) => return store_error(invoice_id, source),
        };

        // The batch snapshot may be stale: another cycle or an operator may have moved it
        if invoice.status != InvoiceStatus::Pending {
            return InvoiceOutcome::Skipped {
                status: invoice.status,
            };
        }

        let customer = match self.customers.find_by_id(invoice.customer_id).await {
            Ok(Some(customer)) => customer,
            Ok(None) => {
                return InvoiceOutcome::NotFound(BillingError::CustomerNotFound {
                    invoice_id,
                    customer_id: invoice.customer_id,
                })
            }
            Err(source) => return store_error(invoice_id, source),
        };

        match self
            .invoices
            .compare_and_set_status(
                invoice_id,
                InvoiceStatus::Pending,
                InvoiceStatus::Processing,
                None,
            )
            .await
        {
            Ok(StatusTransition::Applied(_)) => {}
            Ok(StatusTransition::NotFound) => {
                return InvoiceOutcome::NotFound(BillingError::InvoiceNotFound(invoice_id))
            }
            Ok(StatusTransition::Conflict { actual }) => {
                return InvoiceOutcome::Skipped { status: actual }
            }
            // The update may have been applied before the error surfaced
            Err(source) => {
                return InvoiceOutcome::Errored(BillingError::Claim { invoice_id, source })
            }
        }

        if invoice.currency() != customer.currency {
            let cause = BillingError::CurrencyMismatch {
                invoice_id,
                customer_id: customer.id,
                invoice_currency: invoice.currency(),
                customer_currency: customer.currency,
            };
            return self
                .finalize(invoice_id, InvoiceStatus::Failed, None, InvoiceOutcome::Failed(cause))
                .await;
        }

        let request = ChargeRequest::for_invoice(&invoice);
        info!(invoice_id, amount = %request.money(), gateway = self.gateway.name(), "Charging invoice");

        let charge_timeout = self.config.charge_timeout();
        let charged = match timeout(charge_timeout, self.gateway.charge(&request)).await {
            Ok(charged) => charged,
            Err(_) => ChargeOutcome::unreachable(format!(
                "no answer within {}s",
                charge_timeout.as_secs()
            )),
        };

        match charged {
            ChargeOutcome::Paid => {
                self.finalize(invoice_id, InvoiceStatus::Paid, None, InvoiceOutcome::Paid)
                    .await
            }
            ChargeOutcome::Unreachable { reason } => {
                let schedule_date = self
                    .clock
                    .now()
                    .checked_add_signed(self.config.reschedule_interval())
                    .unwrap_or(DateTime::<Utc>::MAX_UTC);
                let cause = BillingError::Unreachable { invoice_id, reason };
                self.finalize(
                    invoice_id,
                    InvoiceStatus::Pending,
                    Some(schedule_date),
                    InvoiceOutcome::Rescheduled {
                        schedule_date,
                        cause,
                    },
                )
                .await
            }
            ChargeOutcome::Declined { reason } => {
                let cause = BillingError::Declined { invoice_id, reason };
                self.finalize(invoice_id, InvoiceStatus::Failed, None, InvoiceOutcome::Failed(cause))
                    .await
            }
        }
    }

    /// Release the claim by moving PROCESSING to its final status
    async fn finalize(
        &self,
        invoice_id: i64,
        next: InvoiceStatus,
        schedule_date: Option<DateTime<Utc>>,
        outcome: InvoiceOutcome,
    ) -> InvoiceOutcome {
        let detail = match self
            .invoices
            .compare_and_set_status(invoice_id, InvoiceStatus::Processing, next, schedule_date)
            .await
        {
            Ok(StatusTransition::Applied(_)) => return outcome,
            Ok(StatusTransition::NotFound) => "invoice disappeared while processing".to_string(),
            Ok(StatusTransition::Conflict { actual }) => {
                format!("status changed to {} while processing", actual)
            }
            Err(e) => format!("store error, status unconfirmed: {}", e),
        };

        if let Some(cause) = outcome.error() {
            warn!(invoice_id, cause = %cause, "Outcome could not be recorded");
        }

        InvoiceOutcome::Errored(BillingError::Finalize {
            invoice_id,
            intended: next,
            detail,
        })
    }
}

fn store_error(invoice_id: i64, source: AppError) -> InvoiceOutcome {
    InvoiceOutcome::Errored(BillingError::Store { invoice_id, source })
}

fn log_outcome(invoice_id: i64, outcome: &InvoiceOutcome) {
    match outcome {
        InvoiceOutcome::Paid => info!(invoice_id, "Payment successful, invoice marked paid"),
        InvoiceOutcome::Rescheduled {
            schedule_date,
            cause,
        } => warn!(
            invoice_id,
            schedule_date = %schedule_date,
            error = %cause,
            "Payment failed with a network error, rescheduled"
        ),
        InvoiceOutcome::Failed(cause) => {
            if cause.requires_manual_intervention() {
                error!(invoice_id, error = %cause, "Invoice marked failed, manual intervention required")
            } else {
                error!(invoice_id, error = %cause, "Invoice marked failed")
            }
        }
        InvoiceOutcome::Skipped { status } => {
            debug!(invoice_id, status = %status, "Invoice no longer pending, skipped")
        }
        InvoiceOutcome::NotFound(cause) => {
            error!(invoice_id, error = %cause, "Record not found, manual intervention required")
        }
        InvoiceOutcome::Errored(cause) => {
            if cause.requires_manual_intervention() {
                error!(
                    invoice_id,
                    error = %cause,
                    "Invoice status unconfirmed and may be stuck in PROCESSING, manual intervention required"
                )
            } else {
                warn!(invoice_id, error = %cause, "Store unavailable, invoice will be retried next cycle")
            }
        }
    }
}
