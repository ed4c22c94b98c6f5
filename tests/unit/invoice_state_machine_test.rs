use billrun::billing::{BillingError, FailureClass};
use billrun::core::Currency;
use billrun::invoices::InvoiceStatus;
use proptest::prelude::*;

fn status() -> impl Strategy<Value = InvoiceStatus> {
    prop::sample::select(InvoiceStatus::ALL.to_vec())
}

proptest! {
    #[test]
    fn terminal_statuses_never_transition(from in status(), to in status()) {
        if from.is_terminal() {
            prop_assert!(!from.can_transition_to(to));
        }
    }

    #[test]
    fn no_self_transitions(status in status()) {
        prop_assert!(!status.can_transition_to(status));
    }

    #[test]
    fn paid_and_failed_only_reachable_from_processing(from in status()) {
        let reaches_terminal = from.can_transition_to(InvoiceStatus::Paid)
            || from.can_transition_to(InvoiceStatus::Failed);
        prop_assert_eq!(reaches_terminal, from == InvoiceStatus::Processing);
    }
}

#[test]
fn test_processing_resolutions() {
    let processing = InvoiceStatus::Processing;

    assert!(processing.can_transition_to(InvoiceStatus::Paid));
    assert!(processing.can_transition_to(InvoiceStatus::Failed));
    assert!(processing.can_transition_to(InvoiceStatus::Pending));
}

#[test]
fn test_only_unreachable_and_store_errors_are_transient() {
    let transient = [
        BillingError::Unreachable {
            invoice_id: 1,
            reason: "timeout".to_string(),
        },
        BillingError::Store {
            invoice_id: 1,
            source: billrun::core::AppError::internal("connection reset"),
        },
    ];
    for error in &transient {
        assert_eq!(error.class(), FailureClass::Transient, "{}", error);
    }

    let permanent = [
        BillingError::InvoiceNotFound(1),
        BillingError::CustomerNotFound {
            invoice_id: 1,
            customer_id: 2,
        },
        BillingError::CurrencyMismatch {
            invoice_id: 1,
            customer_id: 2,
            invoice_currency: Currency::EUR,
            customer_currency: Currency::USD,
        },
        BillingError::Declined {
            invoice_id: 1,
            reason: "card expired".to_string(),
        },
        BillingError::Claim {
            invoice_id: 1,
            source: billrun::core::AppError::internal("connection reset"),
        },
        BillingError::Finalize {
            invoice_id: 1,
            intended: InvoiceStatus::Paid,
            detail: "connection reset".to_string(),
        },
    ];
    for error in &permanent {
        assert_eq!(error.class(), FailureClass::Permanent, "{}", error);
    }
}
