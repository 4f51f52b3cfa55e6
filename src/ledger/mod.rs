//! Cross-domain payment ledger: charge aggregation, payment
//! classification, balance composition and the payment state machine.
//! Everything here is pure — persistence and chargeable lookups live in
//! the service layer.

pub mod balance;
pub mod charges;
pub mod classify;
pub mod transitions;

pub use balance::Balance;
pub use charges::{gross_total, ChargeSummary};
pub use classify::PaymentBuckets;
pub use transitions::{apply, ChargeableState, PaymentAction};
