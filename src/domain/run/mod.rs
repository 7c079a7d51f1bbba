//! Run module - The run aggregate, its evidence, and its ledger.

mod aggregate;
mod evidence;
mod ledger;
mod status;

pub use aggregate::{Run, RunError};
pub use evidence::{EvidenceKind, EvidenceRecord, EvidenceSource};
pub use ledger::{Ledger, LedgerEntry, LedgerError, LedgerKind};
pub use status::RunStatus;
