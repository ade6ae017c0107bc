//! # Agreement Scanner
//!
//! Walks the id space `[0, count)` in ascending order, one read per id.
//! There is no cursor between invocations: every trigger rescans from 0.
//!
//! A failed count read ends the scan before it starts. A failed read for
//! one id is yielded as [`ScanItem::ReadFailed`] and the walk continues
//! with the next id, so one bad record cannot poison a cycle.

use oath_core::{Agreement, AgreementId};
use oath_ledger::{EvmClient, LedgerError, SlaLedger};

/// One step of a scan.
#[derive(Debug)]
pub enum ScanItem {
    /// An active agreement, ready for evaluation.
    Active(Agreement),
    /// An inactive agreement. Never evaluated.
    Inactive(AgreementId),
    /// The record could not be read or decoded.
    ReadFailed { id: AgreementId, error: LedgerError },
}

/// Sequential cursor over every agreement on the ledger.
pub struct AgreementScanner<'a, C> {
    ledger: &'a SlaLedger<C>,
    count: u64,
    next: u64,
}

impl<'a, C: EvmClient> AgreementScanner<'a, C> {
    /// Read the agreement count and position the cursor at id 0.
    pub async fn start(ledger: &'a SlaLedger<C>) -> Result<Self, LedgerError> {
        let count = ledger.agreement_count().await?;
        Ok(Self {
            ledger,
            count,
            next: 0,
        })
    }

    /// Total agreements on the ledger when the scan started.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Read the next agreement, or `None` once `count` ids were visited.
    pub async fn next(&mut self) -> Option<ScanItem> {
        if self.next >= self.count {
            return None;
        }
        let id = AgreementId::new(self.next);
        self.next += 1;

        Some(match self.ledger.agreement(id).await {
            Ok(agreement) if agreement.active => ScanItem::Active(agreement),
            Ok(_) => ScanItem::Inactive(id),
            Err(error) => ScanItem::ReadFailed { id, error },
        })
    }
}
