//! Transactions and their network captures.
//!
//! A test splits its traffic into named transactions. While a capture proxy
//! is attached, everything recorded between two transaction boundaries
//! belongs to the earlier transaction: opening a new transaction (or ending
//! the run) fetches the proxy's capture into the pending transaction and
//! resets the proxy.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::driver::CaptureProxy;
use crate::error::CommandError;

/// A named slice of a test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub name: String,
    /// HAR document recorded while the transaction was pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<String>,
}

/// Ordered transactions of one run.
#[derive(Debug, Clone, Default)]
pub struct TransactionLog {
    transactions: Vec<Transaction>,
    pending: Option<usize>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Name of the transaction captures are currently attributed to.
    pub fn pending(&self) -> Option<&str> {
        self.pending.map(|i| self.transactions[i].name.as_str())
    }

    /// Opens a transaction.
    ///
    /// The name is recorded even when it repeats an earlier one; the
    /// duplicate is then reported as [`CommandError::DuplicateTransaction`]
    /// after the capture of the previous transaction has been collected.
    pub async fn open(
        &mut self,
        name: &str,
        proxy: Option<&dyn CaptureProxy>,
    ) -> Result<(), CommandError> {
        let duplicate = self.transactions.iter().any(|t| t.name == name);

        self.transactions.push(Transaction { name: name.to_string(), capture: None });
        if let Some(proxy) = proxy {
            self.collect_pending(proxy).await;
        }
        self.pending = Some(self.transactions.len() - 1);
        info!(transaction = name, "transaction started");

        if duplicate {
            return Err(CommandError::DuplicateTransaction(name.to_string()));
        }
        Ok(())
    }

    /// Ends the run: collects the capture of the pending transaction and
    /// returns every transaction recorded.
    ///
    /// The log is empty afterwards, ready for the next iteration.
    pub async fn close_run(&mut self, proxy: Option<&dyn CaptureProxy>) -> Vec<Transaction> {
        if let Some(proxy) = proxy {
            self.collect_pending(proxy).await;
        }
        self.pending = None;
        std::mem::take(&mut self.transactions)
    }

    async fn collect_pending(&mut self, proxy: &dyn CaptureProxy) {
        let Some(index) = self.pending else {
            return;
        };
        match proxy.fetch_capture().await {
            Ok(capture) => self.transactions[index].capture = Some(capture),
            Err(e) => warn!(
                transaction = %self.transactions[index].name,
                error = %e,
                "failed to fetch network capture"
            ),
        }
        if let Err(e) = proxy.reset_capture().await {
            warn!(error = %e, "failed to reset network capture");
        }
    }
}
