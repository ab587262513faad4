//! Batch worker running provisioning requests concurrently

use crate::Provisioner;
use ferry_domain::{CompletionRecord, MetadataStore, ProvisioningRequest};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Runs batches of provisioning requests on the blocking thread pool
///
/// All requests share one [`Provisioner`], so files landing in the same
/// folder still get distinct names.
///
/// # Examples
///
/// ```no_run
/// use ferry_catalog::SqliteCatalog;
/// use ferry_domain::{FileOperation, ProvisioningRequest};
/// use ferry_provision::{Provisioner, ProvisioningWorker};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = Arc::new(SqliteCatalog::new("catalog.db")?);
///     let worker = ProvisioningWorker::new(Arc::new(Provisioner::new(store)));
///
///     let requests = vec![
///         ProvisioningRequest::new("/in/a.csv", "/out", FileOperation::Copy),
///         ProvisioningRequest::new("/in/b.csv", "/out", FileOperation::Copy),
///     ];
///     for record in worker.run_batch(requests).await {
///         println!("{}", record.guard);
///     }
///     Ok(())
/// }
/// ```
pub struct ProvisioningWorker<S: MetadataStore> {
    provisioner: Arc<Provisioner<S>>,
}

impl<S: MetadataStore + 'static> ProvisioningWorker<S> {
    /// Create a worker over a shared provisioner
    pub fn new(provisioner: Arc<Provisioner<S>>) -> Self {
        Self { provisioner }
    }

    /// The shared provisioner
    pub fn provisioner(&self) -> &Arc<Provisioner<S>> {
        &self.provisioner
    }

    /// Run every request concurrently; records come back in input order
    ///
    /// There is exactly one record per request. A task that panics or is
    /// cancelled yields an exception record for its slot.
    pub async fn run_batch(&self, requests: Vec<ProvisioningRequest>) -> Vec<CompletionRecord> {
        let total = requests.len();
        tracing::info!("Provisioning batch of {} requests", total);

        let handles: Vec<_> = requests
            .into_iter()
            .map(|request| {
                let provisioner = Arc::clone(&self.provisioner);
                tokio::task::spawn_blocking(move || provisioner.provision(&request))
            })
            .collect();

        let records = collect_records(handles).await;

        let succeeded = records.iter().filter(|r| r.guard.is_success()).count();
        tracing::info!(
            "Batch finished: {} of {} requests provisioned",
            succeeded,
            total
        );
        records
    }
}

/// Await every task, turning a failed one into an exception record
async fn collect_records(handles: Vec<JoinHandle<CompletionRecord>>) -> Vec<CompletionRecord> {
    let mut records = Vec::with_capacity(handles.len());
    for (slot, handle) in handles.into_iter().enumerate() {
        let record = match handle.await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(slot, error = %e, "provisioning task failed");
                CompletionRecord::exception(format!("provisioning task failed: {}", e))
            }
        };
        records.push(record);
    }
    records
}
