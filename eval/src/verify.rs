//! Shared machinery for the per-resource verification cycles.
//!
//! A [`Verifier`] owns the configuration and name clock and borrows the API
//! client. The resource modules (`locations`, `strains`, `items`) add the
//! actual create/update/get steps on top of it.

use std::thread;

use anyhow::{Context, Result, bail};
use metrc::models::Named;
use metrc::{MetrcApi, Operation, Resource, request_target};
use tracing::{debug, info, warn};

use crate::clock::{NameClock, ResourceNames};
use crate::config::{CleanupPolicy, EvalConfig};

pub struct Verifier<'a, M, C> {
    pub(crate) api: &'a M,
    pub(crate) config: EvalConfig,
    clock: C,
}

impl<'a, M: MetrcApi, C: NameClock> Verifier<'a, M, C> {
    pub fn new(api: &'a M, config: EvalConfig, clock: C) -> Self {
        Self { api, config, clock }
    }

    /// Names for one cycle, stamped with the current clock reading.
    pub fn names(&self) -> ResourceNames {
        ResourceNames::at(&self.clock)
    }

    /// Request target recorded in a row.
    pub fn target(&self, resource: Resource, op: Operation, license: &str) -> String {
        request_target(&self.config.base_url, resource, op, license)
    }

    /// Find the record just created under `name` in the active listing.
    ///
    /// The listing is fetched up to `correlation.attempts` times with growing
    /// pauses in between. Fails with "matching name not found" otherwise.
    pub fn find_created<T, F>(
        &self,
        resource: Resource,
        name: &str,
        mut list_active: F,
    ) -> Result<T>
    where
        T: Named,
        F: FnMut() -> Result<Vec<T>>,
    {
        let correlation = &self.config.correlation;
        for attempt in 0..correlation.attempts {
            let delay = correlation.delay_before(attempt);
            if !delay.is_zero() {
                debug!(%resource, attempt, ?delay, "waiting before relisting");
                thread::sleep(delay);
            }
            let active =
                list_active().with_context(|| format!("could not get active {resource}"))?;
            if let Some(found) = active.into_iter().find(|record| record.name() == name) {
                debug!(%resource, id = found.id(), attempt, "created record found");
                return Ok(found);
            }
            debug!(%resource, attempt, name, "created record not listed yet");
        }
        bail!(
            "could not get {resource} with name {name:?} after {} listing(s): matching name not found",
            correlation.attempts
        )
    }

    /// Delete the created record according to the cleanup policy.
    ///
    /// Returns the failure message when a `warn` policy delete fails, so the
    /// caller can attach it to the bundle it keeps.
    pub fn clean_up<F>(&self, resource: Resource, id: i64, delete: F) -> Result<Option<String>>
    where
        F: FnOnce() -> Result<()>,
    {
        match self.config.cleanup {
            CleanupPolicy::Skip => {
                info!(%resource, id, "cleanup skipped, keeping record");
                Ok(None)
            }
            CleanupPolicy::Propagate => {
                delete()?;
                info!(%resource, id, "record deleted");
                Ok(None)
            }
            CleanupPolicy::Warn => match delete() {
                Ok(()) => {
                    info!(%resource, id, "record deleted");
                    Ok(None)
                }
                Err(err) => {
                    let message = format!("could not delete {resource} {id}: {err:#}");
                    warn!(%resource, id, error = %message, "cleanup failed, keeping results");
                    Ok(Some(message))
                }
            },
        }
    }
}
