//! Admission control list.

use crate::error::BundlersError;
use bundlr_types::Address;
use im::OrdSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Principals allowed to administer the bundler pool.
///
/// The owner always passes the check, whether or not it is enumerated, and
/// removing the owner's address from the set does not revoke its rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionList {
    owner: Address,
    interactors: OrdSet<Address>,
}

impl AdmissionList {
    /// List with only the implicit owner.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            interactors: OrdSet::new(),
        }
    }

    /// List with initial interactors.
    pub fn with_interactors(owner: Address, interactors: impl IntoIterator<Item = Address>) -> Self {
        Self {
            owner,
            interactors: interactors.into_iter().collect(),
        }
    }

    /// Pool owner.
    pub fn owner(&self) -> &Address {
        &self.owner
    }

    /// Enumerated interactors, sorted. Does not include the implicit owner.
    pub fn interactors(&self) -> &OrdSet<Address> {
        &self.interactors
    }

    /// Check if `caller` may administer the pool. The owner is checked first.
    pub fn is_authorized(&self, caller: &Address) -> bool {
        caller == &self.owner || self.interactors.contains(caller)
    }

    /// Fail with `NotAuthorized` unless `caller` may administer the pool.
    pub fn authorize(&self, caller: &Address) -> Result<(), BundlersError> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            debug!(caller = %caller, "admin call rejected: not authorized");
            Err(BundlersError::NotAuthorized(caller.clone()))
        }
    }

    /// Add `interactor` on behalf of `caller`.
    pub fn add(&mut self, caller: &Address, interactor: Address) -> Result<(), BundlersError> {
        self.authorize(caller)?;
        if self.interactors.contains(&interactor) {
            return Err(BundlersError::AlreadyInteractor(interactor));
        }
        info!(by = %caller, interactor = %interactor, "Interactor added");
        self.interactors.insert(interactor);
        Ok(())
    }

    /// Remove `interactor` on behalf of `caller`.
    pub fn remove(&mut self, caller: &Address, interactor: &Address) -> Result<(), BundlersError> {
        self.authorize(caller)?;
        if self.interactors.remove(interactor).is_none() {
            return Err(BundlersError::UnknownInteractor(interactor.clone()));
        }
        info!(by = %caller, interactor = %interactor, "Interactor removed");
        Ok(())
    }
}
