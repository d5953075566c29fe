//! Bundler pool errors.

use bundlr_core::LedgerError;
use bundlr_membership::MembershipError;
use bundlr_types::Address;
use thiserror::Error;

/// Why a bundler pool action was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BundlersError {
    /// Rejected membership transition.
    #[error(transparent)]
    Membership(#[from] MembershipError),

    /// Caller is neither the owner nor on the admission list.
    #[error("{0} is not allowed to administer the pool")]
    NotAuthorized(Address),

    /// Address is already on the admission list.
    #[error("{0} is already an allowed interactor")]
    AlreadyInteractor(Address),

    /// Address is not on the admission list.
    #[error("{0} is not an allowed interactor")]
    UnknownInteractor(Address),

    /// `syncSlash` on a pool with no validator committee configured, or one
    /// the host does not know.
    #[error("No slashing verdict source configured")]
    NoVerdictSource,
}

impl From<LedgerError> for BundlersError {
    fn from(err: LedgerError) -> Self {
        BundlersError::Membership(MembershipError::Ledger(err))
    }
}
