//! Identity-provider boundary.
//!
//! Credential verification happens outside the core: the transport layer
//! validates the caller's token against the identity provider and resolves
//! it to the claims below. The core trusts any context handed to it and
//! never re-derives identity itself.

use campool_storage::{InstitutionId, UserId};

/// Claims resolved from a verified credential.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user_id: UserId,
    pub institution_id: InstitutionId,
    /// Role claim carried through from the provider; not consulted by any
    /// lifecycle rule in this core.
    pub role: String,
}
