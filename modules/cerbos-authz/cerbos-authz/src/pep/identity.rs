//! Authenticated principal as seen by the enforcement point.

use cerbos_authz_sdk::HostValue;
use indexmap::IndexMap;

/// Principal placed in request extensions by the authentication layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: String,
    /// Granted authorities, possibly `ROLE_`-prefixed.
    pub authorities: Vec<String>,
    /// Extra details about the principal, sent as the `details` attribute.
    pub attributes: IndexMap<String, HostValue>,
    /// Account state reported by the authentication layer, if it tracks one.
    pub account: Option<AccountStatus>,
    authenticated: bool,
}

/// Account state flags, sent as principal attributes when known.
#[allow(clippy::struct_excessive_bools)] // one flag per account condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountStatus {
    pub account_non_expired: bool,
    pub account_non_locked: bool,
    pub credentials_non_expired: bool,
    pub enabled: bool,
}

impl Default for AccountStatus {
    fn default() -> Self {
        Self {
            account_non_expired: true,
            account_non_locked: true,
            credentials_non_expired: true,
            enabled: true,
        }
    }
}

impl Identity {
    /// An authenticated principal.
    #[must_use]
    pub fn authenticated<I, R>(id: impl Into<String>, authorities: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            id: id.into(),
            authorities: authorities.into_iter().map(Into::into).collect(),
            attributes: IndexMap::new(),
            account: None,
            authenticated: true,
        }
    }

    /// The anonymous principal. Never authorized.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            id: "anonymous".to_owned(),
            authorities: Vec::new(),
            attributes: IndexMap::new(),
            account: None,
            authenticated: false,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<HostValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_account_status(mut self, account: AccountStatus) -> Self {
        self.account = Some(account);
        self
    }

    /// Authenticated and carrying a non-blank id.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated && !self.id.trim().is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_not_authenticated() {
        assert!(!Identity::anonymous().is_authenticated());
    }

    #[test]
    fn blank_id_is_not_authenticated() {
        assert!(!Identity::authenticated(" ", ["ROLE_user"]).is_authenticated());
        assert!(Identity::authenticated("alice", ["ROLE_user"]).is_authenticated());
    }
}
