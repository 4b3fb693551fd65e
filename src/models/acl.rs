//! Access-control grants attached to stored objects.

use serde::{Deserialize, Serialize};

/// Canonical URI of the provider's "all users" group principal, i.e. anonymous
/// public access. Grantees are normalized to this form before comparison.
pub const ALL_USERS_GROUP_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";

/// Identity of the party a grant applies to.
///
/// Group grantees are keyed by URI, canonical users by their account ID.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum Grantee {
    Group { uri: String },
    CanonicalUser { id: String },
    Email { address: String },
}

impl Grantee {
    /// Build a group grantee, resolving the all-users URI to its canonical
    /// form so an `https://` (or otherwise re-spelled) variant still compares
    /// equal to [`ALL_USERS_GROUP_URI`].
    pub fn group(uri: &str) -> Self {
        let canonical = uri.strip_prefix("https://").map(|rest| format!("http://{rest}"));
        let uri = match canonical {
            Some(ref http_form) if http_form == ALL_USERS_GROUP_URI => http_form.clone(),
            _ => uri.to_string(),
        };
        Grantee::Group { uri }
    }

    /// The all-users group grantee.
    pub fn all_users() -> Self {
        Grantee::Group {
            uri: ALL_USERS_GROUP_URI.to_string(),
        }
    }
}

/// Action a grant permits on an object.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    Read,
    Write,
    ReadAcp,
    WriteAcp,
    FullControl,
}

/// A single (grantee, permission) entry from an object's ACL.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AclGrant {
    pub grantee: Grantee,
    pub permission: Permission,
}

/// The well-known grant that marks an object publicly readable.
pub fn public_read_grant() -> AclGrant {
    AclGrant {
        grantee: Grantee::all_users(),
        permission: Permission::Read,
    }
}

/// True iff the grant set contains an entry exactly equal to
/// (all-users, READ). A broader grant such as (all-users, FULL_CONTROL) does
/// not count: the comparison is by equality, not permission subsumption.
pub fn is_public_read(grants: &[AclGrant]) -> bool {
    let public = public_read_grant();
    grants.iter().any(|grant| *grant == public)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_full_control() -> AclGrant {
        AclGrant {
            grantee: Grantee::CanonicalUser {
                id: "owner-canonical-id".into(),
            },
            permission: Permission::FullControl,
        }
    }

    #[test]
    fn all_users_read_is_public() {
        assert!(is_public_read(&[public_read_grant()]));
    }

    #[test]
    fn all_users_read_among_other_grants_is_public() {
        assert!(is_public_read(&[owner_full_control(), public_read_grant()]));
    }

    #[test]
    fn empty_grant_set_is_private() {
        assert!(!is_public_read(&[]));
    }

    #[test]
    fn owner_grants_alone_are_private() {
        assert!(!is_public_read(&[owner_full_control()]));
    }

    #[test]
    fn all_users_full_control_does_not_count_as_public() {
        // Exact-match rule: FULL_CONTROL subsumes READ at the provider, but
        // the public flag only recognizes the literal READ grant.
        let grant = AclGrant {
            grantee: Grantee::all_users(),
            permission: Permission::FullControl,
        };
        assert!(!is_public_read(&[grant]));
    }

    #[test]
    fn https_all_users_uri_is_canonicalized() {
        let grant = AclGrant {
            grantee: Grantee::group("https://acs.amazonaws.com/groups/global/AllUsers"),
            permission: Permission::Read,
        };
        assert_eq!(grant.grantee, Grantee::all_users());
        assert!(is_public_read(&[grant]));
    }

    #[test]
    fn other_group_uri_is_left_untouched() {
        let grantee = Grantee::group("http://acs.amazonaws.com/groups/global/AuthenticatedUsers");
        assert_eq!(
            grantee,
            Grantee::Group {
                uri: "http://acs.amazonaws.com/groups/global/AuthenticatedUsers".into()
            }
        );
    }
}
