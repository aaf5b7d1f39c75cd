//! Who is registering, and from where.
//!
//! The registration gate only trusts three facts about its caller: the
//! machine it is running on, the uid behind the process, and the
//! connection-origin string the login session carries. This module turns
//! those three into a validated [`Session`] or refuses.
//!
//! Identity resolution (uid to login name) is a seam: production code uses
//! the passwd database via [`SystemIdentity`], tests inject whatever they
//! need through [`IdentityLookup`].

use nix::unistd::{Uid, User};
use tracing::debug;
use wargate_error::{Result, WargateError};

use crate::record::Token;

/// The one host this gate accepts registrations on.
pub const EXPECTED_HOST: &str = "cswar.ellery.edu";

/// Environment variable carrying the connection origin. `sshd` sets it to
/// `"<client-ip> <client-port> <server-port>"`.
pub const ORIGIN_ENV: &str = "SSH_CLIENT";

/// Separator between the origin address and the rest of the value.
const ORIGIN_SEPARATOR: char = ' ';

/// Resolves a numeric uid to a login name.
pub trait IdentityLookup {
    fn login_name(&self, uid: Uid) -> Result<String>;
}

/// Passwd-database lookup, the production identity source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemIdentity;

impl IdentityLookup for SystemIdentity {
    fn login_name(&self, uid: Uid) -> Result<String> {
        match User::from_uid(uid) {
            Ok(Some(user)) => Ok(user.name),
            Ok(None) => Err(WargateError::IdentityLookup {
                uid: uid.as_raw(),
                source: None,
            }),
            Err(errno) => Err(WargateError::IdentityLookup {
                uid: uid.as_raw(),
                source: Some(errno.into()),
            }),
        }
    }
}

/// The raw execution context, captured once by the binary.
///
/// Nothing in here has been checked yet; [`Session::resolve`] does that.
#[derive(Debug, Clone, Copy)]
pub struct SessionEnv<'a> {
    /// What `gethostname` reported.
    pub hostname: &'a str,
    /// The uid the process runs as.
    pub uid: Uid,
    /// The [`ORIGIN_ENV`] value, if the session carries one.
    pub origin_value: Option<&'a str>,
}

/// A caller cleared to attempt a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Login name resolved from the caller's uid.
    pub account: Token,
    /// Address the caller's session connected from.
    pub origin: Token,
}

impl Session {
    /// Validate the execution context in the gate's fixed order: host
    /// first, then identity, then origin presence and shape.
    ///
    /// The origin address is everything before the first space of the
    /// connection-origin value.
    pub fn resolve<I>(env: &SessionEnv<'_>, identity: &I) -> Result<Self>
    where
        I: IdentityLookup + ?Sized,
    {
        if env.hostname != EXPECTED_HOST {
            return Err(WargateError::WrongHost {
                expected: EXPECTED_HOST,
                actual: env.hostname.to_owned(),
            });
        }

        let account = identity.login_name(env.uid)?;
        let account = Token::new("account name", account)?;

        let raw = env.origin_value.ok_or(WargateError::NoOrigin { var: ORIGIN_ENV })?;
        let (address, _rest) =
            raw.split_once(ORIGIN_SEPARATOR)
                .ok_or_else(|| WargateError::MalformedOrigin {
                    value: raw.to_owned(),
                })?;
        let origin = Token::new("origin address", address)?;

        debug!(account = %account, origin = %origin, "session resolved");
        Ok(Self { account, origin })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always resolves to the same login name.
    struct FixedIdentity(&'static str);

    impl IdentityLookup for FixedIdentity {
        fn login_name(&self, _uid: Uid) -> Result<String> {
            Ok(self.0.to_owned())
        }
    }

    /// Behaves like a uid with no passwd entry.
    struct MissingIdentity;

    impl IdentityLookup for MissingIdentity {
        fn login_name(&self, uid: Uid) -> Result<String> {
            Err(WargateError::IdentityLookup {
                uid: uid.as_raw(),
                source: None,
            })
        }
    }

    fn env_on_host<'a>(hostname: &'a str, origin_value: Option<&'a str>) -> SessionEnv<'a> {
        SessionEnv {
            hostname,
            uid: Uid::from_raw(1000),
            origin_value,
        }
    }

    #[test]
    fn resolves_account_and_origin_address() {
        let env = env_on_host(EXPECTED_HOST, Some("10.1.2.3 51234 22"));
        let session = Session::resolve(&env, &FixedIdentity("alice")).expect("valid session");
        assert_eq!(session.account.as_str(), "alice");
        assert_eq!(session.origin.as_str(), "10.1.2.3");
    }

    #[test]
    fn refuses_any_other_host() {
        let env = env_on_host("workstation.local", Some("10.1.2.3 51234 22"));
        let err = Session::resolve(&env, &FixedIdentity("alice")).unwrap_err();
        assert!(matches!(
            err,
            WargateError::WrongHost { expected: EXPECTED_HOST, actual } if actual == "workstation.local"
        ));
    }

    #[test]
    fn host_check_runs_before_identity() {
        // Wrong host loses even when identity would also fail.
        let env = env_on_host("workstation.local", None);
        let err = Session::resolve(&env, &MissingIdentity).unwrap_err();
        assert!(matches!(err, WargateError::WrongHost { .. }));
    }

    #[test]
    fn unresolvable_uid_is_an_identity_error() {
        let env = env_on_host(EXPECTED_HOST, Some("10.1.2.3 51234 22"));
        let err = Session::resolve(&env, &MissingIdentity).unwrap_err();
        assert!(matches!(
            err,
            WargateError::IdentityLookup { uid: 1000, source: None }
        ));
    }

    #[test]
    fn missing_origin_is_refused() {
        let env = env_on_host(EXPECTED_HOST, None);
        let err = Session::resolve(&env, &FixedIdentity("alice")).unwrap_err();
        assert!(matches!(err, WargateError::NoOrigin { var: ORIGIN_ENV }));
    }

    #[test]
    fn origin_without_separator_is_malformed() {
        let env = env_on_host(EXPECTED_HOST, Some("10.1.2.3"));
        let err = Session::resolve(&env, &FixedIdentity("alice")).unwrap_err();
        assert!(matches!(
            err,
            WargateError::MalformedOrigin { value } if value == "10.1.2.3"
        ));
    }

    #[test]
    fn origin_stops_at_the_first_separator() {
        let env = env_on_host(EXPECTED_HOST, Some("fe80::1 51234 22"));
        let session = Session::resolve(&env, &FixedIdentity("alice")).expect("valid session");
        assert_eq!(session.origin.as_str(), "fe80::1");
    }

    #[test]
    fn over_long_login_name_fails_validation() {
        let env = env_on_host(EXPECTED_HOST, Some("10.1.2.3 51234 22"));
        let err = Session::resolve(&env, &FixedIdentity("a-login-name-well-past-the-31-byte-line"))
            .unwrap_err();
        assert!(matches!(
            err,
            WargateError::InvalidToken { field: "account name", .. }
        ));
    }
}
