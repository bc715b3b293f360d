use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{PulseError, PulseResult};

/// Who is acting: an anonymous device, an authenticated user, or both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub device_id: Option<String>,
    pub user_id: Option<String>,
}

impl Identity {
    pub fn device(id: impl Into<String>) -> Self {
        Self {
            device_id: Some(id.into()),
            user_id: None,
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Self {
            device_id: None,
            user_id: Some(id.into()),
        }
    }

    pub fn with_device(mut self, id: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self
    }

    /// The user id, if present and not blank.
    pub fn known_user(&self) -> Option<&str> {
        non_blank(&self.user_id)
    }

    /// The device id, if present and not blank.
    pub fn known_device(&self) -> Option<&str> {
        non_blank(&self.device_id)
    }

    /// At least one non-blank identifier is required.
    pub fn validate(&self) -> PulseResult<()> {
        if self.known_device().is_some() || self.known_user().is_some() {
            Ok(())
        } else {
            Err(PulseError::invalid("identity requires a device or user id"))
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.known_user().is_some()
    }

    /// Reputation is tracked per user when authenticated, per device otherwise.
    /// Blank ids count as absent.
    pub fn reputation_key(&self) -> ReputationKey {
        match (self.known_user(), self.known_device()) {
            (Some(user), _) => ReputationKey::User(user.to_string()),
            (None, Some(device)) => ReputationKey::Device(device.to_string()),
            (None, None) => ReputationKey::Device(String::new()),
        }
    }

    /// Two identities refer to the same actor if they share a user or a device.
    pub fn same_actor(&self, other: &Identity) -> bool {
        let shared = |a: Option<&str>, b: Option<&str>| matches!((a, b), (Some(x), Some(y)) if x == y);
        shared(self.known_user(), other.known_user())
            || shared(self.known_device(), other.known_device())
    }

    /// Short, stable, non-reversible label for logs.
    pub fn fingerprint(&self) -> String {
        self.reputation_key().fingerprint()
    }
}

fn non_blank(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|s| !s.trim().is_empty())
}

/// Key under which a reputation record is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ReputationKey {
    Device(String),
    User(String),
}

impl ReputationKey {
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Device(id) | Self::User(id) => id,
        }
    }

    /// `device:<id>` / `user:<id>`.
    pub fn as_storage_key(&self) -> String {
        match self {
            Self::Device(id) => format!("device:{id}"),
            Self::User(id) => format!("user:{id}"),
        }
    }

    pub fn parse(raw: &str) -> PulseResult<Self> {
        match raw.split_once(':') {
            Some(("device", id)) => Ok(Self::Device(id.to_string())),
            Some(("user", id)) => Ok(Self::User(id.to_string())),
            _ => Err(PulseError::invalid(format!("malformed reputation key '{raw}'"))),
        }
    }

    pub fn fingerprint(&self) -> String {
        let hash = blake3::hash(self.as_storage_key().as_bytes());
        hash.to_hex()[..12].to_string()
    }
}

impl fmt::Display for ReputationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_wins_over_device() {
        let id = Identity::user("u1").with_device("d1");
        assert_eq!(id.reputation_key(), ReputationKey::User("u1".into()));
        assert!(id.is_authenticated());
    }

    #[test]
    fn same_actor_by_device_or_user() {
        let a = Identity::device("d1");
        let b = Identity::user("u9").with_device("d1");
        assert!(a.same_actor(&b));
        assert!(!a.same_actor(&Identity::device("d2")));
        assert!(!Identity::default().same_actor(&Identity::default()));
    }

    #[test]
    fn storage_key_round_trips() {
        let key = ReputationKey::Device("abc:def".into());
        assert_eq!(ReputationKey::parse(&key.as_storage_key()).unwrap(), key);
        assert!(ReputationKey::parse("nobody").is_err());
    }

    #[test]
    fn empty_identity_is_rejected() {
        assert!(Identity::default().validate().is_err());
        assert!(Identity::device("  ").validate().is_err());
        assert!(Identity::device("d").validate().is_ok());
    }

    #[test]
    fn blank_user_id_is_anonymous() {
        let a = Identity {
            device_id: Some("device-a".into()),
            user_id: Some(String::new()),
        };
        let b = Identity {
            device_id: Some("device-b".into()),
            user_id: Some("   ".into()),
        };
        assert!(a.validate().is_ok());
        assert!(!a.is_authenticated());
        assert_eq!(a.reputation_key(), ReputationKey::Device("device-a".into()));
        assert!(!a.same_actor(&b));
        assert!(a.same_actor(&Identity::device("device-a")));
    }

    #[test]
    fn fingerprint_hides_raw_id() {
        let fp = Identity::device("device-1234").fingerprint();
        assert_eq!(fp.len(), 12);
        assert!(!fp.contains("device"));
    }
}
