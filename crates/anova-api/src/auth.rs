use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Every Anova personal access token starts with this prefix.
pub const TOKEN_PREFIX: &str = "anova-";

/// A personal access token for the Anova cloud.
///
/// Generated in the Anova Oven app under More > Developer > Personal Access
/// Tokens. The only validation performed locally is the prefix check; the
/// service decides whether the token is actually valid.
#[derive(Debug, Clone)]
pub struct Credential {
    token: SecretString,
}

impl Credential {
    /// Parse a token, trimming surrounding whitespace.
    pub fn parse(token: &str) -> Result<Self, Error> {
        let token = token.trim();
        if !token.starts_with(TOKEN_PREFIX) {
            return Err(Error::InvalidCredentialFormat);
        }
        Ok(Self {
            token: SecretString::from(token.to_owned()),
        })
    }

    /// Build from an already-secret token (config or keyring lookups).
    pub fn from_secret(token: &SecretString) -> Result<Self, Error> {
        Self::parse(token.expose_secret())
    }

    pub(crate) fn expose(&self) -> &str {
        self.token.expose_secret()
    }

    /// Masked form for display: prefix plus the last four characters.
    pub fn redacted(&self) -> String {
        let token = self.expose();
        let tail: String = token
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("{TOKEN_PREFIX}****{tail}")
    }
}

/// Device families the service can report over the websocket.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Accessory {
    /// Anova Precision Cooker (sous vide stick).
    #[strum(serialize = "APC")]
    #[serde(rename = "APC")]
    Apc,
    /// Anova Precision Oven.
    #[strum(serialize = "APO")]
    #[serde(rename = "APO")]
    Apo,
}

impl Accessory {
    /// Event tag the service uses to push this family's device list.
    pub fn wifi_list_event(self) -> &'static str {
        match self {
            Self::Apc => crate::wire::event::APC_WIFI_LIST,
            Self::Apo => crate::wire::event::APO_WIFI_LIST,
        }
    }

    /// Name used when the service omits one.
    pub fn default_device_name(self) -> &'static str {
        match self {
            Self::Apc => "Anova Precision Cooker",
            Self::Apo => "Anova Precision Oven",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_prefixed_token() {
        let cred = Credential::parse("  anova-abc123\n").unwrap();
        assert_eq!(cred.expose(), "anova-abc123");
    }

    #[test]
    fn rejects_unprefixed_tokens() {
        for bad in ["", "abc123", "Anova-abc", "anova_abc", " xanova-abc", "bearer anova-x"] {
            assert!(
                matches!(Credential::parse(bad), Err(Error::InvalidCredentialFormat)),
                "token {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn redacted_hides_the_secret() {
        let cred = Credential::parse("anova-secretvalue1234").unwrap();
        let shown = cred.redacted();
        assert_eq!(shown, "anova-****1234");
        assert!(!format!("{cred:?}").contains("secretvalue"));
    }

    #[test]
    fn accessory_wire_names() {
        assert_eq!(Accessory::Apc.to_string(), "APC");
        assert_eq!("APO".parse::<Accessory>().unwrap(), Accessory::Apo);
    }
}
