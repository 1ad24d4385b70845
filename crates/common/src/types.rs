use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SocialError;

/// The social-login providers this workspace talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Qq,
    #[serde(alias = "weixin")]
    WeChat,
    Weibo,
}

impl ProviderKind {
    pub const ALL: [Self; 3] = [Self::Qq, Self::WeChat, Self::Weibo];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qq => "qq",
            Self::WeChat => "wechat",
            Self::Weibo => "weibo",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = SocialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qq" => Ok(Self::Qq),
            "wechat" | "weixin" => Ok(Self::WeChat),
            "weibo" => Ok(Self::Weibo),
            other => Err(SocialError::InvalidArgument {
                reason: format!("unknown provider: {other}"),
            }),
        }
    }
}

/// Which of the two identifiers a provider hands out becomes the canonical
/// identity id of a login.
///
/// QQ and WeChat both issue a per-application `openid` and, for apps bound to
/// the same developer account, a cross-application `unionid`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityIdMode {
    /// Always use the per-application id (`openid`).
    #[default]
    #[serde(alias = "openid")]
    PrimaryId,
    /// Always use the cross-application id (`unionid`).
    #[serde(alias = "unionid")]
    UnifiedId,
    /// Use `unionid` when present and non-empty, otherwise `openid`.
    #[serde(alias = "unionid_first")]
    UnifiedIdPreferred,
}

impl IdentityIdMode {
    /// Pick the canonical id out of a response. Empty strings count as absent.
    pub fn select<'a>(self, primary: Option<&'a str>, unified: Option<&'a str>) -> Option<&'a str> {
        let primary = primary.filter(|id| !id.is_empty());
        let unified = unified.filter(|id| !id.is_empty());
        match self {
            Self::PrimaryId => primary,
            Self::UnifiedId => unified,
            Self::UnifiedIdPreferred => unified.or(primary),
        }
    }

    /// Whether the provider has to be asked for the unified id explicitly.
    pub fn wants_unified(self) -> bool {
        !matches!(self, Self::PrimaryId)
    }

    /// Response field that must be present for [`select`](Self::select) to succeed.
    pub fn required_field(self) -> &'static str {
        match self {
            Self::UnifiedId => "unionid",
            Self::PrimaryId | Self::UnifiedIdPreferred => "openid",
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case(IdentityIdMode::PrimaryId, Some("open"), Some("union"), Some("open"))]
    #[case(IdentityIdMode::UnifiedId, Some("open"), Some("union"), Some("union"))]
    #[case(IdentityIdMode::UnifiedId, Some("open"), None, None)]
    #[case(IdentityIdMode::UnifiedIdPreferred, Some("open"), Some("union"), Some("union"))]
    #[case(IdentityIdMode::UnifiedIdPreferred, Some("open"), None, Some("open"))]
    #[case(IdentityIdMode::UnifiedIdPreferred, Some("open"), Some(""), Some("open"))]
    #[case(IdentityIdMode::PrimaryId, Some(""), Some("union"), None)]
    fn test_select(
        #[case] mode: IdentityIdMode,
        #[case] primary: Option<&str>,
        #[case] unified: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(mode.select(primary, unified), expected);
    }

    #[test]
    fn test_mode_deserializes_legacy_names() {
        let mode: IdentityIdMode = serde_json::from_str("\"unionid_first\"").unwrap();
        assert_eq!(mode, IdentityIdMode::UnifiedIdPreferred);
        let mode: IdentityIdMode = serde_json::from_str("\"unified_id\"").unwrap();
        assert_eq!(mode, IdentityIdMode::UnifiedId);
    }

    #[test]
    fn test_wants_unified() {
        assert!(!IdentityIdMode::PrimaryId.wants_unified());
        assert!(IdentityIdMode::UnifiedId.wants_unified());
        assert!(IdentityIdMode::UnifiedIdPreferred.wants_unified());
    }

    #[test]
    fn test_provider_kind_round_trips_through_str() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert_eq!("Weixin".parse::<ProviderKind>().unwrap(), ProviderKind::WeChat);
        assert!("github".parse::<ProviderKind>().is_err());
    }
}
