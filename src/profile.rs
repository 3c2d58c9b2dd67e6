//! Sender profile lookup against the messaging platform's HTTP API.
//!
//! Profile enrichment is best-effort: every outcome, including a missing
//! access token or an HTTP failure, comes back as a [`ProfileResolution`]
//! value rather than an error, so the caller always goes on to store the
//! event.

use std::time::Duration;

use serde::Deserialize;

use crate::event::{Source, SourceKind};
use crate::tlog;

pub const DEFAULT_PROFILE_API: &str = "https://api.line.me/v2/bot";
pub const DEFAULT_PROFILE_TIMEOUT: Duration = Duration::from_secs(5);

/// Display metadata returned by the profile endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub picture_url: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
}

/// Why no lookup was attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoAccessToken,
    MissingGroupId,
    MissingRoomId,
    UnknownSource(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoAccessToken => write!(f, "access token not configured"),
            SkipReason::MissingGroupId => write!(f, "group source without groupId"),
            SkipReason::MissingRoomId => write!(f, "room source without roomId"),
            SkipReason::UnknownSource(tag) => write!(f, "unknown source type {tag:?}"),
        }
    }
}

/// A lookup that was attempted and failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    Status(u16),
    Transport(String),
    Decode(String),
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Status(code) => write!(f, "profile API returned {code}"),
            ProfileError::Transport(e) => write!(f, "profile request failed: {e}"),
            ProfileError::Decode(e) => write!(f, "invalid profile response: {e}"),
        }
    }
}

impl std::error::Error for ProfileError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileResolution {
    Resolved(Profile),
    Skipped(SkipReason),
    Failed(ProfileError),
}

impl ProfileResolution {
    /// The resolved profile, or `None` for any skip or failure.
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            ProfileResolution::Resolved(p) => Some(p),
            _ => None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.profile().and_then(|p| p.display_name.as_deref())
    }

    pub fn picture_url(&self) -> Option<&str> {
        self.profile().and_then(|p| p.picture_url.as_deref())
    }
}

/// Anything that can turn a source descriptor into display metadata.
pub trait ProfileLookup: Send + Sync {
    fn resolve(&self, source: &Source, user_id: &str) -> ProfileResolution;
}

/// Pick the profile endpoint for an event's source, relative to the API base.
pub fn profile_path(source: &Source, user_id: &str) -> Result<String, SkipReason> {
    match &source.kind {
        SourceKind::User => Ok(format!("/profile/{user_id}")),
        SourceKind::Group => source
            .group_id
            .as_deref()
            .map(|gid| format!("/group/{gid}/member/{user_id}"))
            .ok_or(SkipReason::MissingGroupId),
        SourceKind::Room => source
            .room_id
            .as_deref()
            .map(|rid| format!("/room/{rid}/member/{user_id}"))
            .ok_or(SkipReason::MissingRoomId),
        SourceKind::Other(tag) => Err(SkipReason::UnknownSource(tag.clone())),
    }
}

/// Profile lookup over HTTP with a bearer token.
pub struct HttpProfileResolver {
    agent: ureq::Agent,
    api_base: String,
    access_token: Option<String>,
}

impl HttpProfileResolver {
    pub fn new(api_base: &str, access_token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: access_token.filter(|t| !t.is_empty()),
        }
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    fn fetch(&self, path: &str, token: &str) -> Result<Profile, ProfileError> {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .agent
            .get(&url)
            .set("Authorization", &format!("Bearer {token}"))
            .call();

        match response {
            Ok(resp) if resp.status() == 200 => resp
                .into_json::<Profile>()
                .map_err(|e| ProfileError::Decode(e.to_string())),
            Ok(resp) => Err(ProfileError::Status(resp.status())),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                tlog!("profile: {} responded {}: {}", url, code, body.trim());
                Err(ProfileError::Status(code))
            }
            Err(e) => Err(ProfileError::Transport(e.to_string())),
        }
    }
}

impl ProfileLookup for HttpProfileResolver {
    fn resolve(&self, source: &Source, user_id: &str) -> ProfileResolution {
        let Some(token) = self.access_token.as_deref() else {
            return ProfileResolution::Skipped(SkipReason::NoAccessToken);
        };
        let path = match profile_path(source, user_id) {
            Ok(path) => path,
            Err(reason) => return ProfileResolution::Skipped(reason),
        };
        match self.fetch(&path, token) {
            Ok(profile) => ProfileResolution::Resolved(profile),
            Err(e) => ProfileResolution::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(kind: SourceKind, group: Option<&str>, room: Option<&str>) -> Source {
        Source {
            kind,
            user_id: Some("U1".into()),
            group_id: group.map(String::from),
            room_id: room.map(String::from),
        }
    }

    #[test]
    fn user_source_uses_direct_profile() {
        let path = profile_path(&source(SourceKind::User, None, None), "U1");
        assert_eq!(path.as_deref(), Ok("/profile/U1"));
    }

    #[test]
    fn group_and_room_use_member_endpoints() {
        let group = profile_path(&source(SourceKind::Group, Some("G1"), None), "U1");
        assert_eq!(group.as_deref(), Ok("/group/G1/member/U1"));

        let room = profile_path(&source(SourceKind::Room, None, Some("R1")), "U1");
        assert_eq!(room.as_deref(), Ok("/room/R1/member/U1"));
    }

    #[test]
    fn missing_container_id_is_skipped() {
        assert_eq!(
            profile_path(&source(SourceKind::Group, None, Some("R1")), "U1"),
            Err(SkipReason::MissingGroupId)
        );
        assert_eq!(
            profile_path(&source(SourceKind::Room, Some("G1"), None), "U1"),
            Err(SkipReason::MissingRoomId)
        );
    }

    #[test]
    fn unknown_source_is_skipped() {
        assert_eq!(
            profile_path(&source(SourceKind::Other("channel".into()), None, None), "U1"),
            Err(SkipReason::UnknownSource("channel".into()))
        );
    }

    #[test]
    fn no_token_skips_before_any_request() {
        // Unroutable base: any request attempt would surface as Failed, not Skipped.
        let resolver = HttpProfileResolver::new("http://127.0.0.1:1", None, Duration::from_millis(50));
        assert!(!resolver.has_access_token());
        assert_eq!(
            resolver.resolve(&Source::user("U1"), "U1"),
            ProfileResolution::Skipped(SkipReason::NoAccessToken)
        );

        let empty = HttpProfileResolver::new("http://127.0.0.1:1", Some(String::new()), DEFAULT_PROFILE_TIMEOUT);
        assert!(!empty.has_access_token());
    }

    #[test]
    fn group_without_id_skips_even_with_token() {
        let resolver = HttpProfileResolver::new(
            "http://127.0.0.1:1",
            Some("token".into()),
            Duration::from_millis(50),
        );
        assert_eq!(
            resolver.resolve(&source(SourceKind::Group, None, None), "U1"),
            ProfileResolution::Skipped(SkipReason::MissingGroupId)
        );
    }

    #[test]
    fn unreachable_api_is_a_transport_failure() {
        let resolver = HttpProfileResolver::new(
            "http://127.0.0.1:1",
            Some("token".into()),
            Duration::from_millis(200),
        );
        match resolver.resolve(&Source::user("U1"), "U1") {
            ProfileResolution::Failed(ProfileError::Transport(_)) => {}
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[test]
    fn resolution_accessors() {
        let resolved = ProfileResolution::Resolved(Profile {
            display_name: Some("Alice".into()),
            picture_url: Some("https://cdn/p.png".into()),
            status_message: None,
        });
        assert_eq!(resolved.display_name(), Some("Alice"));
        assert_eq!(resolved.picture_url(), Some("https://cdn/p.png"));
        assert_eq!(ProfileResolution::Failed(ProfileError::Status(404)).display_name(), None);
    }
}
