//! What an email sign-in hands back, beyond the user itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::UserIdentity;
use crate::types::indent_for;

/// Account timestamps reported alongside a sign-in, in milliseconds since
/// the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInMetadata {
    pub creation_timestamp: u64,
    pub last_sign_in_timestamp: u64,
}

/// Extra profile data from the sign-in method.
///
/// `profile` is whatever the upstream provider chose to return, so it is
/// kept as raw JSON. Values may be nested objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalUserInfo {
    pub user_name: Option<String>,
    pub provider_id: String,
    #[serde(default)]
    pub profile: Map<String, Value>,
}

/// The full result of a successful sign-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignInResult {
    pub user: UserIdentity,
    pub meta: Option<SignInMetadata>,
    pub info: Option<AdditionalUserInfo>,
}

impl SignInResult {
    /// Indented diagnostic lines for the metadata and additional info.
    ///
    /// The user itself is not included; use
    /// [`UserIdentity::detail_lines`] for that.
    pub fn detail_lines(&self, indent_level: usize) -> Vec<String> {
        let indent = indent_for(indent_level);
        let mut lines = Vec::new();

        if let Some(meta) = &self.meta {
            lines.push(format!("{indent}Created: {}", meta.creation_timestamp));
            lines.push(format!(
                "{indent}Last Sign-in: {}",
                meta.last_sign_in_timestamp
            ));
        }

        if let Some(info) = &self.info {
            lines.push(format!("{indent}Additional User Info:"));
            lines.push(format!(
                "{indent}  User Name: {}",
                info.user_name.as_deref().unwrap_or_default()
            ));
            lines.push(format!("{indent}  Provider ID: {}", info.provider_id));
            profile_lines(&info.profile, indent_level + 1, &mut lines);
        }

        lines
    }
}

/// Flattens a (possibly nested) profile map into `key: value` lines.
/// Nested objects get a `key:` header and their entries one level deeper.
fn profile_lines(profile: &Map<String, Value>, indent_level: usize, out: &mut Vec<String>) {
    let indent = indent_for(indent_level);
    for (key, value) in profile {
        match value {
            Value::Object(nested) => {
                out.push(format!("{indent}{key}:"));
                profile_lines(nested, indent_level + 1, out);
            }
            Value::String(s) => out.push(format!("{indent}{key}: {s}")),
            other => out.push(format!("{indent}{key}: {other}")),
        }
    }
}
