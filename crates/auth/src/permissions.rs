use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Permission (capability) identifier.
///
/// Permissions are opaque strings of the form `"<area>.<action>"`
/// (e.g. `"jobs.publish"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Capabilities checked by the HTTP layer.
pub mod catalog {
    use super::Permission;

    pub const JOBS_CREATE: Permission = Permission::from_static("jobs.create");
    pub const JOBS_PUBLISH: Permission = Permission::from_static("jobs.publish");
    pub const USERS_MANAGE: Permission = Permission::from_static("users.manage");
    pub const COMPANIES_MANAGE: Permission = Permission::from_static("companies.manage");
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionParseError {
    #[error("permissions are not valid JSON: {0}")]
    Json(String),

    #[error("unsupported permission value for '{key}': expected bool or list of actions")]
    UnsupportedValue { key: String },

    #[error("permissions must be a JSON object or array, got {0}")]
    UnsupportedShape(&'static str),
}

/// Set of capabilities granted to a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: &Permission) -> bool {
        self.0.contains(permission)
    }

    pub fn insert(&mut self, permission: Permission) {
        self.0.insert(permission);
    }

    /// Required permissions that are not in this set (order preserved).
    pub fn missing<'a>(&self, required: &'a [Permission]) -> Vec<&'a Permission> {
        required.iter().filter(|p| !self.contains(p)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Parse the stored capability mapping of a user.
    ///
    /// Accepted shapes:
    /// - `{"jobs.create": true, "jobs.publish": false}` (only `true` grants)
    /// - `{"jobs": ["create", "publish"]}` (expands to `jobs.create`, `jobs.publish`)
    /// - `["jobs.create", "jobs.publish"]`
    pub fn parse_stored(raw: &str) -> Result<Self, PermissionParseError> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }

        let value: JsonValue =
            serde_json::from_str(raw).map_err(|e| PermissionParseError::Json(e.to_string()))?;

        let mut set = Self::new();
        match value {
            JsonValue::Null => {}
            JsonValue::Array(items) => {
                for item in items {
                    match item {
                        JsonValue::String(s) => set.insert(Permission::new(s)),
                        _ => return Err(PermissionParseError::UnsupportedShape("array of non-strings")),
                    }
                }
            }
            JsonValue::Object(map) => {
                for (key, granted) in map {
                    match granted {
                        JsonValue::Bool(true) => set.insert(Permission::new(key)),
                        JsonValue::Bool(false) => {}
                        JsonValue::Array(actions) => {
                            for action in actions {
                                let JsonValue::String(action) = action else {
                                    return Err(PermissionParseError::UnsupportedValue { key });
                                };
                                set.insert(Permission::new(format!("{key}.{action}")));
                            }
                        }
                        _ => return Err(PermissionParseError::UnsupportedValue { key }),
                    }
                }
            }
            JsonValue::Bool(_) => return Err(PermissionParseError::UnsupportedShape("bool")),
            JsonValue::Number(_) => return Err(PermissionParseError::UnsupportedShape("number")),
            JsonValue::String(_) => return Err(PermissionParseError::UnsupportedShape("string")),
        }
        Ok(set)
    }

    /// Canonical stored form (`{"<permission>": true, ...}`).
    pub fn to_stored(&self) -> String {
        let map: serde_json::Map<String, JsonValue> = self
            .0
            .iter()
            .map(|p| (p.as_str().to_string(), JsonValue::Bool(true)))
            .collect();
        JsonValue::Object(map).to_string()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_boolean_mapping_and_skips_false_entries() {
        let set = PermissionSet::parse_stored(r#"{"jobs.create": true, "jobs.publish": false}"#).unwrap();
        assert!(set.contains(&catalog::JOBS_CREATE));
        assert!(!set.contains(&catalog::JOBS_PUBLISH));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn expands_grouped_actions() {
        let set = PermissionSet::parse_stored(r#"{"jobs": ["create", "publish"]}"#).unwrap();
        assert!(set.contains(&catalog::JOBS_CREATE));
        assert!(set.contains(&catalog::JOBS_PUBLISH));
    }

    #[test]
    fn accepts_plain_list_and_empty_input() {
        let set = PermissionSet::parse_stored(r#"["users.manage"]"#).unwrap();
        assert!(set.contains(&catalog::USERS_MANAGE));
        assert!(PermissionSet::parse_stored("").unwrap().is_empty());
        assert!(PermissionSet::parse_stored("null").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_mappings() {
        assert!(matches!(
            PermissionSet::parse_stored("{not json"),
            Err(PermissionParseError::Json(_))
        ));
        assert!(matches!(
            PermissionSet::parse_stored(r#"{"jobs.create": "yes"}"#),
            Err(PermissionParseError::UnsupportedValue { .. })
        ));
        assert!(matches!(
            PermissionSet::parse_stored("42"),
            Err(PermissionParseError::UnsupportedShape("number"))
        ));
    }

    #[test]
    fn stored_form_parses_back_to_the_same_set() {
        let set: PermissionSet = [catalog::JOBS_CREATE, catalog::USERS_MANAGE].into_iter().collect();
        assert_eq!(PermissionSet::parse_stored(&set.to_stored()).unwrap(), set);
    }

    #[test]
    fn missing_lists_only_absent_permissions() {
        let set: PermissionSet = [catalog::JOBS_CREATE].into_iter().collect();
        let required = [catalog::JOBS_CREATE, catalog::JOBS_PUBLISH];
        assert_eq!(set.missing(&required), vec![&catalog::JOBS_PUBLISH]);
    }
}
