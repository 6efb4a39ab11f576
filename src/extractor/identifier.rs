use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// A normalized account handle: lowercase ASCII letters, digits, `.` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Trims and lowercases `raw`, returning `None` when the result falls
    /// outside `[a-z0-9._]+`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();

        if is_valid_handle(&normalized) {
            Some(Self(normalized))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_valid_handle(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Following,
    Followers,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Following => "following",
            Role::Followers => "followers",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identifiers parsed from the document(s) of one role.
#[derive(Debug, Clone)]
pub struct MembershipSet {
    role: Role,
    members: HashSet<Identifier>,
}

impl MembershipSet {
    pub fn new(role: Role, members: HashSet<Identifier>) -> Self {
        Self { role, members }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn contains(&self, identifier: &Identifier) -> bool {
        self.members.contains(identifier)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.members.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let id = Identifier::parse("  Jane_Doe ").unwrap();
        assert_eq!(id.as_str(), "jane_doe");
    }

    #[test]
    fn test_parse_rejects_outside_character_class() {
        assert!(Identifier::parse("bad user!").is_none());
        assert!(Identifier::parse("dash-name").is_none());
        assert!(Identifier::parse("café").is_none());
        assert!(Identifier::parse("").is_none());
        assert!(Identifier::parse("   ").is_none());
    }

    #[test]
    fn test_parse_accepts_dots_digits_underscores() {
        for raw in ["a", "user.name", "_x_", "123", "a.b_c.9"] {
            assert!(Identifier::parse(raw).is_some(), "Should accept: {}", raw);
        }
    }

    #[test]
    fn test_membership_set_collapses_duplicates() {
        let members: HashSet<Identifier> = ["bob", "BOB", " bob"]
            .iter()
            .filter_map(|raw| Identifier::parse(raw))
            .collect();
        let set = MembershipSet::new(Role::Followers, members);

        assert_eq!(set.len(), 1);
        assert_eq!(set.role(), Role::Followers);
        assert!(set.contains(&Identifier::parse("bob").unwrap()));
    }
}
