use std::fmt;

use uuid::Uuid;

/// Label of a workload user: either a caller-provided name or the
/// nonnegative index assigned during workload iteration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UserLabel {
    Index(u64),
    Name(String),
}

impl fmt::Display for UserLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserLabel::Index(index) => write!(f, "{index}"),
            UserLabel::Name(name) => f.write_str(name),
        }
    }
}

/// The identity of one serial thread of execution within a workload.
///
/// Two users are equal only if they share the same underlying identity;
/// fresh users from [`User::random`] are always distinct, even when their
/// labels match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct User {
    id: Uuid,
    label: Option<UserLabel>,
}

impl User {
    /// A fresh, unlabeled user. Workload iteration assigns it an integer
    /// label.
    pub fn random() -> User {
        User {
            id: Uuid::new_v4(),
            label: None,
        }
    }

    /// A fresh user with the given name.
    pub fn named(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            label: Some(UserLabel::Name(name.to_string())),
        }
    }

    pub fn label(&self) -> Option<&UserLabel> {
        self.label.as_ref()
    }

    /// The same identity under a new label.
    pub fn relabel(&self, label: UserLabel) -> User {
        User {
            id: self.id,
            label: Some(label),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => label.fmt(f),
            None => write!(f, "{}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_users_are_distinct() {
        assert_ne!(User::random(), User::random());
        assert_ne!(User::named("a"), User::named("a"));
    }

    #[test]
    fn test_relabel_keeps_identity() {
        let user = User::random();
        let relabeled = user.relabel(UserLabel::Index(3));
        assert_eq!(relabeled.label(), Some(&UserLabel::Index(3)));
        // Identity-preserving, but label participates in equality
        assert_ne!(user, relabeled);
        assert_eq!(relabeled, user.relabel(UserLabel::Index(3)));
    }

    #[test]
    fn test_display() {
        assert_eq!(User::named("alice").to_string(), "alice");
        let indexed = User::random().relabel(UserLabel::Index(7));
        assert_eq!(indexed.to_string(), "7");
    }
}
