//! Filename specializations: `name<qualifier>`.
//!
//! A file in the source tree may end in `<host>`, `<user>` or `<user@host>`.
//! Such a file is only deployed when the qualifier matches the current
//! [`Identity`], and it then competes with its unqualified sibling for the
//! same destination name.  The most specific match wins:
//!
//! ```text
//! user@host (2)  >  user (1) = host (1)  >  no qualifier (0)
//! ```
//!
//! Qualifiers are compared with plain string equality.  They come from
//! filenames and are never interpreted as patterns.
use std::ffi::{OsStr, OsString};
use std::fmt;

use crate::identity::Identity;

/// Specificity score used to choose between candidates for one destination.
///
/// Only the ordering is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    /// No qualifier.
    pub const UNQUALIFIED: Self = Self(0);
    /// Bare `<host>` or `<user>`.
    pub const HOST_OR_USER: Self = Self(1);
    /// `<user@host>`.
    pub const USER_AT_HOST: Self = Self(2);

    /// The raw score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A filename split into its destination name and optional qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecializedName {
    filename: OsString,
    base_name: String,
    qualifier: Option<String>,
}

impl SpecializedName {
    /// Parse a raw filename.
    ///
    /// The qualifier is the text between the last `<` and a trailing `>`, as
    /// long as that `<` is not the first character (the name before it must
    /// be non-empty).  Returns `None` for names that cannot be parsed: empty
    /// names, names containing a newline, names that are not valid UTF-8, and
    /// qualified names whose base name is `.` or `..`, which would point at
    /// the destination directory or its parent.
    ///
    /// # Examples
    ///
    /// ```
    /// use dotdeploy::specialization::SpecializedName;
    /// use std::ffi::OsStr;
    ///
    /// let name = SpecializedName::parse(OsStr::new("bashrc<alice@box1>")).unwrap();
    /// assert_eq!(name.base_name(), "bashrc");
    /// assert_eq!(name.qualifier(), Some("alice@box1"));
    ///
    /// let plain = SpecializedName::parse(OsStr::new("<box1>")).unwrap();
    /// assert_eq!(plain.base_name(), "<box1>");
    /// assert_eq!(plain.qualifier(), None);
    /// ```
    #[must_use]
    pub fn parse(filename: &OsStr) -> Option<Self> {
        let raw = filename.to_str()?;
        if raw.is_empty() || raw.contains('\n') {
            return None;
        }

        let (base_name, qualifier) = match raw.strip_suffix('>').zip(raw.rfind('<')) {
            Some((head, open)) if open > 0 => {
                let (name, rest) = head.split_at(open);
                (name, rest.strip_prefix('<'))
            }
            _ => (raw, None),
        };

        if matches!(base_name, "." | "..") {
            return None;
        }

        Some(Self {
            filename: filename.to_os_string(),
            base_name: base_name.to_string(),
            qualifier: qualifier.map(str::to_string),
        })
    }

    /// The filename as found on disk.
    #[must_use]
    pub fn filename(&self) -> &OsStr {
        &self.filename
    }

    /// The filename without its qualifier; the name of the destination.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// The raw text between `<` and `>`, if any.
    #[must_use]
    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    /// Priority of this name for `identity`, or `None` if its qualifier does
    /// not match.
    #[must_use]
    pub fn priority(&self, identity: &Identity) -> Option<Priority> {
        let Some(qualifier) = self.qualifier.as_deref() else {
            return Some(Priority::UNQUALIFIED);
        };
        if identity.is_user_at_host(qualifier) {
            Some(Priority::USER_AT_HOST)
        } else if qualifier == identity.host() || qualifier == identity.username() {
            Some(Priority::HOST_OR_USER)
        } else {
            None
        }
    }

    /// Whether this name may be deployed for `identity`.
    #[must_use]
    pub fn is_valid(&self, identity: &Identity) -> bool {
        self.priority(identity).is_some()
    }

    /// Score this name against `identity`.
    ///
    /// # Errors
    ///
    /// Returns the name back when its qualifier does not match.
    pub fn resolve(self, identity: &Identity) -> Result<Candidate, Self> {
        match self.priority(identity) {
            Some(priority) => Ok(Candidate {
                name: self,
                priority,
            }),
            None => Err(self),
        }
    }
}

/// A name whose qualifier matched the identity, ready for the destination map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    name: SpecializedName,
    priority: Priority,
}

impl Candidate {
    /// The parsed name.
    #[must_use]
    pub const fn name(&self) -> &SpecializedName {
        &self.name
    }

    /// The computed priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }
}
