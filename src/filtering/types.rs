// Closed value sets shared by every part of the engine.
//
// ContentType also carries the SQL row aliases the query layer must use
// (`u`/`ui` for users, `p`/`pi` for posts, `c`/`ci` for comments). Rules
// reference those aliases when they emit predicate fragments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// The kind of content a decision is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    User,
    Post,
    Comment,
}

impl ContentType {
    pub const ALL: [ContentType; 3] = [ContentType::User, ContentType::Post, ContentType::Comment];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::User => "user",
            ContentType::Post => "post",
            ContentType::Comment => "comment",
        }
    }

    /// Upper-case key used in environment variable names (`VEIL_REPORTS_TO_HIDE_POST`).
    pub fn config_key(&self) -> &'static str {
        match self {
            ContentType::User => "USER",
            ContentType::Post => "POST",
            ContentType::Comment => "COMMENT",
        }
    }

    /// Table holding rows of this type.
    pub fn table(&self) -> &'static str {
        match self {
            ContentType::User => "users",
            ContentType::Post => "posts",
            ContentType::Comment => "comments",
        }
    }

    /// Alias of the main row in list queries.
    pub fn row_alias(&self) -> &'static str {
        match self {
            ContentType::User => "u",
            ContentType::Post => "p",
            ContentType::Comment => "c",
        }
    }

    /// Alias of the joined counters row (reports, dismissals).
    pub fn info_alias(&self) -> &'static str {
        match self {
            ContentType::User => "ui",
            ContentType::Post => "pi",
            ContentType::Comment => "ci",
        }
    }

    /// Primary key column name.
    pub fn id_field(&self) -> &'static str {
        match self {
            ContentType::User => "uid",
            ContentType::Post => "postid",
            ContentType::Comment => "commentid",
        }
    }

    /// Qualified column holding the id of the row's owner.
    ///
    /// A user owns itself, so for users this is the row's own id.
    pub fn author_column(&self) -> &'static str {
        match self {
            ContentType::User => "u.uid",
            ContentType::Post => "p.userid",
            ContentType::Comment => "c.userid",
        }
    }

}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "user" | "profile" => Ok(ContentType::User),
            "post" => Ok(ContentType::Post),
            "comment" => Ok(ContentType::Comment),
            _ => Err(PolicyError::UnknownContentType(s.to_string())),
        }
    }
}

/// Outcome of a single decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// No override, show as-is.
    #[default]
    None,
    /// Drop the row from result sets.
    HideContent,
    /// Return the row with redacted fields.
    ReplaceWithPlaceholder,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::None => "none",
            Action::HideContent => "hideContent",
            Action::ReplaceWithPlaceholder => "replaceWithPlaceholder",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Action::None)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation-assigned visibility of a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityStatus {
    #[default]
    Normal,
    Hidden,
    Illegal,
    /// A stored value outside the known set. Carries no moderation action.
    Unrecognized,
}

impl VisibilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisibilityStatus::Normal => "normal",
            VisibilityStatus::Hidden => "hidden",
            VisibilityStatus::Illegal => "illegal",
            VisibilityStatus::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for VisibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisibilityStatus {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(VisibilityStatus::Normal),
            "hidden" => Ok(VisibilityStatus::Hidden),
            "illegal" => Ok(VisibilityStatus::Illegal),
            _ => Err(PolicyError::UnknownVisibilityStatus(s.to_string())),
        }
    }
}

/// Account lifecycle status, stored as an integer code on the users row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AccountStatus {
    #[default]
    Normal,
    Suspended,
    Archived,
    Banned,
    Locked,
    PendingReview,
    Deleted,
}

impl AccountStatus {
    pub fn code(&self) -> i64 {
        match self {
            AccountStatus::Normal => 0,
            AccountStatus::Suspended => 1,
            AccountStatus::Archived => 2,
            AccountStatus::Banned => 3,
            AccountStatus::Locked => 4,
            AccountStatus::PendingReview => 5,
            AccountStatus::Deleted => 6,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(AccountStatus::Normal),
            1 => Some(AccountStatus::Suspended),
            2 => Some(AccountStatus::Archived),
            3 => Some(AccountStatus::Banned),
            4 => Some(AccountStatus::Locked),
            5 => Some(AccountStatus::PendingReview),
            6 => Some(AccountStatus::Deleted),
            _ => None,
        }
    }
}

/// Role mask values stored in `users.roles_mask`.
pub mod roles {
    pub const USER: i64 = 0;
    pub const SYSTEM_ACCOUNT: i64 = 1;
    pub const COMPANY_ACCOUNT: i64 = 2;
    pub const BURN_ACCOUNT: i64 = 4;
    pub const WEB3_BRIDGE_USER: i64 = 8;
    pub const ADMIN: i64 = 16;
    pub const SHOP: i64 = 32;

    /// Roles whose content is shown like any ordinary member's.
    pub const ORDINARY: [i64; 3] = [USER, COMPANY_ACCOUNT, ADMIN];

    pub fn is_ordinary(mask: i64) -> bool {
        ORDINARY.contains(&mask)
    }

    /// SQL list literal for `roles_mask IN (...)`.
    pub fn ordinary_sql_list() -> String {
        ORDINARY
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse_is_case_insensitive() {
        assert_eq!("POST".parse::<ContentType>().unwrap(), ContentType::Post);
        assert_eq!("profile".parse::<ContentType>().unwrap(), ContentType::User);
        assert!("story".parse::<ContentType>().is_err());
    }

    #[test]
    fn test_account_status_codes_round_trip() {
        for code in 0..=6 {
            let status = AccountStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert_eq!(AccountStatus::from_code(7), None);
    }

    #[test]
    fn test_ordinary_roles() {
        assert!(roles::is_ordinary(roles::ADMIN));
        assert!(!roles::is_ordinary(roles::SHOP));
        assert!(!roles::is_ordinary(roles::SYSTEM_ACCOUNT));
        assert_eq!(roles::ordinary_sql_list(), "0,2,16");
    }
}
