// Redactor: replacement patterns and the field templates they apply.
//
// A pattern names a template per redactable field. `None` means "leave the
// field as fetched". Redaction always works on a copy: the caller's entity
// (which may be cached and shared between responses) is never touched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;
use crate::filtering::types::VisibilityStatus;
use crate::models::{Comment, Post, Profile};

const PLACEHOLDER_BIOGRAPHY: &str = "/userData/00000000-0000-0000-0000-000000000000.txt";
const PLACEHOLDER_AVATAR: &str = "/profile/00000000-0000-0000-0000-000000000000.jpeg";
const PLACEHOLDER_MEDIA: &str = "/image/00000000-0000-0000-0000-000000000000.jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacementPattern {
    /// Identity.
    #[default]
    Normal,
    Deleted,
    Hidden,
    Illegal,
}

impl ReplacementPattern {
    pub const ALL: [ReplacementPattern; 4] = [
        ReplacementPattern::Normal,
        ReplacementPattern::Deleted,
        ReplacementPattern::Hidden,
        ReplacementPattern::Illegal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReplacementPattern::Normal => "normal",
            ReplacementPattern::Deleted => "deleted",
            ReplacementPattern::Hidden => "hidden",
            ReplacementPattern::Illegal => "illegal",
        }
    }

    /// Severity rank used when several rules ask for different patterns:
    /// illegal > deleted > hidden > normal.
    pub fn precedence(&self) -> u8 {
        match self {
            ReplacementPattern::Normal => 0,
            ReplacementPattern::Hidden => 1,
            ReplacementPattern::Deleted => 2,
            ReplacementPattern::Illegal => 3,
        }
    }

    pub fn username(&self) -> Option<&'static str> {
        match self {
            ReplacementPattern::Normal => None,
            ReplacementPattern::Deleted => Some("Deleted_Account"),
            ReplacementPattern::Hidden => Some("hidden_account"),
            ReplacementPattern::Illegal => Some("illegal_account"),
        }
    }

    pub fn biography(&self) -> Option<&'static str> {
        match self {
            ReplacementPattern::Normal => None,
            ReplacementPattern::Hidden => Some(""),
            ReplacementPattern::Deleted | ReplacementPattern::Illegal => Some(PLACEHOLDER_BIOGRAPHY),
        }
    }

    pub fn profile_picture(&self) -> Option<&'static str> {
        match self {
            ReplacementPattern::Normal => None,
            _ => Some(PLACEHOLDER_AVATAR),
        }
    }

    pub fn post_title(&self) -> Option<&'static str> {
        match self {
            ReplacementPattern::Normal => None,
            ReplacementPattern::Deleted => Some("this post is deleted"),
            ReplacementPattern::Hidden => Some("this post is hidden"),
            ReplacementPattern::Illegal => Some("this post is illegal"),
        }
    }

    pub fn post_description(&self) -> Option<&'static str> {
        match self {
            ReplacementPattern::Normal => None,
            _ => Some(""),
        }
    }

    pub fn post_media(&self) -> Option<&'static str> {
        match self {
            ReplacementPattern::Normal => None,
            _ => Some(PLACEHOLDER_MEDIA),
        }
    }

    pub fn comment_content(&self) -> Option<&'static str> {
        match self {
            ReplacementPattern::Normal => None,
            ReplacementPattern::Deleted => Some("this comment is deleted"),
            ReplacementPattern::Hidden => Some("this comment is hidden"),
            ReplacementPattern::Illegal => Some("this comment is illegal"),
        }
    }

    /// Visibility status the redacted entity reports. `None` keeps the
    /// stored one.
    pub fn visibility_status(&self) -> Option<VisibilityStatus> {
        match self {
            ReplacementPattern::Hidden => Some(VisibilityStatus::Hidden),
            ReplacementPattern::Deleted => Some(VisibilityStatus::Normal),
            ReplacementPattern::Normal | ReplacementPattern::Illegal => None,
        }
    }

    /// The status after redaction. Illegal content stays illegal.
    fn rewrite_status(&self, current: VisibilityStatus) -> VisibilityStatus {
        if current == VisibilityStatus::Illegal {
            return current;
        }
        self.visibility_status().unwrap_or(current)
    }
}

impl fmt::Display for ReplacementPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplacementPattern {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(ReplacementPattern::Normal),
            "deleted" => Ok(ReplacementPattern::Deleted),
            "hidden" => Ok(ReplacementPattern::Hidden),
            "illegal" => Ok(ReplacementPattern::Illegal),
            _ => Err(PolicyError::UnknownPattern(s.to_string())),
        }
    }
}

/// Entities that can be redacted.
pub trait Redact: Clone {
    /// A copy of `self` with the pattern's templates applied.
    fn redacted(&self, pattern: ReplacementPattern) -> Self;
}

fn overwrite(field: &mut String, template: Option<&str>) {
    if let Some(value) = template {
        *field = value.to_string();
    }
}

fn overwrite_opt(field: &mut Option<String>, template: Option<&str>) {
    if let Some(value) = template {
        *field = Some(value.to_string());
    }
}

impl Redact for Profile {
    fn redacted(&self, pattern: ReplacementPattern) -> Self {
        let mut out = self.clone();
        if pattern == ReplacementPattern::Normal {
            return out;
        }
        overwrite(&mut out.username, pattern.username());
        overwrite_opt(&mut out.biography, pattern.biography());
        overwrite_opt(&mut out.img, pattern.profile_picture());
        out.visibility_status = pattern.rewrite_status(out.visibility_status);
        out
    }
}

impl Redact for Post {
    fn redacted(&self, pattern: ReplacementPattern) -> Self {
        let mut out = self.clone();
        if pattern == ReplacementPattern::Normal {
            return out;
        }
        overwrite(&mut out.title, pattern.post_title());
        overwrite_opt(&mut out.media_description, pattern.post_description());
        overwrite_opt(&mut out.media, pattern.post_media());
        out.visibility_status = pattern.rewrite_status(out.visibility_status);
        out
    }
}

impl Redact for Comment {
    fn redacted(&self, pattern: ReplacementPattern) -> Self {
        let mut out = self.clone();
        if pattern == ReplacementPattern::Normal {
            return out;
        }
        overwrite(&mut out.content, pattern.comment_content());
        out.visibility_status = pattern.rewrite_status(out.visibility_status);
        out
    }
}

/// Apply `pattern` to `entity`, returning a new value.
pub fn apply<T: Redact>(entity: &T, pattern: ReplacementPattern) -> T {
    entity.redacted(pattern)
}
