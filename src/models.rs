// Data models: the entities rules decide on and the redactor rewrites.
//
// These are plain structs that map to fetched rows. They live outside the
// database module so the engine can be used without the SQLite feature.

use serde::{Deserialize, Serialize};

use crate::filtering::types::{AccountStatus, ContentType, VisibilityStatus};

/// A user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub uid: String,
    pub username: String,
    pub biography: Option<String>,
    /// Avatar path.
    pub img: Option<String>,
    pub status: AccountStatus,
    pub roles_mask: i64,
    pub verified: bool,
    pub visibility_status: VisibilityStatus,
    /// Active report count.
    pub reports: i64,
    /// Number of times moderation dismissed reports against this profile.
    pub dismissals: i64,
}

/// A post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub postid: String,
    /// Author.
    pub userid: String,
    pub title: String,
    pub media_description: Option<String>,
    pub media: Option<String>,
    pub visibility_status: VisibilityStatus,
    pub reports: i64,
    pub dismissals: i64,
}

/// A comment on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub commentid: String,
    pub postid: String,
    /// Author.
    pub userid: String,
    pub content: String,
    pub visibility_status: VisibilityStatus,
    pub reports: i64,
    pub dismissals: i64,
}

/// Borrowed view of any fetched entity, handed to rules post-fetch.
#[derive(Debug, Clone, Copy)]
pub enum Subject<'a> {
    Profile(&'a Profile),
    Post(&'a Post),
    Comment(&'a Comment),
}

impl<'a> Subject<'a> {
    pub fn content_type(&self) -> ContentType {
        match self {
            Subject::Profile(_) => ContentType::User,
            Subject::Post(_) => ContentType::Post,
            Subject::Comment(_) => ContentType::Comment,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            Subject::Profile(p) => &p.uid,
            Subject::Post(p) => &p.postid,
            Subject::Comment(c) => &c.commentid,
        }
    }

    /// The user who owns the content. A profile owns itself.
    pub fn owner_id(&self) -> &'a str {
        match self {
            Subject::Profile(p) => &p.uid,
            Subject::Post(p) => &p.userid,
            Subject::Comment(c) => &c.userid,
        }
    }

    pub fn reports(&self) -> i64 {
        match self {
            Subject::Profile(p) => p.reports,
            Subject::Post(p) => p.reports,
            Subject::Comment(c) => c.reports,
        }
    }

    pub fn dismissals(&self) -> i64 {
        match self {
            Subject::Profile(p) => p.dismissals,
            Subject::Post(p) => p.dismissals,
            Subject::Comment(c) => c.dismissals,
        }
    }

    pub fn visibility_status(&self) -> VisibilityStatus {
        match self {
            Subject::Profile(p) => p.visibility_status,
            Subject::Post(p) => p.visibility_status,
            Subject::Comment(c) => c.visibility_status,
        }
    }

    pub fn as_profile(&self) -> Option<&'a Profile> {
        match self {
            Subject::Profile(p) => Some(p),
            _ => None,
        }
    }
}

/// Anything that can be viewed as a [`Subject`].
pub trait Moderatable {
    fn subject(&self) -> Subject<'_>;
}

impl Moderatable for Profile {
    fn subject(&self) -> Subject<'_> {
        Subject::Profile(self)
    }
}

impl Moderatable for Post {
    fn subject(&self) -> Subject<'_> {
        Subject::Post(self)
    }
}

impl Moderatable for Comment {
    fn subject(&self) -> Subject<'_> {
        Subject::Comment(self)
    }
}
