// Viewing-context strategies.
//
// A strategy is the baseline answer to "what happens to content of type
// `showing`, governed by a rule about `target`, in this viewing context?".
// It knows nothing about a concrete item; counters and thresholds are the
// decision engine's job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::types::{Action, ContentType};
use crate::error::PolicyError;

/// The five known viewing contexts.
///
/// `action` is the single dispatch point: adding a context means adding a
/// variant, and the compiler points at every match that has to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// The viewer is looking at their own profile: placeholder everything.
    OwnProfile,
    /// Lookup of a specific user or post by id: placeholder everything.
    SearchById,
    /// Search by title, tag or other metadata: hide everything.
    MetaSearch,
    /// The post feed: hide posts, placeholder everything else.
    Feed,
    /// Strictly hide everything. Rules built on this strategy forbid the
    /// self-exemption by default.
    HideAll,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::OwnProfile,
        Strategy::SearchById,
        Strategy::MetaSearch,
        Strategy::Feed,
        Strategy::HideAll,
    ];

    /// Baseline action for a (target, showing) pair. Total over all pairs.
    ///
    /// The target type does not change the outcome for any of the known
    /// contexts; it stays in the signature so a context can specialise on it.
    pub fn action(&self, _target: ContentType, showing: ContentType) -> Action {
        match self {
            Strategy::OwnProfile | Strategy::SearchById => Action::ReplaceWithPlaceholder,
            Strategy::MetaSearch | Strategy::HideAll => Action::HideContent,
            Strategy::Feed => match showing {
                ContentType::Post => Action::HideContent,
                ContentType::User | ContentType::Comment => Action::ReplaceWithPlaceholder,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::OwnProfile => "own_profile",
            Strategy::SearchById => "search_by_id",
            Strategy::MetaSearch => "meta_search",
            Strategy::Feed => "feed",
            Strategy::HideAll => "hide_all",
        }
    }

    /// Pick the context for a post listing from the request arguments.
    ///
    /// Precedence, lowest first: feed, metadata search (title or tag given),
    /// lookup by id (user or post id given), own profile (the requested user
    /// is the viewer).
    pub fn for_post_listing(
        viewer_id: &str,
        filter_user_id: Option<&str>,
        filter_post_id: Option<&str>,
        has_metadata_filter: bool,
    ) -> Self {
        let mut strategy = Strategy::Feed;
        if has_metadata_filter {
            strategy = Strategy::MetaSearch;
        }
        if filter_user_id.is_some() || filter_post_id.is_some() {
            strategy = Strategy::SearchById;
        }
        if filter_user_id.is_some_and(|uid| !viewer_id.is_empty() && uid == viewer_id) {
            strategy = Strategy::OwnProfile;
        }
        strategy
    }

    /// Pick the context for fetching a single profile.
    pub fn for_profile(viewer_id: &str, target_user_id: &str) -> Self {
        if !viewer_id.is_empty() && viewer_id == target_user_id {
            Strategy::OwnProfile
        } else {
            Strategy::SearchById
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "own_profile" | "myprofile" => Ok(Strategy::OwnProfile),
            "search_by_id" | "searchbyid" => Ok(Strategy::SearchById),
            "meta_search" | "searchbymeta" => Ok(Strategy::MetaSearch),
            "feed" | "post_feed" | "postfeed" => Ok(Strategy::Feed),
            "hide_all" | "hideall" => Ok(Strategy::HideAll),
            _ => Err(PolicyError::UnknownStrategy(s.to_string())),
        }
    }
}
