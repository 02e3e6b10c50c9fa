// Composition tests: the two projections of a rule set must agree.
//
// The SQL predicate (evaluated by SQLite against stored counters) and the
// post-fetch decision (evaluated in Rust against the fetched entity) are
// checked against each other over a grid of counters, statuses and owners,
// for every strategy and both evidence generations. Rule order is checked
// by running the full listing rule set in many orders.

#![cfg(feature = "sqlite")]

use std::collections::BTreeSet;
use std::sync::Arc;

use rusqlite::Connection;

use veil::db::queries::{self, PostFilter};
use veil::db::schema::create_tables;
use veil::filtering::composer;
use veil::filtering::engine::PolicyConfig;
use veil::filtering::severity::SeverityLevels;
use veil::filtering::strategy::Strategy;
use veil::filtering::thresholds::ThresholdTable;
use veil::filtering::types::{roles, AccountStatus, Action, ContentType, VisibilityStatus};
use veil::models::{Comment, Moderatable, Post, Profile};
use veil::redact::ReplacementPattern;
use veil::rules::{self, ReportThresholdRule, Rule, ThresholdMode};

const STRICT: &str = "MYGRANDMALIKES";
const VIEWER: &str = "viewer";

const REPORTS: [i64; 4] = [0, 4, 5, 6];
const DISMISSALS: [i64; 4] = [0, 2, 3, 4];
const STATUSES: [VisibilityStatus; 4] = [
    VisibilityStatus::Normal,
    VisibilityStatus::Hidden,
    VisibilityStatus::Illegal,
    VisibilityStatus::Unrecognized,
];

fn policy() -> Arc<PolicyConfig> {
    Arc::new(PolicyConfig::new(SeverityLevels::default(), ThresholdTable::uniform(5, 3)))
}

fn user(uid: &str, reports: i64, dismissals: i64, visibility_status: VisibilityStatus) -> Profile {
    Profile {
        uid: uid.into(),
        username: uid.into(),
        biography: None,
        img: None,
        status: AccountStatus::Normal,
        roles_mask: roles::USER,
        verified: true,
        visibility_status,
        reports,
        dismissals,
    }
}

/// Users, posts and comments covering every counter/status/owner combination.
fn grid_db() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    create_tables(&conn).unwrap();

    queries::insert_profile(&conn, &user(VIEWER, 6, 0, VisibilityStatus::Normal)).unwrap();
    queries::insert_profile(&conn, &user("other", 0, 0, VisibilityStatus::Normal)).unwrap();
    queries::insert_post(
        &conn,
        &Post {
            postid: "root".into(),
            userid: "other".into(),
            title: "root".into(),
            media_description: None,
            media: None,
            visibility_status: VisibilityStatus::Normal,
            reports: 0,
            dismissals: 0,
        },
    )
    .unwrap();

    let mut n = 0;
    for reports in REPORTS {
        for dismissals in DISMISSALS {
            for status in STATUSES {
                for author in [VIEWER, "other"] {
                    n += 1;
                    queries::insert_profile(&conn, &user(&format!("u{n}"), reports, dismissals, status)).unwrap();
                    queries::insert_post(
                        &conn,
                        &Post {
                            postid: format!("p{n}"),
                            userid: author.into(),
                            title: format!("post {n}"),
                            media_description: None,
                            media: None,
                            visibility_status: status,
                            reports,
                            dismissals,
                        },
                    )
                    .unwrap();
                    queries::insert_comment(
                        &conn,
                        &Comment {
                            commentid: format!("c{n}"),
                            postid: "root".into(),
                            userid: author.into(),
                            content: format!("comment {n}"),
                            visibility_status: status,
                            reports,
                            dismissals,
                        },
                    )
                    .unwrap();
                }
            }
        }
    }
    conn
}

fn report_rule(strategy: Strategy, viewer: &str, mode: ThresholdMode) -> ReportThresholdRule {
    ReportThresholdRule::new(policy(), strategy, Some(STRICT), viewer, mode)
}

// ============================================================
// toSql and toReplacer agree
// ============================================================

#[test]
fn post_sql_keeps_exactly_the_rows_not_hidden_post_fetch() {
    let conn = grid_db();
    let all = queries::list_posts(&conn, &[], &PostFilter::default()).unwrap();

    for strategy in Strategy::ALL {
        for mode in [ThresholdMode::Dismissals, ThresholdMode::VisibilityStatus] {
            for viewer in [VIEWER, ""] {
                let rule = report_rule(strategy, viewer, mode);
                let set: Vec<Box<dyn Rule>> = vec![Box::new(rule.clone())];
                let kept: Vec<Post> = queries::list_posts(&conn, &set, &PostFilter::default()).unwrap();
                let kept_ids: BTreeSet<String> = kept.iter().map(|p| p.postid.clone()).collect();

                let expected: BTreeSet<String> = all
                    .iter()
                    .filter(|p| rule.decide(&p.subject()) != Action::HideContent)
                    .map(|p| p.postid.clone())
                    .collect();
                assert_eq!(kept_ids, expected, "{strategy} / {mode:?} / viewer {viewer:?}");

                // Rows that survive are redacted exactly when the decision is a placeholder
                for redacted in &kept {
                    let Some(original) = all.iter().find(|p| p.postid == redacted.postid) else {
                        panic!("unknown post {}", redacted.postid);
                    };
                    let placeholder = rule.decide(&original.subject()) == Action::ReplaceWithPlaceholder;
                    assert_eq!(
                        redacted.title == "this post is hidden",
                        placeholder,
                        "{strategy} / {mode:?} / {}",
                        redacted.postid
                    );
                }
            }
        }
    }
}

#[test]
fn comment_sql_keeps_exactly_the_rows_not_hidden_post_fetch() {
    let conn = grid_db();
    let all = queries::list_comments(&conn, &[], "root").unwrap();

    for strategy in Strategy::ALL {
        for mode in [ThresholdMode::Dismissals, ThresholdMode::VisibilityStatus] {
            let rule = report_rule(strategy, VIEWER, mode);
            let set: Vec<Box<dyn Rule>> = vec![Box::new(rule.clone())];
            let kept: BTreeSet<String> = queries::list_comments(&conn, &set, "root")
                .unwrap()
                .into_iter()
                .map(|c| c.commentid)
                .collect();
            let expected: BTreeSet<String> = all
                .iter()
                .filter(|c| rule.decide(&c.subject()) != Action::HideContent)
                .map(|c| c.commentid.clone())
                .collect();
            assert_eq!(kept, expected, "{strategy} / {mode:?}");
        }
    }
}

#[test]
fn profile_sql_keeps_exactly_the_rows_not_hidden_post_fetch() {
    let conn = grid_db();
    let all = queries::list_profiles(&conn, &[], None).unwrap();

    for strategy in Strategy::ALL {
        for mode in [ThresholdMode::Dismissals, ThresholdMode::VisibilityStatus] {
            let rule = report_rule(strategy, VIEWER, mode);
            let set: Vec<Box<dyn Rule>> = vec![Box::new(rule.clone())];
            let kept: BTreeSet<String> = queries::list_profiles(&conn, &set, None)
                .unwrap()
                .into_iter()
                .map(|p| p.uid)
                .collect();
            let expected: BTreeSet<String> = all
                .iter()
                .filter(|p| rule.decide(&p.subject()) != Action::HideContent)
                .map(|p| p.uid.clone())
                .collect();
            assert_eq!(kept, expected, "{strategy} / {mode:?}");
            // The viewer's own profile is reported but only hide_all filters it for them
            assert_eq!(kept.contains(VIEWER), strategy != Strategy::HideAll, "{strategy} / {mode:?}");
        }
    }
}

#[test]
fn hiding_sql_implies_post_fetch_hide() {
    // Whenever SQL drops a row, the same rule decides HideContent for it
    let conn = grid_db();
    let all = queries::list_posts(&conn, &[], &PostFilter::default()).unwrap();
    let rule = report_rule(Strategy::Feed, "", ThresholdMode::Dismissals);
    let set: Vec<Box<dyn Rule>> = vec![Box::new(rule.clone())];
    let kept: BTreeSet<String> = queries::list_posts(&conn, &set, &PostFilter::default())
        .unwrap()
        .into_iter()
        .map(|p| p.postid)
        .collect();

    let mut dropped = 0;
    for post in &all {
        if !kept.contains(&post.postid) {
            dropped += 1;
            assert_eq!(rule.decide(&post.subject()), Action::HideContent, "{}", post.postid);
        }
    }
    assert!(dropped > 0, "grid should contain posts over the threshold");
}

// ============================================================
// Order independence
// ============================================================

fn mixed_db() -> Connection {
    let conn = grid_db();
    let mut shop = user("shop", 0, 0, VisibilityStatus::Normal);
    shop.roles_mask = roles::SHOP;
    let mut system = user("system", 0, 0, VisibilityStatus::Normal);
    system.roles_mask = roles::SYSTEM_ACCOUNT;
    let mut banned = user("banned", 0, 0, VisibilityStatus::Normal);
    banned.status = AccountStatus::Banned;
    for u in [&shop, &system, &banned] {
        queries::insert_profile(&conn, u).unwrap();
        queries::insert_post(
            &conn,
            &Post {
                postid: format!("{}_post", u.uid),
                userid: u.uid.clone(),
                title: "x".into(),
                media_description: None,
                media: None,
                visibility_status: VisibilityStatus::Normal,
                reports: 0,
                dismissals: 0,
            },
        )
        .unwrap();
    }
    queries::block_user(&conn, VIEWER, "u3").unwrap();
    queries::block_user(&conn, "u4", VIEWER).unwrap();
    conn
}

fn orderings(len: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    for k in 0..len {
        let mut order: Vec<usize> = (0..len).collect();
        order.rotate_left(k);
        out.push(order.clone());
        order.reverse();
        out.push(order);
    }
    out
}

fn reorder(set: Vec<Box<dyn Rule>>, order: &[usize]) -> Vec<Box<dyn Rule>> {
    let mut slots: Vec<Option<Box<dyn Rule>>> = set.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots[i].take()).collect()
}

#[test]
fn listing_result_does_not_depend_on_rule_order() {
    let conn = mixed_db();
    let p = policy();

    for strategy in Strategy::ALL {
        for showing in ContentType::ALL {
            let baseline_set = rules::listing_rules(&p, strategy, VIEWER, Some(STRICT));
            let baseline = run(&conn, &baseline_set, showing);
            let count = baseline_set.len();

            for order in orderings(count) {
                let set = reorder(rules::listing_rules(&p, strategy, VIEWER, Some(STRICT)), &order);
                assert_eq!(set.len(), count);
                assert_eq!(
                    run(&conn, &set, showing),
                    baseline,
                    "{strategy} / {showing} / order {order:?}"
                );
            }
        }
    }
}

/// Ids and redaction pattern marker of every returned row.
fn run(conn: &Connection, set: &[Box<dyn Rule>], showing: ContentType) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = match showing {
        ContentType::User => queries::list_profiles(conn, set, None)
            .unwrap()
            .into_iter()
            .map(|p| (p.uid, p.username))
            .collect(),
        ContentType::Post => queries::list_posts(conn, set, &PostFilter::default())
            .unwrap()
            .into_iter()
            .map(|p| (p.postid, p.title))
            .collect(),
        ContentType::Comment => queries::list_comments(conn, set, "root")
            .unwrap()
            .into_iter()
            .map(|c| (c.commentid, c.content))
            .collect(),
    };
    rows.sort();
    rows
}

#[test]
fn combined_predicate_params_do_not_depend_on_rule_order() {
    let p = policy();
    let forward = rules::listing_rules(&p, Strategy::MetaSearch, VIEWER, Some(STRICT));
    let mut backward = rules::listing_rules(&p, Strategy::MetaSearch, VIEWER, Some(STRICT));
    backward.reverse();

    let a = composer::combine(&forward, ContentType::Post).unwrap();
    let b = composer::combine(&backward, ContentType::Post).unwrap();
    assert_eq!(a.params, b.params);
    assert_ne!(a.predicate, b.predicate);
}

#[test]
fn full_listing_redacts_with_the_most_severe_pattern() {
    let conn = mixed_db();
    let p = policy();
    let set = rules::listing_rules(&p, Strategy::SearchById, VIEWER, Some(STRICT));
    let profiles = queries::list_profiles(&conn, &set, None).unwrap();

    let banned = profiles.iter().find(|u| u.uid == "banned").map(|u| u.username.clone());
    assert_eq!(banned.as_deref(), ReplacementPattern::Deleted.username());

    // Illegal outranks the hidden pattern a reported profile would get
    let illegal_reported = profiles
        .iter()
        .find(|u| u.visibility_status == VisibilityStatus::Illegal && u.reports >= 5);
    let Some(illegal_reported) = illegal_reported else {
        panic!("grid should contain an illegal, reported profile");
    };
    assert_eq!(illegal_reported.username, "illegal_account");
}
