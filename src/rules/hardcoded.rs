//! Built-in rule table.
//!
//! Used whenever the configuration does not provide its own `[[rules]]`.
//! Order matters: the first rule whose pattern occurs in the cause wins.
//!
//! 1. Catalog timeouts and banner noise are ignored.
//! 2. Database constraint errors from Bazarr's own bookkeeping are ignored.
//! 3. Files with an extension Bazarr refuses are blacklisted and re-encoded.
//! 4. Files ffprobe cannot read are repaired, then remuxed, then replaced.

use super::{ActionNode, ActionTree, Rule};

/// The default rules, in evaluation order.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new("timeout", "Timeout", ActionTree::new(vec![ActionNode::Ignore])),
        Rule::new(
            "banner",
            r"\+-{4,}.*-{7,}\+",
            ActionTree::new(vec![ActionNode::Ignore]),
        ),
        Rule::new(
            "duplicate-movie-insert",
            r"cannot insert movie.*because of \(sqlite3\.IntegrityError\) UNIQUE constraint failed",
            ActionTree::new(vec![ActionNode::Ignore]),
        ),
        Rule::new(
            "catalog-timeout",
            r"Error trying to get (series|movies|episodes|tags|episodeFiles|profiles) from (Sonarr|Radarr)\. Timeout",
            ActionTree::new(vec![ActionNode::Ignore]),
        ),
        Rule::new(
            "unique-constraint",
            "UNIQUE constraint failed:",
            ActionTree::new(vec![ActionNode::Ignore]),
        ),
        Rule::new(
            "invalid-extension",
            "is not a valid video extension",
            ActionTree::new(vec![
                ActionNode::Blacklist,
                ActionNode::remux(ActionNode::Delete, ActionNode::Replace),
            ]),
        ),
        Rule::new(
            "unreadable-video",
            r"ffprobe cannot analyze this video file.*Could it be corrupted\?",
            ActionTree::new(vec![ActionNode::repair(
                ActionNode::Delete,
                ActionNode::remux(ActionNode::Delete, ActionNode::Replace),
            )]),
        ),
    ]
}
