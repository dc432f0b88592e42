//! Remediation action trees.
//!
//! Rule files describe actions in a loose shape: bare tags such as
//! `"BLACKLIST"`, `{ always = "IGNORE" }` aliases, and single-key
//! `REMUX`/`REPAIR` tables with `success` and `fail` branches. That shape is
//! parsed once into the closed [`ActionNode`] tree below and never inspected
//! again.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Deepest nesting of conditional branches accepted from configuration.
pub const MAX_DEPTH: usize = 16;

/// A single remediation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionNode {
    /// Do nothing.
    Ignore,
    /// Unmonitor the movie, rescan, then transcode and drop the original.
    Blacklist,
    /// Ask the catalogs to rescan so the file gets replaced.
    Replace,
    /// Delete the file.
    Delete,
    /// Transcode, then continue with one branch depending on the result.
    Remux {
        on_success: Box<ActionNode>,
        on_fail: Box<ActionNode>,
    },
    /// Repair, then continue with one branch depending on the result.
    Repair {
        on_success: Box<ActionNode>,
        on_fail: Box<ActionNode>,
    },
    /// No rule matched the cause. Never accepted from configuration.
    Unmatched,
}

impl ActionNode {
    pub fn remux(on_success: ActionNode, on_fail: ActionNode) -> Self {
        ActionNode::Remux {
            on_success: Box::new(on_success),
            on_fail: Box::new(on_fail),
        }
    }

    pub fn repair(on_success: ActionNode, on_fail: ActionNode) -> Self {
        ActionNode::Repair {
            on_success: Box::new(on_success),
            on_fail: Box::new(on_fail),
        }
    }

    /// True for nodes that never touch the filesystem or a catalog.
    pub fn is_inert(&self) -> bool {
        matches!(self, ActionNode::Ignore | ActionNode::Unmatched)
    }

    /// Nesting depth, counting this node as one.
    pub fn depth(&self) -> usize {
        match self {
            ActionNode::Remux {
                on_success,
                on_fail,
            }
            | ActionNode::Repair {
                on_success,
                on_fail,
            } => 1 + on_success.depth().max(on_fail.depth()),
            _ => 1,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            ActionNode::Ignore => "IGNORE",
            ActionNode::Blacklist => "BLACKLIST",
            ActionNode::Replace => "REPLACE",
            ActionNode::Delete => "DELETE",
            ActionNode::Remux { .. } => "REMUX",
            ActionNode::Repair { .. } => "REPAIR",
            ActionNode::Unmatched => "UNMATCHED",
        }
    }
}

impl fmt::Display for ActionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionNode::Ignore => write!(f, "Ignore"),
            ActionNode::Blacklist => write!(f, "Blacklist"),
            ActionNode::Replace => write!(f, "Replace"),
            ActionNode::Delete => write!(f, "Delete"),
            ActionNode::Unmatched => write!(f, "Unmatched"),
            ActionNode::Remux {
                on_success,
                on_fail,
            } => write!(f, "Remux{{onSuccess: {}, onFail: {}}}", on_success, on_fail),
            ActionNode::Repair {
                on_success,
                on_fail,
            } => write!(f, "Repair{{onSuccess: {}, onFail: {}}}", on_success, on_fail),
        }
    }
}

/// Ordered sequence of nodes evaluated left to right.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Vec<RawAction>", into = "Vec<RawAction>")]
pub struct ActionTree(Vec<ActionNode>);

impl ActionTree {
    pub fn new(nodes: Vec<ActionNode>) -> Self {
        Self(nodes)
    }

    /// The tree assigned to causes no rule matches.
    pub fn unmatched() -> Self {
        Self(vec![ActionNode::Unmatched])
    }

    pub fn nodes(&self) -> &[ActionNode] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActionNode> {
        self.0.iter()
    }

    /// True when every node is `Ignore` or `Unmatched`.
    pub fn is_inert(&self) -> bool {
        self.0.iter().all(ActionNode::is_inert)
    }

    pub fn is_unmatched(&self) -> bool {
        self.0.iter().any(|n| *n == ActionNode::Unmatched)
    }
}

impl From<Vec<ActionNode>> for ActionTree {
    fn from(nodes: Vec<ActionNode>) -> Self {
        Self(nodes)
    }
}

impl<'a> IntoIterator for &'a ActionTree {
    type Item = &'a ActionNode;
    type IntoIter = std::slice::Iter<'a, ActionNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ActionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, node) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", node)?;
        }
        write!(f, "]")
    }
}

/// Why a configured action could not be turned into a tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionParseError {
    #[error("action list is empty")]
    Empty,

    #[error("unknown action tag '{0}'")]
    UnknownTag(String),

    #[error("UNMATCHED cannot be used in a rule")]
    Unmatched,

    #[error("'{0}' needs success and fail branches")]
    MissingBranches(String),

    #[error("'{0}' does not take branches")]
    NotConditional(String),

    #[error("action table must have exactly one key, found {0:?}")]
    TableShape(Vec<String>),

    #[error("action nesting deeper than {MAX_DEPTH}")]
    TooDeep,
}

/// Configuration shape of a single action.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawAction {
    Tag(String),
    Table(BTreeMap<String, RawBody>),
}

/// Value under a single-key action table.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawBody {
    Tag(String),
    Branches(RawBranches),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RawBranches {
    pub success: Box<RawAction>,
    pub fail: Box<RawAction>,
}

impl TryFrom<Vec<RawAction>> for ActionTree {
    type Error = ActionParseError;

    fn try_from(raw: Vec<RawAction>) -> Result<Self, Self::Error> {
        if raw.is_empty() {
            return Err(ActionParseError::Empty);
        }

        raw.iter()
            .map(|action| parse_action(action, 1))
            .collect::<Result<Vec<_>, _>>()
            .map(ActionTree)
    }
}

impl From<ActionTree> for Vec<RawAction> {
    fn from(tree: ActionTree) -> Self {
        tree.0.iter().map(to_raw).collect()
    }
}

fn parse_action(raw: &RawAction, depth: usize) -> Result<ActionNode, ActionParseError> {
    if depth > MAX_DEPTH {
        return Err(ActionParseError::TooDeep);
    }

    match raw {
        RawAction::Tag(tag) => parse_leaf(tag),
        RawAction::Table(table) => {
            if table.len() != 1 {
                return Err(ActionParseError::TableShape(table.keys().cloned().collect()));
            }
            let Some((key, body)) = table.iter().next() else {
                return Err(ActionParseError::TableShape(Vec::new()));
            };
            let key = key.to_uppercase();

            match (key.as_str(), body) {
                ("ALWAYS", RawBody::Tag(tag)) => parse_leaf(tag),
                ("ALWAYS", RawBody::Branches(_)) => Err(ActionParseError::NotConditional(key)),
                ("REMUX" | "REPAIR", RawBody::Branches(branches)) => {
                    let on_success = parse_action(&branches.success, depth + 1)?;
                    let on_fail = parse_action(&branches.fail, depth + 1)?;
                    Ok(if key == "REMUX" {
                        ActionNode::remux(on_success, on_fail)
                    } else {
                        ActionNode::repair(on_success, on_fail)
                    })
                }
                ("REMUX" | "REPAIR", RawBody::Tag(_)) => {
                    Err(ActionParseError::MissingBranches(key))
                }
                (_, _) => {
                    // Validates the key first so typos get the better message.
                    parse_leaf(&key)?;
                    Err(ActionParseError::NotConditional(key))
                }
            }
        }
    }
}

fn parse_leaf(tag: &str) -> Result<ActionNode, ActionParseError> {
    let upper = tag.trim().to_uppercase();
    match upper.as_str() {
        "IGNORE" => Ok(ActionNode::Ignore),
        "BLACKLIST" => Ok(ActionNode::Blacklist),
        "REPLACE" => Ok(ActionNode::Replace),
        "DELETE" => Ok(ActionNode::Delete),
        "REMUX" | "REPAIR" => Err(ActionParseError::MissingBranches(upper)),
        "UNMATCHED" => Err(ActionParseError::Unmatched),
        _ => Err(ActionParseError::UnknownTag(tag.to_string())),
    }
}

fn to_raw(node: &ActionNode) -> RawAction {
    match node {
        ActionNode::Remux {
            on_success,
            on_fail,
        }
        | ActionNode::Repair {
            on_success,
            on_fail,
        } => {
            let body = RawBody::Branches(RawBranches {
                success: Box::new(to_raw(on_success)),
                fail: Box::new(to_raw(on_fail)),
            });
            RawAction::Table(BTreeMap::from([(node.tag().to_string(), body)]))
        }
        leaf => RawAction::Tag(leaf.tag().to_string()),
    }
}
