use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::rules::{ActionTree, RuleTable};

/// One file reported by the log, with the first cause seen for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub file_path: PathBuf,
    pub cause: String,
    pub actions: ActionTree,
    /// Name of the rule that produced `actions`, if any.
    pub rule: Option<String>,
}

/// Records keyed by file path, in order of first appearance.
#[derive(Debug, Default, Clone)]
pub struct DedupIndex {
    records: Vec<ErrorRecord>,
    seen: HashSet<PathBuf>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the path is already present. Returns whether it was
    /// inserted.
    pub fn insert(&mut self, record: ErrorRecord) -> bool {
        if self.seen.contains(&record.file_path) {
            return false;
        }
        self.seen.insert(record.file_path.clone());
        self.records.push(record);
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    pub fn get(&self, path: &Path) -> Option<&ErrorRecord> {
        if !self.contains(path) {
            return None;
        }
        self.records.iter().find(|r| r.file_path == path)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ErrorRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<ErrorRecord> {
        self.records
    }
}

/// Parses error lines of the form
/// `<prefix> ERROR (<context>) - <ORIGIN> <cause> <path>`.
#[derive(Debug, Clone)]
pub struct ErrorExtractor {
    line: Regex,
}

impl ErrorExtractor {
    pub fn new(origin: &str) -> Result<Self, regex::Error> {
        let line = Regex::new(&format!(
            r"^.+?ERROR \(.+?\) - {} (.+) (\S+)\s*$",
            regex::escape(origin)
        ))?;
        Ok(Self { line })
    }

    /// Cause and file path of a single line.
    pub fn parse_line(&self, line: &str) -> Option<(String, PathBuf)> {
        if is_separator(line) {
            return None;
        }

        let Some(caps) = self.line.captures(line) else {
            tracing::trace!("Skipping line: {}", line);
            return None;
        };

        let cause = caps.get(1)?.as_str().trim().to_string();
        let path = PathBuf::from(caps.get(2)?.as_str());
        Some((cause, path))
    }

    /// Parse every line of `text`, classifying each new path with `table`.
    /// Later lines for a path already seen are dropped.
    pub fn extract(&self, text: &str, table: &RuleTable) -> DedupIndex {
        let mut index = DedupIndex::new();

        for line in text.lines() {
            let Some((cause, file_path)) = self.parse_line(line) else {
                continue;
            };

            if index.contains(&file_path) {
                tracing::trace!("Already have an error for {}", file_path.display());
                continue;
            }

            let rule = table.matching_rule(&cause);
            let record = ErrorRecord {
                actions: rule
                    .map(|r| r.action.clone())
                    .unwrap_or_else(ActionTree::unmatched),
                rule: rule.map(|r| r.name.clone()),
                file_path,
                cause,
            };
            tracing::debug!(
                "Found error for {}: {} -> {}",
                record.file_path.display(),
                record.cause,
                record.actions
            );
            index.insert(record);
        }

        index
    }
}

/// Decorative lines: only dashes and box-drawing characters, or a
/// `+-----...-----+` banner anywhere in the line.
pub fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }

    let decorative = trimmed
        .chars()
        .all(|c| matches!(c, '-' | '+' | '|' | '=' | '\u{2500}'..='\u{257F}'));
    if decorative {
        return true;
    }

    match trimmed.find("+----") {
        Some(start) => trimmed[start + 1..].contains("----+"),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ActionNode;

    const LINE: &str = "2024-05-01 10:00:00,123 - root (7f12) :  ERROR (list_subtitles:120) - BAZARR ffprobe cannot analyze this video file. Could it be corrupted? /movies/Film (2020)/Film.mkv";

    fn extractor() -> ErrorExtractor {
        ErrorExtractor::new("BAZARR").unwrap()
    }

    #[test]
    fn parses_cause_and_trailing_path() {
        let (cause, path) = extractor().parse_line(LINE).unwrap();
        assert_eq!(
            cause,
            "ffprobe cannot analyze this video file. Could it be corrupted? /movies/Film"
        );
        assert_eq!(path, PathBuf::from("(2020)/Film.mkv"));
    }

    #[test]
    fn path_is_last_token() {
        let line = "x :  ERROR (a:1) - BAZARR file .rmvb is not a valid video extension /tv/Show/Season 1/e01.rmvb";
        let (cause, path) = extractor().parse_line(line).unwrap();
        assert_eq!(path, PathBuf::from("1/e01.rmvb"));
        assert!(cause.contains("is not a valid video extension"));

        let line = "x :  ERROR (a:1) - BAZARR Timeout reaching provider /tv/Show/S01/e01.mkv";
        let (cause, path) = extractor().parse_line(line).unwrap();
        assert_eq!(cause, "Timeout reaching provider");
        assert_eq!(path, PathBuf::from("/tv/Show/S01/e01.mkv"));
    }

    #[test]
    fn skips_non_matching_lines() {
        let ex = extractor();
        assert!(ex.parse_line("INFO (x:1) - BAZARR all good /a.mkv").is_none());
        assert!(ex.parse_line("ERROR (x:1) - SONARR bad /a.mkv").is_none());
        assert!(ex.parse_line("").is_none());
    }

    #[test]
    fn custom_origin() {
        let ex = ErrorExtractor::new("SUBS.SYNC").unwrap();
        let line = "t ERROR (x:1) - SUBS.SYNC broken /a/b.mkv";
        assert_eq!(ex.parse_line(line).unwrap().1, PathBuf::from("/a/b.mkv"));
        assert!(ex.parse_line("t ERROR (x:1) - SUBSXSYNC broken /a/b.mkv").is_none());
    }

    #[test]
    fn separators() {
        assert!(is_separator("-------------------------"));
        assert!(is_separator("  +=====+=====+  "));
        assert!(is_separator("╔══════════╗"));
        assert!(is_separator("x ERROR (y) - BAZARR +------ Traceback ------+ /a.mkv"));
        assert!(!is_separator(""));
        assert!(!is_separator("ERROR (y) - BAZARR file-name - broken /a.mkv"));
    }

    #[test]
    fn first_occurrence_wins() {
        let text = "\
t ERROR (x:1) - BAZARR Timeout talking to Sonarr /tv/a.mkv
-----------------------------------------
t ERROR (x:1) - BAZARR file is not a valid video extension /tv/a.mkv
t ERROR (x:1) - BAZARR file is not a valid video extension /tv/b.avi
";
        let index = extractor().extract(text, &RuleTable::builtin());
        assert_eq!(index.len(), 2);

        let first = index.get(Path::new("/tv/a.mkv")).unwrap();
        assert_eq!(first.cause, "Timeout talking to Sonarr");
        assert_eq!(first.actions, ActionTree::new(vec![ActionNode::Ignore]));
        assert_eq!(first.rule.as_deref(), Some("timeout"));

        let second = &index.iter().nth(1).unwrap();
        assert_eq!(second.file_path, PathBuf::from("/tv/b.avi"));
        assert_eq!(second.actions.nodes()[0], ActionNode::Blacklist);
    }

    #[test]
    fn unmatched_causes_are_recorded() {
        let text = "t ERROR (x:1) - BAZARR brand new failure /tv/c.mkv\n";
        let index = extractor().extract(text, &RuleTable::builtin());
        let record = index.iter().next().unwrap();
        assert_eq!(record.actions, ActionTree::unmatched());
        assert!(record.rule.is_none());
    }

    #[test]
    fn dedup_index_rejects_repeats() {
        let mut index = DedupIndex::new();
        let record = ErrorRecord {
            file_path: PathBuf::from("/a.mkv"),
            cause: "one".into(),
            actions: ActionTree::unmatched(),
            rule: None,
        };
        assert!(index.insert(record.clone()));
        assert!(!index.insert(ErrorRecord {
            cause: "two".into(),
            ..record
        }));
        assert_eq!(index.into_records()[0].cause, "one");
    }
}
