//! `@mention` parsing and mention-entry editing.
//!
//! All offsets are byte offsets into the text. Cursors past the end are
//! clamped, and cursors inside a multi-byte character move back to the
//! previous character boundary.

use huddle_client::Agent;
use once_cell::sync::Lazy;
use regex::Regex;

static MENTION_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("mention pattern is valid"));

/// One `@token` occurrence in a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionMatch {
    /// Offset of the `@`.
    pub start: usize,
    /// Offset just past the token.
    pub end: usize,
    /// Captured name, as typed.
    pub agent_name: String,
}

/// Whether the cursor sits in a mention being typed, and what has been typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionContext {
    pub active: bool,
    pub query: String,
}

/// Result of inserting a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionEdit {
    pub text: String,
    pub cursor: usize,
}

/// Canonical names of the known agents mentioned in `text`.
///
/// Matching ignores case, unknown names are dropped and repeats keep their
/// first position.
pub fn parse_mentions(text: &str, agents: &[Agent]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for capture in MENTION_TOKEN.captures_iter(text) {
        let Some(agent) = agents.iter().find(|a| a.matches_name(&capture[1])) else {
            continue;
        };
        if !names.contains(&agent.name) {
            names.push(agent.name.clone());
        }
    }
    names
}

/// Every `@token` in `text`, valid or not.
pub fn find_mention_matches(text: &str) -> Vec<MentionMatch> {
    MENTION_TOKEN
        .captures_iter(text)
        .filter_map(|capture| {
            let whole = capture.get(0)?;
            Some(MentionMatch {
                start: whole.start(),
                end: whole.end(),
                agent_name: capture[1].to_string(),
            })
        })
        .collect()
}

/// Agents whose name or display name contains `query`, ignoring case.
///
/// An empty query returns every agent.
pub fn filter_agents<'a>(query: &str, agents: &'a [Agent]) -> Vec<&'a Agent> {
    if query.is_empty() {
        return agents.iter().collect();
    }
    let query = query.to_lowercase();
    agents
        .iter()
        .filter(|agent| {
            agent.name.to_lowercase().contains(&query)
                || agent.display_name.to_lowercase().contains(&query)
        })
        .collect()
}

/// Mention state at `cursor`.
///
/// Active when the nearest `@` at or before the cursor is not separated from
/// it by whitespace.
pub fn resolve_mention_context(text: &str, cursor: usize) -> MentionContext {
    let before = &text[..clamp_cursor(text, cursor)];
    let Some(at) = before.rfind('@') else {
        return MentionContext::default();
    };
    let query = &before[at + 1..];
    if query.chars().any(char::is_whitespace) {
        return MentionContext::default();
    }
    MentionContext {
        active: true,
        query: query.to_string(),
    }
}

/// Replace the `@partial` ending at `cursor` with `@agent_name `.
///
/// Without an `@` before the cursor the text is returned unchanged.
pub fn insert_mention(text: &str, cursor: usize, agent_name: &str) -> MentionEdit {
    let cursor = clamp_cursor(text, cursor);
    let (before, after) = text.split_at(cursor);
    let Some(at) = before.rfind('@') else {
        return MentionEdit {
            text: text.to_string(),
            cursor,
        };
    };

    let inserted = format!("@{agent_name} ");
    let mut edited = String::with_capacity(at + inserted.len() + after.len());
    edited.push_str(&before[..at]);
    edited.push_str(&inserted);
    edited.push_str(after);
    MentionEdit {
        text: edited,
        cursor: at + inserted.len(),
    }
}

fn clamp_cursor(text: &str, cursor: usize) -> usize {
    let mut cursor = cursor.min(text.len());
    while !text.is_char_boundary(cursor) {
        cursor -= 1;
    }
    cursor
}

/// Draft text with live mention suggestions.
///
/// Call [`MentionComposer::update`] on every edit; the mention context is
/// recomputed each time.
#[derive(Debug, Clone, Default)]
pub struct MentionComposer {
    text: String,
    cursor: usize,
    context: MentionContext,
}

impl MentionComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit and recompute the mention context.
    pub fn update(&mut self, text: impl Into<String>, cursor: usize) -> &MentionContext {
        self.text = text.into();
        self.cursor = clamp_cursor(&self.text, cursor);
        self.context = resolve_mention_context(&self.text, self.cursor);
        &self.context
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn context(&self) -> &MentionContext {
        &self.context
    }

    /// Whether suggestions should be shown.
    pub fn is_suggesting(&self) -> bool {
        self.context.active
    }

    /// Agents matching the mention being typed; empty when not suggesting.
    pub fn suggestions<'a>(&self, agents: &'a [Agent]) -> Vec<&'a Agent> {
        if !self.context.active {
            return Vec::new();
        }
        filter_agents(&self.context.query, agents)
    }

    /// Complete the mention being typed. Returns false when there is none.
    pub fn accept(&mut self, agent_name: &str) -> bool {
        if !self.context.active {
            return false;
        }
        let edit = insert_mention(&self.text, self.cursor, agent_name);
        self.text = edit.text;
        self.cursor = edit.cursor;
        self.context = MentionContext::default();
        true
    }

    /// Hide suggestions until the next edit.
    pub fn dismiss(&mut self) {
        self.context = MentionContext::default();
    }

    /// Take the draft and its parsed mentions, leaving the composer empty.
    pub fn take(&mut self, agents: &[Agent]) -> (String, Vec<String>) {
        let text = std::mem::take(&mut self.text);
        let mentions = parse_mentions(&text, agents);
        *self = Self::default();
        (text, mentions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_client::roster::Roster;

    fn agents() -> Vec<Agent> {
        Roster::agents()
    }

    #[test]
    fn test_parse_dedupes_preserving_first_order() {
        assert_eq!(
            parse_mentions("Hi @Coder and @Coder again", &agents()),
            vec!["Coder".to_string()]
        );
        assert_eq!(
            parse_mentions("@Writer, @Coder, @writer", &agents()),
            vec!["Writer".to_string(), "Coder".to_string()]
        );
    }

    #[test]
    fn test_parse_is_case_insensitive_and_canonical() {
        assert_eq!(parse_mentions("@coder", &agents()), vec!["Coder".to_string()]);
        assert_eq!(parse_mentions("@CODER", &agents()), vec!["Coder".to_string()]);
    }

    #[test]
    fn test_parse_drops_unknown() {
        assert_eq!(parse_mentions("@Nope @Coder", &agents()), vec!["Coder".to_string()]);
        assert!(parse_mentions("@Nope", &agents()).is_empty());
        assert!(parse_mentions("@Coder", &[]).is_empty());
    }

    #[test]
    fn test_parse_stops_at_non_word_characters() {
        assert_eq!(
            parse_mentions("ping @Coder, then @Researcher!", &agents()),
            vec!["Coder".to_string(), "Researcher".to_string()]
        );
        assert!(parse_mentions("@ Coder", &agents()).is_empty());
    }

    #[test]
    fn test_find_matches_reports_offsets_regardless_of_validity() {
        let matches = find_mention_matches("Hey @Nope and @Coder");
        assert_eq!(
            matches,
            vec![
                MentionMatch {
                    start: 4,
                    end: 9,
                    agent_name: "Nope".to_string()
                },
                MentionMatch {
                    start: 14,
                    end: 20,
                    agent_name: "Coder".to_string()
                },
            ]
        );
        assert!(find_mention_matches("plain text").is_empty());
    }

    #[test]
    fn test_filter_agents() {
        let all = agents();
        assert_eq!(filter_agents("", &all).len(), 4);

        let names: Vec<_> = filter_agents("er", &all).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Coder", "Writer", "Researcher"]);

        let names: Vec<_> = filter_agents("COD", &all).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Coder"]);
        assert!(filter_agents("zzz", &all).is_empty());
    }

    #[test]
    fn test_filter_matches_display_name() {
        let mut all = agents();
        all[0].display_name = "Helper Bot".to_string();
        let names: Vec<_> = filter_agents("bot", &all).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Assistant"]);
    }

    #[test]
    fn test_context_tracks_each_keystroke() {
        assert_eq!(resolve_mention_context("Hello ", 6), MentionContext::default());
        assert_eq!(
            resolve_mention_context("Hello @", 7),
            MentionContext {
                active: true,
                query: String::new()
            }
        );
        assert_eq!(
            resolve_mention_context("Hello @Co", 9),
            MentionContext {
                active: true,
                query: "Co".to_string()
            }
        );
        assert!(!resolve_mention_context("Hello @Coder ", 13).active);
    }

    #[test]
    fn test_context_uses_cursor_not_text_end() {
        let context = resolve_mention_context("@Cod rest of text", 4);
        assert!(context.active);
        assert_eq!(context.query, "Cod");
    }

    #[test]
    fn test_insert_mention_replaces_partial() {
        assert_eq!(
            insert_mention("Hello @Cod", 10, "Coder"),
            MentionEdit {
                text: "Hello @Coder ".to_string(),
                cursor: 13
            }
        );
    }

    #[test]
    fn test_insert_mention_without_at_is_noop() {
        assert_eq!(
            insert_mention("Hello world", 11, "Coder"),
            MentionEdit {
                text: "Hello world".to_string(),
                cursor: 11
            }
        );
    }

    #[test]
    fn test_insert_mention_keeps_text_after_cursor() {
        let edit = insert_mention("@Wr please", 3, "Writer");
        assert_eq!(edit.text, "@Writer  please");
        assert_eq!(edit.cursor, 8);
    }

    #[test]
    fn test_cursor_is_clamped_to_char_boundary() {
        let text = "héllo @C";
        assert_eq!(resolve_mention_context(text, 100).query, "C");
        // Offset 2 is inside 'é'.
        assert!(!resolve_mention_context(text, 2).active);
        assert_eq!(insert_mention(text, 2, "Coder").text, text);
    }

    #[test]
    fn test_composer_flow() {
        let all = agents();
        let mut composer = MentionComposer::new();

        composer.update("Hi @", 4);
        assert!(composer.is_suggesting());
        assert_eq!(composer.suggestions(&all).len(), 4);

        composer.update("Hi @wr", 6);
        let names: Vec<_> = composer.suggestions(&all).iter().map(|a| a.name.clone()).collect();
        assert_eq!(names, vec!["Writer".to_string()]);

        assert!(composer.accept("Writer"));
        assert_eq!(composer.text(), "Hi @Writer ");
        assert_eq!(composer.cursor(), 11);
        assert!(!composer.is_suggesting());
        assert!(!composer.accept("Writer"));

        let (text, mentions) = composer.take(&all);
        assert_eq!(text, "Hi @Writer ");
        assert_eq!(mentions, vec!["Writer".to_string()]);
        assert!(composer.text().is_empty());
    }

    #[test]
    fn test_composer_dismiss() {
        let all = agents();
        let mut composer = MentionComposer::new();
        composer.update("@Co", 3);
        composer.dismiss();
        assert!(composer.suggestions(&all).is_empty());
        composer.update("@Cod", 4);
        assert!(composer.is_suggesting());
    }
}
