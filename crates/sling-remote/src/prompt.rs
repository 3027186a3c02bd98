//! Best-effort answers to interactive prompts in remote output.
//!
//! This is a plain substring table, not a terminal protocol. A prompt that is
//! worded differently, or that is written somewhere other than the command's
//! output streams, goes unanswered and the stage runs until its timeout.

use sling_core::PromptRule;

/// Built-in answers for common package-manager and SSH confirmation prompts.
pub fn default_rules() -> Vec<PromptRule> {
    vec![
        PromptRule::new("Do you want to continue? [Y/n]", "Y\n"),
        PromptRule::new("[y/N]", "y\n"),
        PromptRule::new("(yes/no)", "yes\n"),
        PromptRule::new("(yes/no/[fingerprint])", "yes\n"),
    ]
}

/// Scans one output stream for prompts.
///
/// Matches may span chunk boundaries. Each occurrence of a pattern is
/// answered once: scanning resumes after the end of the match. Only the tail
/// that could still begin a match is retained between chunks.
#[derive(Debug)]
pub struct PromptResponder {
    rules: Vec<PromptRule>,
    window: String,
    longest: usize,
}

impl PromptResponder {
    pub fn new(rules: Vec<PromptRule>) -> Self {
        let rules: Vec<PromptRule> = rules
            .into_iter()
            .filter(|r| !r.pattern.is_empty())
            .collect();
        let longest = rules.iter().map(|r| r.pattern.len()).max().unwrap_or(0);
        Self {
            rules,
            window: String::new(),
            longest,
        }
    }

    /// Feed an output chunk; returns the responses to write, in order.
    pub fn observe(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.rules.is_empty() {
            return Vec::new();
        }

        self.window.push_str(&String::from_utf8_lossy(chunk));

        let mut responses = Vec::new();
        while let Some((end, rule)) = self.earliest_match() {
            tracing::debug!(pattern = %rule.pattern, "interactive prompt detected");
            responses.push(rule.response.clone());
            self.window.drain(..end);
        }

        self.trim_window();
        responses
    }

    /// End offset and rule of the leftmost match; longer patterns win ties.
    fn earliest_match(&self) -> Option<(usize, &PromptRule)> {
        self.rules
            .iter()
            .filter_map(|rule| self.window.find(&rule.pattern).map(|start| (start, rule)))
            .min_by(|(a_start, a), (b_start, b)| {
                a_start
                    .cmp(b_start)
                    .then_with(|| b.pattern.len().cmp(&a.pattern.len()))
            })
            .map(|(start, rule)| (start + rule.pattern.len(), rule))
    }

    fn trim_window(&mut self) {
        let keep = self.longest.saturating_sub(1);
        if self.window.len() <= keep {
            return;
        }
        let mut cut = self.window.len() - keep;
        while !self.window.is_char_boundary(cut) {
            cut += 1;
        }
        self.window.drain(..cut);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responder() -> PromptResponder {
        PromptResponder::new(default_rules())
    }

    #[test]
    fn apt_prompt_gets_one_answer() {
        let mut r = responder();
        let replies = r.observe(
            b"After this operation, 120 MB will be used.\nDo you want to continue? [Y/n] ",
        );
        assert_eq!(replies, vec!["Y\n".to_owned()]);

        // Output after the answer does not re-trigger it.
        assert!(r.observe(b"\nSetting up docker.io ...\n").is_empty());
    }

    #[test]
    fn prompt_split_across_chunks_is_detected() {
        let mut r = responder();
        assert!(r.observe(b"Do you want to con").is_empty());
        assert!(r.observe(b"tinue? [Y").is_empty());
        assert_eq!(r.observe(b"/n] "), vec!["Y\n".to_owned()]);
    }

    #[test]
    fn repeated_prompts_are_each_answered() {
        let mut r = responder();
        let replies = r.observe(b"Remove file? [y/N] \nRemove other? [y/N] ");
        assert_eq!(replies, vec!["y\n".to_owned(), "y\n".to_owned()]);
    }

    #[test]
    fn longer_pattern_wins_at_same_position() {
        let mut r = PromptResponder::new(vec![
            PromptRule::new("Continue?", "short\n"),
            PromptRule::new("Continue? (y/n)", "long\n"),
        ]);
        assert_eq!(r.observe(b"Continue? (y/n)"), vec!["long\n".to_owned()]);
    }

    #[test]
    fn ssh_fingerprint_prompt_is_answered() {
        let mut r = responder();
        let replies = r.observe(
            b"Are you sure you want to continue connecting (yes/no/[fingerprint])? ",
        );
        assert_eq!(replies, vec!["yes\n".to_owned()]);
    }

    #[test]
    fn unrelated_output_is_ignored_and_window_stays_bounded() {
        let mut r = responder();
        for _ in 0..1000 {
            assert!(r.observe(b"Reading package lists... Done\n").is_empty());
        }
        assert!(r.window.len() < r.longest);
    }

    #[test]
    fn empty_patterns_are_dropped() {
        let mut r = PromptResponder::new(vec![PromptRule::new("", "boom\n")]);
        assert!(r.observe(b"anything").is_empty());
    }

    #[test]
    fn multibyte_output_does_not_break_trimming() {
        let mut r = responder();
        assert!(r.observe("ダウンロード中… ✓ 完了しました\n".repeat(20).as_bytes()).is_empty());
        assert_eq!(r.observe(b"[y/N]"), vec!["y\n".to_owned()]);
    }
}
