//! Whitespace handling for streamed fragments.

/// Re-chunks streamed fragments so their concatenation equals the trimmed
/// full response.
///
/// Leading whitespace is dropped; trailing whitespace is held back until more
/// non-whitespace text arrives, and discarded if none does.
#[derive(Debug, Default)]
pub struct FragmentTrimmer {
    started: bool,
    pending: String,
}

impl FragmentTrimmer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one upstream fragment; returns the text ready to emit, if any.
    pub fn push(&mut self, fragment: &str) -> Option<String> {
        let mut rest = fragment;
        if !self.started {
            rest = rest.trim_start();
            if rest.is_empty() {
                return None;
            }
            self.started = true;
        }

        let body = rest.trim_end();
        if body.is_empty() {
            self.pending.push_str(rest);
            return None;
        }

        let mut out = std::mem::take(&mut self.pending);
        out.push_str(body);
        self.pending.push_str(&rest[body.len()..]);
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fragments: &[&str]) -> Vec<String> {
        let mut trimmer = FragmentTrimmer::new();
        fragments.iter().filter_map(|f| trimmer.push(f)).collect()
    }

    #[test]
    fn test_concatenation_equals_trimmed_whole() {
        let cases: &[&[&str]] = &[
            &["  ", "\nRisk", " level", ": High", "  \n", "  "],
            &["Fake", " ", "reviews", "\n\n", "detected."],
            &["   "],
            &[],
            &["single"],
            &["é ", " ü\t", "\t"],
        ];
        for fragments in cases {
            let joined: String = fragments.concat();
            let emitted = run(fragments).concat();
            assert_eq!(emitted, joined.trim(), "{:?}", fragments);
        }
    }

    #[test]
    fn test_never_emits_empty() {
        let out = run(&["  ", "a", " ", " ", "b", "   "]);
        assert!(out.iter().all(|s| !s.is_empty()));
        assert_eq!(out, vec!["a".to_string(), "  b".to_string()]);
    }
}
