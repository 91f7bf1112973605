use crate::domain::{Verdict, VerdictMap};

/// Parses the line-oriented completion into verdicts.
///
/// Each line must be `<url> recommend` or `<url> not recommend`. Lines with any
/// other shape are skipped without error; a later line for the same URL wins.
pub fn parse_verdicts(completion: &str) -> VerdictMap {
    let mut verdicts = VerdictMap::new();
    for line in completion.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((token, remainder)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        let Some(verdict) = Verdict::from_phrase(remainder.trim()) else {
            continue;
        };
        let url = strip_brackets(token);
        if url.is_empty() {
            continue;
        }
        verdicts.insert(url.to_string(), verdict);
    }
    verdicts
}

fn strip_brackets(token: &str) -> &str {
    let token = token.strip_prefix('[').unwrap_or(token);
    token.strip_suffix(']').unwrap_or(token)
}
