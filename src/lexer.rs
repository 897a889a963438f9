//! Command splitter (spec §6): whitespace-run splitting, no quoting or escaping.

/// Split a trimmed command line into an owned argument vector on runs of whitespace.
pub fn split_whitespace_owned(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_runs_of_whitespace() {
        assert_eq!(
            split_whitespace_owned("run   /bin/echo  hello   world"),
            vec!["run", "/bin/echo", "hello", "world"]
        );
    }

    #[test]
    fn empty_line_yields_empty_vec() {
        assert!(split_whitespace_owned("").is_empty());
        assert!(split_whitespace_owned("   ").is_empty());
    }

    #[test]
    fn no_quoting_or_escaping() {
        // A quoted argument is split like any other whitespace-separated token.
        let tokens = split_whitespace_owned(r#"run /bin/echo "hello world""#);
        assert_eq!(tokens, vec!["run", "/bin/echo", "\"hello", "world\""]);
    }
}
