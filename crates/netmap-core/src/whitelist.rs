//! The contract implementation whitelist.
//!
//! Maps a contract's fully qualified name to the ordered set of attachment
//! hashes approved to implement it. The admin surface exchanges whitelists
//! as text lines of the form `<fqn>:<sha256>`.

use crate::{CoreError, Result, SecureHash};
use std::collections::{BTreeMap, BTreeSet};

/// Contract FQN to approved attachment hashes.
pub type Whitelist = BTreeMap<String, BTreeSet<SecureHash>>;

/// Parses one `<fqn>:<sha256>` line.
///
/// # Errors
///
/// Returns [`CoreError::BadWhitelistLine`] when the separator is missing,
/// the name is empty, or the hash is malformed.
pub fn parse_whitelist_line(line: &str) -> Result<(String, SecureHash)> {
    let bad = || CoreError::BadWhitelistLine(line.to_string());
    let (fqn, hash) = line.rsplit_once(':').ok_or_else(bad)?;
    let fqn = fqn.trim();
    if fqn.is_empty() {
        return Err(bad());
    }
    let hash = SecureHash::from_hex(hash.trim()).map_err(|_| bad())?;
    Ok((fqn.to_string(), hash))
}

/// Parses a newline-separated whitelist body, skipping blank lines.
///
/// # Errors
///
/// Fails on the first malformed line.
pub fn parse_whitelist_lines(body: &str) -> Result<Whitelist> {
    let mut whitelist = Whitelist::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (fqn, hash) = parse_whitelist_line(line)?;
        whitelist.entry(fqn).or_default().insert(hash);
    }
    Ok(whitelist)
}

/// Renders a whitelist back into `<fqn>:<sha256>` lines.
#[must_use]
pub fn format_whitelist(whitelist: &Whitelist) -> String {
    let mut out = String::new();
    for (fqn, hashes) in whitelist {
        for hash in hashes {
            out.push_str(fqn);
            out.push(':');
            out.push_str(&hash.to_hex());
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hash(n: u8) -> SecureHash {
        SecureHash::compute(&[n])
    }

    #[test]
    fn parse_line_accepts_valid_entry() {
        let line = format!("com.example.Cash:{}", hash(1).to_hex());
        let (fqn, h) = parse_whitelist_line(&line).unwrap();
        assert_eq!(fqn, "com.example.Cash");
        assert_eq!(h, hash(1));
    }

    #[test]
    fn parse_line_rejects_missing_separator() {
        assert!(parse_whitelist_line("com.example.Cash").is_err());
    }

    #[test]
    fn parse_line_rejects_bad_hash() {
        assert!(parse_whitelist_line("com.example.Cash:nothex").is_err());
    }

    #[test]
    fn parse_lines_merges_duplicate_fqns() {
        let body = format!(
            "com.example.Cash:{}\n\ncom.example.Cash:{}\n",
            hash(1).to_hex(),
            hash(2).to_hex()
        );
        let wl = parse_whitelist_lines(&body).unwrap();
        assert_eq!(wl.len(), 1);
        assert_eq!(wl["com.example.Cash"].len(), 2);
    }

    #[test]
    fn format_round_trips() {
        let body = format!(
            "com.example.Cash:{}\ncom.example.Bond:{}\n",
            hash(1).to_hex(),
            hash(2).to_hex()
        );
        let wl = parse_whitelist_lines(&body).unwrap();
        let rendered = format_whitelist(&wl);
        assert_eq!(parse_whitelist_lines(&rendered).unwrap(), wl);
    }
}
