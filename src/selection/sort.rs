//! Natural ordering of site codes.
//!
//! Digit runs compare by numeric value and text runs compare without regard
//! to case, so `MKT-2` sorts before `mkt-10`.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;

    for (i, ch) in s.char_indices() {
        let is_digit = ch.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(prev) = in_digits {
        out.push(make_chunk(&s[start..], prev));
    }
    out
}

fn make_chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Digits(s)
    } else {
        Chunk::Text(s)
    }
}

fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Numeric-aware, case-insensitive comparison.
///
/// Strings that only differ in case or leading zeros fall back to a plain
/// comparison so the order stays total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Chunk::Digits(x), Chunk::Digits(y)) => compare_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => compare_text(x, y),
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_runs() {
        assert_eq!(natural_cmp("MKT-2", "MKT-10"), Ordering::Less);
        assert_eq!(natural_cmp("MKT-010", "MKT-9"), Ordering::Greater);
        assert_eq!(natural_cmp("A100", "A20"), Ordering::Greater);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(natural_cmp("edsa-1", "EDSA-2"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "ABD"), Ordering::Less);
    }

    #[test]
    fn test_sorting_list() {
        let mut codes = vec!["s10", "S2", "s1", "b3", "S1a"];
        codes.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(codes, vec!["b3", "s1", "S1a", "S2", "s10"]);
    }

    #[test]
    fn test_total_order_on_ties() {
        assert_ne!(natural_cmp("a1", "A1"), Ordering::Equal);
        assert_eq!(natural_cmp("a1", "a1"), Ordering::Equal);
    }
}
