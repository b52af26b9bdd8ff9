//! Numeric-aware, case-insensitive ordering for card identifiers, so that
//! `card-2` sorts before `card-10`.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

/// Compare two strings, treating runs of ASCII digits as numbers and everything else
/// case-insensitively. Strings equal under that rule fall back to plain byte order so
/// the result is a total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_cmp_loose(a, b).then_with(|| a.cmp(b))
}

fn natural_cmp_loose(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ordering = compare_numbers(&take_digits(&mut left), &take_digits(&mut right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                let ordering = l.to_lowercase().cmp(r.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

/// Compare digit runs by value without parsing, so arbitrarily long runs work
fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort in place by [`natural_cmp`] on the key
pub fn natural_sort_by_key<T, F>(items: &mut [T], key: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by(|a, b| natural_cmp(key(a), key(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(input: &[&str]) -> Vec<String> {
        let mut items: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        natural_sort_by_key(&mut items, |s| s.as_str());
        items
    }

    #[test]
    fn test_numeric_runs() {
        assert_eq!(
            sorted(&["card-2", "card-10", "card-1"]),
            vec!["card-1", "card-2", "card-10"]
        );
    }

    #[test]
    fn test_row_column_identifiers() {
        assert_eq!(
            sorted(&["s-r10-c1", "s-r2-c10", "s-r2-c2", "s-r1-c3"]),
            vec!["s-r1-c3", "s-r2-c2", "s-r2-c10", "s-r10-c1"]
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(sorted(&["b", "A", "a", "B"]), vec!["A", "a", "B", "b"]);
        assert_eq!(natural_cmp_loose("Card", "card"), Ordering::Equal);
    }

    #[test]
    fn test_leading_zeros_and_prefixes() {
        assert_eq!(natural_cmp_loose("x007", "x7"), Ordering::Equal);
        assert_eq!(natural_cmp("x7", "x007y"), Ordering::Less);
        assert_eq!(natural_cmp("page", "page1"), Ordering::Less);
        assert_eq!(
            natural_cmp("n99999999999999999999999", "n100000000000000000000000"),
            Ordering::Less
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let forward = sorted(&["c10", "c9", "C1", "c1", "c100"]);
        let backward = sorted(&["c100", "c1", "C1", "c9", "c10"]);
        assert_eq!(forward, backward);
    }
}
