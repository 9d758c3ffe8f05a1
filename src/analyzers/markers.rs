//! In-text citation markers.
//!
//! Three shapes are recognized: author-date, parenthetical `(Smith, 2020)` or
//! narrative `Smith (2020)`; author-page `(Smith 42)`; and numeric `[3]`,
//! `[1, 4-6]`.

use regex::Regex;
use std::sync::OnceLock;

const MAX_RANGE: usize = 100;

/// An in-text reference to an author, with a year or page
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthorMarker {
    pub start: usize,
    pub end: usize,
    pub surname: String,
    pub year: Option<i32>,
}

/// A bracketed numeric reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NumericMarker {
    pub start: usize,
    pub end: usize,
    pub numbers: Vec<usize>,
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid marker regex"))
}

fn parenthetical() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\(([^()]*?\b[12]\d{3}[a-z]?\b[^()]*)\)")
}

fn narrative() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"(\p{Lu}[\p{L}'’\-]+)(?:\s+et\s+al\.?|\s+(?:and|&)\s+\p{Lu}[\p{L}'’\-]+)?\s+\(([12]\d{3})[a-z]?\)",
    )
}

fn year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\b([12]\d{3})[a-z]?\b")
}

fn author_page() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\((\p{Lu}[\p{L}'’\-]+)(?:\s+et\s+al\.)?\s+\d+(?:[-–]\d+)?\)")
}

fn numeric() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"\[(\d+(?:\s*[-–,]\s*\d+)*)\]")
}

/// First capitalized word of an author part, without punctuation
fn surname_in(part: &str) -> Option<String> {
    part.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphabetic() && c != '\'' && c != '-'))
        .find(|w| w.chars().next().is_some_and(char::is_uppercase))
        .map(str::to_string)
}

/// Author-date markers, parenthetical and narrative, in content order
pub(crate) fn author_date_markers(content: &str) -> Vec<AuthorMarker> {
    let mut markers = Vec::new();

    for caps in parenthetical().captures_iter(content) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        for part in inner.as_str().split(';') {
            let Some(y) = year().captures(part) else { continue };
            let Some(year_match) = y.get(0) else { continue };
            let Some(surname) = surname_in(&part[..year_match.start()]) else {
                continue;
            };
            markers.push(AuthorMarker {
                start: whole.start(),
                end: whole.end(),
                surname,
                year: y[1].parse().ok(),
            });
        }
    }

    for caps in narrative().captures_iter(content) {
        let Some(whole) = caps.get(0) else { continue };
        markers.push(AuthorMarker {
            start: whole.start(),
            end: whole.end(),
            surname: caps[1].to_string(),
            year: caps[2].parse().ok(),
        });
    }

    markers.sort_by_key(|m| m.start);
    markers
}

/// MLA-style `(Author page)` markers
pub(crate) fn author_page_markers(content: &str) -> Vec<AuthorMarker> {
    author_page()
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(AuthorMarker {
                start: whole.start(),
                end: whole.end(),
                surname: caps[1].to_string(),
                year: None,
            })
        })
        .collect()
}

/// Bracketed numeric markers with ranges expanded
pub(crate) fn numeric_markers(content: &str) -> Vec<NumericMarker> {
    numeric()
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let mut numbers = Vec::new();

            for item in caps[1].split(',') {
                let bounds: Vec<usize> = item
                    .split(['-', '–'])
                    .filter_map(|n| n.trim().parse().ok())
                    .collect();
                match bounds.as_slice() {
                    [n] => numbers.push(*n),
                    [a, b] if a <= b && b - a < MAX_RANGE => numbers.extend(*a..=*b),
                    _ => {}
                }
            }

            Some(NumericMarker {
                start: whole.start(),
                end: whole.end(),
                numbers,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parenthetical_author_date() {
        let content = "Sleep helps (Smith, 2020; Doe et al., 2018a) and more (see Brown & Lee, 2015, p. 4).";
        let markers = author_date_markers(content);

        let found: Vec<_> = markers.iter().map(|m| (m.surname.as_str(), m.year)).collect();
        assert_eq!(
            found,
            vec![("Smith", Some(2020)), ("Doe", Some(2018)), ("Brown", Some(2015))]
        );
        assert_eq!(&content[markers[0].start..markers[0].end], "(Smith, 2020; Doe et al., 2018a)");
    }

    #[test]
    fn test_narrative_author_date() {
        let markers = author_date_markers("As Smith and Jones (2019) showed, and Lee et al. (2001) agreed.");
        let found: Vec<_> = markers.iter().map(|m| (m.surname.as_str(), m.year)).collect();
        assert_eq!(found, vec![("Smith", Some(2019)), ("Lee", Some(2001))]);
    }

    #[test]
    fn test_bare_years_are_not_markers() {
        assert!(author_date_markers("Data from (2020) and the year 1999.").is_empty());
    }

    #[test]
    fn test_numeric_markers() {
        let markers = numeric_markers("Shown in [1], [2, 4-6] and [3–3]. Not [a].");
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].numbers, vec![1]);
        assert_eq!(markers[1].numbers, vec![2, 4, 5, 6]);
        assert_eq!(markers[2].numbers, vec![3]);
    }

    #[test]
    fn test_author_page_markers() {
        let markers = author_page_markers("A claim (Smith 42) and another (Doe et al. 10-12).");
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[1].surname, "Doe");
        assert_eq!(markers[0].year, None);
    }
}
