//! Extracting page ranges such as `2, 4-6, 9-`

use crate::error::{Result, ToolError};
use crate::merge::merge_documents;
use crate::models::{OutputNamer, Settings};
use crate::pdf_engine::{self, PageSource, PdfDocument};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceMode {
    /// All ranges in one file.
    Single,
    /// One file per range.
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Page(usize),
    /// `first-last`, with `last` missing for an open-ended range.
    Span(usize, Option<usize>),
}

fn number(text: &str, part: &str) -> Result<usize> {
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return Err(ToolError::Syntax(part.to_string()));
    }
    text.parse()
        .map_err(|_| ToolError::Syntax(part.to_string()))
}

fn tokenize(part: &str) -> Result<Token> {
    match part.split_once('-') {
        None => Ok(Token::Page(number(part, part)?)),
        Some((first, "")) => Ok(Token::Span(number(first.trim(), part)?, None)),
        Some((first, last)) => Ok(Token::Span(
            number(first.trim(), part)?,
            Some(number(last.trim(), part)?),
        )),
    }
}

/// Parse a comma separated list of pages and ranges into zero-based,
/// half-open page ranges, in the order given.
pub fn parse_ranges(query: &str, page_count: usize) -> Result<Vec<Range<usize>>> {
    let tokens = query
        .split(',')
        .map(|part| tokenize(part.trim()))
        .collect::<Result<Vec<_>>>()?;

    for token in &tokens {
        let last = match *token {
            Token::Page(page) | Token::Span(_, Some(page)) => page,
            Token::Span(first, None) => first,
        };
        if last > page_count {
            return Err(ToolError::PageOutOfRange {
                page: last,
                count: page_count,
            });
        }
    }

    tokens
        .into_iter()
        .map(|token| {
            let (first, last) = match token {
                Token::Page(page) => (page, page),
                Token::Span(first, last) => (first, last.unwrap_or(page_count)),
            };
            if first == 0 {
                return Err(ToolError::PageZero);
            }
            let (start, stop) = (first - 1, last);
            if start >= stop {
                return Err(ToolError::ReverseRange { start: first, stop: last });
            }
            Ok(start..stop)
        })
        .collect()
}

/// Write the pages selected by `query` and return the files created.
pub fn slice(path: &Path, query: &str, mode: SliceMode, settings: &Settings) -> Result<Vec<PathBuf>> {
    let doc = PdfDocument::open(path)?;
    let ranges = parse_ranges(query, doc.page_count())?;
    let namer = OutputNamer::new(path, &settings.suffix, settings.naming);

    let outputs = match mode {
        SliceMode::Single => {
            let parts = ranges
                .iter()
                .map(|range| doc.extract(range.clone()))
                .collect::<Result<Vec<_>>>()?;
            let mut sliced = merge_documents(parts)?;
            let output = namer.tagged("sliced");
            pdf_engine::save(&mut sliced, &output)?;
            vec![output]
        }
        SliceMode::Multi => ranges
            .iter()
            .enumerate()
            .map(|(i, range)| {
                let output = namer.part(i + 1);
                doc.write_range(range.clone(), &output)?;
                Ok(output)
            })
            .collect::<Result<Vec<_>>>()?,
    };

    info!(ranges = ranges.len(), files = outputs.len(), ?mode, "sliced");
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_pdf, page_widths, FixturePage};
    use tempfile::TempDir;

    #[test]
    fn test_parse_ranges() {
        assert_eq!(
            parse_ranges("2, 4-6, 9-", 10).unwrap(),
            vec![1..2, 3..6, 8..10]
        );
        assert_eq!(parse_ranges("3-3", 3).unwrap(), vec![2..3]);
    }

    #[test]
    fn test_parse_ranges_errors() {
        assert!(matches!(parse_ranges("1, a", 5), Err(ToolError::Syntax(_))));
        assert!(matches!(parse_ranges("", 5), Err(ToolError::Syntax(_))));
        assert!(matches!(parse_ranges("-3", 5), Err(ToolError::Syntax(_))));
        assert!(matches!(parse_ranges("1-2-3", 5), Err(ToolError::Syntax(_))));
        assert!(matches!(
            parse_ranges("2, 4-8", 5),
            Err(ToolError::PageOutOfRange { page: 8, count: 5 })
        ));
        assert!(matches!(parse_ranges("0-2", 5), Err(ToolError::PageZero)));
        assert!(matches!(parse_ranges("0", 5), Err(ToolError::PageZero)));
        assert!(matches!(
            parse_ranges("4-2", 5),
            Err(ToolError::ReverseRange { start: 4, stop: 2 })
        ));
    }

    #[test]
    fn test_syntax_checked_before_range() {
        // an out-of-range page does not hide a syntax error later on
        assert!(matches!(parse_ranges("99, x", 5), Err(ToolError::Syntax(_))));
    }

    #[test]
    fn test_slice_single() {
        let dir = TempDir::new().unwrap();
        let input = build_pdf(dir.path(), "doc.pdf", &FixturePage::numbered(6));

        let outputs = slice(&input, "5-, 2", SliceMode::Single, &Settings::default()).unwrap();

        assert_eq!(outputs, vec![dir.path().join("doc [sliced].pdf")]);
        assert_eq!(page_widths(&outputs[0]), vec![605.0, 606.0, 602.0]);
    }

    #[test]
    fn test_slice_multi() {
        let dir = TempDir::new().unwrap();
        let input = build_pdf(dir.path(), "doc.pdf", &FixturePage::numbered(6));

        let outputs = slice(&input, "1-2, 4", SliceMode::Multi, &Settings::default()).unwrap();

        assert_eq!(
            outputs,
            vec![
                dir.path().join("doc [part 1].pdf"),
                dir.path().join("doc [part 2].pdf"),
            ]
        );
        assert_eq!(page_widths(&outputs[0]), vec![601.0, 602.0]);
        assert_eq!(page_widths(&outputs[1]), vec![604.0]);
    }
}
