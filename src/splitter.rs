//! Splices annotated ranges into a token tree as wrapper nodes.
//!
//! Every range becomes exactly one wrapper holding the in-range pieces of
//! however many tokens it crosses, followed by one message node. Text outside
//! ranges stays on its original token, split at range boundaries.

use tracing::debug;

use crate::error::Error;
use crate::token::{self, Composite, Content, Token};
use crate::types::AnnotatedRange;

/// Result of applying a full list of ranges.
#[derive(Debug)]
pub struct Annotated {
    /// Ranges that produced a wrapper.
    pub applied: usize,
    /// Ranges that were empty or fell past the end of the tree.
    pub skipped: usize,
    /// The rewritten tree.
    pub tokens: Vec<Token>,
}

/// What happened to a single range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A wrapper was inserted.
    Applied,
    /// Nothing to annotate: empty range, empty tree, or range past the end.
    Skipped,
}

/// Apply every range to the tree in ascending start order.
///
/// Ranges are first normalized by [`prepare_ranges`]. Each application
/// consumes the tree produced by the previous one.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if the input tree has a reserved node of the
/// wrong shape or a range boundary falls inside an existing annotation. The
/// whole invocation stops at the first such fault.
pub fn apply_annotations(tokens: Vec<Token>, ranges: &[AnnotatedRange]) -> Result<Annotated, Error> {
    token::validate(&tokens)?;

    let mut annotated = Annotated { applied: 0, skipped: 0, tokens };
    for range in prepare_ranges(ranges) {
        let (tokens, outcome) = apply_one_range(annotated.tokens, &range)?;
        annotated.tokens = tokens;
        match outcome {
            Outcome::Applied => annotated.applied = annotated.applied.saturating_add(1),
            Outcome::Skipped => annotated.skipped = annotated.skipped.saturating_add(1),
        }
    }

    return Ok(annotated);
}

/// Insert one wrapper for `range` into a tree whose first character is at offset 0.
///
/// A range that is empty or starts at or past the end of the tree leaves the
/// tree untouched. A range ending past the end of the tree is clamped.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if a range boundary falls inside an existing wrapper.
pub fn apply_one_range(tokens: Vec<Token>, range: &AnnotatedRange) -> Result<(Vec<Token>, Outcome), Error> {
    let total = token::tree_len(&tokens);
    if range.is_empty() || range.start >= total {
        debug!(start = range.start, end = range.end, total, "range outside token tree, skipping");
        return Ok((tokens, Outcome::Skipped));
    }

    let span = Span {
        end: range.end.min(total),
        message: &range.message,
        start: range.start,
    };
    let tokens = splice(tokens, 0, &span)?;
    return Ok((tokens, Outcome::Applied));
}

/// Sort ranges by start (longest first on ties) and merge any range that
/// overlaps its predecessor into one range covering both. Each distinct
/// message is kept once and the survivors are joined with a newline. Merely
/// adjacent ranges stay separate, and empty ranges are passed through
/// untouched so the splitter counts them as skipped.
pub fn prepare_ranges(ranges: &[AnnotatedRange]) -> Vec<AnnotatedRange> {
    let mut sorted = ranges.to_vec();
    sorted.sort_by(|a, b| return a.start.cmp(&b.start).then_with(|| return b.end.cmp(&a.end)));

    let mut merged: Vec<(AnnotatedRange, Vec<String>)> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some((prev, messages)) if !prev.is_empty() && !range.is_empty() && range.start < prev.end => {
                prev.end = prev.end.max(range.end);
                if !messages.contains(&range.message) {
                    messages.push(range.message);
                }
            },
            _ => {
                let messages = vec![range.message.clone()];
                merged.push((range, messages));
            },
        }
    }

    return merged
        .into_iter()
        .map(|(range, messages)| {
            return AnnotatedRange { message: messages.join("\n"), ..range };
        })
        .collect();
}

/// A range resolved against a tree, with `end` already clamped.
struct Span<'a> {
    /// Exclusive end offset.
    end: usize,
    /// Text for the message node.
    message: &'a str,
    /// Inclusive start offset.
    start: usize,
}

/// Insert the wrapper for `span` into `tokens`, whose first character sits at
/// absolute offset `origin`. The caller guarantees the span starts inside
/// `tokens`.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if a boundary falls inside an existing wrapper.
fn splice(tokens: Vec<Token>, origin: usize, span: &Span<'_>) -> Result<Vec<Token>, Error> {
    let mut out = Vec::with_capacity(tokens.len().saturating_add(2));
    let mut remaining = tokens.into_iter();
    let mut cursor = origin;

    // Pass through everything that ends at or before the span start.
    let entry = loop {
        let Some(token) = remaining.next() else {
            return Ok(out);
        };
        let token_end = cursor.saturating_add(token.len());
        if token_end > span.start {
            break token;
        }
        out.push(token);
        cursor = token_end;
    };

    let entry_end = cursor.saturating_add(entry.len());
    let entry = match entry {
        Token::Node(Composite { alias, content: Content::Nodes(children), kind })
            if span.end <= entry_end =>
        {
            // The span lives entirely inside this node: build the wrapper one level down.
            let children = splice(children, cursor, span)?;
            out.push(Composite { alias, content: Content::Nodes(children), kind }.into());
            out.extend(remaining);
            return Ok(out);
        },
        other => other,
    };

    let (before, inside) = token::split_token(entry, span.start.saturating_sub(cursor))?;
    out.extend(before);

    let mut pieces = Vec::new();
    let mut after = None;
    let mut position = span.start;
    let mut pending = inside;

    while let Some(token) = pending.take() {
        let token_end = position.saturating_add(token.len());
        if token_end <= span.end {
            pieces.push(token);
            position = token_end;
        } else {
            let (head, tail) = token::split_token(token, span.end.saturating_sub(position))?;
            pieces.extend(head);
            after = tail;
            break;
        }
        if position < span.end {
            pending = remaining.next();
        }
    }

    out.push(Token::wrapper(pieces, span.message));
    out.extend(after);
    out.extend(remaining);
    return Ok(out);
}
