//! Token trees: leaf text fragments and labelled composite nodes.
//!
//! A tree is a `Vec<Token>` whose flattened text spells out the source exactly.
//! Message nodes ride inside the tree as metadata and flatten to nothing.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Alias set on a wrapper whose only content is a single line break.
pub const LINE_BREAK_TAG: &str = "line-break";

/// Reserved kind of the zero-width node carrying an annotation's text.
pub const MESSAGE_KIND: &str = "annotation-message";

/// Reserved kind of the node wrapping an annotated span.
pub const WRAPPER_KIND: &str = "annotated-span";

/// A labelled node. Its content is either plain text or more tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composite {
    /// Style class used by renderers, such as `keyword` or `comment`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Text or nested tokens.
    pub content: Content,
    /// Grammar kind, such as `identifier`, or one of the reserved kinds.
    pub kind: String,
}

impl Composite {
    /// True when the node contributes no characters.
    pub fn is_empty(&self) -> bool {
        if self.is_message() {
            return true;
        }
        return match &self.content {
            Content::Nodes(children) => children.iter().all(Token::is_empty),
            Content::Text(text) => text.is_empty(),
        };
    }

    /// True for the reserved zero-width message kind.
    pub fn is_message(&self) -> bool {
        return self.kind == MESSAGE_KIND;
    }

    /// True for the reserved wrapper kind.
    pub fn is_wrapper(&self) -> bool {
        return self.kind == WRAPPER_KIND;
    }

    /// Number of source characters under this node. Messages count zero.
    pub fn len(&self) -> usize {
        if self.is_message() {
            return 0;
        }
        return match &self.content {
            Content::Nodes(children) => tree_len(children),
            Content::Text(text) => text.chars().count(),
        };
    }

    /// Composite holding nested tokens.
    pub fn nodes(kind: &str, children: Vec<Token>) -> Self {
        return Self {
            alias: None,
            content: Content::Nodes(children),
            kind: kind.to_string(),
        };
    }

    /// Composite holding a text fragment.
    pub fn text(kind: &str, text: &str) -> Self {
        return Self {
            alias: None,
            content: Content::Text(text.to_string()),
            kind: kind.to_string(),
        };
    }

    /// Builder-style alias setter.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.to_string());
        return self;
    }
}

/// What a composite contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Nested tokens, in source order.
    Nodes(Vec<Token>),
    /// A single text fragment.
    Text(String),
}

/// One node of a token tree. Serialized as a bare string for leaves and
/// as `{kind, alias?, content}` for composites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    /// A labelled node.
    Node(Composite),
    /// A raw text fragment.
    Text(String),
}

impl Token {
    /// The zero-width node carrying an annotation's text.
    pub fn message(text: &str) -> Self {
        return Self::Node(Composite::text(MESSAGE_KIND, text));
    }

    /// True when the token contributes no characters.
    pub fn is_empty(&self) -> bool {
        return match self {
            Self::Node(composite) => composite.is_empty(),
            Self::Text(text) => text.is_empty(),
        };
    }

    /// True for the reserved zero-width message kind.
    pub fn is_message(&self) -> bool {
        return matches!(self, Self::Node(c) if c.is_message());
    }

    /// Number of source characters under this token.
    pub fn len(&self) -> usize {
        return match self {
            Self::Node(composite) => composite.len(),
            Self::Text(text) => text.chars().count(),
        };
    }

    /// A raw text leaf.
    pub fn text(text: &str) -> Self {
        return Self::Text(text.to_string());
    }

    /// Wrap in-range pieces and append the single message node.
    /// A wrapper around exactly one line break is tagged so renderers
    /// can keep the line height unchanged.
    pub fn wrapper(mut pieces: Vec<Self>, message: &str) -> Self {
        let alias = is_line_break(&flatten(&pieces)).then(|| return LINE_BREAK_TAG.to_string());
        pieces.push(Self::message(message));
        return Self::Node(Composite {
            alias,
            content: Content::Nodes(pieces),
            kind: WRAPPER_KIND.to_string(),
        });
    }
}

impl From<Composite> for Token {
    fn from(composite: Composite) -> Self {
        return Self::Node(composite);
    }
}

/// Concatenate the text of every token, skipping message nodes.
pub fn flatten(tokens: &[Token]) -> String {
    let mut out = String::new();
    push_flattened(tokens, &mut out);
    return out;
}

/// True for a single line-break character.
fn is_line_break(text: &str) -> bool {
    return text == "\n" || text == "\r";
}

/// Collect every annotation message in document order.
#[cfg(test)]
pub fn messages(tokens: &[Token]) -> Vec<&str> {
    let mut out = Vec::new();
    push_messages(tokens, &mut out);
    return out;
}

/// Recursive worker for [`flatten`].
fn push_flattened(tokens: &[Token], out: &mut String) {
    for token in tokens {
        match token {
            Token::Node(composite) if composite.is_message() => {},
            Token::Node(composite) => match &composite.content {
                Content::Nodes(children) => push_flattened(children, out),
                Content::Text(text) => out.push_str(text),
            },
            Token::Text(text) => out.push_str(text),
        }
    }
}

/// Recursive worker for [`messages`].
#[cfg(test)]
fn push_messages<'a>(tokens: &'a [Token], out: &mut Vec<&'a str>) {
    for token in tokens {
        let Token::Node(composite) = token else {
            continue;
        };
        match &composite.content {
            Content::Nodes(children) => push_messages(children, out),
            Content::Text(text) if composite.is_message() => out.push(text),
            Content::Text(_) => {},
        }
    }
}

/// Split `tokens` (whose first character sits at offset 0) into the tokens
/// before `at` and the tokens from `at` on. Zero-width tokens sitting exactly
/// at `at` stay on the left.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if `at` falls inside an existing wrapper.
fn split_children(tokens: Vec<Token>, at: usize) -> Result<(Vec<Token>, Vec<Token>), Error> {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut cursor = 0_usize;

    for token in tokens {
        let token_end = cursor.saturating_add(token.len());
        if token_end <= at {
            left.push(token);
        } else if cursor >= at {
            right.push(token);
        } else {
            let (head, tail) = split_token(token, at.saturating_sub(cursor))?;
            left.extend(head);
            right.extend(tail);
        }
        cursor = token_end;
    }

    return Ok((left, right));
}

/// Split a string after `at` characters.
fn split_text(text: &str, at: usize) -> (String, String) {
    let byte = text.char_indices().nth(at).map_or(text.len(), |(i, _)| return i);
    let (head, tail) = text.split_at_checked(byte).unwrap_or((text, ""));
    return (head.to_string(), tail.to_string());
}

/// Split one token after `at` characters, preserving kind and alias on both
/// sides and recursing into nested content. A side with no characters is `None`.
///
/// # Errors
///
/// Returns `Error::MalformedTree` if the split point falls strictly inside a
/// wrapper, since that would separate annotated text from its message.
pub fn split_token(token: Token, at: usize) -> Result<(Option<Token>, Option<Token>), Error> {
    if at == 0 {
        return Ok((None, Some(token)));
    }
    if at >= token.len() {
        return Ok((Some(token), None));
    }

    let composite = match token {
        Token::Node(composite) => composite,
        Token::Text(text) => {
            let (head, tail) = split_text(&text, at);
            return Ok((Some(Token::Text(head)), Some(Token::Text(tail))));
        },
    };

    if composite.is_wrapper() {
        return Err(Error::MalformedTree {
            reason: format!("range boundary falls {at} characters inside an existing annotation"),
        });
    }

    let Composite { alias, content, kind } = composite;
    let (head, tail) = match content {
        Content::Nodes(children) => {
            let (head, tail) = split_children(children, at)?;
            (Content::Nodes(head), Content::Nodes(tail))
        },
        Content::Text(text) => {
            let (head, tail) = split_text(&text, at);
            (Content::Text(head), Content::Text(tail))
        },
    };

    let left = Composite { alias: alias.clone(), content: head, kind: kind.clone() };
    let right = Composite { alias, content: tail, kind };
    return Ok((Some(left.into()), Some(right.into())));
}

/// Total number of source characters in a tree.
pub fn tree_len(tokens: &[Token]) -> usize {
    return tokens.iter().map(Token::len).fold(0, usize::saturating_add);
}

/// Check that reserved kinds have the shape renderers and the splitter rely on:
/// messages hold text, and wrappers hold nested pieces ending in exactly one
/// message.
///
/// # Errors
///
/// Returns `Error::MalformedTree` naming the first offending node.
pub fn validate(tokens: &[Token]) -> Result<(), Error> {
    for token in tokens {
        let Token::Node(composite) = token else {
            continue;
        };
        validate_composite(composite)?;
    }
    return Ok(());
}

/// Shape check for a single composite and its descendants.
///
/// # Errors
///
/// Returns `Error::MalformedTree` naming the offending node.
fn validate_composite(composite: &Composite) -> Result<(), Error> {
    if composite.is_message() {
        if matches!(composite.content, Content::Nodes(_)) {
            return Err(Error::MalformedTree {
                reason: "annotation message holds nested nodes instead of text".to_string(),
            });
        }
        return Ok(());
    }

    let children = match &composite.content {
        Content::Nodes(children) => children,
        Content::Text(_) if composite.is_wrapper() => {
            return Err(Error::MalformedTree {
                reason: "annotated span has no message node".to_string(),
            });
        },
        Content::Text(_) => return Ok(()),
    };

    if composite.is_wrapper() {
        let message_count = children.iter().filter(|t| return t.is_message()).count();
        let ends_with_message = children.last().is_some_and(Token::is_message);
        if message_count != 1 || !ends_with_message {
            return Err(Error::MalformedTree {
                reason: format!(
                    "annotated span must end with exactly one message node, found {message_count}"
                ),
            });
        }
    }

    return validate(children);
}
