//! Movetext loading.
//!
//! Reads PGN-style movetext with nested parenthesised variations into a
//! [`GameTree`]. Move numbers, comments, NAGs, annotation glyphs and game
//! results are skipped.

use shakmaty::{CastlingMode, Chess, fen::Fen};

use crate::error::{Result, ViewerError};
use crate::game_tree::GameTree;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Word(&'a str),
}

/// Parses a FEN string into a position.
///
/// # Errors
///
/// Returns [`ViewerError::Position`] if the FEN is malformed or describes an
/// illegal position.
pub fn position_from_fen(fen: &str) -> Result<Chess> {
    let fen = Fen::from_ascii(fen.trim().as_bytes())
        .map_err(|e| ViewerError::Position(format!("invalid FEN: {e}")))?;
    fen.into_position(CastlingMode::Standard)
        .map_err(|e| ViewerError::Position(format!("illegal position: {e}")))
}

/// Parses movetext played from `start` into a game tree.
///
/// A parenthesised group is an alternative to the move just before it, so
/// `1. e4 e5 (1... c5) 2. Nf3` stores `c5` as the second variation after
/// `e4` and continues the mainline with `Nf3`.
///
/// # Errors
///
/// Returns [`ViewerError::Movetext`] with the index of the offending token
/// for illegal moves or unbalanced parentheses.
pub fn parse(text: &str, start: Chess) -> Result<GameTree> {
    let mut tree = GameTree::new(start);
    let mut current = tree.root();
    let mut stack = Vec::new();
    let tokens = tokenize(text);
    let token_count = tokens.len();

    for (index, token) in tokens.into_iter().enumerate() {
        match token {
            Token::Open => {
                let parent = tree.parent(current).ok_or_else(|| ViewerError::Movetext {
                    index,
                    message: "variation before any move".to_string(),
                })?;
                stack.push(current);
                current = parent;
            }
            Token::Close => {
                current = stack.pop().ok_or_else(|| ViewerError::Movetext {
                    index,
                    message: "unbalanced ')'".to_string(),
                })?;
            }
            Token::Word(word) => {
                let Some(san) = move_text(word) else {
                    continue;
                };
                current = tree
                    .add_san(current, san)
                    .map_err(|e| ViewerError::Movetext {
                        index,
                        message: e.to_string(),
                    })?;
            }
        }
    }

    if !stack.is_empty() {
        return Err(ViewerError::Movetext {
            index: token_count,
            message: "unclosed variation".to_string(),
        });
    }

    Ok(tree)
}

/// Splits movetext into parentheses and words, dropping comments.
fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        match c {
            '(' => {
                tokens.push(Token::Open);
                rest = &rest[1..];
            }
            ')' => {
                tokens.push(Token::Close);
                rest = &rest[1..];
            }
            '{' => {
                rest = rest.find('}').map_or("", |end| &rest[end + 1..]);
            }
            ';' => {
                rest = rest.find('\n').map_or("", |end| &rest[end + 1..]);
            }
            c if c.is_whitespace() => {
                rest = &rest[c.len_utf8()..];
            }
            _ => {
                let end = rest
                    .find(|ch: char| ch.is_whitespace() || "(){;".contains(ch))
                    .unwrap_or(rest.len());
                tokens.push(Token::Word(&rest[..end]));
                rest = &rest[end..];
            }
        }
    }

    tokens
}

/// Strips move numbers and annotations from a word, returning the SAN if any.
fn move_text(word: &str) -> Option<&str> {
    if word.starts_with('$') || matches!(word, "1-0" | "0-1" | "1/2-1/2" | "*") {
        return None;
    }
    let word = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let word = word.trim_start_matches('.');
    let word = word.trim_end_matches(['!', '?']);
    (!word.is_empty()).then_some(word)
}
