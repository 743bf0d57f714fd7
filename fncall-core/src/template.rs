// Copyright 2025 Fncall Contributors (https://github.com/fncall-rs/fncall)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Prompt template rendering
//!
//! Templates use `{placeholder}` slots filled from a caller-provided argument
//! mapping. `{{` and `}}` are literal braces. Every placeholder must have a
//! binding; rendering fails with a typed error otherwise, never with partial
//! output.

use crate::error::TemplateError;
use serde_json::{Map, Value};

enum Token {
    Text(String),
    Placeholder(String),
}

/// Substitute `{placeholder}` slots in `template` from `args`.
///
/// Every placeholder is checked against `args` before any substitution
/// happens. String arguments substitute verbatim; other JSON values
/// substitute as compact JSON. Arguments without a matching placeholder are
/// ignored.
pub fn render(template: &str, args: &Map<String, Value>) -> Result<String, TemplateError> {
    let tokens = tokenize(template)?;
    for token in &tokens {
        if let Token::Placeholder(name) = token {
            if !args.contains_key(name) {
                return Err(TemplateError::MissingKey(name.clone()));
            }
        }
    }

    let mut out = String::with_capacity(template.len() + 16);
    for token in tokens {
        match token {
            Token::Text(text) => out.push_str(&text),
            Token::Placeholder(name) => match args.get(&name) {
                Some(Value::String(s)) => out.push_str(s),
                Some(other) => out.push_str(&other.to_string()),
                None => return Err(TemplateError::MissingKey(name)),
            },
        }
    }
    Ok(out)
}

/// Placeholder names referenced by `template`, in order of first appearance.
///
/// Applies the same brace-syntax check as [`render`], so a template that
/// passes here can only fail rendering on a missing argument.
pub fn placeholders(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names = Vec::new();
    for token in tokenize(template)? {
        if let Token::Placeholder(name) = token {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

fn tokenize(template: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut text = String::new();
    let mut chars = template.char_indices().peekable();

    while let Some((pos, ch)) = chars.next() {
        match ch {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    text.push('{');
                    continue;
                }
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(TemplateError::Unclosed(pos));
                }
                if !text.is_empty() {
                    tokens.push(Token::Text(std::mem::take(&mut text)));
                }
                tokens.push(Token::Placeholder(name));
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    text.push('}');
                } else {
                    return Err(TemplateError::Unclosed(pos));
                }
            }
            _ => text.push(ch),
        }
    }

    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    Ok(tokens)
}
