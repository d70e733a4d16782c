//! Route template compilation and matching.
//!
//! A template is literal text with `{name}` placeholders, e.g. `/users/{id}` or
//! `/files/{stem}.{ext}`. Literal text is compared byte for byte and has no special
//! meaning. A placeholder captures one or more characters up to the next `/`, so it never
//! spans segments. A match must consume the whole path.
//!
//! Matching is greedy with backtracking: `/files/{stem}.{ext}` against
//! `/files/a.tar.gz` captures `stem = "a.tar"` and `ext = "gz"`. Failed split points are
//! remembered per match, so adjacent placeholders stay polynomial in the path length.

use crate::error::RouteError;
use crate::request::PathParams;
use crate::utils::ensure;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    /// index into the placeholder names
    Param(usize),
}

/// A compiled route template
#[derive(Debug, Clone)]
pub struct PathMatcher {
    template: String,
    tokens: Vec<Token>,
    names: Vec<String>,
}

impl PathMatcher {
    /// Compiles `template`, failing on a malformed placeholder.
    ///
    /// # Errors
    ///
    /// - [`RouteError::UnterminatedPlaceholder`] when a `{` has no closing `}`
    /// - [`RouteError::EmptyPlaceholder`] for `{}`
    /// - [`RouteError::InvalidPlaceholder`] when a name contains `{` or `/`
    pub fn compile(template: impl Into<String>) -> Result<Self, RouteError> {
        let template = template.into();
        let mut tokens = Vec::new();
        let mut names = Vec::new();
        let mut literal = String::new();

        let mut chars = template.char_indices();
        while let Some((position, c)) = chars.next() {
            if c != '{' {
                literal.push(c);
                continue;
            }

            let mut name = String::new();
            let mut closed = false;
            for (inner_position, inner) in chars.by_ref() {
                match inner {
                    '}' => {
                        closed = true;
                        break;
                    }
                    '{' | '/' => {
                        return Err(RouteError::invalid_placeholder(
                            &template,
                            inner_position,
                            format!("'{inner}' is not allowed in a placeholder name"),
                        ));
                    }
                    other => name.push(other),
                }
            }

            ensure!(closed, RouteError::unterminated_placeholder(&template, position));
            ensure!(!name.is_empty(), RouteError::empty_placeholder(&template, position));

            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            tokens.push(Token::Param(names.len()));
            names.push(name);
        }

        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Ok(Self { template, tokens, names })
    }

    /// Returns the template this matcher was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the placeholder names, first to last, repeats included
    pub fn param_names(&self) -> &[String] {
        &self.names
    }

    /// Matches `path` against the template.
    ///
    /// Returns the captured values keyed by placeholder name, in placeholder order.
    /// When a name is repeated the last capture wins.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut captures = Vec::with_capacity(self.names.len());
        let mut dead_ends = DeadEnds::new(self.names.len(), self.tokens.len(), path.len());
        if !match_tokens(&self.tokens, path, &mut captures, &mut dead_ends) {
            return None;
        }

        let mut params = PathParams::with_capacity(captures.len());
        for (index, value) in captures {
            params.insert(self.names[index].clone(), value.to_owned());
        }
        Some(params)
    }
}

/// Remembers `(tokens left, path left)` states that cannot match, so adjacent placeholders
/// do not retry the same split points over and over
struct DeadEnds {
    path_len: usize,
    states: Vec<bool>,
}

impl DeadEnds {
    fn new(param_count: usize, token_count: usize, path_len: usize) -> Self {
        // a single placeholder never revisits a state
        let states = if param_count > 1 { vec![false; (token_count + 1) * (path_len + 1)] } else { Vec::new() };
        Self { path_len, states }
    }

    fn index(&self, tokens_left: usize, path_left: usize) -> usize {
        tokens_left * (self.path_len + 1) + path_left
    }

    fn contains(&self, tokens_left: usize, path_left: usize) -> bool {
        self.states.get(self.index(tokens_left, path_left)).copied().unwrap_or(false)
    }

    fn insert(&mut self, tokens_left: usize, path_left: usize) {
        let index = self.index(tokens_left, path_left);
        if let Some(state) = self.states.get_mut(index) {
            *state = true;
        }
    }
}

fn match_tokens<'p>(
    tokens: &[Token],
    path: &'p str,
    captures: &mut Vec<(usize, &'p str)>,
    dead_ends: &mut DeadEnds,
) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return path.is_empty();
    };

    match token {
        Token::Literal(literal) => path
            .strip_prefix(literal.as_str())
            .is_some_and(|remaining| match_tokens(rest, remaining, captures, dead_ends)),
        Token::Param(index) => {
            if dead_ends.contains(tokens.len(), path.len()) {
                return false;
            }

            let segment_end = path.find('/').unwrap_or(path.len());
            // longest capture first, then give characters back to the tokens that follow
            for end in (1..=segment_end).rev().filter(|end| path.is_char_boundary(*end)) {
                captures.push((*index, &path[..end]));
                if match_tokens(rest, &path[end..], captures, dead_ends) {
                    return true;
                }
                captures.pop();
            }

            dead_ends.insert(tokens.len(), path.len());
            false
        }
    }
}
