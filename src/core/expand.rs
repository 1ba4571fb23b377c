//! Secret references.
//!
//! Text may refer to secrets as `$secrets.<category>.<name>` or
//! `${secrets.<category>.<name>}`. Each category maps to a handler in an
//! [`Expanders`] table built by the caller; nothing is registered globally.

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::api::Transport;
use crate::core::constants::{PROJECT_CATEGORY, USER_CATEGORY};
use crate::core::domain::SecretRequest;
use crate::core::expander::Expander;
use crate::error::{ResolveError, Result};

const PREFIX: &str = "secrets";

/// Resolves one name within a category, given the table's context.
pub type Handler<C> = fn(&mut C, &str) -> Result<Zeroizing<String>>;

/// A reference found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub category: String,
    pub name: String,
}

impl Reference {
    /// Parse `secrets.<category>.<name>`, with or without the leading `$`
    /// and braces.
    pub fn parse(text: &str) -> std::result::Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidReference(text.to_string());

        let inner = text.strip_prefix('$').unwrap_or(text);
        let inner = match inner.strip_prefix('{') {
            Some(rest) => rest.strip_suffix('}').ok_or_else(invalid)?,
            None => inner,
        };

        let mut parts = inner.splitn(3, '.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(PREFIX), Some(category), Some(name))
                if is_word(category) && !name.is_empty() && name.chars().all(is_name_char) =>
            {
                Ok(Self {
                    category: category.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Category handlers over a shared context.
pub struct Expanders<C> {
    context: C,
    handlers: Vec<(String, Handler<C>)>,
}

impl<C> Expanders<C> {
    /// An empty table over `context`.
    pub fn new(context: C) -> Self {
        Self {
            context,
            handlers: Vec::new(),
        }
    }

    /// Register `handler` for `category`, replacing any previous one.
    pub fn register(mut self, category: impl Into<String>, handler: Handler<C>) -> Self {
        let category = category.into();
        self.handlers.retain(|(c, _)| *c != category);
        self.handlers.push((category, handler));
        self
    }

    /// Registered categories, in registration order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|(c, _)| c.as_str())
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    /// Resolve one name in `category`.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::UnknownCategory` if nothing is registered for
    /// `category`, otherwise whatever the handler reports.
    pub fn expand(&mut self, category: &str, name: &str) -> Result<Zeroizing<String>> {
        let handler = self
            .handlers
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, h)| *h)
            .ok_or_else(|| ResolveError::UnknownCategory(category.to_string()))?;

        debug!(category, name, "expanding reference");
        handler(&mut self.context, name)
    }

    /// Resolve a single reference such as `$secrets.user.token`.
    pub fn expand_reference(&mut self, reference: &str) -> Result<Zeroizing<String>> {
        let reference = Reference::parse(reference)?;
        self.expand(&reference.category, &reference.name)
    }

    /// Replace every reference in `text`. Text without references is
    /// returned unchanged.
    pub fn expand_text(&mut self, text: &str) -> Result<Zeroizing<String>> {
        let mut out = Zeroizing::new(String::with_capacity(text.len()));
        let mut rest = text;

        while let Some(start) = rest.find('$') {
            out.push_str(&rest[..start]);
            let candidate = &rest[start..];

            match reference_len(candidate) {
                Some(len) => {
                    let value = self.expand_reference(&candidate[..len])?;
                    out.push_str(&value);
                    rest = &candidate[len..];
                }
                None => {
                    out.push('$');
                    rest = &candidate[1..];
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }
}

/// Length of the reference at the start of `text`, if there is one.
fn reference_len(text: &str) -> Option<usize> {
    let marker = format!("{}.", PREFIX);

    if let Some(body) = text.strip_prefix("${") {
        let end = body.find('}')?;
        return body[..end].starts_with(&marker).then_some(end + 3);
    }

    let body = text.strip_prefix('$')?;
    if !body.starts_with(&marker) {
        return None;
    }
    let len = body
        .char_indices()
        .find(|(_, c)| !is_name_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    // a trailing dot ends a sentence, not a name
    let name = body[..len].trim_end_matches('.');
    let mut parts = name.splitn(3, '.');
    parts.next();
    parts.next();
    // prose like "$secrets." or "$secrets.user." is left as text
    match parts.next() {
        Some(rest) if !rest.is_empty() => Some(name.len() + 1),
        _ => None,
    }
}

fn user_secret<T: Transport>(expander: &mut Expander<T>, name: &str) -> Result<Zeroizing<String>> {
    expander.resolve(&SecretRequest::user(name))
}

fn project_secret<T: Transport>(
    expander: &mut Expander<T>,
    name: &str,
) -> Result<Zeroizing<String>> {
    expander.resolve(&SecretRequest::project(name))
}

/// The standard table: `user` and `project` categories over `expander`.
pub fn secrets<T: Transport>(expander: Expander<T>) -> Expanders<Expander<T>> {
    Expanders::new(expander)
        .register(USER_CATEGORY, user_secret::<T>)
        .register(PROJECT_CATEGORY, project_secret::<T>)
}
