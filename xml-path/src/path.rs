//! Path expression parsing.
//!
//! A path is a `.`-separated list of steps. Element steps may be quoted with
//! `'` so that a prefixed name such as `'x:item'` is read as one token, and
//! may end with a zero-based `[n]` index. `text()` and `@attr` are terminal.

use crate::error::XmlPathError;

/// How an element step matches element names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NameTest {
    /// `*`
    Wildcard,
    /// `name`: the local name in any namespace.
    Any(String),
    /// `:name`: the local name with no namespace.
    Unqualified(String),
    /// `p:name`: the local name in the namespace declared for `p`.
    Prefixed { prefix: String, local: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Element { name: NameTest, index: Option<usize> },
    Text,
    Attribute(String),
}

pub(crate) fn parse(path: &str) -> Result<Vec<Step>, XmlPathError> {
    split_segments(path)?
        .into_iter()
        .map(|segment| parse_segment(path, segment))
        .collect()
}

fn split_segments(path: &str) -> Result<Vec<&str>, XmlPathError> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut depth = 0usize;

    for (i, c) in path.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '[' if !quoted => depth += 1,
            ']' if !quoted => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| XmlPathError::invalid_path(path, "unbalanced ']'"))?;
            }
            '.' if !quoted && depth == 0 => {
                segments.push(path[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return Err(XmlPathError::invalid_path(path, "unterminated quote"));
    }
    if depth > 0 {
        return Err(XmlPathError::invalid_path(path, "unbalanced '['"));
    }
    segments.push(path[start..].trim());

    if segments.iter().any(|s| s.is_empty()) {
        return Err(XmlPathError::invalid_path(path, "empty path segment"));
    }
    Ok(segments)
}

fn parse_segment(path: &str, segment: &str) -> Result<Step, XmlPathError> {
    if segment == "text()" {
        return Ok(Step::Text);
    }
    if let Some(attribute) = segment.strip_prefix('@') {
        let attribute = unquote(attribute);
        if attribute.is_empty() {
            return Err(XmlPathError::invalid_path(path, "empty attribute name"));
        }
        return Ok(Step::Attribute(attribute.to_string()));
    }

    let (name, index) = match segment.strip_suffix(']') {
        Some(head) => {
            let open = head
                .rfind('[')
                .ok_or_else(|| XmlPathError::invalid_path(path, "unbalanced ']'"))?;
            let index = head[open + 1..].trim().parse::<usize>().map_err(|_| {
                XmlPathError::invalid_path(path, format!("invalid index in '{segment}'"))
            })?;
            (&head[..open], Some(index))
        }
        None => (segment, None),
    };

    let name = unquote(name.trim());
    if name.is_empty() {
        return Err(XmlPathError::invalid_path(path, "empty element name"));
    }
    Ok(Step::Element {
        name: name_test(name),
        index,
    })
}

fn unquote(token: &str) -> &str {
    token
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .unwrap_or(token)
}

fn name_test(name: &str) -> NameTest {
    if name == "*" {
        return NameTest::Wildcard;
    }
    if let Some(local) = name.strip_prefix(':') {
        return NameTest::Unqualified(local.to_string());
    }
    match name.split_once(':') {
        Some((prefix, local)) => NameTest::Prefixed {
            prefix: prefix.to_string(),
            local: local.to_string(),
        },
        None => NameTest::Any(name.to_string()),
    }
}
