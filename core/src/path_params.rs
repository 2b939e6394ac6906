//! Named and positional path parameters for a `{placeholder}` URL template.
//!
//! # Design
//! Named values are keyed by placeholder name. Positional (unnamed) values
//! are bound once, when the request method is invoked: each value takes the
//! next distinct placeholder that has no value yet, in template order, and
//! keeps that placeholder for as long as it lives. Values left over after
//! every placeholder is taken stay unbound and are reported as redundant at
//! render time.
//!
//! Because bindings are sticky, removing an unnamed value never shifts its
//! neighbours onto other placeholders, and assigning a named value removes
//! exactly the unnamed value bound to that name.

use indexmap::IndexMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
struct UnnamedParam {
    placeholder: Option<String>,
    value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    template: String,
    named: IndexMap<String, String>,
    unnamed: Vec<UnnamedParam>,
}

impl PathParams {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Self::default()
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Replace the template. Unnamed values are re-bound, in supply order,
    /// against the placeholders of the new template.
    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = template.into();
        let values: Vec<String> = self.unnamed.drain(..).map(|p| p.value).collect();
        self.bind_unnamed(values);
    }

    /// Every distinct placeholder name, in first-occurrence order.
    pub fn placeholders(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for segment in segments(&self.template) {
            if let Segment::Placeholder(name) = segment {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// Placeholders with neither a named nor a bound unnamed value.
    pub fn undefined_placeholders(&self) -> Vec<String> {
        self.placeholders()
            .into_iter()
            .filter(|name| self.value_of(name).is_none())
            .collect()
    }

    pub fn named(&self) -> &IndexMap<String, String> {
        &self.named
    }

    /// Unnamed values in the order they were supplied.
    pub fn unnamed_values(&self) -> Vec<&str> {
        self.unnamed.iter().map(|p| p.value.as_str()).collect()
    }

    /// Named values plus every bound unnamed value keyed by its placeholder.
    pub fn path_params(&self) -> IndexMap<String, String> {
        let mut params = self.named.clone();
        for param in &self.unnamed {
            if let Some(name) = &param.placeholder {
                params
                    .entry(name.clone())
                    .or_insert_with(|| param.value.clone());
            }
        }
        params
    }

    /// Bind positional values to the placeholders that are still undefined.
    pub fn bind_unnamed<I, T>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut free = self.undefined_placeholders().into_iter();
        for value in values {
            self.unnamed.push(UnnamedParam {
                placeholder: free.next(),
                value: value.into(),
            });
        }
    }

    /// Assign `name`. An unnamed value bound to `name` is dropped, so the
    /// named value wins for every occurrence of the placeholder.
    pub fn set_named(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.unnamed
            .retain(|p| p.placeholder.as_deref() != Some(name.as_str()));
        self.named.insert(name, value.into());
    }

    /// Remove the first unnamed value equal to `value`, if any.
    pub fn remove_unnamed_by_value(&mut self, value: &str) {
        if let Some(i) = self.unnamed.iter().position(|p| p.value == value) {
            self.unnamed.remove(i);
        }
    }

    /// Remove the unnamed value bound to placeholder `name`, if any.
    pub fn remove_unnamed(&mut self, name: &str) {
        if let Some(i) = self
            .unnamed
            .iter()
            .position(|p| p.placeholder.as_deref() == Some(name))
        {
            self.unnamed.remove(i);
        }
    }

    pub fn remove_named(&mut self, name: &str) {
        self.named.shift_remove(name);
    }

    /// Remove both the named and the unnamed value for `name`.
    pub fn remove(&mut self, name: &str) {
        self.remove_named(name);
        self.remove_unnamed(name);
    }

    /// Substitute every placeholder occurrence.
    ///
    /// Fails when values are left over (unbound unnamed values first, then
    /// named values for names the template does not use) or when a
    /// placeholder has no value. `encode` percent-encodes each value.
    pub fn render(&self, encode: bool) -> Result<String> {
        let placeholders = self.placeholders();

        let redundant: Vec<String> = self
            .unnamed
            .iter()
            .filter(|p| p.placeholder.is_none())
            .map(|p| p.value.clone())
            .chain(
                self.named
                    .iter()
                    .filter(|(name, _)| !placeholders.contains(*name))
                    .map(|(name, value)| format!("{name}={value}")),
            )
            .collect();
        if !redundant.is_empty() {
            return Err(Error::RedundantPathParams(redundant));
        }

        let undefined = self.undefined_placeholders();
        if !undefined.is_empty() {
            return Err(Error::UndefinedPathParams {
                expected: placeholders.len(),
                actual: placeholders.len() - undefined.len(),
                undefined,
            });
        }

        let mut rendered = String::with_capacity(self.template.len());
        for segment in segments(&self.template) {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Placeholder(name) => {
                    let value = self.value_of(name).unwrap_or_default();
                    if encode {
                        rendered.push_str(&urlencoding::encode(value));
                    } else {
                        rendered.push_str(value);
                    }
                }
            }
        }
        Ok(rendered)
    }

    fn value_of(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str).or_else(|| {
            self.unnamed
                .iter()
                .find(|p| p.placeholder.as_deref() == Some(name))
                .map(|p| p.value.as_str())
        })
    }
}

fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let Some(len) = rest[open + 1..].find('}') else {
            break;
        };
        let name = &rest[open + 1..open + 1 + len];
        if name.is_empty() || name.contains('{') {
            out.push(Segment::Literal(&rest[..=open]));
            rest = &rest[open + 1..];
            continue;
        }
        if open > 0 {
            out.push(Segment::Literal(&rest[..open]));
        }
        out.push(Segment::Placeholder(name));
        rest = &rest[open + len + 2..];
    }
    if !rest.is_empty() {
        out.push(Segment::Literal(rest));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(template: &str, unnamed: &[&str]) -> PathParams {
        let mut params = PathParams::new(template);
        params.bind_unnamed(unnamed.iter().copied());
        params
    }

    #[test]
    fn segments_split_literals_and_placeholders() {
        assert_eq!(
            segments("/a/{x}/b{y}"),
            vec![
                Segment::Literal("/a/"),
                Segment::Placeholder("x"),
                Segment::Literal("/b"),
                Segment::Placeholder("y"),
            ]
        );
    }

    #[test]
    fn unbalanced_and_empty_braces_are_literal() {
        assert_eq!(segments("/{}/x"), vec![Segment::Literal("/{"), Segment::Literal("}/x")]);
        assert_eq!(segments("/{open"), vec![Segment::Literal("/{open")]);
        assert_eq!(
            segments("{{a}"),
            vec![Segment::Literal("{"), Segment::Placeholder("a")]
        );
    }

    #[test]
    fn all_placeholders_undefined_initially() {
        let p = params("/{firstName}/{lastName}", &[]);
        assert!(p.named().is_empty());
        assert_eq!(p.undefined_placeholders(), vec!["firstName", "lastName"]);
    }

    #[test]
    fn named_param_defines_its_placeholder() {
        let mut p = params("/{firstName}/{lastName}", &[]);
        p.set_named("lastName", "Doe");
        assert_eq!(p.named().len(), 1);
        assert_eq!(p.undefined_placeholders(), vec!["firstName"]);
    }

    #[test]
    fn unnamed_params_fill_placeholders_left_to_right() {
        let p = params("/{firstName}/{lastName}", &["John"]);
        assert!(p.named().is_empty());
        assert_eq!(p.undefined_placeholders(), vec!["lastName"]);
    }

    #[test]
    fn unnamed_params_skip_already_named_placeholders() {
        let mut p = PathParams::new("/{firstName}/{lastName}");
        p.set_named("lastName", "Doe");
        p.bind_unnamed(["John2"]);
        assert!(p.undefined_placeholders().is_empty());
        assert_eq!(p.placeholders(), vec!["firstName", "lastName"]);
        assert_eq!(p.render(true).unwrap(), "/John2/Doe");
    }

    #[test]
    fn named_param_replaces_bound_unnamed_param() {
        let mut p = params("/{firstName}/{lastName}", &["John", "Doe2"]);
        p.set_named("lastName", "Doe");
        assert_eq!(p.unnamed_values(), vec!["John"]);
        assert_eq!(p.render(true).unwrap(), "/John/Doe");
    }

    #[test]
    fn named_param_overrides_previous_named_value() {
        let mut p = PathParams::new("/{firstName}/{lastName}");
        p.set_named("lastName", "Doe");
        p.bind_unnamed(["John2"]);
        p.set_named("firstName", "John");
        assert!(p.unnamed_values().is_empty());
        assert_eq!(p.render(true).unwrap(), "/John/Doe");
    }

    #[test]
    fn repeated_placeholder_renders_one_value_everywhere() {
        let mut p = params("/{name}/{name}", &["John2"]);
        p.set_named("name", "John");
        assert!(p.undefined_placeholders().is_empty());
        assert_eq!(p.placeholders(), vec!["name"]);
        assert_eq!(p.render(true).unwrap(), "/John/John");
    }

    #[test]
    fn single_named_value_fills_repeated_placeholder() {
        let mut p = PathParams::new("/{name}/{name}");
        p.set_named("name", "John");
        assert_eq!(p.render(true).unwrap(), "/John/John");
    }

    #[test]
    fn path_params_merge_named_and_bound_unnamed() {
        let mut p = PathParams::new("/{firstName}/{lastName}");
        p.set_named("firstName", "John");
        p.bind_unnamed(["John2"]);
        let merged = p.path_params();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("firstName").map(String::as_str), Some("John"));
        assert_eq!(merged.get("lastName").map(String::as_str), Some("John2"));

        p.set_named("lastName", "Something");
        assert_eq!(p.render(true).unwrap(), "/John/Something");
    }

    #[test]
    fn remove_unnamed_by_value_removes_first_match_only() {
        let mut p = params("/{firstName}/{lastName}", &["John", "Doe", "Real Name"]);
        p.remove_unnamed_by_value("Real Name");
        assert_eq!(p.unnamed_values(), vec!["John", "Doe"]);
        assert_eq!(p.render(true).unwrap(), "/John/Doe");

        let mut p = params("/{a}/{b}/{c}", &["x", "y", "x"]);
        p.remove_unnamed_by_value("x");
        assert_eq!(p.unnamed_values(), vec!["y", "x"]);
    }

    #[test]
    fn remove_unnamed_by_value_ignores_missing_value() {
        let mut p = params("/{firstName}", &["John"]);
        p.remove_unnamed_by_value("Nobody");
        assert_eq!(p.unnamed_values(), vec!["John"]);
    }

    #[test]
    fn remove_unnamed_by_name_keeps_other_bindings() {
        let mut p = params("/{firstName}/{lastName}", &["John", "Doe"]);
        p.remove_unnamed("firstName");
        assert_eq!(p.unnamed_values(), vec!["Doe"]);
        p.set_named("firstName", "John2");
        assert_eq!(p.unnamed_values(), vec!["Doe"]);
        assert_eq!(p.render(true).unwrap(), "/John2/Doe");
    }

    #[test]
    fn removing_bound_params_leaves_surplus_redundant() {
        let mut p = PathParams::new("/{firstName}/{lastName}");
        p.set_named("firstName", "John2");
        p.bind_unnamed(["John", "John3", "Doe"]);
        assert_eq!(p.unnamed_values(), vec!["John", "John3", "Doe"]);

        p.remove("firstName");
        p.remove("lastName");
        assert_eq!(p.unnamed_values(), vec!["John3", "Doe"]);
        assert!(p.named().is_empty());

        let err = p.render(true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Path parameters were not correctly defined. Redundant path parameters are: John3, Doe."
        );
    }

    #[test]
    fn too_many_unnamed_values_are_redundant() {
        let p = params("/{a}", &["1", "2", "3"]);
        match p.render(true).unwrap_err() {
            Error::RedundantPathParams(values) => assert_eq!(values, vec!["2", "3"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn named_values_for_unknown_placeholders_are_redundant() {
        let mut p = params("/{a}", &["1", "2"]);
        p.set_named("b", "x");
        match p.render(true).unwrap_err() {
            Error::RedundantPathParams(values) => assert_eq!(values, vec!["2", "b=x"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undefined_placeholders_fail_render() {
        let p = params("/{firstName}/{lastName}", &[]);
        match p.render(true).unwrap_err() {
            Error::UndefinedPathParams {
                expected,
                actual,
                undefined,
            } => {
                assert_eq!((expected, actual), (2, 0));
                assert_eq!(undefined, vec!["firstName", "lastName"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn values_are_percent_encoded_when_enabled() {
        let p = params("/users/{name}", &["Real Name/x"]);
        assert_eq!(p.render(true).unwrap(), "/users/Real%20Name%2Fx");
        assert_eq!(p.render(false).unwrap(), "/users/Real Name/x");
    }

    #[test]
    fn changing_template_rebinds_unnamed_values() {
        let mut p = params("/{a}/{b}", &["1", "2"]);
        p.set_template("/{c}/{d}");
        assert_eq!(p.undefined_placeholders(), Vec::<String>::new());
        assert_eq!(p.render(true).unwrap(), "/1/2");
    }

    #[test]
    fn binding_all_placeholders_leaves_no_braces() {
        for (template, values) in [
            ("/{a}", vec!["1"]),
            ("/{a}/{b}/{a}", vec!["1", "2"]),
            ("/x{a}y{b}z", vec!["1", "2"]),
        ] {
            let p = params(template, &values);
            assert!(p.undefined_placeholders().is_empty(), "{template}");
            let rendered = p.render(true).unwrap();
            assert!(!rendered.contains('{') && !rendered.contains('}'), "{rendered}");
        }
    }
}
