use std::fmt;

use async_graphql_parser::Pos;

use crate::sdl::SdlDocument;

use super::registry::Origin;

/// One problem found while assembling a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
    location: Option<SourceLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceLocation {
    source_name: String,
    line: usize,
    column: usize,
    source_line: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// The one-line summary of the problem.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the problem is, with the offending source line, if known.
    pub fn detail(&self) -> Option<String> {
        let location = self.location.as_ref()?;
        let mut detail = format!("{}:{}:{}", location.source_name, location.line, location.column);

        if let Some(ref source_line) = location.source_line {
            let gutter = location.line.to_string();
            let padding = " ".repeat(gutter.len());
            let caret = " ".repeat(location.column.saturating_sub(1));

            detail.push_str(&format!("\n{gutter} | {source_line}\n{padding} | {caret}^"));
        }

        Some(detail)
    }

    fn at(mut self, document: &SdlDocument, pos: Pos) -> Self {
        let source_line = document
            .text()
            .lines()
            .nth(pos.line.saturating_sub(1))
            .map(|line| line.trim_end().to_owned());

        self.location = Some(SourceLocation {
            source_name: document.name().to_owned(),
            line: pos.line,
            column: pos.column,
            source_line,
        });

        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;

        if let Some(detail) = self.detail() {
            write!(f, "\n\n{detail}")?;
        }

        Ok(())
    }
}

/// Every problem found by one failed assembly, in the order they were found. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self { errors: vec![error] }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [error] => write!(f, "{}", error.message()),
            errors => write!(f, "schema contains {} validation errors", errors.len()),
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Collects errors against the documents being assembled, so positions can be
/// turned into source excerpts.
pub(crate) struct Diagnostics<'a> {
    prelude: &'a SdlDocument,
    remote: Option<&'a SdlDocument>,
    user: &'a SdlDocument,
    errors: Vec<ValidationError>,
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(prelude: &'a SdlDocument, remote: Option<&'a SdlDocument>, user: &'a SdlDocument) -> Self {
        Self {
            prelude,
            remote,
            user,
            errors: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, message: impl Into<String>, origin: Origin, pos: Pos) {
        let error = ValidationError::new(message);

        let error = match self.document(origin) {
            Some(document) => error.at(document, pos),
            None => error,
        };

        self.errors.push(error);
    }

    pub(crate) fn push_unlocated(&mut self, message: impl Into<String>) {
        self.errors.push(ValidationError::new(message));
    }

    /// Fails with everything collected so far, if anything was.
    pub(crate) fn check(&mut self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: std::mem::take(&mut self.errors),
            })
        }
    }

    fn document(&self, origin: Origin) -> Option<&'a SdlDocument> {
        match origin {
            Origin::Prelude => Some(self.prelude),
            Origin::Remote => self.remote,
            Origin::User => Some(self.user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_points_at_the_column() {
        let document = SdlDocument::new("type Query {\n  a: Foo\n}", "schema.graphql", "");
        let error = ValidationError::new("Unknown type \"Foo\".").at(&document, Pos { line: 2, column: 6 });

        insta::assert_snapshot!(error.to_string(), @r###"
        Unknown type "Foo".

        schema.graphql:2:6
        2 |   a: Foo
          |      ^
        "###);
    }

    #[test]
    fn unlocated_error_has_no_detail() {
        let error = ValidationError::new("Query root type must be provided.");

        assert_eq!(None, error.detail());
        assert_eq!("Query root type must be provided.", error.to_string());
    }
}
