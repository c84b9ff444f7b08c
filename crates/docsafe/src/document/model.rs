//! Parsed snapshot of a document body and its style table.

use std::collections::BTreeSet;

use quick_xml::events::BytesStart;

use super::xml::{Node, attribute, walk};

/// Highest heading level recognised.
pub const MAX_HEADING_LEVEL: u8 = 9;

/// A paragraph in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    style_id: Option<String>,
    text: String,
    run_styles: Vec<String>,
}

impl Paragraph {
    /// Creates an unstyled paragraph.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Sets the paragraph style id.
    #[must_use]
    pub fn with_style(mut self, style_id: impl Into<String>) -> Self {
        self.style_id = Some(style_id.into());
        self
    }

    /// Adds a character style referenced by one of the paragraph's runs.
    #[must_use]
    pub fn with_run_style(mut self, style_id: impl Into<String>) -> Self {
        self.run_styles.push(style_id.into());
        self
    }

    /// Paragraph style id, if one is set.
    #[must_use]
    pub fn style_id(&self) -> Option<&str> {
        self.style_id.as_deref()
    }

    /// Visible text with tabs and breaks rendered as whitespace.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Character style ids referenced by runs.
    #[must_use]
    pub fn run_styles(&self) -> &[String] {
        &self.run_styles
    }

    /// Returns true when the paragraph has non-whitespace text.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// A style defined in `word/styles.xml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDefinition {
    id: String,
    name: Option<String>,
    kind: Option<String>,
}

impl StyleDefinition {
    /// Creates a definition with no display name.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            kind: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the style type (`paragraph`, `character`, `table`, `numbering`).
    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Style id referenced from the body.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name, if the definition has one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Style type attribute.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Display name, falling back to the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A heading paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    index: usize,
    level: u8,
    text: String,
}

impl Heading {
    /// Paragraph index of the heading.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Outline level, 1 to [`MAX_HEADING_LEVEL`].
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Heading text, trimmed.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Read-only view of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
    table_styles: Vec<String>,
    styles: Option<Vec<StyleDefinition>>,
    has_body: bool,
}

impl Document {
    /// Creates a document with a body holding `paragraphs` and no style part.
    #[must_use]
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self {
            paragraphs,
            has_body: true,
            ..Self::default()
        }
    }

    /// Attaches a style table.
    #[must_use]
    pub fn with_styles(mut self, styles: Vec<StyleDefinition>) -> Self {
        self.styles = Some(styles);
        self
    }

    /// Adds a table style reference.
    #[must_use]
    pub fn with_table_style(mut self, style_id: impl Into<String>) -> Self {
        self.table_styles.push(style_id.into());
        self
    }

    /// Parses a `word/document.xml` body.
    pub(crate) fn parse_body(xml: &[u8]) -> Result<Self, String> {
        let mut builder = BodyBuilder::default();
        walk(xml, |node| builder.visit(node))?;
        Ok(Self {
            paragraphs: builder.paragraphs,
            table_styles: builder.table_styles,
            styles: None,
            has_body: builder.has_body,
        })
    }

    /// Parses a `word/styles.xml` style table.
    pub(crate) fn parse_styles(xml: &[u8]) -> Result<Vec<StyleDefinition>, String> {
        let mut builder = StylesBuilder::default();
        walk(xml, |node| builder.visit(node))?;
        Ok(builder.styles)
    }

    /// Paragraphs in document order, including those nested in tables and
    /// text boxes.
    #[must_use]
    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    /// Style table, or `None` when the document has no styles part.
    #[must_use]
    pub fn styles(&self) -> Option<&[StyleDefinition]> {
        self.styles.as_deref()
    }

    /// Table style ids referenced by tables.
    #[must_use]
    pub fn table_styles(&self) -> &[String] {
        &self.table_styles
    }

    /// Whether the body element was present.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.has_body
    }

    /// Looks up a style definition by id.
    #[must_use]
    pub fn style(&self, id: &str) -> Option<&StyleDefinition> {
        self.styles()?.iter().find(|style| style.id() == id)
    }

    /// Outline level of `paragraph`, if its style is a heading style.
    ///
    /// A style counts as a heading when its id is `HeadingN` or its display
    /// name is `heading N`, case-insensitively, for N in 1 to 9.
    #[must_use]
    pub fn heading_level(&self, paragraph: &Paragraph) -> Option<u8> {
        let id = paragraph.style_id()?;
        heading_number(id).or_else(|| {
            self.style(id)
                .and_then(StyleDefinition::name)
                .and_then(heading_number)
        })
    }

    /// Headings in document order.
    #[must_use]
    pub fn headings(&self) -> Vec<Heading> {
        self.paragraphs
            .iter()
            .enumerate()
            .filter_map(|(index, paragraph)| {
                self.heading_level(paragraph).map(|level| Heading {
                    index,
                    level,
                    text: paragraph.text().trim().to_owned(),
                })
            })
            .collect()
    }

    /// Every style id referenced by paragraphs, runs and tables.
    #[must_use]
    pub fn referenced_styles(&self) -> BTreeSet<&str> {
        let paragraph_styles = self.paragraphs.iter().filter_map(Paragraph::style_id);
        let run_styles = self
            .paragraphs
            .iter()
            .flat_map(|paragraph| paragraph.run_styles().iter().map(String::as_str));
        let table_styles = self.table_styles.iter().map(String::as_str);
        paragraph_styles
            .chain(run_styles)
            .chain(table_styles)
            .collect()
    }

    /// Visible text with one line per paragraph.
    #[must_use]
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whitespace-separated words across all paragraphs.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.paragraphs
            .iter()
            .map(|paragraph| paragraph.text().split_whitespace().count())
            .sum()
    }

    /// Characters of visible text, excluding paragraph separators.
    #[must_use]
    pub fn character_count(&self) -> usize {
        self.paragraphs
            .iter()
            .map(|paragraph| paragraph.text().chars().count())
            .sum()
    }
}

fn heading_number(label: &str) -> Option<u8> {
    let lowered = label.to_ascii_lowercase();
    let level: u8 = lowered.strip_prefix("heading")?.trim_start().parse().ok()?;
    (1..=MAX_HEADING_LEVEL).contains(&level).then_some(level)
}

#[derive(Default)]
struct BodyBuilder {
    paragraphs: Vec<Paragraph>,
    open: Vec<usize>,
    table_styles: Vec<String>,
    runs: usize,
    in_text: bool,
    has_body: bool,
}

impl BodyBuilder {
    fn visit(&mut self, node: Node<'_>) -> Result<(), String> {
        match node {
            Node::Start(element) => self.open_element(element, false)?,
            Node::Empty(element) => self.open_element(element, true)?,
            Node::End(name) => self.close_element(name),
            Node::Text(text) if self.in_text => self.push_text(text),
            Node::Text(_) => {}
        }
        Ok(())
    }

    fn open_element(&mut self, element: &BytesStart<'_>, empty: bool) -> Result<(), String> {
        match element.local_name().as_ref() {
            b"body" => self.has_body = true,
            b"p" => {
                self.paragraphs.push(Paragraph::default());
                if !empty {
                    self.open.push(self.paragraphs.len() - 1);
                }
            }
            b"r" if !empty => self.runs += 1,
            b"t" if !empty => self.in_text = true,
            b"tab" if self.runs > 0 => self.push_text("\t"),
            b"br" | b"cr" if self.runs > 0 => self.push_text("\n"),
            b"pStyle" => {
                let style = attribute(element, b"val")?;
                if let Some(paragraph) = self.current()
                    && paragraph.style_id.is_none()
                {
                    paragraph.style_id = style;
                }
            }
            b"rStyle" => {
                if let Some(style) = attribute(element, b"val")?
                    && let Some(paragraph) = self.current()
                {
                    paragraph.run_styles.push(style);
                }
            }
            b"tblStyle" => {
                if let Some(style) = attribute(element, b"val")? {
                    self.table_styles.push(style);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close_element(&mut self, name: &[u8]) {
        match name {
            b"p" => {
                self.open.pop();
            }
            b"r" => self.runs = self.runs.saturating_sub(1),
            b"t" => self.in_text = false,
            _ => {}
        }
    }

    fn current(&mut self) -> Option<&mut Paragraph> {
        let index = *self.open.last()?;
        self.paragraphs.get_mut(index)
    }

    fn push_text(&mut self, text: &str) {
        if let Some(paragraph) = self.current() {
            paragraph.text.push_str(text);
        }
    }
}

#[derive(Default)]
struct StylesBuilder {
    styles: Vec<StyleDefinition>,
    current: Option<StyleDefinition>,
}

impl StylesBuilder {
    fn visit(&mut self, node: Node<'_>) -> Result<(), String> {
        match node {
            Node::Start(element) if element.local_name().as_ref() == b"style" => {
                self.current = Some(read_style(element)?);
            }
            Node::Empty(element) if element.local_name().as_ref() == b"style" => {
                self.finish(read_style(element)?);
            }
            Node::Start(element) | Node::Empty(element)
                if element.local_name().as_ref() == b"name" =>
            {
                let name = attribute(element, b"val")?;
                if let Some(style) = self.current.as_mut()
                    && style.name.is_none()
                {
                    style.name = name;
                }
            }
            Node::End(b"style") => {
                if let Some(style) = self.current.take() {
                    self.finish(style);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(&mut self, style: StyleDefinition) {
        if !style.id.is_empty() {
            self.styles.push(style);
        }
    }
}

fn read_style(element: &BytesStart<'_>) -> Result<StyleDefinition, String> {
    Ok(StyleDefinition {
        id: attribute(element, b"styleId")?.unwrap_or_default(),
        name: None,
        kind: attribute(element, b"type")?,
    })
}
