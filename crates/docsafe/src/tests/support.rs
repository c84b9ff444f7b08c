//! Builds small `.docx` containers for tests.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DAMAGE_MARKER: &[u8] = b"DOCSAFE-INTEGRITY-MARKER";

/// Fluent builder for a minimal WordprocessingML package.
#[derive(Debug, Clone)]
pub(crate) struct DocxFixture {
    body: Vec<String>,
    styles: Vec<(String, String)>,
    raw_parts: Vec<(String, Vec<u8>)>,
    omitted: Vec<String>,
    damaged: bool,
}

impl DocxFixture {
    /// Stored part whose bytes [`DocxFixture::damaged_part`] corrupts.
    pub(crate) const DAMAGED_PART: &'static str = "customXml/item1.xml";

    /// A package defining `Normal` and `Heading1` to `Heading3`.
    pub(crate) fn new() -> Self {
        let mut styles = vec![("Normal".to_owned(), "Normal".to_owned())];
        styles.extend((1..=3).map(|level| (format!("Heading{level}"), format!("heading {level}"))));
        Self {
            body: Vec::new(),
            styles,
            raw_parts: Vec::new(),
            omitted: Vec::new(),
            damaged: false,
        }
    }

    /// Replaces the style table.
    pub(crate) fn styles(mut self, styles: &[(&str, &str)]) -> Self {
        self.styles = styles
            .iter()
            .map(|(id, name)| ((*id).to_owned(), (*name).to_owned()))
            .collect();
        self
    }

    pub(crate) fn paragraph(self, text: &str) -> Self {
        self.push(format!("<w:p>{}</w:p>", run(text)))
    }

    pub(crate) fn styled(self, style_id: &str, text: &str) -> Self {
        self.push(format!(
            r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr>{}</w:p>"#,
            escape(style_id),
            run(text)
        ))
    }

    pub(crate) fn heading(self, level: u8, text: &str) -> Self {
        self.styled(&format!("Heading{level}"), text)
    }

    pub(crate) fn run_styled(self, run_style: &str, text: &str) -> Self {
        self.push(format!(
            r#"<w:p><w:r><w:rPr><w:rStyle w:val="{}"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape(run_style),
            escape(text)
        ))
    }

    pub(crate) fn table(self, table_style: &str, cell_text: &str) -> Self {
        self.push(format!(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="{}"/></w:tblPr><w:tr><w:tc><w:p>{}</w:p></w:tc></w:tr></w:tbl>"#,
            escape(table_style),
            run(cell_text)
        ))
    }

    /// A paragraph of `count` distinct words.
    pub(crate) fn words(self, count: usize) -> Self {
        let text = (1..=count)
            .map(|index| format!("word{index}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.paragraph(&text)
    }

    pub(crate) fn without_part(mut self, name: &str) -> Self {
        self.omitted.push(name.to_owned());
        self
    }

    /// Adds a part, or replaces a generated one with the same name.
    pub(crate) fn raw_part(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.raw_parts.push((name.to_owned(), bytes));
        self
    }

    /// Adds a stored part whose data no longer matches its checksum.
    ///
    /// The central directory stays intact, so only a full read of
    /// [`DocxFixture::DAMAGED_PART`] notices.
    pub(crate) fn damaged_part(mut self) -> Self {
        self.damaged = true;
        self
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        let generated = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes().to_vec()),
            ("word/document.xml", self.document_xml().into_bytes()),
            ("word/styles.xml", self.styles_xml().into_bytes()),
        ];
        for (name, bytes) in generated {
            if self.omitted.iter().any(|omitted| omitted == name) {
                continue;
            }
            let replacement = self
                .raw_parts
                .iter()
                .find(|(raw, _)| raw == name)
                .map(|(_, raw_bytes)| raw_bytes.clone());
            writer
                .start_file(name, options(CompressionMethod::Deflated))
                .expect("start part");
            writer
                .write_all(&replacement.unwrap_or(bytes))
                .expect("write part");
        }
        for (name, bytes) in &self.raw_parts {
            if is_generated(name) {
                continue;
            }
            writer
                .start_file(name.as_str(), options(CompressionMethod::Deflated))
                .expect("start part");
            writer.write_all(bytes).expect("write part");
        }
        if self.damaged {
            writer
                .start_file(Self::DAMAGED_PART, options(CompressionMethod::Stored))
                .expect("start damaged part");
            writer.write_all(b"<marker>").expect("write");
            writer.write_all(DAMAGE_MARKER).expect("write");
            writer.write_all(b"</marker>").expect("write");
        }

        let mut bytes = writer.finish().expect("finish zip").into_inner();
        if self.damaged {
            let offset = bytes
                .windows(DAMAGE_MARKER.len())
                .position(|window| window == DAMAGE_MARKER)
                .expect("marker present in stored data");
            if let Some(byte) = bytes.get_mut(offset) {
                *byte ^= 0x20;
            }
        }
        bytes
    }

    /// Writes the package to `path` and returns the path.
    pub(crate) fn write_to(&self, path: &Path) -> PathBuf {
        fs::write(path, self.to_bytes()).expect("write fixture");
        path.to_path_buf()
    }

    fn push(mut self, xml: String) -> Self {
        self.body.push(xml);
        self
    }

    fn document_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            self.body.concat()
        )
    }

    fn styles_xml(&self) -> String {
        let styles: String = self
            .styles
            .iter()
            .map(|(id, name)| {
                format!(
                    r#"<w:style w:type="paragraph" w:styleId="{}"><w:name w:val="{}"/></w:style>"#,
                    escape(id),
                    escape(name)
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{W_NS}">{styles}</w:styles>"#
        )
    }
}

/// Reads a whole file.
pub(crate) fn read_bytes(path: &Path) -> Vec<u8> {
    fs::read(path).expect("read file")
}

fn options(method: CompressionMethod) -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(method)
}

fn is_generated(name: &str) -> bool {
    matches!(
        name,
        "[Content_Types].xml" | "_rels/.rels" | "word/document.xml" | "word/styles.xml"
    )
}

fn run(text: &str) -> String {
    format!(
        r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape(text)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
