//! Editable view of an MSBuild-style project descriptor.
//!
//! The document keeps the original text and an index of its elements. Edits
//! splice the text directly so everything outside the removed elements
//! (formatting, comments, attribute order) survives byte for byte.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::{reference_name_from_path, Error, ProjectReference, Result, SourceLocation};

static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_][\w.:-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});

const PROJECT_REFERENCE: &str = "ProjectReference";
const ITEM_GROUP: &str = "ItemGroup";
const PROJECT_NAME: &str = "ProjectName";
const INCLUDE: &str = "Include";
const OUTPUT_ITEM_TYPE: &str = "OutputItemType";
const REFERENCE_OUTPUT_ASSEMBLY: &str = "ReferenceOutputAssembly";

/// One element of the document with byte offsets into the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Offset of the opening `<`
    pub start: usize,
    /// Offset just past the start tag
    pub open_end: usize,
    /// Offset of the closing tag (equals `end` for self-closing elements)
    pub close_start: usize,
    /// Offset just past the element
    pub end: usize,
    pub parent: Option<usize>,
}

impl Element {
    /// Attribute value by name, ignoring case.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn content_range(&self) -> Range<usize> {
        self.open_end..self.close_start
    }
}

#[derive(Debug, Clone)]
pub struct DescriptorDocument {
    path: PathBuf,
    text: String,
    elements: Vec<Element>,
    modified: bool,
}

impl DescriptorDocument {
    /// Read and index a descriptor file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::project_load(path, e.to_string()))?;
        Self::parse(path, text)
    }

    /// Index descriptor text; malformed markup fails with [`Error::ProjectLoad`].
    pub fn parse(path: &Path, text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let elements = scan(&text).map_err(|message| Error::project_load(path, message))?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
            elements,
            modified: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    fn has_child_elements(&self, index: usize) -> bool {
        self.elements.iter().any(|e| e.parent == Some(index))
    }

    /// Unescaped, trimmed text between an element's tags.
    pub fn inner_text(&self, element: &Element) -> String {
        unescape(self.text[element.content_range()].trim())
    }

    /// Metadata given either as an attribute or as a child element.
    fn metadata(&self, index: usize, name: &str) -> Option<String> {
        let element = &self.elements[index];
        if let Some(value) = element.attribute(name) {
            return Some(unescape(value));
        }
        self.elements
            .iter()
            .find(|child| child.parent == Some(index) && child.is_named(name))
            .map(|child| self.inner_text(child))
    }

    /// 1-based line and column of a byte offset.
    pub fn location_of(&self, offset: usize) -> (usize, usize) {
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |p| p + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }

    /// Value of the first non-empty `<ProjectName>` property.
    pub fn project_name(&self) -> Option<String> {
        self.elements
            .iter()
            .filter(|e| e.is_named(PROJECT_NAME))
            .map(|e| self.inner_text(e))
            .find(|name| !name.is_empty())
    }

    pub fn project_references(&self) -> Vec<ProjectReference> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_named(PROJECT_REFERENCE))
            .filter_map(|(index, element)| {
                let include = element.attribute(INCLUDE).map(unescape)?;
                if include.trim().is_empty() {
                    return None;
                }

                let (line, column) = self.location_of(element.start);
                let mut reference = ProjectReference::new(include.trim()).with_location(SourceLocation {
                    file: self.path.clone(),
                    line,
                    column,
                });
                if let Some(item_type) = self.metadata(index, OUTPUT_ITEM_TYPE).filter(|v| !v.is_empty()) {
                    reference = reference.with_output_item_type(item_type);
                }
                let produces_output = self
                    .metadata(index, REFERENCE_OUTPUT_ASSEMBLY)
                    .map_or(true, |value| !value.trim().eq_ignore_ascii_case("false"));
                Some(reference.with_runtime_output(produces_output))
            })
            .collect()
    }

    /// Index of the first reference whose target name equals `name`, ignoring case.
    pub fn find_reference(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|e| {
            e.is_named(PROJECT_REFERENCE)
                && e.attribute(INCLUDE)
                    .is_some_and(|include| reference_name_from_path(&unescape(include)).eq_ignore_ascii_case(name))
        })
    }

    /// Remove exactly one reference to `name`. Returns whether one was found.
    pub fn remove_reference(&mut self, name: &str) -> Result<bool> {
        match self.find_reference(name) {
            Some(index) => {
                self.remove_element(index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove every item group left without child elements.
    pub fn prune_empty_groups(&mut self) -> Result<usize> {
        let mut removed = 0;
        while let Some(index) = self
            .elements
            .iter()
            .enumerate()
            .position(|(i, e)| e.is_named(ITEM_GROUP) && !self.has_child_elements(i))
        {
            self.remove_element(index)?;
            removed += 1;
        }
        Ok(removed)
    }

    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, &self.text).map_err(|e| Error::io_at(e, &self.path))
    }

    fn remove_element(&mut self, index: usize) -> Result<()> {
        let element = &self.elements[index];
        let range = removal_range(&self.text, element.start, element.end);
        self.text.replace_range(range, "");
        self.elements = scan(&self.text).map_err(|message| Error::project_load(&self.path, message))?;
        self.modified = true;
        Ok(())
    }
}

/// Widen a removal to the whole line when the element is alone on it.
fn removal_range(text: &str, start: usize, end: usize) -> Range<usize> {
    let line_start = text[..start].rfind('\n').map_or(0, |p| p + 1);
    let line_end = text[end..].find('\n').map_or(text.len(), |p| end + p);

    let alone = text[line_start..start].trim().is_empty() && text[end..line_end].trim().is_empty();
    if !alone {
        return start..end;
    }
    if line_end < text.len() {
        line_start..line_end + 1
    } else if line_start > 0 {
        line_start - 1..line_end
    } else {
        line_start..line_end
    }
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

fn skip_past(text: &str, from: usize, terminator: &str, what: &str) -> std::result::Result<usize, String> {
    text[from..]
        .find(terminator)
        .map(|p| from + p + terminator.len())
        .ok_or_else(|| format!("unterminated {} starting at line {}", what, line_of(text, from)))
}

/// Offset of the `>` closing the tag opened at `lt`, ignoring quoted `>`.
fn tag_end(text: &str, lt: usize) -> std::result::Result<usize, String> {
    let mut quote: Option<char> = None;
    for (offset, ch) in text[lt + 1..].char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '>') => return Ok(lt + 1 + offset),
            (None, '<') => break,
            (None, _) => {}
        }
    }
    Err(format!("unterminated tag at line {}", line_of(text, lt)))
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == ':'
}

/// Index every element, failing on unbalanced or unterminated markup.
fn scan(text: &str) -> std::result::Result<Vec<Element>, String> {
    let mut elements: Vec<Element> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut cursor = 0;

    while let Some(found) = text[cursor..].find('<') {
        let lt = cursor + found;
        let rest = &text[lt..];

        if rest.starts_with("<!--") {
            cursor = skip_past(text, lt + 4, "-->", "comment")?;
            continue;
        }
        if rest.starts_with("<![CDATA[") {
            cursor = skip_past(text, lt + 9, "]]>", "CDATA section")?;
            continue;
        }
        if rest.starts_with("<?") {
            cursor = skip_past(text, lt + 2, "?>", "processing instruction")?;
            continue;
        }
        if rest.starts_with("<!") {
            cursor = skip_past(text, lt + 2, ">", "declaration")?;
            continue;
        }

        let gt = tag_end(text, lt)?;

        if let Some(closing) = rest.strip_prefix("</") {
            let name = closing[..gt - lt - 2].trim();
            let Some(index) = open.pop() else {
                return Err(format!("unexpected closing tag </{}> at line {}", name, line_of(text, lt)));
            };
            if elements[index].name != name {
                return Err(format!(
                    "closing tag </{}> at line {} does not match <{}>",
                    name,
                    line_of(text, lt),
                    elements[index].name
                ));
            }
            elements[index].close_start = lt;
            elements[index].end = gt + 1;
            cursor = gt + 1;
            continue;
        }

        let raw = text[lt + 1..gt].trim_end();
        let (body, self_closing) = match raw.strip_suffix('/') {
            Some(body) => (body, true),
            None => (raw, false),
        };
        let name_len = body
            .find(|c: char| c.is_whitespace())
            .unwrap_or(body.len());
        let name = &body[..name_len];
        if !name.chars().next().is_some_and(is_name_start) {
            return Err(format!("invalid tag '<{}' at line {}", name, line_of(text, lt)));
        }

        let attributes = ATTRIBUTE
            .captures_iter(&body[name_len..])
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str().to_string();
                let value = caps.get(2).or_else(|| caps.get(3))?.as_str().to_string();
                Some((key, value))
            })
            .collect();

        let index = elements.len();
        elements.push(Element {
            name: name.to_string(),
            attributes,
            start: lt,
            open_end: gt + 1,
            close_start: gt + 1,
            end: gt + 1,
            parent: open.last().copied(),
        });
        if !self_closing {
            open.push(index);
        }
        cursor = gt + 1;
    }

    if let Some(&index) = open.last() {
        return Err(format!(
            "element <{}> opened at line {} is never closed",
            elements[index].name,
            line_of(text, elements[index].start)
        ));
    }
    if elements.is_empty() {
        return Err("document has no root element".to_string());
    }
    Ok(elements)
}
