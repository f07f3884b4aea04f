//! XML documents as JSON values.
//!
//! Used by `getXMLPageSourceAsJSON`. The mapping is the one common .NET and
//! JavaScript converters use:
//!
//! - the document is an object with the root element's name as its only key
//!   (preceded by `?xml` when the document has a declaration);
//! - attributes become `@name` keys;
//! - an element with only text becomes a string, an empty one `null`;
//! - text next to attributes or child elements is stored under `#text`;
//! - repeated sibling elements become an array.
//!
//! Comments, processing instructions and the DOCTYPE are dropped.

use serde_json::{Map, Value};

/// Deepest element nesting accepted.
///
/// Converted values are serialized and dropped recursively, so depth stays
/// bounded even though parsing itself is iterative.
pub const MAX_DEPTH: usize = 256;

/// Converts an XML document to JSON.
///
/// Returns a description of the first syntax error on malformed input.
pub fn to_json(xml: &str) -> Result<Value, String> {
    let mut parser = Parser { src: xml, pos: 0 };
    let mut doc = Map::new();

    parser.skip_whitespace();
    if parser.rest().starts_with("<?xml") {
        parser.pos += "<?".len();
        parser.name()?;
        let (_, attributes) = parser.tag_body("?>")?;
        let mut decl = Map::new();
        for (name, value) in attributes {
            decl.insert(format!("@{}", name), Value::String(value));
        }
        doc.insert("?xml".to_string(), Value::Object(decl));
    }

    parser.skip_misc()?;
    if !parser.rest().starts_with('<') {
        return Err(parser.error("expected root element"));
    }
    let (name, value) = parser.element()?;
    doc.insert(name, value);

    parser.skip_misc()?;
    if !parser.rest().is_empty() {
        return Err(parser.error("content after root element"));
    }
    Ok(Value::Object(doc))
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, what: &str) -> String {
        format!("{} at offset {}", what, self.pos)
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn skip_past(&mut self, terminator: &str) -> Result<(), String> {
        match self.rest().find(terminator) {
            Some(idx) => {
                self.pos += idx + terminator.len();
                Ok(())
            }
            None => Err(self.error(&format!("unterminated markup, expected '{}'", terminator))),
        }
    }

    /// Skips whitespace, comments, processing instructions and DOCTYPE.
    fn skip_misc(&mut self) -> Result<(), String> {
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with("<!DOCTYPE") || rest.starts_with("<!doctype") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_doctype(&mut self) -> Result<(), String> {
        let mut depth = 0usize;
        for (idx, c) in self.rest().char_indices() {
            match c {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '>' if depth == 0 => {
                    self.pos += idx + 1;
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(self.error("unterminated DOCTYPE"))
    }

    fn name(&mut self) -> Result<&'a str, String> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '>' | '/' | '=' | '?'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error("expected name"));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    /// Parses attributes up to `close` (`>`, `/>` or `?>`).
    ///
    /// Returns whether the tag was self-closing, and the attributes.
    fn tag_body(&mut self, close: &str) -> Result<(bool, Vec<(String, String)>), String> {
        let mut attributes = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.starts_with(close) {
                self.pos += close.len();
                return Ok((close != ">", attributes));
            }
            if close == ">" && rest.starts_with("/>") {
                self.pos += 2;
                return Ok((true, attributes));
            }
            if rest.is_empty() {
                return Err(self.error("unterminated tag"));
            }
            let name = self.name()?.to_string();
            self.skip_whitespace();
            if !self.rest().starts_with('=') {
                return Err(self.error(&format!("expected '=' after attribute '{}'", name)));
            }
            self.pos += 1;
            self.skip_whitespace();
            let quote = match self.rest().chars().next() {
                Some(q @ ('"' | '\'')) => q,
                _ => return Err(self.error("expected quoted attribute value")),
            };
            self.pos += 1;
            let rest = self.rest();
            let end = rest
                .find(quote)
                .ok_or_else(|| self.error("unterminated attribute value"))?;
            let value = decode_entities(&rest[..end]).map_err(|e| self.error(&e))?;
            self.pos += end + 1;
            attributes.push((name, value));
        }
    }

    /// Parses a start tag at `<` up to and including its `>` or `/>`.
    ///
    /// Returns the opened element and whether the tag was self-closing.
    fn start_tag(&mut self) -> Result<(OpenElement, bool), String> {
        self.pos += 1;
        let name = self.name()?.to_string();
        let (self_closing, attributes) = self.tag_body(">")?;

        let mut object = Map::new();
        for (attr, value) in attributes {
            object.insert(format!("@{}", attr), Value::String(value));
        }
        let element = OpenElement {
            name,
            has_attributes: !object.is_empty(),
            object,
            text: String::new(),
            has_children: false,
        };
        Ok((element, self_closing))
    }

    /// Parses one element starting at `<`. Returns its name and JSON value.
    ///
    /// Open ancestors live on an explicit stack, so document depth never
    /// grows the call stack.
    fn element(&mut self) -> Result<(String, Value), String> {
        let (root, self_closing) = self.start_tag()?;
        if self_closing {
            return Ok(root.finish());
        }
        let mut stack = vec![root];

        while let Some(open) = stack.last_mut() {
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(&format!("element '{}' is not closed", open.name)));
            }
            if let Some(after) = rest.strip_prefix("</") {
                let end = after
                    .find('>')
                    .ok_or_else(|| self.error("unterminated end tag"))?;
                let closing = after[..end].trim();
                if closing != open.name {
                    return Err(self.error(&format!(
                        "mismatched end tag: expected '{}', found '{}'",
                        open.name, closing
                    )));
                }
                self.pos += 2 + end + 1;
                let Some(closed) = stack.pop() else { break };
                let (name, value) = closed.finish();
                match stack.last_mut() {
                    Some(parent) => parent.add_child(name, value),
                    None => return Ok((name, value)),
                }
            } else if rest.starts_with("<!--") {
                self.skip_past("-->")?;
            } else if let Some(after) = rest.strip_prefix("<![CDATA[") {
                let end = after
                    .find("]]>")
                    .ok_or_else(|| self.error("unterminated CDATA section"))?;
                open.text.push_str(&after[..end]);
                self.pos += "<![CDATA[".len() + end + "]]>".len();
            } else if rest.starts_with("<?") {
                self.skip_past("?>")?;
            } else if rest.starts_with('<') {
                let (child, self_closing) = self.start_tag()?;
                if self_closing {
                    let (name, value) = child.finish();
                    open.add_child(name, value);
                } else if stack.len() >= MAX_DEPTH {
                    return Err(self.error(&format!(
                        "elements nested deeper than {} levels",
                        MAX_DEPTH
                    )));
                } else {
                    stack.push(child);
                }
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                let chunk = decode_entities(&rest[..end]).map_err(|e| self.error(&e))?;
                open.text.push_str(&chunk);
                self.pos += end;
            }
        }
        Err(self.error("expected root element"))
    }
}

/// An element whose end tag has not been reached yet.
struct OpenElement {
    name: String,
    object: Map<String, Value>,
    has_attributes: bool,
    text: String,
    has_children: bool,
}

impl OpenElement {
    fn add_child(&mut self, name: String, value: Value) {
        self.has_children = true;
        insert_child(&mut self.object, name, value);
    }

    fn finish(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if !self.has_attributes && !self.has_children {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut object = self.object;
            if !text.is_empty() {
                object.insert("#text".to_string(), Value::String(text.to_string()));
            }
            Value::Object(object)
        };
        (self.name, value)
    }
}

fn insert_child(object: &mut Map<String, Value>, name: String, value: Value) {
    match object.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            object.insert(name, value);
        }
    }
}

fn decode_entities(raw: &str) -> Result<String, String> {
    if !raw.contains('&') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find(';')
            .ok_or_else(|| format!("unterminated entity in '{}'", raw))?;
        let entity = &after[..end];
        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let hex = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X"));
                let code = if let Some(hex) = hex {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| format!("unknown entity '&{};'", entity))?
            }
        };
        out.push(decoded);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
