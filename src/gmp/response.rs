// ABOUTME: A raw GMP response plus the attributes of its root element.
// ABOUTME: Only the root start tag is inspected; the body is kept as text.

use std::collections::BTreeMap;
use std::fmt;

/// One response from gvmd.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    name: String,
    attributes: BTreeMap<String, String>,
    xml: String,
}

impl Response {
    /// Wrap raw response text. Returns `None` if there is no root element.
    pub fn parse(xml: impl Into<String>) -> Option<Self> {
        let xml = xml.into();
        let (name, attributes) = parse_root(&xml)?;
        Some(Self {
            name,
            attributes,
            xml,
        })
    }

    /// Root element name, e.g. `get_tasks_response`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.attribute("status")
    }

    pub fn status_text(&self) -> Option<&str> {
        self.attribute("status_text")
    }

    /// True for `2xx` statuses.
    pub fn is_ok(&self) -> bool {
        self.status().is_some_and(|s| s.starts_with('2'))
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.xml)
    }
}

fn parse_root(xml: &str) -> Option<(String, BTreeMap<String, String>)> {
    let mut rest = xml.trim_start();
    // Skip a prolog or comments ahead of the root.
    while rest.starts_with("<?") || rest.starts_with("<!") {
        let end = rest.find('>')?;
        rest = rest[end + 1..].trim_start();
    }
    let body = rest.strip_prefix('<')?;

    let name_end = body
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(body.len());
    let name = &body[..name_end];
    if name.is_empty() {
        return None;
    }

    let mut attributes = BTreeMap::new();
    let mut cursor = body[name_end..].trim_start();
    while let Some(eq) = cursor.find('=') {
        if cursor.starts_with('>') || cursor.starts_with('/') {
            break;
        }
        let key = cursor[..eq].trim();
        let after = cursor[eq + 1..].trim_start();
        let quote = after.chars().next()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let close = after[1..].find(quote)? + 1;
        attributes.insert(key.to_string(), unescape(&after[1..close]));
        cursor = after[close + 1..].trim_start();
    }

    Some((name.to_string(), attributes))
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Escape text for use in an attribute value or element body.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
