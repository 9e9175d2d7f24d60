// ABOUTME: Detects where one GMP response ends in a byte stream.
// ABOUTME: Counts element depth across tags; does not build a document tree.

/// Accumulates bytes until one complete top-level element has arrived.
///
/// Scanning is incremental: a tag split across two reads is picked up again
/// once the rest of it arrives.
#[derive(Debug, Default)]
pub struct ResponseFramer {
    buf: Vec<u8>,
    pos: usize,
    depth: usize,
    started: bool,
    complete_at: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Open,
    Close,
    SelfClosing,
    Other,
}

impl ResponseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes. Returns true once the response is complete.
    pub fn push(&mut self, data: &[u8]) -> bool {
        if self.complete_at.is_none() {
            self.buf.extend_from_slice(data);
            self.scan();
        }
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.complete_at.is_some()
    }

    /// True if nothing but whitespace has been received.
    pub fn is_empty(&self) -> bool {
        self.buf.iter().all(u8::is_ascii_whitespace)
    }

    /// The response text, up to and including the closing tag of the root.
    pub fn finish(self) -> String {
        let end = self.complete_at.unwrap_or(self.buf.len());
        String::from_utf8_lossy(&self.buf[..end]).trim().to_string()
    }

    fn scan(&mut self) {
        while self.complete_at.is_none() {
            let Some(offset) = self.buf[self.pos..].iter().position(|&b| b == b'<') else {
                self.pos = self.buf.len();
                return;
            };
            let start = self.pos + offset;
            let Some((len, kind)) = tag_extent(&self.buf[start..]) else {
                // Incomplete tag; wait for more data.
                self.pos = start;
                return;
            };

            match kind {
                TagKind::Open => {
                    self.depth += 1;
                    self.started = true;
                }
                TagKind::Close => self.depth = self.depth.saturating_sub(1),
                TagKind::SelfClosing => self.started = true,
                TagKind::Other => {}
            }

            self.pos = start + len;
            if self.started && self.depth == 0 {
                self.complete_at = Some(self.pos);
            }
        }
    }
}

/// Length and kind of the markup starting at `bytes[0] == b'<'`, or `None`
/// if the markup is not complete yet.
fn tag_extent(bytes: &[u8]) -> Option<(usize, TagKind)> {
    const COMMENT: &[u8] = b"<!--";
    const CDATA: &[u8] = b"<![CDATA[";

    if bytes.len() < CDATA.len() && (CDATA.starts_with(bytes) || COMMENT.starts_with(bytes)) {
        return None;
    }
    if bytes.starts_with(COMMENT) {
        return find(bytes, b"-->", COMMENT.len()).map(|i| (i + 3, TagKind::Other));
    }
    if bytes.starts_with(CDATA) {
        return find(bytes, b"]]>", CDATA.len()).map(|i| (i + 3, TagKind::Other));
    }
    if bytes.starts_with(b"<?") {
        return find(bytes, b"?>", 2).map(|i| (i + 2, TagKind::Other));
    }
    if bytes.starts_with(b"<!") {
        return find(bytes, b">", 2).map(|i| (i + 1, TagKind::Other));
    }
    if bytes.starts_with(b"</") {
        return find(bytes, b">", 2).map(|i| (i + 1, TagKind::Close));
    }

    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate().skip(1) {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => {
                let kind = if bytes[i - 1] == b'/' {
                    TagKind::SelfClosing
                } else {
                    TagKind::Open
                };
                return Some((i + 1, kind));
            }
            None => {}
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if haystack.len() < from + needle.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const RESPONSES: &[&str] = &[
        r#"<authenticate_response status="200" status_text="OK"><role>Admin</role></authenticate_response>"#,
        r#"<get_version_response status="200" status_text="OK"><version>9.0</version></get_version_response>"#,
        r#"<help_response status="200" status_text="OK"/>"#,
        r#"<get_tasks_response status="200" status_text="OK"><task id="a>b"><name><![CDATA[</task>]]></name><!-- <task> --></task></get_tasks_response>"#,
    ];

    #[test]
    fn self_closing_root_is_complete() {
        let mut framer = ResponseFramer::new();
        assert!(framer.push(br#"<help_response status="200"/>"#));
        assert_eq!(framer.finish(), r#"<help_response status="200"/>"#);
    }

    #[test]
    fn nested_response_waits_for_root_close() {
        let mut framer = ResponseFramer::new();
        assert!(!framer.push(b"<a><b>text</b>"));
        assert!(framer.push(b"</a>"));
        assert_eq!(framer.finish(), "<a><b>text</b></a>");
    }

    #[test]
    fn trailing_bytes_are_dropped() {
        let mut framer = ResponseFramer::new();
        assert!(framer.push(b"<a/>\n<b/>"));
        assert_eq!(framer.finish(), "<a/>");
    }

    #[test]
    fn quoted_angle_brackets_do_not_end_tags() {
        let mut framer = ResponseFramer::new();
        assert!(!framer.push(br#"<a x="1>2" y='/'>"#));
        assert!(framer.push(b"</a>"));
    }

    #[test]
    fn whitespace_only_is_empty() {
        let mut framer = ResponseFramer::new();
        framer.push(b" \n");
        assert!(framer.is_empty());
        assert!(!framer.is_complete());
    }

    proptest! {
        #[test]
        fn split_reads_complete_only_at_the_end(index in 0..RESPONSES.len(), split in 0usize..200) {
            let response = RESPONSES[index].as_bytes();
            let split = split.min(response.len() - 1);
            let mut framer = ResponseFramer::new();

            prop_assert!(!framer.push(&response[..split]));
            prop_assert!(framer.push(&response[split..]));
            prop_assert_eq!(framer.finish(), RESPONSES[index]);
        }
    }
}
