//! HTML minification.
//!
//! Collapses inter-tag whitespace and strips comments while leaving the
//! content of `<pre>`, `<textarea>`, `<script>` and `<style>` elements and
//! downlevel conditional comments (`<!--[if ...]>`) verbatim. The pass is
//! idempotent, so replaying a memoized response through the pipeline cannot
//! change it further.

use bytes::Bytes;
use tracing::trace;

use crate::payload::Payload;

const VERBATIM_TAGS: [&str; 4] = ["pre", "textarea", "script", "style"];

/// Minifies the payload body in place, when the payload is transformable.
///
/// Bodies that are not valid UTF-8 pass through untouched.
pub fn minify_payload(payload: Payload) -> Payload {
    if !payload.is_transformable() {
        return payload;
    }
    match std::str::from_utf8(payload.body()) {
        Ok(html) => {
            let minified = minify_html(html);
            trace!(before = html.len(), after = minified.len(), "minified html body");
            payload.with_body(Bytes::from(minified))
        }
        Err(_) => payload,
    }
}

/// Minifies an HTML document.
pub fn minify_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_space = false;
    let mut rest = input;

    while !rest.is_empty() {
        if rest.starts_with("<!--") {
            let end = rest.find("-->").map(|p| p + 3).unwrap_or(rest.len());
            if rest.starts_with("<!--[if") {
                // Conditional comments target old IE and must survive as-is.
                flush_space(&mut out, &mut pending_space);
                out.push_str(&rest[..end]);
            }
            rest = &rest[end..];
            continue;
        }
        if let Some(len) = verbatim_block_len(rest) {
            flush_space(&mut out, &mut pending_space);
            out.push_str(&rest[..len]);
            rest = &rest[len..];
            continue;
        }
        let c = match rest.chars().next() {
            Some(c) => c,
            None => break,
        };
        if c.is_ascii_whitespace() {
            pending_space = !out.is_empty();
        } else {
            flush_space(&mut out, &mut pending_space);
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn flush_space(out: &mut String, pending: &mut bool) {
    if *pending {
        out.push(' ');
        *pending = false;
    }
}

/// Length of a leading verbatim element (`<pre>`..`</pre>` etc.), if any.
fn verbatim_block_len(rest: &str) -> Option<usize> {
    if !rest.starts_with('<') {
        return None;
    }
    // Compare raw bytes; slicing the str here could land inside a multi-byte
    // character when arbitrary text follows the '<'.
    let bytes = rest.as_bytes();
    let tag = VERBATIM_TAGS.iter().find(|tag| {
        let name_end = 1 + tag.len();
        bytes
            .get(1..name_end)
            .is_some_and(|name| name.eq_ignore_ascii_case(tag.as_bytes()))
            && matches!(
                bytes.get(name_end),
                Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r')
            )
    })?;
    let closing = format!("</{tag}");
    let mut search = 0;
    loop {
        let found = rest[search..]
            .to_ascii_lowercase()
            .find(&closing)
            .map(|p| search + p)?;
        // Closing tag ends at the next '>'.
        match rest[found..].find('>') {
            Some(end) => return Some(found + end + 1),
            None => search = found + closing.len(),
        }
    }
}
