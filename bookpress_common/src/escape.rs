use aho_corasick::AhoCorasick;
use lazy_static::lazy_static;
use std::borrow::Cow;

lazy_static! {
    static ref XML_FINDER: AhoCorasick = AhoCorasick::new(&XML_TARGET_CHARS);
}

static XML_TARGET_CHARS: [&str; 5] = ["&", "<", ">", "\"", "'"];

static XML_REPLACEMENTS: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"];

/// escape `input` for xml output, in text nodes or attribute values
pub fn escape_to_xml<'a, S: Into<Cow<'a, str>>>(input: S) -> Cow<'a, str> {
    let input = input.into();
    let input_bytes = input.as_bytes();
    if XML_FINDER.is_match(input_bytes) {
        let mut wtr = Vec::with_capacity(input.len());
        XML_FINDER
            .stream_replace_all(input_bytes, &mut wtr, &XML_REPLACEMENTS)
            .expect("Aho-Corasick error");
        // replacements are ascii substitutions over valid utf8
        unsafe { Cow::Owned(String::from_utf8_unchecked(wtr)) }
    } else {
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_input_is_borrowed() {
        let escaped = escape_to_xml("nothing special");
        assert!(matches!(escaped, Cow::Borrowed(_)));
    }

    #[test]
    fn all_five_entities() {
        let escaped = escape_to_xml("a < b & \"c\" > 'd'");
        assert_eq!(escaped, "a &lt; b &amp; &quot;c&quot; &gt; &apos;d&apos;");
    }
}
