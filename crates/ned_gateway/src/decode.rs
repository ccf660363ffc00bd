use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// Decode a gateway response into text: BOM first, then the Content-Type
/// charset, then chardetng detection. Decoding is lossy on purpose; the
/// scanner tolerates replacement characters far better than the pipeline
/// tolerates a hard failure.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> String {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding.decode(bytes).0.into_owned();
    }

    if let Some(label) = content_type.and_then(charset_label) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return encoding.decode(bytes).0.into_owned();
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true).decode(bytes).0.into_owned()
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        if key.eq_ignore_ascii_case("charset") {
            Some(value.trim_matches([' ', '"', '\''].as_ref()).to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_header_wins_over_detection() {
        let bytes = b"caf\xe9";
        let text = decode_page(bytes, Some("text/html; charset=ISO-8859-1"));
        assert_eq!(text, "caf\u{e9}");
    }

    #[test]
    fn bom_wins_over_charset_header() {
        let bytes = b"\xEF\xBB\xBFhello";
        let text = decode_page(bytes, Some("text/html; charset=ISO-8859-1"));
        assert_eq!(text, "hello");
    }

    #[test]
    fn plain_ascii_without_header_decodes_unchanged() {
        let text = decode_page(b"<html>ok</html>", None);
        assert_eq!(text, "<html>ok</html>");
    }
}
