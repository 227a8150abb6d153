//! Decoding of raw process output whose encoding is not known in advance.
//!
//! netsh writes its output in the console code page, which depends upon the
//! Windows display language. [`Decoder`] tries a fixed chain of encodings and
//! keeps the first one that decodes the whole buffer without error.
use encoding_rs::{Encoding, GBK, UTF_8};
use std::fmt;
use tracing::{info, warn};

/// Legacy encodings tried after UTF-8 and the locale encoding.
pub const DEFAULT_FALLBACKS: &[&str] = &["gbk", "cp936"];

/// Result of [`Decoder::decode`].
#[derive(Debug, PartialEq, Eq)]
pub struct Decoded {
    /// Decoded text, or a placeholder embedding the raw bytes.
    pub text: String,
    /// Encoding that succeeded, `None` when every attempt failed.
    pub encoding: Option<&'static Encoding>,
}

/// Ordered, de-duplicated chain of encodings.
#[derive(Clone, PartialEq, Eq)]
pub struct Decoder {
    chain: Vec<&'static Encoding>,
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.chain.iter().map(|e| e.name()))
            .finish()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::system(DEFAULT_FALLBACKS)
    }
}

impl Decoder {
    /// Build a decoder trying `encodings` in order. Duplicates are dropped.
    pub fn new(encodings: impl IntoIterator<Item = &'static Encoding>) -> Self {
        let mut chain: Vec<&'static Encoding> = Vec::new();
        for enc in encodings {
            if !chain.contains(&enc) {
                chain.push(enc);
            }
        }
        Self { chain }
    }

    /// UTF-8, then the locale encoding, then the `fallbacks` labels.
    ///
    /// Unknown labels are skipped.
    pub fn system<S: AsRef<str>>(fallbacks: &[S]) -> Self {
        let mut chain = vec![UTF_8];
        chain.extend(locale_encoding());
        for label in fallbacks {
            match encoding_for_label(label.as_ref()) {
                Some(enc) => chain.push(enc),
                None => warn!("Ignoring unknown encoding label {:?}", label.as_ref()),
            }
        }
        Self::new(chain)
    }

    /// Encodings tried by this decoder, in order.
    pub fn encodings(&self) -> &[&'static Encoding] {
        &self.chain
    }

    /// Decode `bytes` read from `stream` ("stdout" or "stderr").
    ///
    /// Never fails: when no encoding fits, the text is a placeholder holding
    /// the escaped raw bytes.
    pub fn decode(&self, stream: &str, bytes: &[u8]) -> Decoded {
        for enc in &self.chain {
            if let Some(text) = enc.decode_without_bom_handling_and_without_replacement(bytes) {
                if *enc != UTF_8 && !bytes.is_empty() {
                    info!("Decoded {} using '{}'", stream, enc.name());
                }
                return Decoded {
                    text: text.into_owned(),
                    encoding: Some(*enc),
                };
            }
        }
        warn!("Unable to decode {} with any of {:?}", stream, self);
        Decoded {
            text: format!("[undecodable {}: b\"{}\"]", stream, bytes.escape_ascii()),
            encoding: None,
        }
    }
}

/// Resolve a WHATWG label (`gbk`, `utf-8`, ...) or a Windows code page
/// name (`cp936`, `cp1252`, ...).
pub fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    let label = label.trim();
    Encoding::for_label(label.as_bytes()).or_else(|| {
        let lower = label.to_ascii_lowercase();
        lower
            .strip_prefix("cp")
            .and_then(|cp| cp.parse::<u16>().ok())
            .and_then(codepage::to_encoding)
    })
}

/// Encoding of the active ANSI code page.
#[cfg(target_os = "windows")]
pub fn locale_encoding() -> Option<&'static Encoding> {
    // SAFETY: GetACP has no preconditions.
    let acp = unsafe { windows::Win32::Globalization::GetACP() };
    u16::try_from(acp).ok().and_then(codepage::to_encoding)
}

/// Encoding named by the charset suffix of the POSIX locale variables.
#[cfg(not(target_os = "windows"))]
pub fn locale_encoding() -> Option<&'static Encoding> {
    ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
        .and_then(|value| charset_from_locale(&value))
}

#[cfg_attr(target_os = "windows", allow(dead_code))]
fn charset_from_locale(locale: &str) -> Option<&'static Encoding> {
    let charset = locale.split_once('.')?.1;
    let charset = charset.split('@').next().unwrap_or(charset);
    Encoding::for_label(charset.as_bytes())
}

#[cfg(test)]
mod should {
    use super::*;
    use encoding_rs::{SHIFT_JIS, WINDOWS_1252};
    use test_log::test;

    #[test]
    fn prefer_utf8() {
        let decoder = Decoder::new([UTF_8, GBK]);
        let res = decoder.decode("stdout", "Wi-Fi 已启用".as_bytes());
        assert_eq!(res.text, "Wi-Fi 已启用");
        assert_eq!(res.encoding, Some(UTF_8));
    }

    #[test]
    fn fall_back_to_legacy_encoding() {
        let (bytes, _, had_errors) = GBK.encode("已启用        已连接         专用             以太网");
        assert!(!had_errors);
        assert!(std::str::from_utf8(&bytes).is_err());

        let decoder = Decoder::new([UTF_8, GBK]);
        let res = decoder.decode("stdout", &bytes);
        let (direct, _, _) = GBK.decode(&bytes);
        assert_eq!(res.text, direct);
        assert_eq!(res.encoding, Some(GBK));
    }

    #[test]
    fn return_placeholder_when_nothing_fits() {
        let decoder = Decoder::new([UTF_8]);
        let res = decoder.decode("stderr", &[b'o', b'k', 0xff]);
        assert_eq!(res.text, "[undecodable stderr: b\"ok\\xff\"]");
        assert_eq!(res.encoding, None);
    }

    #[test]
    fn deduplicate_aliases() {
        let decoder = Decoder::new(
            ["utf-8", "gbk", "cp936", "utf8"]
                .iter()
                .filter_map(|l| encoding_for_label(l)),
        );
        assert_eq!(decoder.encodings(), &[UTF_8, GBK]);
    }

    #[test]
    fn skip_unknown_fallback_labels() {
        let decoder = Decoder::system(&["not-an-encoding", "shift_jis"]);
        assert_eq!(decoder.encodings()[0], UTF_8);
        assert!(decoder.encodings().contains(&SHIFT_JIS));
    }

    #[test]
    fn resolve_code_page_names() {
        assert_eq!(encoding_for_label("cp936"), Some(GBK));
        assert_eq!(encoding_for_label("CP1252"), Some(WINDOWS_1252));
        assert_eq!(encoding_for_label(" GBK "), Some(GBK));
        assert_eq!(encoding_for_label("cpfoo"), None);
    }

    #[test]
    fn read_charset_from_locale() {
        assert_eq!(charset_from_locale("en_US.UTF-8"), Some(UTF_8));
        assert_eq!(charset_from_locale("zh_CN.GBK"), Some(GBK));
        assert_eq!(charset_from_locale("de_DE.ISO-8859-1@euro"), Some(WINDOWS_1252));
        assert_eq!(charset_from_locale("C"), None);
    }
}
