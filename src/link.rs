//! Redirect-wrapper decoding for result links.
//!
//! Results pages fetched without JavaScript wrap each destination in a
//! relative redirect of the form `/url?q=<encoded destination>&sa=U&ved=...`.
//! [`normalize_link`] recovers the destination; any other href passes
//! through untouched.

/// Prefix of a wrapped result link.
const WRAPPER_PREFIX: &str = "/url?q=";

/// Start of the tracking parameters that follow the wrapped destination.
const TRACKING_DELIMITER: &str = "&sa=";

/// Recover the destination URL from a result href.
///
/// If `raw` starts with `/url?q=`, the segment up to the first `&sa=` (or
/// the end of the string when there is none) is percent-decoded and
/// returned. Byte sequences that do not decode to valid UTF-8 are replaced
/// lossily. Every other href is returned unchanged.
///
/// # Examples
///
/// ```
/// use serp_harvest::link::normalize_link;
///
/// let link = normalize_link("/url?q=https%3A%2F%2Fexample.com%2Fpage&sa=U&ved=2ah");
/// assert_eq!(link, "https://example.com/page");
/// assert_eq!(normalize_link("https://example.com/direct"), "https://example.com/direct");
/// ```
pub fn normalize_link(raw: &str) -> String {
    let Some(wrapped) = raw.strip_prefix(WRAPPER_PREFIX) else {
        return raw.to_string();
    };

    let encoded = wrapped
        .split_once(TRACKING_DELIMITER)
        .map_or(wrapped, |(destination, _)| destination);

    match urlencoding::decode(encoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(encoded.as_bytes()))
            .into_owned(),
    }
}
