//! Conversions between ed2k links and the magnet links handed to callers.
//!
//! A borrowed hash is the 32-hex ed2k hash followed by [`HASH_PAD`], which
//! makes it the 40-hex shape BitTorrent-oriented callers expect. It is never
//! a real BitTorrent info hash.

use thiserror::Error;

/// Suffix appended to a native hash to form a borrowed hash.
pub const HASH_PAD: &str = "00000000";

/// Length of an ed2k (MD4) hash in hex characters.
pub const NATIVE_HASH_LEN: usize = 32;

/// Length of a borrowed hash in hex characters.
pub const BORROWED_HASH_LEN: usize = NATIVE_HASH_LEN + HASH_PAD.len();

const NATIVE_SCHEME: &str = "ed2k://";
const NATIVE_KIND: &str = "file";
const NATIVE_MIN_FIELDS: usize = 5;

/// Errors produced when a link cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("Malformed magnet URI: {0}")]
    MalformedUri(String),

    #[error("Hash {0} is 40 characters but does not end with the {HASH_PAD} padding")]
    InvalidPadding(String),

    #[error("Invalid ed2k link: {0}")]
    InvalidNativeLink(String),
}

/// A magnet link minted from a native hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowedLink {
    pub uri: String,
    pub borrowed_hash: String,
    pub native_hash: String,
}

/// A magnet link decoded back into the backend's terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLink {
    pub native_link: String,
    pub native_hash: String,
    pub borrowed_hash: String,
    pub name: String,
    pub size_bytes: u64,
}

/// Fields of an ed2k file link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeLink {
    pub name: String,
    pub size_bytes: u64,
    pub hash: String,
}

/// Pad a native hash into its borrowed form (lowercased).
pub fn borrowed_hash_for(native_hash: &str) -> String {
    let mut hash = native_hash.to_ascii_lowercase();
    hash.push_str(HASH_PAD);
    hash
}

/// Strip the padding from a borrowed hash.
///
/// Returns `None` when the input is not a padded 40-hex hash.
pub fn native_hash_for(borrowed_hash: &str) -> Option<String> {
    let hash = borrowed_hash.to_ascii_lowercase();
    if hash.len() != BORROWED_HASH_LEN || !is_hex(&hash) {
        return None;
    }
    hash.strip_suffix(HASH_PAD).map(str::to_string)
}

/// Build the magnet link a caller will hand back to us when grabbing a hit.
pub fn native_to_borrowed(native_hash: &str, name: &str, size_bytes: u64) -> BorrowedLink {
    let native_hash = native_hash.to_ascii_lowercase();
    let borrowed_hash = borrowed_hash_for(&native_hash);
    let uri = format!(
        "magnet:?xt=urn:btih:{}&dn={}&xl={}",
        borrowed_hash,
        urlencoding::encode(name),
        size_bytes
    );

    BorrowedLink {
        uri,
        borrowed_hash,
        native_hash,
    }
}

/// Decode a magnet link minted by [`native_to_borrowed`] (or an older
/// unpadded variant) into the ed2k link the backend understands.
pub fn borrowed_to_native(uri: &str) -> Result<DecodedLink, ConversionError> {
    let uri = uri.trim();
    let query = match uri.split_once('?') {
        Some((_, query)) => query,
        None => uri,
    };

    let mut token = None;
    let mut name = None;
    let mut size_bytes = 0u64;

    for pair in query.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        match key.to_ascii_lowercase().as_str() {
            "xt" if token.is_none() => token = hash_token(value),
            "dn" => name = Some(decode_component(value)),
            "xl" => size_bytes = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    let token = token.ok_or_else(|| {
        ConversionError::MalformedUri(format!("no hash token in '{}'", truncate(uri, 120)))
    })?;

    let native_hash = match token.len() {
        BORROWED_HASH_LEN => native_hash_for(&token)
            .ok_or_else(|| ConversionError::InvalidPadding(token.clone()))?,
        NATIVE_HASH_LEN => token,
        _ => {
            return Err(ConversionError::MalformedUri(format!(
                "hash token '{}' has unsupported length {}",
                token,
                token.len()
            )))
        }
    };

    let name = name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| native_hash.clone());

    Ok(DecodedLink {
        native_link: format_native_link(&name, size_bytes, &native_hash),
        borrowed_hash: borrowed_hash_for(&native_hash),
        native_hash,
        name,
        size_bytes,
    })
}

/// Split an `ed2k://|file|<name>|<size>|<hash>|/` link into its fields.
pub fn parse_native_link(link: &str) -> Result<NativeLink, ConversionError> {
    let fields: Vec<&str> = link.trim().split('|').collect();
    if fields.len() < NATIVE_MIN_FIELDS {
        return Err(ConversionError::InvalidNativeLink(format!(
            "expected at least {} fields, found {}",
            NATIVE_MIN_FIELDS,
            fields.len()
        )));
    }

    if !fields[0].eq_ignore_ascii_case(NATIVE_SCHEME) || !fields[1].eq_ignore_ascii_case(NATIVE_KIND)
    {
        return Err(ConversionError::InvalidNativeLink(format!(
            "link must start with '{}|{}|'",
            NATIVE_SCHEME, NATIVE_KIND
        )));
    }

    let size_bytes = fields[3].parse().map_err(|_| {
        ConversionError::InvalidNativeLink(format!("invalid size '{}'", fields[3]))
    })?;

    let hash = fields[4].to_ascii_lowercase();
    if hash.len() != NATIVE_HASH_LEN || !is_hex(&hash) {
        return Err(ConversionError::InvalidNativeLink(format!(
            "invalid hash '{}'",
            fields[4]
        )));
    }

    Ok(NativeLink {
        name: decode_component(fields[2]),
        size_bytes,
        hash,
    })
}

/// Format an ed2k file link.
pub fn format_native_link(name: &str, size_bytes: u64, native_hash: &str) -> String {
    format!(
        "{}|{}|{}|{}|{}|/",
        NATIVE_SCHEME,
        NATIVE_KIND,
        name.replace('|', "_"),
        size_bytes,
        native_hash.to_ascii_lowercase()
    )
}

pub(crate) fn is_hex(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn hash_token(xt: &str) -> Option<String> {
    let lower = xt.to_ascii_lowercase();
    let token = ["urn:btih:", "urn:ed2k:", "urn:ed2khash:"]
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))?;
    if is_hex(token) {
        Some(token.to_string())
    } else {
        None
    }
}

fn decode_component(value: &str) -> String {
    let value = value.replace('+', " ");
    match urlencoding::decode(&value) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => value,
    }
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "31d6cfe0d16ae931b73c59d7e0c089c0";

    #[test]
    fn test_borrowed_hash_is_padded_native_hash() {
        let link = native_to_borrowed(HASH, "x", 10);
        assert_eq!(link.borrowed_hash.len(), 40);
        assert_eq!(link.borrowed_hash, format!("{}00000000", HASH));
        assert_eq!(link.native_hash, HASH);
    }

    #[test]
    fn test_native_to_borrowed_lowercases_and_encodes_name() {
        let link = native_to_borrowed(&HASH.to_uppercase(), "Show Name S01E01 [720p].mkv", 734003200);
        assert_eq!(link.native_hash, HASH);
        assert_eq!(
            link.uri,
            format!(
                "magnet:?xt=urn:btih:{}00000000&dn=Show%20Name%20S01E01%20%5B720p%5D.mkv&xl=734003200",
                HASH
            )
        );
    }

    #[test]
    fn test_round_trip_preserves_native_hash() {
        let hashes = [
            HASH,
            "00000000000000000000000000000000",
            "ffffffffffffffffffffffffffffffff",
            "0123456789abcdef0123456789abcdef",
        ];
        for hash in hashes {
            let link = native_to_borrowed(hash, "x", 10);
            let decoded = borrowed_to_native(&link.uri).unwrap();
            assert_eq!(decoded.native_hash, hash);
            assert_eq!(decoded.borrowed_hash, link.borrowed_hash);
        }
    }

    #[test]
    fn test_borrowed_to_native_rebuilds_ed2k_link() {
        let link = native_to_borrowed(HASH, "My File (2020) & more.avi", 1234);
        let decoded = borrowed_to_native(&link.uri).unwrap();

        assert_eq!(decoded.name, "My File (2020) & more.avi");
        assert_eq!(decoded.size_bytes, 1234);
        assert_eq!(
            decoded.native_link,
            format!("ed2k://|file|My File (2020) & more.avi|1234|{}|/", HASH)
        );

        let parsed = parse_native_link(&decoded.native_link).unwrap();
        assert_eq!(parsed.hash, HASH);
        assert_eq!(parsed.size_bytes, 1234);
        assert_eq!(parsed.name, decoded.name);
    }

    #[test]
    fn test_borrowed_to_native_rejects_bad_padding() {
        let uri = format!("magnet:?xt=urn:btih:{}12345678&dn=x&xl=1", HASH);
        let err = borrowed_to_native(&uri).unwrap_err();
        assert_eq!(
            err,
            ConversionError::InvalidPadding(format!("{}12345678", HASH))
        );
    }

    #[test]
    fn test_borrowed_to_native_accepts_legacy_unpadded_token() {
        let uri = format!("magnet:?xt=urn:btih:{}&dn=legacy&xl=5", HASH.to_uppercase());
        let decoded = borrowed_to_native(&uri).unwrap();
        assert_eq!(decoded.native_hash, HASH);
        assert_eq!(decoded.borrowed_hash, format!("{}00000000", HASH));

        let uri = format!("magnet:?xt=urn:ed2k:{}&dn=legacy&xl=5", HASH);
        assert_eq!(borrowed_to_native(&uri).unwrap().native_hash, HASH);
    }

    #[test]
    fn test_borrowed_to_native_without_token_is_malformed() {
        for uri in ["magnet:?dn=nothing&xl=1", "", "magnet:?xt=urn:btih:&dn=x", "not a link"] {
            assert!(
                matches!(borrowed_to_native(uri), Err(ConversionError::MalformedUri(_))),
                "expected MalformedUri for {:?}",
                uri
            );
        }
    }

    #[test]
    fn test_borrowed_to_native_rejects_odd_length_token() {
        let uri = "magnet:?xt=urn:btih:abcdef&dn=x";
        assert!(matches!(
            borrowed_to_native(uri),
            Err(ConversionError::MalformedUri(_))
        ));
    }

    #[test]
    fn test_borrowed_to_native_defaults_missing_name_and_size() {
        let uri = format!("magnet:?xt=urn:btih:{}00000000", HASH);
        let decoded = borrowed_to_native(&uri).unwrap();
        assert_eq!(decoded.name, HASH);
        assert_eq!(decoded.size_bytes, 0);
    }

    #[test]
    fn test_parse_native_link_valid() {
        let link = format!("ed2k://|file|Some%20Movie.mkv|700000000|{}|/", HASH.to_uppercase());
        let parsed = parse_native_link(&link).unwrap();
        assert_eq!(parsed.name, "Some Movie.mkv");
        assert_eq!(parsed.size_bytes, 700000000);
        assert_eq!(parsed.hash, HASH);
    }

    #[test]
    fn test_parse_native_link_too_few_fields() {
        let err = parse_native_link("ed2k://|file|name|123").unwrap_err();
        assert!(matches!(err, ConversionError::InvalidNativeLink(_)));
    }

    #[test]
    fn test_parse_native_link_wrong_framing() {
        let link = format!("http://|file|name|123|{}|/", HASH);
        assert!(matches!(
            parse_native_link(&link),
            Err(ConversionError::InvalidNativeLink(_))
        ));

        let link = format!("ed2k://|server|name|123|{}|/", HASH);
        assert!(matches!(
            parse_native_link(&link),
            Err(ConversionError::InvalidNativeLink(_))
        ));
    }

    #[test]
    fn test_parse_native_link_bad_size_or_hash() {
        let link = format!("ed2k://|file|name|big|{}|/", HASH);
        assert!(parse_native_link(&link).is_err());

        assert!(parse_native_link("ed2k://|file|name|123|nothex|/").is_err());
    }

    #[test]
    fn test_native_hash_for() {
        assert_eq!(
            native_hash_for(&format!("{}00000000", HASH.to_uppercase())),
            Some(HASH.to_string())
        );
        assert_eq!(native_hash_for(HASH), None);
        assert_eq!(native_hash_for(&format!("{}00000001", HASH)), None);
    }
}
