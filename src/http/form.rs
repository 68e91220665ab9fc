use percent_encoding::percent_decode_str;

use crate::http::{error::BodyError, params::MultiMap, protocol::charset::Charset};

/// Decodes an `application/x-www-form-urlencoded` string.
///
/// Pairs are split on `&` and keep their order. A pair without `=` is a key
/// with an empty value; a pair whose key is empty (`=x`, or an empty pair
/// from `a&&b` or a trailing `&`) is dropped. Any escape that cannot be
/// decoded fails the whole string.
pub fn decode_url_string(input: &str, charset: Charset) -> Result<MultiMap, BodyError> {
    let mut result = MultiMap::new();
    if input.is_empty() {
        return Ok(result);
    }

    for pair in input.split('&') {
        if let Some((key, value)) = decode_url_param(pair, charset)? {
            result.add(key, value);
        }
    }
    Ok(result)
}

/// Splits and decodes a single `key=value` pair. `None` means the pair has
/// no addressable key.
pub fn decode_url_param(
    param: &str,
    charset: Charset,
) -> Result<Option<(String, String)>, BodyError> {
    let (key, value) = match param.find('=') {
        None => (param, ""),
        Some(0) => return Ok(None),
        Some(pos) => (&param[..pos], &param[pos + 1..]),
    };
    if key.is_empty() {
        return Ok(None);
    }

    let key = percent_decode(key, charset)?;
    if key.is_empty() {
        return Ok(None);
    }
    let value = percent_decode(value, charset)?;
    Ok(Some((key, value)))
}

/// Reverses `+` and `%XX` escaping. Consecutive escapes form one byte run
/// decoded with `charset`, so multi-byte sequences survive.
pub fn percent_decode(input: &str, charset: Charset) -> Result<String, BodyError> {
    if !input.bytes().any(|b| b == b'%' || b == b'+') {
        return Ok(input.to_string());
    }

    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(' ');
                i += 1;
            }
            b'%' => {
                let start = i;
                while i < bytes.len() && bytes[i] == b'%' {
                    let valid = i + 2 < bytes.len()
                        && bytes[i + 1].is_ascii_hexdigit()
                        && bytes[i + 2].is_ascii_hexdigit();
                    if !valid {
                        return Err(BodyError::Decode(format!(
                            "malformed escape at offset {} in {:?}",
                            i, input
                        )));
                    }
                    i += 3;
                }
                let run: Vec<u8> = percent_decode_str(&input[start..i]).collect();
                out.push_str(&charset.decode(&run)?);
            }
            _ => {
                let next = bytes[i..]
                    .iter()
                    .position(|&b| b == b'%' || b == b'+')
                    .map(|p| i + p)
                    .unwrap_or(bytes.len());
                out.push_str(&input[i..next]);
                i = next;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode_plain() {
        assert_eq!(percent_decode("abc", Charset::Utf8).unwrap(), "abc");
        assert_eq!(percent_decode("New+York", Charset::Utf8).unwrap(), "New York");
        assert_eq!(percent_decode("G%26M", Charset::Utf8).unwrap(), "G&M");
        assert_eq!(percent_decode("1%2B1", Charset::Utf8).unwrap(), "1+1");
    }

    #[test]
    fn test_percent_decode_multibyte() {
        assert_eq!(percent_decode("caf%C3%A9", Charset::Utf8).unwrap(), "café");
        assert_eq!(percent_decode("caf%E9", Charset::Latin1).unwrap(), "café");
        assert!(percent_decode("caf%E9", Charset::Utf8).is_err());
    }

    #[test]
    fn test_percent_decode_malformed() {
        assert!(percent_decode("100%", Charset::Utf8).is_err());
        assert!(percent_decode("%4", Charset::Utf8).is_err());
        assert!(percent_decode("%zz", Charset::Utf8).is_err());
    }
}
