//! Conversions between TXT record byte strings and printable text.

/// Render raw bytes for display: printable ASCII passes through, anything
/// else becomes `.`.
pub fn byte_array_to_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if (32..127).contains(&b) { b as char } else { '.' })
        .collect()
}

pub fn txt_array_to_string_array<T: AsRef<[u8]>>(txt: &[T]) -> Vec<String> {
    txt.iter().map(|s| byte_array_to_string(s.as_ref())).collect()
}

pub fn string_to_byte_array(s: &str) -> Vec<u8> {
    s.as_bytes().to_vec()
}

pub fn string_array_to_txt_array<S: AsRef<str>>(strings: &[S]) -> Vec<Vec<u8>> {
    strings
        .iter()
        .map(|s| string_to_byte_array(s.as_ref()))
        .collect()
}

/// Split a TXT entry at the first `=`. An entry without `=` is a boolean
/// attribute and has no value.
pub fn split_pair(entry: &[u8]) -> (&[u8], Option<&[u8]>) {
    match entry.iter().position(|&b| b == b'=') {
        Some(idx) => (&entry[..idx], Some(&entry[idx + 1..])),
        None => (entry, None),
    }
}

/// One-line rendering used after a resolve: `"a=1" "b=2"`.
pub fn txt_to_display<T: AsRef<[u8]>>(txt: &[T]) -> String {
    txt.iter()
        .map(|entry| format!("\"{}\"", byte_array_to_string(entry.as_ref())))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_printable_bytes_become_dots() {
        assert_eq!(byte_array_to_string(b"ab\x00c\x7f\xff"), "ab.c..");
        assert_eq!(byte_array_to_string(&[31, 32, 126, 127]), ". ~.");
    }

    #[test]
    fn test_printable_roundtrip() {
        let s = "path=/index.html";
        assert_eq!(byte_array_to_string(&string_to_byte_array(s)), s);
    }

    #[test]
    fn test_txt_arrays() {
        let txt = string_array_to_txt_array(&["a=1", "flag"]);
        assert_eq!(txt, vec![b"a=1".to_vec(), b"flag".to_vec()]);
        assert_eq!(txt_array_to_string_array(&txt), vec!["a=1", "flag"]);
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair(b"k=v=w"), (&b"k"[..], Some(&b"v=w"[..])));
        assert_eq!(split_pair(b"k="), (&b"k"[..], Some(&b""[..])));
        assert_eq!(split_pair(b"flag"), (&b"flag"[..], None));
    }

    #[test]
    fn test_txt_to_display() {
        let txt = vec![b"a=1".to_vec(), b"b=\x01".to_vec()];
        assert_eq!(txt_to_display(&txt), "\"a=1\" \"b=.\"");
        assert_eq!(txt_to_display::<Vec<u8>>(&[]), "");
    }
}
