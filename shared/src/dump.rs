//! Hex rendering of connection buffers for debug logs

/// Formats `bytes` as offset-prefixed lines of sixteen bytes each.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let printable: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        out.push_str(&format!(
            "{:08x}  {:<32}  |{}|\n",
            line * 16,
            hex::encode(chunk),
            printable
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_lines() {
        let dump = hex_dump(b"s\x01\x00\x00\x00abcdefghijklmnop");
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000000  7301000000616263"));
        assert!(lines[0].ends_with("|s....abcdefghijk|"));
        assert!(lines[1].starts_with("00000010  6c6d6e6f70"));
    }

    #[test]
    fn test_empty_dump() {
        assert!(hex_dump(&[]).is_empty());
    }
}
