/// Shorten an address for display: `0x8B0e...3D9` style when longer than 8 chars
pub fn shorten(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return value.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_values_are_unchanged() {
        assert_eq!(shorten("0xUSER"), "0xUSER");
        assert_eq!(shorten("12345678"), "12345678");
        assert_eq!(shorten(""), "");
    }

    #[test]
    fn test_long_values_are_truncated() {
        assert_eq!(shorten("0xUSERXSER"), "0xUS...SER");
        assert_eq!(
            shorten("0x8B0eeCABAc71696eb65a63a3a15E3Fc5f83BD3D9"),
            "0x8B...3D9"
        );
    }
}
