/// Cuts `value` to at most `max_bytes` without splitting a UTF-8 sequence.
pub fn truncate_utf8_prefix(value: &str, max_bytes: usize) -> String {
    if value.len() <= max_bytes {
        return value.to_string();
    }
    let end = (0..=max_bytes)
        .rev()
        .find(|idx| value.is_char_boundary(*idx))
        .unwrap_or(0);
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::truncate_utf8_prefix;

    #[test]
    fn short_values_are_untouched() {
        assert_eq!(truncate_utf8_prefix("title", 10), "title");
        assert_eq!(truncate_utf8_prefix("", 0), "");
    }

    #[test]
    fn cut_lands_on_char_boundary() {
        assert_eq!(truncate_utf8_prefix("Zürich", 2), "Z");
        assert_eq!(truncate_utf8_prefix("Zürich", 3), "Zü");
        assert_eq!(truncate_utf8_prefix("hello", 0), "");
    }
}
