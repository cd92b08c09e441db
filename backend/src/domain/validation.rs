//! Small input checks shared by the services.

use crate::domain::Error;

/// Trimmed, non-empty text or a 400 naming `field`.
pub fn required_text(field: &str, value: Option<String>) -> Result<String, Error> {
    optional_text(value).ok_or_else(|| Error::invalid_request(format!("{field} is required")))
}

/// Trimmed text, treating blank input as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// A present value or a 400 naming `field`.
pub fn required<T>(field: &str, value: Option<T>) -> Result<T, Error> {
    value.ok_or_else(|| Error::invalid_request(format!("{field} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, false)]
    #[case(Some("  "), false)]
    #[case(Some(" x "), true)]
    fn required_text_trims(#[case] raw: Option<&str>, #[case] ok: bool) {
        let result = required_text("titre", raw.map(str::to_owned));
        assert_eq!(result.is_ok(), ok);
        if let Ok(text) = result {
            assert_eq!(text, "x");
        }
    }
}
