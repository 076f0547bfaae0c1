//! Scanner options

/// Options that change what the scanner reports and records.
///
/// None of them changes which tokens are recognized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScannerOptions {
    /// Recognize delimiter characters in data as [TokenKind::CharDelim](crate::token::TokenKind::CharDelim)
    ///     and warn about them when collecting literals.
    pub warn_data_delim: bool,
    /// Warn about references that are not terminated by REFC.
    pub warn_refc_omitted: bool,
    /// Record the markup of references in their origins, so that the exact
    ///     reference text can be reproduced.
    pub keep_markup: bool,
    /// Number of errors after which [Scanner::should_give_up](crate::scanner::Scanner::should_give_up)
    ///     returns true.
    pub error_limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "serde")]
    #[test]
    fn missing_fields_take_defaults() {
        use super::*;
        let options: ScannerOptions = serde_json::from_str(r#"{"keep_markup": true}"#).unwrap();
        assert_eq!(
            options,
            ScannerOptions {
                keep_markup: true,
                ..Default::default()
            }
        );
    }
}
