//! In-process configuration honored while building and dispatching requests.

pub const DEFAULT_CONTENT_CHARSET: &str = "ISO-8859-1";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// How request bodies and their content type are encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    pub default_content_charset: String,
    /// Append `; charset=<default_content_charset>` to a content type that
    /// has no charset of its own.
    pub append_default_content_charset_to_content_type_if_undefined: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            default_content_charset: DEFAULT_CONTENT_CHARSET.to_string(),
            append_default_content_charset_to_content_type_if_undefined: true,
        }
    }
}

impl EncoderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_content_charset(mut self, charset: impl Into<String>) -> Self {
        self.default_content_charset = charset.into();
        self
    }

    pub fn append_default_content_charset_to_content_type_if_undefined(mut self, append: bool) -> Self {
        self.append_default_content_charset_to_content_type_if_undefined = append;
        self
    }

    /// The content type as it will be sent.
    pub fn content_type_with_charset(&self, content_type: &str) -> String {
        if !self.append_default_content_charset_to_content_type_if_undefined
            || content_type.to_ascii_lowercase().contains("charset=")
        {
            return content_type.to_string();
        }
        format!("{content_type}; charset={}", self.default_content_charset)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub encoder: EncoderConfig,
    /// Percent-encode path parameter values and query parameters.
    pub url_encoding_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            encoder: EncoderConfig::default(),
            url_encoding_enabled: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encoder_config(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn url_encoding_enabled(mut self, enabled: bool) -> Self {
        self.url_encoding_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_is_appended_by_default() {
        let encoder = EncoderConfig::default();
        assert_eq!(
            encoder.content_type_with_charset(FORM_URLENCODED),
            "application/x-www-form-urlencoded; charset=ISO-8859-1"
        );
    }

    #[test]
    fn charset_is_not_appended_when_disabled() {
        let encoder = EncoderConfig::new().append_default_content_charset_to_content_type_if_undefined(false);
        assert_eq!(encoder.content_type_with_charset(FORM_URLENCODED), FORM_URLENCODED);
    }

    #[test]
    fn explicit_charset_is_kept() {
        let encoder = EncoderConfig::new().default_content_charset("UTF-16");
        assert_eq!(
            encoder.content_type_with_charset("text/plain; Charset=UTF-8"),
            "text/plain; Charset=UTF-8"
        );
        assert_eq!(
            encoder.content_type_with_charset("text/plain"),
            "text/plain; charset=UTF-16"
        );
    }
}
