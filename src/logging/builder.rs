//! Template expansion for log messages.
//!
//! # Responsibilities
//! - Expand `{placeholder}` templates against a [`LogContext`]
//! - Fall back to the caller's extra values, then to the sentinel
//!
//! # Design Decisions
//! - Rendering never fails; an unresolved placeholder becomes [`DEFAULT_VALUE`]
//! - Positional placeholders resolve to the empty string (keyword-only system)
//! - The literal `message` key is reserved for the caller's free text

use crate::logging::context::LogContext;
use crate::logging::message_types::MessageType;

/// Sentinel substituted for any unresolved placeholder.
pub const DEFAULT_VALUE: &str = "NA";

/// Reserved placeholder for the caller's free-text message.
pub const MESSAGE_KEY: &str = "message";

/// Renders one log statement from a message type's format string.
///
/// Transient; built per log call by the adapter and dropped once the line
/// has been written.
pub struct MessageBuilder<'a> {
    message: Option<&'a str>,
    format: &'static str,
    context: &'a LogContext,
}

impl<'a> MessageBuilder<'a> {
    pub fn new(
        message: Option<&'a str>,
        message_type: &MessageType,
        context: &'a LogContext,
    ) -> Self {
        Self {
            message,
            format: message_type.format,
            context,
        }
    }

    /// Expand the format string. `{{` and `}}` render literal braces; an
    /// unterminated placeholder is emitted verbatim.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.format.len() + 32);
        let mut chars = self.format.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut key = String::new();
                    let mut closed = false;
                    for k in chars.by_ref() {
                        if k == '}' {
                            closed = true;
                            break;
                        }
                        key.push(k);
                    }
                    if closed {
                        out.push_str(&self.get_value(&key));
                    } else {
                        out.push('{');
                        out.push_str(&key);
                    }
                }
                _ => out.push(c),
            }
        }

        out
    }

    /// Resolve one placeholder key.
    ///
    /// Order: positional index (empty string), the reserved `message` key,
    /// the context's named accessors, the context's extra values, sentinel.
    fn get_value(&self, key: &str) -> String {
        if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) {
            return String::new();
        }

        if key == MESSAGE_KEY {
            return self.message.unwrap_or("").to_string();
        }

        let key = key.to_ascii_lowercase();
        self.context
            .resolve(&key)
            .or_else(|| self.context.extra(&key))
            .unwrap_or_else(|| DEFAULT_VALUE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::message_types::MessageType;

    fn render(format: &'static str, message: Option<&str>, context: &LogContext) -> String {
        let message_type = MessageType::new(format);
        MessageBuilder::new(message, &message_type, context).render()
    }

    #[test]
    fn test_unresolved_placeholder_renders_sentinel() {
        let context = LogContext::new();
        assert_eq!(render("value={nonexistent}", None, &context), "value=NA");
    }

    #[test]
    fn test_positional_placeholder_renders_empty() {
        let context = LogContext::new();
        assert_eq!(render("a{0}b{12}c", None, &context), "abc");
    }

    #[test]
    fn test_message_key_uses_free_text() {
        let context = LogContext::new();
        assert_eq!(render("msg:{message}", Some("hello"), &context), "msg:hello");
        assert_eq!(render("msg:{message}", None, &context), "msg:");
    }

    #[test]
    fn test_extra_values_fill_unknown_keys() {
        let context = LogContext::new().with_extra("processing_time", "0.001200");
        assert_eq!(render("t={processing_time}", None, &context), "t=0.001200");
    }

    #[test]
    fn test_keys_are_lowercased_before_lookup() {
        let context = LogContext::new().with_extra("custom", "x");
        assert_eq!(render("{CUSTOM}", None, &context), "x");
    }

    #[test]
    fn test_escaped_braces() {
        let context = LogContext::new();
        assert_eq!(render("{{literal}}", None, &context), "{literal}");
    }

    #[test]
    fn test_unterminated_placeholder_is_literal() {
        let context = LogContext::new();
        assert_eq!(render("oops {tail", None, &context), "oops {tail");
    }
}
