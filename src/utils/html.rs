// src/utils/html.rs

/// Sanitizes admin-entered question text with ammonia.
///
/// Safe formatting tags (`<b>`, `<code>`, ...) survive; scripts, frames and event
/// handler attributes are stripped, so question content cannot carry stored XSS
/// into the test-taking client.
pub fn clean_text(input: &str) -> String {
    ammonia::clean(input.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_keeps_formatting() {
        assert_eq!(
            clean_text("  What is <b>2+2</b>?<script>alert(1)</script> "),
            "What is <b>2+2</b>?"
        );
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(clean_text("Сколько будет 2+2?"), "Сколько будет 2+2?");
    }
}
