//! 响应清洗：去掉首尾的 markdown 代码围栏（含语言标记），得到可直接写盘的文档。
//! 对任意输入都有定义，不会失败；结果再次清洗保持不变。

const FENCE: &str = "```";

/// 清洗后的文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CleanDocument(String);

impl CleanDocument {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 围栏后允许紧跟的语言标记字符，例如 `html`、`html5`、`c++`
fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.' | '#')
}

/// 文本以围栏开头时，去掉围栏及紧跟的语言标记（不要求换行）
fn strip_opening_fence(text: &str) -> Option<&str> {
    text.strip_prefix(FENCE).map(|rest| rest.trim_start_matches(is_tag_char))
}

/// 文本以围栏结尾时（无论是否独占一行），去掉该围栏
fn strip_closing_fence(text: &str) -> Option<&str> {
    text.strip_suffix(FENCE)
}

pub(crate) fn sanitize(raw: &str) -> CleanDocument {
    let mut current = raw.trim();
    // 每轮至少缩短一次才继续，必然终止；停在不动点上保证幂等
    loop {
        let mut next = current;
        if let Some(body) = strip_opening_fence(next) {
            next = body.trim();
        }
        if let Some(body) = strip_closing_fence(next) {
            next = body.trim();
        }
        if next.len() == current.len() {
            break;
        }
        current = next;
    }
    CleanDocument(current.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(s: &str) -> String {
        sanitize(s).as_str().to_string()
    }

    #[test]
    fn strips_html_fence() {
        assert_eq!(clean("```html\n<p>hi</p>\n```"), "<p>hi</p>");
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(clean("<p>hi</p>"), "<p>hi</p>");
        assert_eq!(clean("  \n<p>hi</p>\n\n"), "<p>hi</p>");
    }

    #[test]
    fn bare_fence_and_crlf() {
        assert_eq!(clean("```\r\n<!DOCTYPE html>\r\n<html></html>\r\n```\r\n"), "<!DOCTYPE html>\r\n<html></html>");
    }

    #[test]
    fn opening_fence_only_keeps_the_rest() {
        assert_eq!(clean("```html\n<p>hi</p>"), "<p>hi</p>");
    }

    #[test]
    fn closing_fence_only_is_removed() {
        assert_eq!(clean("<p>hi</p>\n```"), "<p>hi</p>");
    }

    #[test]
    fn closing_fence_attached_to_last_line() {
        assert_eq!(
            clean("```html\n<!DOCTYPE html>\n<html></html>```"),
            "<!DOCTYPE html>\n<html></html>"
        );
    }

    #[test]
    fn language_tag_attached_to_content() {
        assert_eq!(
            clean("```html<!DOCTYPE html>\n<html></html>\n```"),
            "<!DOCTYPE html>\n<html></html>"
        );
        assert_eq!(clean("```html <p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn backticks_in_the_middle_are_kept() {
        let doc = "<p>use ``` for code</p>";
        assert_eq!(clean(doc), doc);
    }

    #[test]
    fn fences_inside_the_document_are_kept() {
        let raw = "```html\n<pre>\n```\nlet x = 1;\n```\n</pre>\n```";
        assert_eq!(clean(raw), "<pre>\n```\nlet x = 1;\n```\n</pre>");
    }

    #[test]
    fn total_on_degenerate_input() {
        for raw in ["", "   \n\t ", "```", "```html", "```\n```", "\n```\n", "````"] {
            let once = sanitize(raw);
            assert!(once.as_str().len() <= raw.len());
        }
        assert!(sanitize("").is_empty());
        assert!(sanitize("```html\n```").is_empty());
    }

    #[test]
    fn idempotent() {
        let samples = [
            "```html\n<p>hi</p>\n```",
            "```\n```\n<p>hi</p>\n```\n```",
            "```html\n<p>hi</p>",
            "<p>hi</p>\n```",
            "  plain text  ",
            "```html\n<pre>\n```\n</pre>\n```",
            "",
            "```",
            "````\n<p>x</p>",
            "```html\n<p>hi</p>```",
            "```html<p>hi</p>\n```",
            "```js```",
        ];
        for raw in samples {
            let once = sanitize(raw);
            let twice = sanitize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }
}
