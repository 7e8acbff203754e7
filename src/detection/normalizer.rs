// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::Html;

/// 不参与检测的噪声标签
const NOISE_TAGS: [&str; 6] = ["script", "style", "noscript", "header", "footer", "nav"];

/// 归一化后的文档
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    /// 结构化的DOM序列化副本，用于存储
    pub pretty: String,
    /// 小写、空白折叠后的纯文本，用于检测
    pub text: String,
    /// 纯文本的有界前缀摘要
    pub snippet: String,
}

/// 将HTML归一化为可检测文本
///
/// # 参数
///
/// * `html` - 原始HTML
/// * `snippet_len` - 摘要长度上限（字符数）
///
/// # 返回值
///
/// 归一化后的文档；空或畸形输入得到空字符串而非错误
pub fn normalize_html(html: &str, snippet_len: usize) -> NormalizedDocument {
    let document = Html::parse_document(html);
    let pretty = document.root_element().html();
    let text = visible_text(&document);
    let snippet = truncate_chars(&text, snippet_len);

    NormalizedDocument {
        pretty,
        text,
        snippet,
    }
}

/// 提取可见文本：跳过噪声标签子树，折叠空白并转为小写
fn visible_text(document: &Html) -> String {
    let mut raw = String::new();
    for node in document.tree.root().descendants() {
        if let Some(text) = node.value().as_text() {
            let noisy = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| NOISE_TAGS.contains(&el.name()))
            });
            if noisy {
                continue;
            }
            raw.push_str(text);
            raw.push(' ');
        }
    }

    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// 按字符数截断字符串，不会切断UTF-8编码
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html><head><style>body { color: red; }</style>
        <script>var secret = "nope";</script></head>
        <body><nav>Home | About</nav>
        <p>Hello   WORLD</p>
        <p>Contact: admin@example.onion</p>
        <footer>copyright 2025</footer></body></html>"#;

    #[test]
    fn test_noise_tags_are_stripped() {
        let doc = normalize_html(SAMPLE, 500);

        assert!(!doc.text.contains("color: red"));
        assert!(!doc.text.contains("var secret"));
        assert!(!doc.text.contains("home | about"));
        assert!(!doc.text.contains("copyright 2025"));
        assert!(doc.text.contains("hello world"));
        assert!(doc.text.contains("admin@example.onion"));
    }

    #[test]
    fn test_text_is_lowercase_and_collapsed() {
        let doc = normalize_html("<p>Some\n\n  BIG\ttext</p>", 500);

        assert_eq!(doc.text, "some big text");
        assert!(!doc.text.contains("  "));
    }

    #[test]
    fn test_snippet_is_bounded_prefix() {
        let doc = normalize_html("<p>abcdefghij</p>", 4);

        assert_eq!(doc.snippet, "abcd");
        assert!(doc.text.starts_with(&doc.snippet));
    }

    #[test]
    fn test_empty_input() {
        let doc = normalize_html("", 500);

        assert!(doc.text.is_empty());
        assert!(doc.snippet.is_empty());
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }

    #[test]
    fn test_pretty_keeps_structure() {
        let doc = normalize_html("<p>Hi</p>", 500);

        assert!(doc.pretty.contains("<p>Hi</p>"));
    }
}
