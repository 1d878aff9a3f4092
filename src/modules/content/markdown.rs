use pulldown_cmark::{html, Options, Parser};

/// 将文章正文渲染为 HTML
///
/// 正文为 Markdown；内联 HTML（如富文本编辑器的输出）原样保留，
/// 已是 HTML 的正文按原样渲染。
pub fn render_body(body: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(body, options);
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown_body() {
        let html = render_body("# Hello World\n\nThis is a **test** post.");
        assert!(html.contains("<h1>Hello World</h1>"));
        assert!(html.contains("<strong>test</strong>"));
    }

    #[test]
    fn test_html_body_passes_through() {
        let html = render_body("<p>Written in the <em>editor</em></p>");
        assert!(html.contains("<p>Written in the <em>editor</em></p>"));
    }
}
