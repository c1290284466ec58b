//! Server-rendered single page: branding, example questions, the question
//! form, and the reply (notices, answer, sources).
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use pulldown_cmark::{Event, Options, Parser, html};

use crate::config::{BrandingConfig, ExampleQuestion};
use crate::pipeline::{Outcome, Reply};

/// Render model output as HTML that cannot carry markup of its own.
///
/// Raw HTML in the markdown is demoted to text, and the rendered result is
/// sanitised so only inert formatting tags and safe links survive.
pub fn render_answer(markdown: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    ammonia::clean(&out)
}

fn is_web_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

fn render_styles(page: &mut String, branding: &BrandingConfig) {
    let backdrop = text(&branding.backdrop_color);
    let button = text(&branding.button_color);
    page.push_str(&format!(
        r#"<style>
  body {{ margin: 0; background-color: {backdrop}; font-family: 'Source Serif 4', serif; }}
  .block-container {{ position: relative; max-width: 60%; margin: 30px auto; background: white;
    border: 1px solid #333; border-radius: 8px; padding: 30px; box-shadow: 0 4px 8px rgba(0,0,0,0.1); }}
  .logo {{ position: absolute; top: 40px; right: 20px; width: 80px; }}
  .tagline {{ font-family: 'Bebas Neue', sans-serif; font-size: 24px; line-height: 1.2; }}
  .examples {{ display: grid; grid-template-columns: 1fr 1fr; gap: 8px; margin: 12px 0; }}
  button {{ font-family: 'DM Sans', sans-serif; background: #f0f0f0; color: #000; border: 1px solid #ccc;
    padding: 6px 12px; border-radius: 4px; cursor: pointer; }}
  button.submit {{ background: {button}; color: #fff; border-color: {button}; }}
  input[type=text] {{ width: 100%; padding: 8px; box-sizing: border-box; }}
  .notice {{ padding: 10px; border-radius: 4px; margin: 12px 0; }}
  .notice.error {{ background: #fde2e2; }}
  .notice.warning {{ background: #fff4d6; }}
  .big-font {{ font-size: 20px; }}
  .small-italic {{ font-size: 14px; font-style: italic; }}
</style>
"#
    ));
}

fn render_examples(page: &mut String, examples: &[ExampleQuestion]) {
    if examples.is_empty() {
        return;
    }
    page.push_str("<p>Try an example:</p>\n<form class=\"examples\" method=\"get\" action=\"/\">\n");
    for example in examples {
        page.push_str(&format!(
            "  <button type=\"submit\" name=\"question\" value=\"{}\">{}</button>\n",
            attr(&example.question),
            text(&example.label)
        ));
    }
    page.push_str("</form>\n");
}

fn render_reply(page: &mut String, reply: &Reply) {
    for notice in &reply.notices {
        page.push_str(&format!(
            "<div class=\"notice error\">{}</div>\n",
            text(notice)
        ));
    }
    if let Some(warning) = reply.warning() {
        page.push_str(&format!(
            "<div class=\"notice warning\">{}</div>\n",
            text(warning)
        ));
    }
    if let Outcome::Answered { answer, sources } = &reply.outcome {
        page.push_str(&format!(
            "<div class=\"big-font answer\">{}</div><br><br>\n",
            render_answer(answer)
        ));
        page.push_str("<div class=\"small-italic\">sources</div>\n<ol class=\"sources\">\n");
        for source in sources {
            let url = if is_web_url(&source.url) {
                format!(
                    "<a href=\"{}\" rel=\"noopener noreferrer\">{}</a>",
                    attr(&source.url),
                    text(&source.url)
                )
            } else {
                text(&source.url).into_owned()
            };
            page.push_str(&format!(
                "  <li>{}<br>URL: {}</li>\n",
                text(&source.title),
                url
            ));
        }
        page.push_str("</ol>\n");
    }
}

/// The whole page. `question` is echoed back into the text field.
pub fn render_page(
    branding: &BrandingConfig,
    examples: &[ExampleQuestion],
    question: &str,
    reply: Option<&Reply>,
) -> String {
    let mut page = String::with_capacity(4096);
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    page.push_str(&format!("<title>{}</title>\n", text(&branding.title)));
    render_styles(&mut page, branding);
    page.push_str("</head>\n<body>\n<main class=\"block-container\">\n");

    if let Some(logo) = branding.logo_url.as_deref().filter(|u| is_web_url(u)) {
        page.push_str(&format!(
            "<img class=\"logo\" src=\"{}\" alt=\"{} logo\">\n",
            attr(logo),
            attr(&branding.institution)
        ));
    }
    page.push_str(&format!("<h1>{}</h1>\n", text(&branding.title)));
    page.push_str(&format!(
        "<div class=\"tagline\">{}</div>\n",
        text(&branding.tagline)
    ));

    render_examples(&mut page, examples);

    page.push_str(&format!(
        "<form method=\"post\" action=\"/ask\">\n\
         <label for=\"question\">Or type your own question:</label>\n\
         <input type=\"text\" id=\"question\" name=\"question\" value=\"{}\">\n\
         <p><button class=\"submit\" type=\"submit\">Submit</button></p>\n\
         </form>\n",
        attr(question)
    ));

    if let Some(reply) = reply {
        render_reply(&mut page, reply);
    }

    page.push_str("</main>\n</body>\n</html>\n");
    page
}
