use crate::parsers::sanitize::{self, WorkingDocument};
use scraper::{Html, Selector};

fn clean(markup: &str) -> String {
    sanitize::clean_html(&Html::parse_document(markup), None)
}

fn body(markup: &str) -> String {
    clean(&format!("<html><head></head><body>{markup}</body></html>"))
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn test_scripts_and_styles_always_go() {
        let cleaned = clean(
            "<html><head><style>p { color: red }</style></head><body>\
             <script>var tracking = 'enabled';</script>\
             <p>Readable paragraph</p></body></html>",
        );
        assert_eq!(cleaned, "<html><body><p>Readable paragraph</p></body></html>");
    }

    #[test]
    fn test_doctype_is_stripped() {
        let cleaned = clean("<!DOCTYPE html><html><body><p>Hello there</p></body></html>");
        assert_eq!(cleaned, "<html><body><p>Hello there</p></body></html>");
    }

    #[test]
    fn test_leaf_with_enough_text_survives() {
        let cleaned = body("<div><p>Hello world</p><p>ok!</p><b>12345</b><i>1234</i></div>");
        assert_eq!(
            cleaned,
            "<html><body><div><p>Hello world</p><b>12345</b></div></body></html>"
        );
    }

    #[test]
    fn test_empty_blocks_are_removed() {
        let cleaned = body("<div>  </div><li></li><span> </span><p>kept text</p>");
        assert_eq!(cleaned, "<html><body><p>kept text</p></body></html>");
    }

    #[test]
    fn test_textless_wrapper_goes_with_its_children() {
        // The wrapper has a child element, so only the empty-block pass can drop it
        let cleaned = body("<div><em> </em><br></div><p>kept text</p>");
        assert_eq!(cleaned, "<html><body><p>kept text</p></body></html>");
    }

    #[test]
    fn test_noise_is_judged_when_visited() {
        // The wrapper still has a child when it is checked, so only the leaf goes
        let cleaned = body("<div><p>ab</p></div>");
        assert_eq!(cleaned, "<html><body><div></div></body></html>");
    }

    #[test]
    fn test_hidden_content_is_removed() {
        let cleaned = body(
            "<p hidden>Secret paragraph</p>\
             <p style=\"display: none\">Invisible paragraph</p>\
             <p style=\"display:block\">Visible paragraph</p>",
        );
        assert_eq!(
            cleaned,
            "<html><body><p>Visible paragraph</p></body></html>"
        );
    }

    #[test]
    fn test_comments_are_removed() {
        let cleaned = body("<!-- tracking pixel --><p>Actual content</p>");
        assert!(!cleaned.contains("tracking"));
        assert!(cleaned.contains("<p>Actual content</p>"));
    }

    #[test]
    fn test_boilerplate_tags_are_removed() {
        let cleaned = body(
            "<nav><a href=\"/\">Home page link</a></nav>\
             <form><input name=\"q\"><button>Search button</button></form>\
             <figure><img src=\"a.png\"><figcaption>Caption text</figcaption></figure>\
             <article><p>Story paragraph</p></article>",
        );
        assert_eq!(
            cleaned,
            "<html><body><article><p>Story paragraph</p></article></body></html>"
        );
    }

    #[test]
    fn test_boilerplate_ids_and_classes() {
        let cleaned = body(
            "<div id=\"cookie-banner\">We use cookies here</div>\
             <div class=\"wide sidebar\">Sidebar content</div>\
             <p class=\"tagline\">Tagline content</p>\
             <p class=\"tag\">Tag content</p>",
        );
        assert_eq!(
            cleaned,
            "<html><body><p class=\"tagline\">Tagline content</p></body></html>"
        );
    }

    #[test]
    fn test_long_footers_only() {
        let long_text = "Lots of footer links ".repeat(60);
        let cleaned = body(&format!(
            "<p>Main content</p><footer>{long_text}</footer><footer>Copyright 2024 Example</footer>"
        ));
        assert_eq!(
            cleaned,
            "<html><body><p>Main content</p><footer>Copyright 2024 Example</footer></body></html>"
        );
    }

    #[test]
    fn test_long_classes_are_stripped_before_class_filtering() {
        let cleaned = body(
            "<div class=\"article-body related-content-wrapper\">Main story text</div>\
             <div class=\"related\">Also read this</div>\
             <div class=\"share-bar\">Share this page</div>",
        );
        assert_eq!(
            cleaned,
            "<html><body><div>Main story text</div></body></html>"
        );
    }

    #[test]
    fn test_spans_become_text() {
        let cleaned = body("<p>Hello <span class=\"x\">brave <span>new</span></span> world</p>");
        assert_eq!(
            cleaned,
            "<html><body><p>Hello brave new world</p></body></html>"
        );
    }

    #[test]
    fn test_link_dense_blocks_are_removed() {
        let links: String = (0..12).map(|_| "<a href=\"/x\">Link text</a>").collect();
        let prose = "This paragraph is mostly prose and it runs long enough to cross the \
                     one hundred character threshold with just <a href=\"/a\">one link</a> \
                     and <a href=\"/b\">another link</a> inside it.";
        let cleaned = body(&format!("<div>{links}</div><p>{prose}</p>"));

        assert!(!cleaned.contains("Link text"));
        assert!(cleaned.contains("<a href=\"/a\">one link</a>"));
        assert!(cleaned.starts_with("<html><body><p>This paragraph is mostly prose"));
    }

    #[test]
    fn test_attribute_allow_list() {
        let cleaned = body(
            "<p id=\"intro\" style=\"color: red\" data-track=\"1\" onclick=\"go()\">Allowed attributes</p>\
             <p><a href=\"/x\" target=\"_blank\" rel=\"nofollow\">Link with target</a></p>",
        );
        assert_eq!(
            cleaned,
            "<html><body><p id=\"intro\">Allowed attributes</p>\
             <p><a href=\"/x\" rel=\"nofollow\">Link with target</a></p></body></html>"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let cleaned = body("<p>Fish &amp; chips &lt;3\u{a0}always</p>");
        assert_eq!(
            cleaned,
            "<html><body><p>Fish &amp; chips &lt;3&nbsp;always</p></body></html>"
        );
    }

    #[test]
    fn test_byte_cap() {
        let document = Html::parse_document(
            "<html><body><p>A paragraph long enough to be cut by the cap</p></body></html>",
        );
        let capped = sanitize::clean_html(&document, Some(20));
        assert_eq!(capped, "<html><body><p>A par");

        let uncapped = sanitize::clean_html(&document, None);
        assert!(uncapped.len() > 20);
    }

    #[test]
    fn test_byte_cap_respects_char_boundaries() {
        let document = Html::parse_document("<html><body><p>Ünïcödé text here</p></body></html>");
        let capped = sanitize::clean_html(&document, Some(18));
        assert!(capped.len() <= 18);
        assert!(capped.starts_with("<html><body><p>"));
    }

    #[test]
    fn test_original_document_is_untouched() {
        let document = Html::parse_document(
            "<html><head><title>Kept title</title></head><body><nav>Menu items</nav></body></html>",
        );
        let mut working = WorkingDocument::from_html(&document);
        working.sanitize();
        assert!(!working.to_html().contains("Kept title"));

        let title = Selector::parse("title").unwrap();
        let nav = Selector::parse("nav").unwrap();
        assert_eq!(document.select(&title).count(), 1);
        assert_eq!(document.select(&nav).count(), 1);
    }

    #[test]
    fn test_working_document_text() {
        let working = WorkingDocument::parse("<html><body><p>One</p><p>Two</p></body></html>");
        assert_eq!(working.text(), "OneTwo");
    }
}
