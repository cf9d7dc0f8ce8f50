use scraper::ElementRef;

pub fn extract_text(node: ElementRef) -> String {
    node.text().collect::<String>()
}

/// FBRef hrefs are site-absolute ("/en/players/...").
pub fn absolute_fbref_url(href: &str) -> String {
    "https://fbref.com".to_string() + href
}

/// FBRef table cells use a non-breaking space as the empty placeholder.
pub fn clean_cell(text: &str) -> String {
    text.replace('\u{a0}', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_cell_strips_nbsp_padding() {
        assert_eq!(clean_cell("\u{a0}"), "");
        assert_eq!(clean_cell(" Arsenal\u{a0}"), "Arsenal");
    }

    #[test]
    fn absolute_url_prepends_site() {
        assert_eq!(
            absolute_fbref_url("/en/players/abcd1234/Some-Player"),
            "https://fbref.com/en/players/abcd1234/Some-Player"
        );
    }
}
