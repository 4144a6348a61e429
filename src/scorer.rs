// src/scorer.rs - rank same-domain links by contact-page likelihood
use scraper::{Html, Selector};
use url::Url;

const TEXT_MATCH_SCORE: u32 = 10;
const PATH_MATCH_SCORE: u32 = 5;

/// All same-domain links on the page, in document order.
pub fn collect_links(html: &str, base: &Url) -> Vec<(Url, String)> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").unwrap();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        if !same_host(base, &resolved) {
            continue;
        }
        let text = element.text().collect::<String>();
        links.push((resolved, text));
    }

    links
}

pub fn score_link(text: &str, path: &str, keywords: &[String]) -> u32 {
    let text = text.to_lowercase();
    let path = path.to_lowercase();
    let mut score = 0;
    if keywords.iter().any(|k| text.contains(&k.to_lowercase())) {
        score += TEXT_MATCH_SCORE;
    }
    if keywords.iter().any(|k| path.contains(&k.to_lowercase())) {
        score += PATH_MATCH_SCORE;
    }
    score
}

/// Highest-scoring contact-page candidate, ties broken by document order.
/// Links pointing back at the current page are ignored.
pub fn best_contact_link(html: &str, base: &Url, keywords: &[String]) -> Option<Url> {
    let mut best: Option<(u32, Url)> = None;

    for (link, text) in collect_links(html, base) {
        if same_page(&link, base) {
            continue;
        }
        let score = score_link(&text, link.path(), keywords);
        if score == 0 {
            continue;
        }
        match &best {
            Some((top, _)) if *top >= score => {}
            _ => best = Some((score, link)),
        }
    }

    best.map(|(_, url)| url)
}

fn same_host(a: &Url, b: &Url) -> bool {
    fn host(u: &Url) -> &str {
        let h = u.host_str().unwrap_or("");
        h.strip_prefix("www.").unwrap_or(h)
    }
    host(a) == host(b)
}

fn same_page(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a.as_str().trim_end_matches('/') == b.as_str().trim_end_matches('/')
}
