//! HTTP-backed navigator: fetches a page with `reqwest` and answers
//! locator queries over the parsed HTML with the `scraper` crate.
//!
//! `scraper::Html` is not `Send`, so page and node handles own their raw
//! HTML and re-parse per query. Queries here are infrequent (a handful of
//! locators per listing) and fragments are small, so the trade is cheap.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{ListingNode, NavError, Navigator, PageHandle};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

pub struct HttpNavigator {
    client: reqwest::Client,
}

impl HttpNavigator {
    pub fn new(timeout: Duration) -> Result<Self, NavError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Navigator for HttpNavigator {
    async fn open(&self, url: &str) -> Result<Box<dyn PageHandle>, NavError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NavError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let html = response.text().await?;
        debug!(url, bytes = html.len(), "page fetched");
        Ok(Box::new(HtmlPage::from_html(html)))
    }
}

/// A fetched page, held as raw HTML.
pub struct HtmlPage {
    html: String,
}

impl HtmlPage {
    pub fn from_html(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl PageHandle for HtmlPage {
    fn query_all(&self, locator: &str) -> Vec<Box<dyn ListingNode>> {
        let Ok(selector) = Selector::parse(locator) else {
            debug!(locator, "unparseable locator, treating as no matches");
            return Vec::new();
        };
        let document = Html::parse_document(&self.html);
        document
            .select(&selector)
            .map(|el| Box::new(HtmlNode::new(el.html())) as Box<dyn ListingNode>)
            .collect()
    }
}

/// One element subtree, held as its own HTML fragment.
pub struct HtmlNode {
    html: String,
}

impl HtmlNode {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Runs `f` against this node's own element inside a freshly parsed
    /// fragment. `parse_fragment` wraps content in an `<html>` root; the
    /// node itself is that root's first element child.
    fn with_element<T>(&self, f: impl FnOnce(ElementRef<'_>) -> T) -> Option<T> {
        let fragment = Html::parse_fragment(&self.html);
        let element = fragment
            .root_element()
            .children()
            .filter_map(ElementRef::wrap)
            .next()?;
        Some(f(element))
    }
}

impl ListingNode for HtmlNode {
    fn query_one(&self, locator: &str) -> Result<Option<Box<dyn ListingNode>>, NavError> {
        let selector = Selector::parse(locator)
            .map_err(|e| NavError::Query(format!("invalid locator '{locator}': {e}")))?;
        let fragment = Html::parse_fragment(&self.html);
        Ok(fragment
            .select(&selector)
            .next()
            .map(|el| Box::new(HtmlNode::new(el.html())) as Box<dyn ListingNode>))
    }

    fn read_text(&self) -> Result<String, NavError> {
        let fragment = Html::parse_fragment(&self.html);
        let joined = fragment
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join(" ");
        // Collapse runs of whitespace the way a browser renders them.
        Ok(joined.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    fn read_attribute(&self, name: &str) -> Result<Option<String>, NavError> {
        Ok(self
            .with_element(|el| el.value().attr(name).map(str::to_string))
            .flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <div class="job_seen_beacon" data-jk="abc123">
            <h2 class="jobTitle"><a href="/viewjob?jk=abc123"><span title="Software Intern"> Software Intern </span></a></h2>
            <span data-testid="company-name">Acme Corp</span>
            <div data-testid="job-snippet">Join our   engineering team
                as a summer intern</div>
        </div>
    "#;

    #[test]
    fn query_all_finds_listing_containers() {
        let page = HtmlPage::from_html(format!("<html><body>{LISTING}{LISTING}</body></html>"));
        assert_eq!(page.query_all("div[data-jk]").len(), 2);
        assert_eq!(page.query_all(".job_seen_beacon").len(), 2);
    }

    #[test]
    fn query_all_with_bad_locator_is_empty() {
        let page = HtmlPage::from_html("<html><body><div>x</div></body></html>");
        assert!(page.query_all("div[[[").is_empty());
    }

    #[test]
    fn query_one_returns_first_match_only() {
        let node = HtmlNode::new(LISTING);
        let title = node.query_one("h2 a span").unwrap().expect("span exists");
        assert_eq!(title.read_text().unwrap(), "Software Intern");
    }

    #[test]
    fn query_one_miss_is_none_not_error() {
        let node = HtmlNode::new(LISTING);
        assert!(node.query_one(".salaryText").unwrap().is_none());
    }

    #[test]
    fn query_one_invalid_locator_is_a_query_error() {
        let node = HtmlNode::new(LISTING);
        assert!(matches!(
            node.query_one("div[[["),
            Err(NavError::Query(_))
        ));
    }

    #[test]
    fn read_attribute_reads_own_element() {
        let node = HtmlNode::new(LISTING);
        let span = node
            .query_one("h2 a span[title]")
            .unwrap()
            .expect("titled span");
        assert_eq!(
            span.read_attribute("title").unwrap().as_deref(),
            Some("Software Intern")
        );
        assert_eq!(span.read_attribute("missing").unwrap(), None);
    }

    #[test]
    fn read_text_collapses_whitespace() {
        let node = HtmlNode::new(LISTING);
        let snippet = node
            .query_one("[data-testid=\"job-snippet\"]")
            .unwrap()
            .expect("snippet exists");
        assert_eq!(
            snippet.read_text().unwrap(),
            "Join our engineering team as a summer intern"
        );
    }

    #[test]
    fn href_attribute_survives_fragment_round_trip() {
        let node = HtmlNode::new(LISTING);
        let link = node.query_one("h2 a").unwrap().expect("anchor exists");
        assert_eq!(
            link.read_attribute("href").unwrap().as_deref(),
            Some("/viewjob?jk=abc123")
        );
    }
}
