//! Per-site scraping profiles.
//!
//! A profile is pure data: where to start, how to find listing containers,
//! which locator chains feed each field, and which keyword sets gate
//! relevance. The pipeline stays generic over the profile it runs.

use url::Url;

use crate::extract::{source_label, FieldSpec};
use crate::filter::KeywordSet;

pub struct SiteProfile {
    /// Dataset name used for export filenames, e.g. `indeed_jobs`.
    pub dataset: String,
    /// Site origin used for URL resolution and the record source label.
    pub origin: String,
    /// Ordered chain of listing-container locators; first one that
    /// matches any nodes on the page wins.
    pub listing_locators: Vec<String>,
    pub field_specs: Vec<FieldSpec>,
    pub keyword_sets: Vec<KeywordSet>,
    seed_url: String,
    /// Listings per results page, for pagination; `None` means the site
    /// is scraped as a single page.
    page_stride: Option<u32>,
}

impl SiteProfile {
    /// Looks up a profile by name. Unknown names list the known ones in
    /// the error so a config typo is self-explanatory.
    pub fn by_name(name: &str, query: &str, location: &str) -> Result<Self, String> {
        match name {
            "indeed" => Ok(Self::indeed(query, location)),
            "craigslist" => Ok(Self::craigslist()),
            other => Err(format!(
                "unknown site profile '{other}' (known: indeed, craigslist)"
            )),
        }
    }

    pub fn source(&self) -> String {
        source_label(&self.origin)
    }

    /// Results-page URL for 0-based page `n`.
    pub fn page_url(&self, n: u32) -> String {
        match (self.page_stride, n) {
            (_, 0) | (None, _) => self.seed_url.clone(),
            (Some(stride), n) => format!("{}&start={}", self.seed_url, n * stride),
        }
    }

    /// How many result pages the profile supports walking.
    pub fn paginates(&self) -> bool {
        self.page_stride.is_some()
    }

    /// Indeed search results, filtered to internships and sorted by date.
    pub fn indeed(query: &str, location: &str) -> Self {
        let origin = "https://www.indeed.com";
        let seed_url = Url::parse_with_params(
            "https://www.indeed.com/jobs",
            &[
                ("q", format!("{query} internship")),
                ("l", location.to_string()),
                ("jt", "internship".to_string()),
                ("sort", "date".to_string()),
            ],
        )
        // Static base URL, parse cannot fail.
        .map(String::from)
        .unwrap_or_default();

        Self {
            dataset: "indeed_jobs".to_string(),
            origin: origin.to_string(),
            listing_locators: vec![
                "div[data-jk]".to_string(),
                ".jobsearch-SerpJobCard".to_string(),
                ".job_seen_beacon".to_string(),
                "[data-testid=\"job-result\"]".to_string(),
                ".slider_container .slider_item".to_string(),
            ],
            field_specs: vec![
                FieldSpec::attr(
                    "title",
                    &[
                        "h2 a span[title]",
                        "h2 a span",
                        "h2 span",
                        ".jobTitle a",
                        ".jobTitle span",
                        "a[data-jk] span",
                    ],
                    "title",
                ),
                FieldSpec::text(
                    "company",
                    &[
                        "[data-testid=\"company-name\"] a",
                        "[data-testid=\"company-name\"]",
                        ".companyName a",
                        ".companyName span",
                        ".companyName",
                    ],
                ),
                FieldSpec::text(
                    "location",
                    &[
                        "[data-testid=\"job-location\"]",
                        ".companyLocation",
                        ".locationsContainer",
                    ],
                ),
                FieldSpec::text(
                    "salary",
                    &[
                        "[data-testid=\"attribute_snippet_testid\"]",
                        ".salaryText",
                        ".salary-snippet",
                    ],
                ),
                FieldSpec::text(
                    "snippet",
                    &["[data-testid=\"job-snippet\"]", ".summary", ".jobSnippet"],
                ),
                FieldSpec::text(
                    "posting_date",
                    &["[data-testid=\"myJobsStateDate\"]", ".date"],
                ),
                FieldSpec::link("job_url", &["h2 a", ".jobTitle a", "a[data-jk]"], origin),
            ],
            keyword_sets: vec![
                KeywordSet::new([
                    "intern",
                    "internship",
                    "co-op",
                    "coop",
                    "summer program",
                    "student",
                ]),
                KeywordSet::new([
                    "software",
                    "developer",
                    "engineer",
                    "programming",
                    "coding",
                    "tech",
                ]),
            ],
            seed_url,
            page_stride: Some(10),
        }
    }

    /// Richmond craigslist software listings (thumb view), single page.
    pub fn craigslist() -> Self {
        let origin = "https://richmond.craigslist.org";
        Self {
            dataset: "craigslist_jobs".to_string(),
            origin: origin.to_string(),
            listing_locators: vec![
                "div.cl-search-result.cl-search-view-mode-thumb".to_string(),
                "div.cl-search-result".to_string(),
            ],
            field_specs: vec![
                // The result node carries the posting title as its own
                // `title` attribute; the label span is the fallback.
                FieldSpec::attr("title", &[":scope", "a .label", "a"], "title"),
                FieldSpec::text("snippet", &[".meta", ".result-meta"]),
                FieldSpec::link("job_url", &["a.posting-title", "a"], origin),
            ],
            keyword_sets: Vec::new(),
            seed_url: format!(
                "{origin}/search/richmond-va/sof?lat=37.551&lon=-77.459&search_distance=25"
            ),
            page_stride: None,
        }
    }
}
