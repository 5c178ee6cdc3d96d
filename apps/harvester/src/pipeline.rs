//! The scrape run: page walk, node extraction, filtering, optional
//! scoring, persistence, and the final export.
//!
//! Failure containment is the organizing rule. A bad node loses one
//! record, a bad page stops paging but keeps what was collected, a
//! scorer failure downgrades one record to unscored, and the export of
//! whatever accumulated always runs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::errors::PipelineError;
use crate::export::{self, ExportFormat};
use crate::extract::{self, ExtractedRecord, SENTINEL};
use crate::filter;
use crate::nav::Navigator;
use crate::scorer::{listing_text, CompatibilityScorer};
use crate::sites::SiteProfile;
use crate::store::{DedupPolicy, JobStore, PersistResult};

/// Random pause between page fetches, mimicking a human reading pace.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    min_ms: u64,
    max_ms: u64,
}

impl Throttle {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms,
            max_ms: max_ms.max(min_ms),
        }
    }

    pub async fn pause(&self) {
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Everything one run needs, passed explicitly.
pub struct RunContext {
    pub navigator: Box<dyn Navigator>,
    pub store: JobStore,
    pub scorer: Option<Box<dyn CompatibilityScorer>>,
    pub resume_text: Option<String>,
    pub throttle: Throttle,
    pub dedup_policy: DedupPolicy,
}

/// Counters reported at the end of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub pages_visited: u32,
    pub nodes_seen: usize,
    pub extracted: usize,
    pub relevant: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub skipped: usize,
    pub export_paths: Vec<PathBuf>,
}

impl RunSummary {
    pub fn report(&self) {
        println!("\n=== Scrape summary ===");
        println!("Pages visited:    {}", self.pages_visited);
        println!("Listings seen:    {}", self.nodes_seen);
        println!("Extracted:        {}", self.extracted);
        println!("Relevant:         {}", self.relevant);
        println!("Stored (new):     {}", self.inserted);
        println!("Refreshed:        {}", self.replaced);
        println!("Skipped (known):  {}", self.skipped);
        if self.export_paths.is_empty() {
            println!("Exports:          none");
        } else {
            for path in &self.export_paths {
                println!("Exported:         {}", path.display());
            }
        }
    }
}

/// Runs one full scrape of `profile`, up to `max_pages` result pages.
///
/// Only export I/O can surface an error here; every scraping failure is
/// contained and reflected in the summary instead.
pub async fn run(
    ctx: &RunContext,
    profile: &SiteProfile,
    max_pages: u32,
    results_dir: &Path,
) -> Result<RunSummary, PipelineError> {
    let source = profile.source();
    let mut summary = RunSummary::default();
    let mut batch: Vec<ExtractedRecord> = Vec::new();

    let pages = if profile.paginates() { max_pages } else { 1 };
    for page_index in 0..pages {
        if page_index > 0 {
            ctx.throttle.pause().await;
        }

        let url = profile.page_url(page_index);
        info!(page = page_index + 1, %url, "Fetching results page");

        let page = match ctx.navigator.open(&url).await {
            Ok(page) => page,
            Err(err) => {
                warn!(%url, %err, "page fetch failed, stopping pagination");
                break;
            }
        };
        summary.pages_visited += 1;

        let nodes = first_matching_chain(page.as_ref(), &profile.listing_locators);
        if nodes.is_empty() {
            info!(page = page_index + 1, "No listings found, stopping pagination");
            break;
        }
        summary.nodes_seen += nodes.len();

        for node in &nodes {
            let mut record = extract::extract(node.as_ref(), &profile.field_specs, &source);

            // A listing without even a title is markup noise, not a job.
            if record.get_or_sentinel("title") == SENTINEL {
                continue;
            }
            summary.extracted += 1;

            if !filter::is_relevant(&record, &profile.keyword_sets) {
                continue;
            }
            summary.relevant += 1;

            if let (Some(scorer), Some(resume)) = (&ctx.scorer, &ctx.resume_text) {
                match scorer.score(resume, &listing_text(&record)).await {
                    Ok(verdict) => record.compatibility = Some(verdict),
                    Err(err) => {
                        warn!(
                            title = record.get_or_sentinel("title"),
                            %err,
                            "scoring failed, storing record unscored"
                        );
                    }
                }
            }

            match ctx.store.persist(&record, ctx.dedup_policy).await {
                Ok(PersistResult::Inserted) => summary.inserted += 1,
                Ok(PersistResult::Replaced) => summary.replaced += 1,
                Ok(PersistResult::Skipped) => summary.skipped += 1,
                Err(err) => {
                    warn!(
                        job_url = record.get_or_sentinel("job_url"),
                        %err,
                        "persist failed, continuing with next listing"
                    );
                }
            }
            batch.push(record);
        }
    }

    summary.export_paths = export::export(
        &batch,
        results_dir,
        &profile.dataset,
        &[ExportFormat::Csv, ExportFormat::Json],
    )?;

    Ok(summary)
}

/// Walks the listing-locator chain and returns the nodes from the first
/// locator that matches anything on the page.
fn first_matching_chain(
    page: &dyn crate::nav::PageHandle,
    locators: &[String],
) -> Vec<Box<dyn crate::nav::ListingNode>> {
    for locator in locators {
        let nodes = page.query_all(locator);
        if !nodes.is_empty() {
            info!(locator, count = nodes.len(), "Found job listings");
            return nodes;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::{NavError, PageHandle};
    use async_trait::async_trait;

    /// Serves canned HTML pages keyed by exact URL; anything else 404s.
    struct FakeNavigator {
        pages: Vec<(String, String)>,
    }

    #[async_trait]
    impl Navigator for FakeNavigator {
        async fn open(&self, url: &str) -> Result<Box<dyn PageHandle>, NavError> {
            let html = self
                .pages
                .iter()
                .find(|(u, _)| u == url)
                .map(|(_, html)| html.clone());
            match html {
                Some(html) => Ok(Box::new(crate::nav::http::HtmlPage::from_html(html))),
                None => Err(NavError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    fn listing(title: &str, snippet: &str, jk: &str) -> String {
        format!(
            r#"<div data-jk="{jk}">
                 <h2><a href="/viewjob?jk={jk}"><span title="{title}">{title}</span></a></h2>
                 <span data-testid="company-name">Acme Corp</span>
                 <div data-testid="job-location">Richmond, VA</div>
                 <div data-testid="job-snippet">{snippet}</div>
               </div>"#
        )
    }

    fn indeed_page(listings: &[String]) -> String {
        format!("<html><body>{}</body></html>", listings.join("\n"))
    }

    fn instant_throttle() -> Throttle {
        Throttle::new(0, 0)
    }

    struct FixedScorer(&'static str);

    #[async_trait]
    impl CompatibilityScorer for FixedScorer {
        async fn score(&self, _resume: &str, _listing: &str) -> Result<String, PipelineError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingScorer;

    #[async_trait]
    impl CompatibilityScorer for FailingScorer {
        async fn score(&self, _resume: &str, _listing: &str) -> Result<String, PipelineError> {
            Err(PipelineError::Llm("model unavailable".to_string()))
        }
    }

    async fn memory_store() -> JobStore {
        JobStore::connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite")
    }

    #[tokio::test]
    async fn full_run_extracts_filters_persists_and_exports() {
        let profile = SiteProfile::indeed("software", "Richmond, VA");
        let page = indeed_page(&[
            listing("Software Engineering Intern", "Write Rust services", "1"),
            listing("Forklift Operator", "Warehouse work", "2"),
        ]);
        let ctx = RunContext {
            navigator: Box::new(FakeNavigator {
                pages: vec![(profile.page_url(0), page)],
            }),
            store: memory_store().await,
            scorer: None,
            resume_text: None,
            throttle: instant_throttle(),
            dedup_policy: DedupPolicy::Ignore,
        };
        let dir = tempfile::tempdir().unwrap();

        let summary = run(&ctx, &profile, 1, dir.path()).await.unwrap();

        assert_eq!(summary.pages_visited, 1);
        assert_eq!(summary.nodes_seen, 2);
        assert_eq!(summary.extracted, 2);
        // Forklift listing fails the software keyword set.
        assert_eq!(summary.relevant, 1);
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.export_paths.len(), 2);
        assert_eq!(ctx.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_page_keeps_earlier_results() {
        let profile = SiteProfile::indeed("software", "Richmond, VA");
        let page_one = indeed_page(&[listing(
            "Software Intern",
            "Programming internship",
            "1",
        )]);
        // Page two is not served: the navigator returns 404 for it.
        let ctx = RunContext {
            navigator: Box::new(FakeNavigator {
                pages: vec![(profile.page_url(0), page_one)],
            }),
            store: memory_store().await,
            scorer: None,
            resume_text: None,
            throttle: instant_throttle(),
            dedup_policy: DedupPolicy::Ignore,
        };
        let dir = tempfile::tempdir().unwrap();

        let summary = run(&ctx, &profile, 3, dir.path()).await.unwrap();

        assert_eq!(summary.pages_visited, 1);
        assert_eq!(summary.inserted, 1);
        // The partial batch is still exported.
        assert_eq!(summary.export_paths.len(), 2);
    }

    #[tokio::test]
    async fn scorer_verdict_lands_in_the_stored_row() {
        let profile = SiteProfile::indeed("software", "Richmond, VA");
        let page = indeed_page(&[listing("Software Intern", "Coding internship", "1")]);
        let ctx = RunContext {
            navigator: Box::new(FakeNavigator {
                pages: vec![(profile.page_url(0), page)],
            }),
            store: memory_store().await,
            scorer: Some(Box::new(FixedScorer("<match_score>85%</match_score>"))),
            resume_text: Some("Rust developer, three internships".to_string()),
            throttle: instant_throttle(),
            dedup_policy: DedupPolicy::Ignore,
        };
        let dir = tempfile::tempdir().unwrap();

        run(&ctx, &profile, 1, dir.path()).await.unwrap();

        let rows = ctx.store.fetch_all().await.unwrap();
        assert_eq!(
            rows[0].compatibility.as_deref(),
            Some("<match_score>85%</match_score>")
        );
    }

    #[tokio::test]
    async fn scorer_failure_stores_record_unscored() {
        let profile = SiteProfile::indeed("software", "Richmond, VA");
        let page = indeed_page(&[listing("Software Intern", "Coding internship", "1")]);
        let ctx = RunContext {
            navigator: Box::new(FakeNavigator {
                pages: vec![(profile.page_url(0), page)],
            }),
            store: memory_store().await,
            scorer: Some(Box::new(FailingScorer)),
            resume_text: Some("resume".to_string()),
            throttle: instant_throttle(),
            dedup_policy: DedupPolicy::Ignore,
        };
        let dir = tempfile::tempdir().unwrap();

        let summary = run(&ctx, &profile, 1, dir.path()).await.unwrap();

        assert_eq!(summary.inserted, 1);
        let rows = ctx.store.fetch_all().await.unwrap();
        assert_eq!(rows[0].compatibility, None);
    }

    #[tokio::test]
    async fn persist_failure_does_not_abort_the_batch() {
        let profile = SiteProfile::indeed("software", "Richmond, VA");
        let page = indeed_page(&[
            listing("Software Intern", "Programming internship", "1"),
            listing("Backend Engineer Intern", "Coding internship", "2"),
        ]);

        let dir = tempfile::tempdir().unwrap();
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("jobs.db").display()
        );
        let store = JobStore::connect(&db_url).await.unwrap();

        // Break storage behind the store's back: every persist from here
        // on fails with "no such table".
        let second_conn = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await
            .unwrap();
        sqlx::query("DROP TABLE jobs")
            .execute(&second_conn)
            .await
            .unwrap();

        let ctx = RunContext {
            navigator: Box::new(FakeNavigator {
                pages: vec![(profile.page_url(0), page)],
            }),
            store,
            scorer: None,
            resume_text: None,
            throttle: instant_throttle(),
            dedup_policy: DedupPolicy::Ignore,
        };
        let out_dir = dir.path().join("results");

        let summary = run(&ctx, &profile, 1, &out_dir).await.unwrap();

        // Both listings survive extraction and filtering, neither lands
        // in the store, and the batch is still exported.
        assert_eq!(summary.relevant, 2);
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.export_paths.len(), 2);
    }

    #[tokio::test]
    async fn overwrite_policy_counts_refreshed_rows_separately() {
        let profile = SiteProfile::indeed("software", "Richmond, VA");
        // Same job_url twice in one page: second occurrence refreshes.
        let page = indeed_page(&[
            listing("Software Intern", "Programming internship", "1"),
            listing("Software Intern (reposted)", "Programming internship", "1"),
        ]);
        let ctx = RunContext {
            navigator: Box::new(FakeNavigator {
                pages: vec![(profile.page_url(0), page)],
            }),
            store: memory_store().await,
            scorer: None,
            resume_text: None,
            throttle: instant_throttle(),
            dedup_policy: DedupPolicy::Overwrite,
        };
        let dir = tempfile::tempdir().unwrap();

        let summary = run(&ctx, &profile, 1, dir.path()).await.unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.replaced, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(ctx.store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn untitled_listings_are_dropped_before_filtering() {
        let profile = SiteProfile::indeed("software", "Richmond, VA");
        let noise = r#"<div data-jk="x"><p>sponsored placeholder</p></div>"#.to_string();
        let page = indeed_page(&[
            noise,
            listing("Software Intern", "Programming internship", "1"),
        ]);
        let ctx = RunContext {
            navigator: Box::new(FakeNavigator {
                pages: vec![(profile.page_url(0), page)],
            }),
            store: memory_store().await,
            scorer: None,
            resume_text: None,
            throttle: instant_throttle(),
            dedup_policy: DedupPolicy::Ignore,
        };
        let dir = tempfile::tempdir().unwrap();

        let summary = run(&ctx, &profile, 1, dir.path()).await.unwrap();

        assert_eq!(summary.nodes_seen, 2);
        assert_eq!(summary.extracted, 1);
    }
}
