//! # Report Module
//!
//! Turns a finished crawl into human- and machine-readable findings.
//!
//! ## Overview
//!
//! `CrawlReport` partitions the visited pages the way a site audit wants to
//! read them: live internal pages, live external pages, and pages that ended
//! with one of the configured error status codes, grouped under the page
//! that linked to them. The page-list files and the JSON rendering all come
//! from the same partition, so they can never disagree.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::error::CrawlError;
use crate::page::Page;

/// True when a page answered with usable HTML and a non-error status.
pub(crate) fn is_live_html(page: &Page, error_codes: &[u16]) -> bool {
    page.content_type.contains("text/html")
        && match page.status {
            Some(code) => !error_codes.contains(&code),
            None => false,
        }
}

/// Pages that ended with one error status, grouped by discovering parent.
#[derive(Debug, Serialize)]
pub struct ErrorGroup {
    /// The status code this group collects.
    pub status: u16,
    /// Whether the grouped pages are external to the crawled site.
    pub external: bool,
    /// Offending pages keyed by the parent that linked to them.
    pub by_parent: Vec<ParentPages>,
}

/// The pages one parent linked to.
#[derive(Debug, Serialize)]
pub struct ParentPages {
    pub parent: String,
    pub pages: Vec<String>,
}

/// Browser-probe findings for one page.
#[derive(Debug, Serialize)]
pub struct PageErrors {
    pub url: String,
    pub errors: Vec<String>,
}

/// The audit view of a finished crawl.
#[derive(Debug, Serialize)]
pub struct CrawlReport {
    pub total_visited: usize,
    pub internal_visited: usize,
    pub external_visited: usize,
    /// Live internal HTML pages, sorted by URL.
    pub internal_pages: Vec<String>,
    /// Live external HTML pages, sorted by URL.
    pub external_pages: Vec<String>,
    /// One group per configured code that actually occurred, internal first.
    pub error_groups: Vec<ErrorGroup>,
    /// Pages the browser probe flagged.
    pub js_errors: Vec<PageErrors>,
}

impl CrawlReport {
    /// Builds the report from the visited pages of a crawl.
    pub fn from_pages(pages: &[Page], error_codes: &[u16]) -> Self {
        let total_visited = pages.len();
        let external_visited = pages.iter().filter(|page| page.is_external()).count();
        let internal_visited = total_visited - external_visited;

        let mut internal_pages: Vec<String> = pages
            .iter()
            .filter(|page| !page.is_external() && is_live_html(page, error_codes))
            .map(|page| page.url().to_string())
            .collect();
        internal_pages.sort();

        let mut external_pages: Vec<String> = pages
            .iter()
            .filter(|page| page.is_external() && is_live_html(page, error_codes))
            .map(|page| page.url().to_string())
            .collect();
        external_pages.sort();

        let mut error_groups = Vec::new();
        for external in [false, true] {
            for &code in error_codes {
                if let Some(group) = collect_error_group(pages, code, external) {
                    error_groups.push(group);
                }
            }
        }

        let mut js_errors: Vec<PageErrors> = pages
            .iter()
            .filter(|page| !page.errors.is_empty())
            .map(|page| PageErrors {
                url: page.url().to_string(),
                errors: page.errors.clone(),
            })
            .collect();
        js_errors.sort_by(|a, b| a.url.cmp(&b.url));

        CrawlReport {
            total_visited,
            internal_visited,
            external_visited,
            internal_pages,
            external_pages,
            error_groups,
            js_errors,
        }
    }

    /// Total number of pages that ended with a configured error status.
    pub fn error_count(&self) -> usize {
        self.error_groups
            .iter()
            .map(|group| {
                group
                    .by_parent
                    .iter()
                    .map(|parent| parent.pages.len())
                    .sum::<usize>()
            })
            .sum()
    }

    /// Writes the internal and external page-list files into `dir`.
    pub fn write_page_lists(&self, dir: &Path) -> Result<(), CrawlError> {
        let internal_path = dir.join("all_internal_pages.txt");
        fs::write(&internal_path, list_body(&self.internal_pages))?;
        let external_path = dir.join("all_external_pages.txt");
        fs::write(&external_path, list_body(&self.external_pages))?;
        info!(
            "Wrote page lists to {} and {}",
            internal_path.display(),
            external_path.display()
        );
        Ok(())
    }

    /// Converts the report into a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String, CrawlError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn collect_error_group(pages: &[Page], status: u16, external: bool) -> Option<ErrorGroup> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for page in pages {
        if page.is_external() == external && page.status == Some(status) {
            let parent = page.parent().unwrap_or("(seed)").to_string();
            grouped
                .entry(parent)
                .or_default()
                .push(page.url().to_string());
        }
    }
    if grouped.is_empty() {
        return None;
    }
    let by_parent = grouped
        .into_iter()
        .map(|(parent, mut pages)| {
            pages.sort();
            ParentPages { parent, pages }
        })
        .collect();
    Some(ErrorGroup {
        status,
        external,
        by_parent,
    })
}

fn list_body(urls: &[String]) -> String {
    let mut body = urls.join("\n");
    if !body.is_empty() {
        body.push('\n');
    }
    body
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nCrawl Report")?;
        writeln!(f, "------------")?;
        writeln!(
            f,
            "  visited  : {} pages ({} internal, {} external)",
            self.total_visited, self.internal_visited, self.external_visited
        )?;
        writeln!(
            f,
            "  live html: {} internal, {} external",
            self.internal_pages.len(),
            self.external_pages.len()
        )?;
        writeln!(
            f,
            "  errors   : {} pages across {} groups",
            self.error_count(),
            self.error_groups.len()
        )?;

        for group in &self.error_groups {
            let scope = if group.external { "external" } else { "internal" };
            writeln!(f)?;
            writeln!(f, "Pages with response code {} ({scope}):", group.status)?;
            for parent in &group.by_parent {
                writeln!(f, "  found on {}:", parent.parent)?;
                for url in &parent.pages {
                    writeln!(f, "    {url}")?;
                }
            }
        }

        if !self.js_errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Pages with browser errors:")?;
            for entry in &self.js_errors {
                writeln!(f, "  {}:", entry.url)?;
                for error in &entry.errors {
                    writeln!(f, "    {error}")?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{CONTENT_TYPE_UNKNOWN, SchemePolicy, SiteContext};
    use std::sync::Arc;
    use url::Url;

    fn site() -> Arc<SiteContext> {
        Arc::new(SiteContext {
            base_domain: "example.com".to_string(),
            base_site: "http://example.com".to_string(),
            always_external: Vec::new(),
            scheme_policy: SchemePolicy::Collapse,
        })
    }

    fn visited_page(
        url: &str,
        parent: Option<&str>,
        status: Option<u16>,
        content_type: &str,
        site: &Arc<SiteContext>,
    ) -> Page {
        let mut page = Page::from_url(Url::parse(url).unwrap(), parent, site);
        page.status = status;
        page.content_type = content_type.to_string();
        page
    }

    fn sample_pages(site: &Arc<SiteContext>) -> Vec<Page> {
        vec![
            visited_page("http://example.com/", None, Some(200), "text/html", site),
            visited_page(
                "http://example.com/a",
                Some("http://example.com/"),
                Some(200),
                "text/html; charset=utf-8",
                site,
            ),
            visited_page(
                "http://example.com/gone",
                Some("http://example.com/"),
                Some(404),
                CONTENT_TYPE_UNKNOWN,
                site,
            ),
            visited_page(
                "http://example.com/also-gone",
                Some("http://example.com/a"),
                Some(404),
                CONTENT_TYPE_UNKNOWN,
                site,
            ),
            visited_page(
                "http://example.com/broken",
                Some("http://example.com/a"),
                Some(500),
                CONTENT_TYPE_UNKNOWN,
                site,
            ),
            visited_page(
                "http://partner.net/",
                Some("http://example.com/"),
                Some(200),
                "text/html",
                site,
            ),
            visited_page(
                "http://example.com/doc.pdf",
                Some("http://example.com/"),
                Some(200),
                "application/pdf",
                site,
            ),
        ]
    }

    #[test]
    fn partitions_live_pages_by_locality() {
        let site = site();
        let report = CrawlReport::from_pages(&sample_pages(&site), &[404, 500]);

        assert_eq!(report.total_visited, 7);
        assert_eq!(report.internal_visited, 6);
        assert_eq!(report.external_visited, 1);
        assert_eq!(
            report.internal_pages,
            vec!["http://example.com/", "http://example.com/a"]
        );
        assert_eq!(report.external_pages, vec!["http://partner.net/"]);
    }

    #[test]
    fn groups_error_pages_by_code_and_parent() {
        let site = site();
        let report = CrawlReport::from_pages(&sample_pages(&site), &[404, 500]);

        assert_eq!(report.error_groups.len(), 2);
        let first = &report.error_groups[0];
        assert_eq!(first.status, 404);
        assert!(!first.external);
        assert_eq!(first.by_parent.len(), 2);
        assert_eq!(first.by_parent[0].parent, "http://example.com/");
        assert_eq!(first.by_parent[0].pages, vec!["http://example.com/gone"]);
        assert_eq!(first.by_parent[1].parent, "http://example.com/a");
        assert_eq!(
            first.by_parent[1].pages,
            vec!["http://example.com/also-gone"]
        );
        assert_eq!(report.error_count(), 3);
    }

    #[test]
    fn non_configured_codes_are_not_grouped() {
        let site = site();
        let report = CrawlReport::from_pages(&sample_pages(&site), &[500]);

        assert_eq!(report.error_groups.len(), 1);
        assert_eq!(report.error_groups[0].status, 500);
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn page_lists_land_in_files() {
        let site = site();
        let report = CrawlReport::from_pages(&sample_pages(&site), &[404, 500]);

        let dir = tempfile::tempdir().unwrap();
        report.write_page_lists(dir.path()).unwrap();

        let internal = fs::read_to_string(dir.path().join("all_internal_pages.txt")).unwrap();
        assert_eq!(internal, "http://example.com/\nhttp://example.com/a\n");
        let external = fs::read_to_string(dir.path().join("all_external_pages.txt")).unwrap();
        assert_eq!(external, "http://partner.net/\n");
    }

    #[test]
    fn display_lists_error_pages_under_their_parent() {
        let site = site();
        let report = CrawlReport::from_pages(&sample_pages(&site), &[404, 500]);

        let rendered = format!("{report}");
        assert!(rendered.contains("Pages with response code 404 (internal):"));
        assert!(rendered.contains("  found on http://example.com/:"));
        assert!(rendered.contains("    http://example.com/gone"));
    }

    #[test]
    fn probe_findings_appear_in_the_report() {
        let site = site();
        let mut pages = sample_pages(&site);
        pages[1].errors = vec!["TypeError: x is undefined".to_string()];

        let report = CrawlReport::from_pages(&pages, &[404]);
        assert_eq!(report.js_errors.len(), 1);
        assert_eq!(report.js_errors[0].url, "http://example.com/a");
        assert!(format!("{report}").contains("Pages with browser errors:"));
    }
}
