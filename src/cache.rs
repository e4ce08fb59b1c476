//! Per-resource page cache for the list views.
//!
//! The consuming view pages through stargazers or contributors and must not
//! re-fetch pages it has already seen. The cache is scoped to one
//! (owner, repo) pair and swapped wholesale when the active repository
//! changes; entries never expire on their own — staleness is accepted for the
//! lifetime of a page view.

use std::collections::HashMap;

/// Totals shared by every page of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMeta {
    pub total_pages: u32,
    /// Exact once the last page has been observed; unknown until then for
    /// multi-page resources.
    pub total_count: Option<u64>,
}

/// Page store keyed by (resource, page) under one active (owner, repo).
#[derive(Debug)]
pub struct PageCache<T> {
    owner: String,
    repo: String,
    pages: HashMap<(String, u32), Vec<T>>,
    meta: HashMap<String, ResourceMeta>,
}

impl<T> PageCache<T> {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            pages: HashMap::new(),
            meta: HashMap::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Point the cache at a repository. Changing the pair discards the whole
    /// store; re-selecting the current pair keeps it.
    pub fn switch_repo(&mut self, owner: &str, repo: &str) {
        if self.owner != owner || self.repo != repo {
            *self = Self::new(owner, repo);
        }
    }

    /// Drop every entry, keeping the active repository.
    pub fn invalidate(&mut self) {
        self.pages.clear();
        self.meta.clear();
    }

    pub fn get(&self, resource: &str, page: u32) -> Option<&[T]> {
        self.pages
            .get(&(resource.to_string(), page))
            .map(|data| data.as_slice())
    }

    pub fn meta(&self, resource: &str) -> Option<&ResourceMeta> {
        self.meta.get(resource)
    }

    /// Store a fetched page along with the pagination metadata observed on
    /// the response. `last_page` is the `rel="last"` number parsed from the
    /// `Link` header; its absence means the resource fits a single page.
    ///
    /// The first observed totals win and are never downgraded; the only later
    /// change allowed is filling in an exact `total_count` once the last page
    /// itself is fetched.
    pub fn put(
        &mut self,
        resource: &str,
        page: u32,
        data: Vec<T>,
        per_page: usize,
        last_page: Option<u32>,
    ) {
        let item_count = data.len() as u64;

        let meta = self
            .meta
            .entry(resource.to_string())
            .or_insert_with(|| match last_page {
                None => ResourceMeta {
                    total_pages: 1,
                    total_count: Some(item_count),
                },
                Some(last) => ResourceMeta {
                    total_pages: last.max(1),
                    total_count: None,
                },
            });

        if meta.total_count.is_none() && page == meta.total_pages {
            // The last page is never empty upstream, so this sum is exact.
            meta.total_count =
                Some((u64::from(meta.total_pages) - 1) * per_page as u64 + item_count);
        }

        self.pages.insert((resource.to_string(), page), data);
    }
}
