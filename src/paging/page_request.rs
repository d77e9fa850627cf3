use crate::config::PaginationConfig;

use super::error::PagingError;
use super::page_order::PageOrder;
use super::types::{PageRequest, SortOrder, SortProperty};

/// Raw paging parameters as they arrived on the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageParams {
    pub page: Option<String>,
    pub size: Option<String>,
    pub sort: Vec<String>,
}

impl PageParams {
    /// Collect `page`, `size` and every `sort` value from a raw query string.
    /// Unrelated keys are ignored; the last `page`/`size` wins.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = PageParams::default();
        let Some(query) = query else {
            return params;
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => params.page = Some(value.into_owned()),
                "size" => params.size = Some(value.into_owned()),
                "sort" => params.sort.push(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// Defaults applied when a caller leaves a paging parameter out.
#[derive(Debug, Clone, PartialEq)]
pub struct PageDefaults {
    pub page: u32,
    pub size: u32,
    pub max_size: u32,
    pub sort: Vec<SortOrder>,
}

impl PageDefaults {
    pub fn from_config(config: &PaginationConfig) -> Result<Self, PagingError> {
        let sort = PageOrder::parse_sort_param(&config.default_sort)
            .map_err(|e| PagingError::InvalidDefaultSort(e.to_string()))?;
        let max_size = config.max_size.max(1);
        Ok(Self {
            page: config.default_page,
            size: config.default_size.clamp(1, max_size),
            max_size,
            sort,
        })
    }

    /// Merge caller parameters over the defaults. A caller-supplied sort
    /// replaces the default sort entirely.
    pub fn resolve(&self, params: &PageParams) -> Result<PageRequest, PagingError> {
        let page = params
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 0)
            .map(|p| p.min(i64::from(u32::MAX)) as u32)
            .unwrap_or(self.page);

        let size = params
            .size
            .as_deref()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|s| *s >= 1)
            .map(|s| s.min(i64::from(self.max_size)) as u32)
            .unwrap_or(self.size);

        let requested = PageOrder::parse_all(&params.sort)?;
        let sort = if requested.is_empty() { self.sort.clone() } else { requested };

        Ok(PageRequest::new(page, size, sort))
    }
}

impl Default for PageDefaults {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            max_size: 2000,
            sort: vec![SortOrder::asc(SortProperty::Amount)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: &str) -> PageParams {
        PageParams::from_query(Some(query))
    }

    #[test]
    fn empty_query_resolves_to_defaults() {
        let req = PageDefaults::default().resolve(&PageParams::from_query(None)).unwrap();
        assert_eq!(req, PageRequest::new(0, 20, vec![SortOrder::asc(SortProperty::Amount)]));
    }

    #[test]
    fn caller_values_override_defaults() {
        let req = PageDefaults::default().resolve(&params("page=0&size=1&sort=amount,desc")).unwrap();
        assert_eq!(req, PageRequest::new(0, 1, vec![SortOrder::desc(SortProperty::Amount)]));
    }

    #[test]
    fn caller_sort_replaces_default_wholesale() {
        let req = PageDefaults::default().resolve(&params("sort=id,desc")).unwrap();
        assert_eq!(req.sort, vec![SortOrder::desc(SortProperty::Id)]);
    }

    #[test]
    fn collects_repeated_sort_params() {
        let p = params("sort=amount%2Cdesc&sort=id&tenant=x");
        assert_eq!(p.sort, vec!["amount,desc".to_string(), "id".to_string()]);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let req = PageDefaults::default().resolve(&params("page=-3&size=abc")).unwrap();
        assert_eq!(req.page, 0);
        assert_eq!(req.size, 20);

        let req = PageDefaults::default().resolve(&params("size=0")).unwrap();
        assert_eq!(req.size, 20);
    }

    #[test]
    fn size_is_clamped_to_max() {
        let req = PageDefaults::default().resolve(&params("size=50000")).unwrap();
        assert_eq!(req.size, 2000);
    }

    #[test]
    fn offset_is_page_times_size() {
        let req = PageDefaults::default().resolve(&params("page=3&size=7")).unwrap();
        assert_eq!(req.offset(), 21);
        assert_eq!(req.limit(), 7);
    }

    #[test]
    fn unknown_sort_property_is_an_error() {
        let err = PageDefaults::default().resolve(&params("sort=owner")).unwrap_err();
        assert_eq!(err, PagingError::UnknownProperty("owner".to_string()));
    }

    #[test]
    fn default_matches_default_config() {
        assert_eq!(PageDefaults::from_config(&PaginationConfig::default()).unwrap(), PageDefaults::default());
    }

    #[test]
    fn rejects_bad_default_sort_in_config() {
        let config = PaginationConfig { default_sort: "balance".to_string(), ..PaginationConfig::default() };
        assert!(matches!(PageDefaults::from_config(&config), Err(PagingError::InvalidDefaultSort(_))));
    }
}
