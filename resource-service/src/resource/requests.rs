//! Request payloads for the read actions

use serde::{Deserialize, Serialize};

use crate::repository::FilterCondition;

/// Fetch-by-id request
///
/// The id always comes from the path. Preloads come from a JSON body
/// `{"preloads": [..]}` or from the query string `?preloads=a,b`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRequest {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub preloads: Vec<String>,
}

impl IdRequest {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            preloads: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_preloads<I, S>(mut self, preloads: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preloads = preloads.into_iter().map(Into::into).collect();
        self
    }
}

/// Query-string form of the preload list
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PreloadQuery {
    #[serde(default)]
    pub(crate) preloads: Option<String>,
}

impl PreloadQuery {
    pub(crate) fn into_list(self) -> Vec<String> {
        self.preloads
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Filtered fetch request for First and List
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
}

/// Page request
///
/// A page of 0 reads as 1. A page size of 0 takes the service default and
/// larger sizes are clamped to the service maximum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub page_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_uses_camel_case() {
        let request: PageRequest = serde_json::from_str(
            r#"{"filters":[{"field":"name","operator":"=","value":"x"}],"page":2,"pageSize":5}"#,
        )
        .unwrap();
        assert_eq!(request.page, 2);
        assert_eq!(request.page_size, 5);
        assert_eq!(request.filters, vec![FilterCondition::eq("name", "x")]);
    }

    #[test]
    fn test_missing_fields_default() {
        let request: PageRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request, PageRequest::default());

        let request: FilterRequest = serde_json::from_str("{}").unwrap();
        assert!(request.filters.is_empty());
    }

    #[test]
    fn test_preload_query_splits_on_commas() {
        let query = PreloadQuery {
            preloads: Some("owner, parts,,".to_string()),
        };
        assert_eq!(query.into_list(), vec!["owner".to_string(), "parts".to_string()]);
        assert!(PreloadQuery::default().into_list().is_empty());
    }
}
