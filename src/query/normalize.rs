//! Filter normalization: one request, one backend's parameter set

use super::{validate_query, Category, SearchRequest};
use crate::engines::{BackendCapabilities, RequestParams};
use crate::error::Result;
use tracing::debug;

/// Map a request onto the parameters a backend can express.
///
/// Filters the backend does not support are dropped, not rejected. The
/// only failure is an empty or over-long query.
pub fn normalize(request: &SearchRequest, caps: &BackendCapabilities) -> Result<RequestParams> {
    let query = validate_query(&request.query)?;

    let time_range = match request.time_range() {
        Some(range) if caps.time_range => Some(range),
        Some(range) => {
            debug!(%range, "dropping time filter");
            None
        }
        None => None,
    };

    let category = if caps.supports_category(request.category) {
        request.category
    } else {
        debug!(category = %request.category, "dropping category filter");
        Category::Web
    };

    let language = request.language.clone().filter(|_| caps.language);
    if request.language.is_some() && language.is_none() {
        debug!("dropping language filter");
    }

    let country = request.country.clone().filter(|_| caps.country);
    if request.country.is_some() && country.is_none() {
        debug!("dropping country filter");
    }

    Ok(RequestParams {
        query,
        limit: request.limit,
        time_range,
        category,
        language,
        country,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::query::TimeRange;

    fn filtered_request() -> SearchRequest {
        let mut request = SearchRequest::new("climate policy");
        request.country = Some("FR".to_string());
        request.language = Some("fr".to_string());
        request.recency_days = Some(30);
        request.category = Category::News;
        request.limit = 3;
        request
    }

    #[test]
    fn test_full_support_keeps_everything() {
        let caps = BackendCapabilities::new()
            .language()
            .country()
            .time_range()
            .categories(&[Category::News]);
        let params = normalize(&filtered_request(), &caps).unwrap();

        assert_eq!(params.query, "climate policy");
        assert_eq!(params.limit, 3);
        assert_eq!(params.category, Category::News);
        assert_eq!(params.language.as_deref(), Some("fr"));
        assert_eq!(params.country.as_deref(), Some("FR"));
        assert_eq!(params.time_range, Some(TimeRange::Month));
    }

    #[test]
    fn test_unsupported_filters_are_dropped() {
        let caps = BackendCapabilities::new().language();
        let params = normalize(&filtered_request(), &caps).unwrap();

        assert_eq!(params.category, Category::Web);
        assert_eq!(params.language.as_deref(), Some("fr"));
        assert_eq!(params.country, None);
        assert_eq!(params.time_range, None);
    }

    #[test]
    fn test_empty_query_is_an_error() {
        let request = SearchRequest::new("");
        let err = normalize(&request, &BackendCapabilities::new()).unwrap_err();
        assert!(matches!(err, SearchError::InvalidFilter(_)));
    }

    #[test]
    fn test_long_query_is_an_error() {
        let request = SearchRequest::new("x".repeat(201));
        assert!(normalize(&request, &BackendCapabilities::new()).is_err());
    }
}
