use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::debug;

use coffeehaus_types::search::{SearchOptions, SearchResult};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /search?q=&lat=&lng=&radius=&limit=&offset=`
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Json<SearchResult>> {
    let opts = parse_options(&params)?;
    let service = state
        .search
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("search is not configured".into()))?;

    debug!("Search request: {:?}", opts);
    let result = service.search(opts).await?;
    Ok(Json(result))
}

/// Builds search options from the raw query string. `q` is required; numeric
/// parameters that do not parse, and coordinates that are not finite, are ignored.
pub fn parse_options(params: &HashMap<String, String>) -> ApiResult<SearchOptions> {
    let query = params
        .get("q")
        .map(|q| q.trim())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("query parameter 'q' is required".into()))?;

    fn num<T: std::str::FromStr + Default>(params: &HashMap<String, String>, key: &str) -> T {
        params
            .get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }

    fn coord(params: &HashMap<String, String>, key: &str) -> f64 {
        let value: f64 = num(params, key);
        if value.is_finite() { value } else { 0.0 }
    }

    Ok(SearchOptions {
        query: query.to_string(),
        lat: coord(params, "lat"),
        lng: coord(params, "lng"),
        radius: num(params, "radius"),
        limit: num(params, "limit"),
        offset: num(params, "offset"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn missing_query_is_rejected() {
        assert!(matches!(parse_options(&params(&[])), Err(ApiError::BadRequest(_))));
        assert!(matches!(parse_options(&params(&[("q", "  ")])), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn unparsable_numbers_are_ignored() {
        let opts = parse_options(&params(&[
            ("q", "matcha"),
            ("lat", "33.77"),
            ("lng", "abc"),
            ("limit", "-3"),
            ("offset", "20"),
        ]))
        .unwrap();
        assert_eq!(opts.query, "matcha");
        assert_eq!(opts.lat, 33.77);
        assert_eq!(opts.lng, 0.0);
        assert_eq!(opts.limit, 0);
        assert_eq!(opts.offset, 20);
    }

    #[test]
    fn out_of_range_numbers_are_ignored() {
        let opts = parse_options(&params(&[
            ("q", "matcha"),
            ("lat", "NaN"),
            ("lng", "inf"),
            ("radius", "99999999999"),
            ("limit", "184467440737095516160"),
            ("offset", "18446744073709551615"),
        ]))
        .unwrap();
        assert_eq!(opts.lat, 0.0);
        assert_eq!(opts.lng, 0.0);
        assert_eq!(opts.radius, 0);
        assert_eq!(opts.limit, 0);
        assert_eq!(opts.offset, usize::MAX);
    }
}
