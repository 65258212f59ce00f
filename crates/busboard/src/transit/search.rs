//! Route search

use super::types::{Bound, Route};

/// Filter routes by a free-text query
///
/// Matches the route number and English place names case-insensitively,
/// and Chinese place names verbatim. A blank query returns every route.
pub fn filter_routes<'a>(routes: &'a [Route], query: &str) -> Vec<&'a Route> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return routes.iter().collect();
    }
    let lower = trimmed.to_lowercase();

    routes
        .iter()
        .filter(|r| {
            r.route.to_lowercase().contains(&lower)
                || r.orig_en.to_lowercase().contains(&lower)
                || r.dest_en.to_lowercase().contains(&lower)
                || r.orig_tc.contains(trimmed)
                || r.dest_tc.contains(trimmed)
        })
        .collect()
}

/// First route with the given number and direction
pub fn find_route<'a>(routes: &'a [Route], route_id: &str, bound: Bound) -> Option<&'a Route> {
    routes.iter().find(|r| r.matches(route_id, bound))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> Vec<Route> {
        vec![
            Route::new("1", Bound::Outbound, "1")
                .with_origin("CHUK YUEN ESTATE", "竹園邨")
                .with_destination("STAR FERRY", "尖沙咀碼頭"),
            Route::new("1", Bound::Inbound, "1")
                .with_origin("STAR FERRY", "尖沙咀碼頭")
                .with_destination("CHUK YUEN ESTATE", "竹園邨"),
            Route::new("1A", Bound::Outbound, "1")
                .with_origin("STAR FERRY", "尖沙咀碼頭")
                .with_destination("SAU MAU PING (CENTRAL)", "秀茂坪(中)"),
            Route::new("960", Bound::Outbound, "1")
                .with_origin("TUEN MUN (KIN SANG ESTATE)", "屯門(建生邨)")
                .with_destination("WAN CHAI NORTH", "灣仔北"),
        ]
    }

    #[test]
    fn test_empty_query_returns_all() {
        let all = routes();
        assert_eq!(filter_routes(&all, "").len(), all.len());
        assert_eq!(filter_routes(&all, "   ").len(), all.len());
    }

    #[test]
    fn test_route_number_match() {
        let all = routes();
        let found = filter_routes(&all, "1a");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].route, "1A");
    }

    #[test]
    fn test_english_place_match_case_insensitive() {
        let all = routes();
        let found = filter_routes(&all, "  wan chai ");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].route, "960");
    }

    #[test]
    fn test_chinese_place_match() {
        let all = routes();
        let found = filter_routes(&all, "竹園");
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_order_preserved() {
        let all = routes();
        let found = filter_routes(&all, "star ferry");
        let keys: Vec<String> = found.iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec!["1-O-1", "1-I-1", "1A-O-1"]);
    }

    #[test]
    fn test_no_match() {
        let all = routes();
        assert!(filter_routes(&all, "airport").is_empty());
    }

    #[test]
    fn test_find_route() {
        let all = routes();
        let found = find_route(&all, "1", Bound::Inbound).unwrap();
        assert_eq!(found.orig_en, "STAR FERRY");
        assert!(find_route(&all, "1A", Bound::Inbound).is_none());
    }
}
