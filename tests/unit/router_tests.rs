// Route parsing tests

use placecreature::router::Route;
use rstest::rstest;

#[rstest]
#[case("GET", "/cat/300/200", "image")]
#[case("HEAD", "/cat/300/200", "image")]
#[case("GET", "/health", "health")]
#[case("GET", "/metrics", "metrics")]
#[case("GET", "/creatures", "creatures")]
#[case("GET", "/attribution", "attribution")]
#[case("GET", "/cat/300", "not_found")]
#[case("GET", "/cat/3x/200", "not_found")]
#[case("GET", "/health/", "not_found")]
#[case("PATCH", "/health", "method_not_allowed")]
fn test_route_labels(#[case] method: &str, #[case] path: &str, #[case] label: &str) {
    assert_eq!(Route::parse(method, path).label(), label);
}

#[test]
fn test_identifier_is_percent_decoded() {
    assert_eq!(
        Route::parse("GET", "/red%20panda/64/32"),
        Route::Image {
            identifier: "red panda".to_string(),
            width: 64,
            height: 32,
        }
    );
}
