//! Viewer-request cache-key integration tests.

#[cfg(test)]
mod tests {
    use nextedge_core::{HandlerKind, NextEdgeConfig};

    use crate::{edge_handler, fixture, fixture_json, signing_time};

    fn cache_key_config() -> NextEdgeConfig {
        NextEdgeConfig {
            handler: HandlerKind::CacheKey,
            ..NextEdgeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_should_derive_key_from_router_headers_and_bypass_cookie() {
        let handler = edge_handler(&cache_key_config());
        let response = handler
            .invoke(&fixture("viewer-request-page.json"), signing_time())
            .await
            .unwrap();

        assert_eq!(
            response["headers"]["x-open-next-cache-key"]["value"],
            "980311ba187b712d93aec9e2d3cdc3f8"
        );
        assert_eq!(response["headers"]["x-forwarded-host"]["value"], "www.example.com");
    }

    #[tokio::test]
    async fn test_should_derive_image_key_from_accept() {
        let handler = edge_handler(&cache_key_config());
        let response = handler
            .invoke(&fixture("viewer-request-image.json"), signing_time())
            .await
            .unwrap();

        assert_eq!(
            response["headers"]["x-open-next-cache-key"]["value"],
            "e3b573a7a4d54ebb7d70bbb49a2ca0b2"
        );
    }

    #[tokio::test]
    async fn test_should_copy_viewer_geolocation() {
        let handler = edge_handler(&cache_key_config());
        let response = handler
            .invoke(&fixture("viewer-request-page.json"), signing_time())
            .await
            .unwrap();

        let headers = &response["headers"];
        assert_eq!(headers["x-open-next-country"]["value"], "DE");
        assert_eq!(headers["x-open-next-city"]["value"], "Berlin");
        assert_eq!(headers["x-open-next-latitude"]["value"], "52.52000");
        assert_eq!(headers["x-open-next-longitude"]["value"], "13.40500");
        assert!(headers["x-open-next-region"].is_null());
    }

    #[tokio::test]
    async fn test_should_keep_uri_querystring_and_cookies() {
        let original = fixture_json("viewer-request-image.json");
        let handler = edge_handler(&cache_key_config());
        let response = handler
            .invoke(&fixture("viewer-request-image.json"), signing_time())
            .await
            .unwrap();

        assert_eq!(response["uri"], original["request"]["uri"]);
        assert_eq!(response["querystring"], original["request"]["querystring"]);
        assert_eq!(response["cookies"], original["request"]["cookies"]);
        assert_eq!(
            response["headers"]["accept"],
            original["request"]["headers"]["accept"]
        );
    }
}
