//! Origin-request signing integration tests.

#[cfg(test)]
mod tests {
    use nextedge_core::NextEdgeConfig;
    use nextedge_edge::{EdgeError, EdgeHandler, OriginAuthHandler};
    use nextedge_model::{CfRequest, OriginRequestEvent};

    use crate::{credential_provider, edge_handler, fixture, fixture_json, signing_time};

    fn header<'a>(response: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
        &response["headers"][name]
    }

    #[tokio::test]
    async fn test_should_sign_function_url_request() {
        let handler = edge_handler(&NextEdgeConfig::default());
        let response = handler
            .invoke(&fixture("origin-request-get.json"), signing_time())
            .await
            .unwrap();

        let authorization = header(&response, "authorization");
        assert_eq!(authorization.as_array().map(Vec::len), Some(1));
        assert_eq!(authorization[0]["key"], "authorization");
        assert_eq!(
            authorization[0]["value"],
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240501/eu-west-1/lambda/aws4_request, \
             SignedHeaders=accept;host;via;x-amz-content-sha256;x-amz-date, \
             Signature=1b4aae3947abaed80750bb8d920146cd5183dd65e3e026f80158e88062d2e0fa"
        );
        assert_eq!(header(&response, "x-amz-date")[0]["value"], "20240501T103000Z");
        assert_eq!(
            header(&response, "x-amz-content-sha256")[0]["value"],
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert!(header(&response, "x-amz-security-token").is_null());
    }

    #[tokio::test]
    async fn test_should_leave_request_line_and_origin_untouched() {
        let original: OriginRequestEvent =
            serde_json::from_slice(&fixture("origin-request-post.json")).unwrap();
        let original = original.into_request().unwrap();

        let handler = edge_handler(&NextEdgeConfig::default());
        let response = handler
            .invoke(&fixture("origin-request-post.json"), signing_time())
            .await
            .unwrap();
        let signed: CfRequest = serde_json::from_value(response).unwrap();

        assert_eq!(signed.uri, original.uri);
        assert_eq!(signed.method, original.method);
        assert_eq!(signed.querystring, original.querystring);
        assert_eq!(signed.body, original.body);
        assert_eq!(signed.origin, original.origin);
        assert_eq!(signed.client_ip, original.client_ip);
    }

    #[tokio::test]
    async fn test_should_replace_viewer_authorization() {
        let handler = edge_handler(&NextEdgeConfig::default());
        let response = handler
            .invoke(&fixture("origin-request-post.json"), signing_time())
            .await
            .unwrap();

        let authorization = header(&response, "authorization");
        assert_eq!(authorization.as_array().map(Vec::len), Some(1));
        let value = authorization[0]["value"].as_str().unwrap();
        assert!(value.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240501/us-east-1/lambda/aws4_request, "
        ));
        assert!(value.contains("SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date, "));
        assert!(!value.contains("Bearer"));
    }

    #[tokio::test]
    async fn test_should_hash_decoded_body() {
        let handler = edge_handler(&NextEdgeConfig::default());
        let response = handler
            .invoke(&fixture("origin-request-post.json"), signing_time())
            .await
            .unwrap();

        let expected = nextedge_auth::hash::sha256_hex(br#"{"name":"nextedge"}"#);
        assert_eq!(header(&response, "x-amz-content-sha256")[0]["value"], expected);
    }

    #[tokio::test]
    async fn test_should_drop_forwarded_for_and_collapse_headers() {
        let handler = edge_handler(&NextEdgeConfig::default());
        let response = handler
            .invoke(&fixture("origin-request-get.json"), signing_time())
            .await
            .unwrap();

        assert!(header(&response, "x-forwarded-for").is_null());
        for (name, entries) in response["headers"].as_object().unwrap() {
            assert_eq!(name, &name.to_ascii_lowercase());
            assert_eq!(entries.as_array().map(Vec::len), Some(1), "header {name}");
        }
        assert_eq!(header(&response, "accept")[0]["value"], "text/html");
    }

    #[tokio::test]
    async fn test_should_sign_identically_twice() {
        let handler = edge_handler(&NextEdgeConfig::default());
        let payload = fixture("origin-request-post.json");

        let first = handler.invoke(&payload, signing_time()).await.unwrap();
        let second = handler.invoke(&payload, signing_time()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_should_fail_for_s3_origin() {
        let handler = edge_handler(&NextEdgeConfig::default());
        let err = handler
            .invoke(&fixture("origin-request-s3.json"), signing_time())
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), "UnexpectedOrigin");
        let message = err.to_string();
        assert!(message.starts_with("Unexpected origin type. Expected 'custom'. Got: "));
        assert!(message.contains("origin-access-identity"));
    }

    #[tokio::test]
    async fn test_should_fail_for_host_without_region() {
        let mut event = fixture_json("origin-request-get.json");
        event["Records"][0]["cf"]["request"]["headers"]["host"][0]["value"] =
            serde_json::Value::from("localhost");
        let payload = serde_json::to_vec(&event).unwrap();

        let handler = edge_handler(&NextEdgeConfig::default());
        let err = handler.invoke(&payload, signing_time()).await.unwrap_err();
        assert!(matches!(err, EdgeError::InvalidHost { .. }));
    }

    #[tokio::test]
    async fn test_should_fail_for_truncated_body() {
        let mut event = fixture_json("origin-request-post.json");
        event["Records"][0]["cf"]["request"]["body"]["inputTruncated"] =
            serde_json::Value::from(true);
        let payload = serde_json::to_vec(&event).unwrap();

        let handler = edge_handler(&NextEdgeConfig::default());
        let err = handler.invoke(&payload, signing_time()).await.unwrap_err();
        assert_eq!(err.error_type(), "TruncatedBody");
    }

    #[tokio::test]
    async fn test_should_include_session_token_when_present() {
        let handler = EdgeHandler::OriginAuth(OriginAuthHandler::new(
            credential_provider(Some("FwoGZXIvYXdzEXAMPLE")),
            "lambda",
        ));
        let response = handler
            .invoke(&fixture("origin-request-get.json"), signing_time())
            .await
            .unwrap();

        assert_eq!(
            header(&response, "x-amz-security-token")[0]["value"],
            "FwoGZXIvYXdzEXAMPLE"
        );
        let authorization = header(&response, "authorization")[0]["value"].as_str().unwrap();
        assert!(authorization.contains(";x-amz-security-token, "));
    }
}
