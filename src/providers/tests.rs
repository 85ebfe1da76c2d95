//! Provider tests with HTTP mocking.

mod dreamhost_tests {
    use crate::error::ProviderErrorKind;
    use crate::providers::{DreamHostProvider, RecordProvider};
    use crate::record::{DomainRecord, RecordType};
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const LISTING: &str = "success\n\
        account_id\tzone\trecord\ttype\tvalue\tcomment\teditable\n\
        1234\texample.com\thome.example.com\tA\t198.51.100.4\t\t1\n\
        1234\texample.com\thome.example.com\tA\t198.51.100.5\told\t1\n\
        1234\texample.com\tmail.example.com\tA\t198.51.100.9\t\t1\n\
        1234\texample.com\thome.example.com\tCNAME\tother.example.com.\t\t1\n";

    fn provider(server: &MockServer) -> DreamHostProvider {
        DreamHostProvider::with_base_url(
            "secret-key".to_string(),
            server.uri(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    async fn respond(server: &MockServer, cmd: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("cmd", cmd))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_list_records() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("key", "secret-key"))
            .and(query_param("cmd", "dns-list_records"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LISTING))
            .expect(1)
            .mount(&server)
            .await;

        let records = provider(&server)
            .list_records("home.example.com")
            .await
            .unwrap();

        assert_eq!(
            records,
            vec![
                DomainRecord::new("home.example.com", RecordType::A, "198.51.100.4"),
                DomainRecord::new("home.example.com", RecordType::A, "198.51.100.5"),
            ]
        );
    }

    #[tokio::test]
    async fn test_every_call_gets_a_fresh_unique_id() {
        let server = MockServer::start().await;
        respond(
            &server,
            "dns-list_records",
            ResponseTemplate::new(200).set_body_string(LISTING),
        )
        .await;

        let provider = provider(&server);
        provider.list_records("home.example.com").await.unwrap();
        provider.list_records("home.example.com").await.unwrap();

        let unique_ids: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r: &Request| {
                r.url
                    .query_pairs()
                    .find(|(k, _)| k == "unique_id")
                    .map(|(_, v)| v.into_owned())
                    .unwrap()
            })
            .collect();

        assert_eq!(unique_ids.len(), 2);
        assert_ne!(unique_ids[0], unique_ids[1]);
    }

    #[tokio::test]
    async fn test_add_record_sends_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("cmd", "dns-add_record"))
            .and(query_param("record", "home.example.com"))
            .and(query_param("type", "AAAA"))
            .and(query_param("value", "2001:db8::7"))
            .respond_with(ResponseTemplate::new(200).set_body_string("success\nrecord_added\n"))
            .expect(1)
            .mount(&server)
            .await;

        provider(&server)
            .add_record("home.example.com", RecordType::Aaaa, "2001:db8::7")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_existing_record_is_conflict() {
        let server = MockServer::start().await;
        respond(
            &server,
            "dns-add_record",
            ResponseTemplate::new(200).set_body_string("error\nrecord_already_exists_remove_first\n"),
        )
        .await;

        let err = provider(&server)
            .add_record("home.example.com", RecordType::A, "198.51.100.4")
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_remove_missing_record_is_not_found() {
        let server = MockServer::start().await;
        respond(
            &server,
            "dns-remove_record",
            ResponseTemplate::new(200).set_body_string("error\nno_such_value\n"),
        )
        .await;

        let err = provider(&server)
            .remove_record("home.example.com", RecordType::A, "198.51.100.4")
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_invalid_key_is_unauthorized() {
        let server = MockServer::start().await;
        respond(
            &server,
            "dns-list_records",
            ResponseTemplate::new(200).set_body_string("error\ninvalid_key\n"),
        )
        .await;

        let err = provider(&server)
            .list_records("home.example.com")
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_slow_down_is_rate_limited() {
        let server = MockServer::start().await;
        respond(
            &server,
            "dns-remove_record",
            ResponseTemplate::new(200).set_body_string("error\nslow_down_bucko\n"),
        )
        .await;

        let err = provider(&server)
            .remove_record("home.example.com", RecordType::A, "198.51.100.4")
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::RateLimited);
        assert!(err.kind.is_retryable());
    }

    #[tokio::test]
    async fn test_http_status_mapping() {
        let cases: [(u16, ProviderErrorKind); 4] = [
            (401, ProviderErrorKind::Unauthorized),
            (429, ProviderErrorKind::RateLimited),
            (503, ProviderErrorKind::Network),
            (404, ProviderErrorKind::Malformed),
        ];

        for (status, expected) in cases {
            let server = MockServer::start().await;
            respond(&server, "dns-list_records", ResponseTemplate::new(status)).await;

            let err = provider(&server)
                .list_records("home.example.com")
                .await
                .unwrap_err();
            assert_eq!(err.kind, expected, "HTTP {}", status);
        }
    }

    #[tokio::test]
    async fn test_unexpected_body_is_malformed() {
        let server = MockServer::start().await;
        respond(
            &server,
            "dns-list_records",
            ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"),
        )
        .await;

        let err = provider(&server)
            .list_records("home.example.com")
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::Malformed);
    }

    #[tokio::test]
    async fn test_timeout_is_network_error() {
        let server = MockServer::start().await;
        respond(
            &server,
            "dns-list_records",
            ResponseTemplate::new(200)
                .set_body_string(LISTING)
                .set_delay(Duration::from_secs(3)),
        )
        .await;

        let provider = DreamHostProvider::with_base_url(
            "secret-key".to_string(),
            server.uri(),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = provider.list_records("home.example.com").await.unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::Network);
    }

    #[tokio::test]
    async fn test_provider_name() {
        let provider = DreamHostProvider::new("key".to_string(), Duration::from_secs(1)).unwrap();
        assert_eq!(provider.name(), "dreamhost");
    }
}
