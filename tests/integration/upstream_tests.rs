//! Analytics API client tests against a mock server

#[cfg(test)]
mod tests {
    use crate::common::test_config;
    use chrono::Utc;
    use futures::StreamExt;
    use sampling_controller::ControllerError;
    use sampling_controller::core::upstream::PaginatedClient;
    use serde_json::{Value, json};
    use std::time::{Duration, Instant};
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> PaginatedClient {
        let config = test_config(&format!("{}/api/0/", server.uri()));
        PaginatedClient::new(config.upstream()).unwrap()
    }

    async fn collect_pages(client: &PaginatedClient) -> Vec<Value> {
        let mut pages = client.list_projects();
        let mut out = Vec::new();
        while let Some(page) = pages.next().await {
            out.push(page.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_follows_next_link_until_results_false() {
        let server = MockServer::start().await;
        let next = format!("{}/api/0/projects/?cursor=2", server.uri());

        Mock::given(method("GET"))
            .and(path("/api/0/projects/"))
            .and(query_param("cursor", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "2", "slug": "web"}]))
                    .insert_header(
                        "link",
                        format!("<{}>; rel=\"next\"; results=\"false\"; cursor=\"3\"", next),
                    ),
            )
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/0/projects/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "1", "slug": "api"}]))
                    .insert_header(
                        "link",
                        format!(
                            "<{}>; rel=\"previous\"; results=\"false\", <{}>; rel=\"next\"; results=\"true\"",
                            server.uri(),
                            next
                        ),
                    ),
            )
            .expect(1)
            .mount(&server)
            .await;

        let pages = collect_pages(&client(&server)).await;
        assert_eq!(pages.len(), 2);

        let projects = PaginatedClient::project_page(pages[1].clone()).unwrap();
        assert_eq!(projects[0].slug, "web");
    }

    #[tokio::test]
    async fn test_single_page_without_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/0/projects/"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let pages = collect_pages(&client(&server)).await;
        assert_eq!(pages, vec![json!([])]);
    }

    #[tokio::test]
    async fn test_waits_out_rate_limit_then_retries() {
        let server = MockServer::start().await;
        let reset = Utc::now().timestamp() + 3;

        Mock::given(method("GET"))
            .and(path("/api/0/projects/"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("x-sentry-rate-limit-reset", reset.to_string().as_str()),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/0/projects/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let started = Instant::now();
        let pages = collect_pages(&client(&server)).await;

        assert_eq!(pages.len(), 1);
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/0/organizations/acme/stats_v2/"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).fetch_stats("42").await.unwrap_err();
        assert!(matches!(err, ControllerError::Upstream { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_stats_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/0/organizations/acme/stats_v2/"))
            .and(query_param("field", "sum(quantity)"))
            .and(query_param("groupBy", "category"))
            .and(query_param("groupBy", "outcome"))
            .and(query_param("interval", "1h"))
            .and(query_param("project", "42"))
            .and(query_param("statsPeriod", "7d"))
            .and(query_param("category", "transaction"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "intervals": ["2024-03-01T00:00:00Z"],
                "groups": [{"by": {"outcome": "accepted"}, "series": {"sum(quantity)": [3]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stats = client(&server).fetch_stats("42").await.unwrap();
        assert_eq!(stats.series_for("accepted", "sum(quantity)"), Some(&[3.0][..]));
    }
}
