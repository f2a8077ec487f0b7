use layer_crawler::crawler::{CrawlError, CrawlerConfig, HttpDownloader, WebCrawler};
use std::collections::HashSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crawl_site_over_http() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    mount_page(&server, "/start", r#"
        <a href="/a">A</a>
        <a href="/b">B</a>
        <a href="/missing">Missing</a>
    "#).await;
    mount_page(&server, "/a", r#"<a href="/start">Back</a><a href="/deep">Deep</a>"#).await;
    mount_page(&server, "/b", "").await;
    mount_page(&server, "/deep", r#"<a href="/deeper">Deeper</a>"#).await;
    Mock::given(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = CrawlerConfig::new()
        .with_downloaders(4)
        .with_extractors(2)
        .with_per_host(2)
        .with_request_timeout(5);
    let crawler = WebCrawler::new(HttpDownloader::new(&config)?, &config)?;

    let start = format!("{}/start", server.uri());
    let result = crawler.download(&start, 3).await?;

    let downloaded: HashSet<String> = result.downloaded().iter().cloned().collect();
    let expected: HashSet<String> = ["/start", "/a", "/b", "/deep"]
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect();
    assert_eq!(downloaded, expected);

    let missing = format!("{}/missing", server.uri());
    assert_eq!(result.errors().len(), 1);
    assert!(matches!(result.errors().get(&missing), Some(CrawlError::Fetch { .. })));
    assert!(!result.is_downloaded(&format!("{}/deeper", server.uri())));

    crawler.close().await;
    Ok(())
}

#[tokio::test]
async fn test_restricted_crawl_over_http() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start().await;
    mount_page(&server, "/page", r#"
        <a href="https://foreign.invalid/page">Foreign</a>
        <a href="/local">Local</a>
    "#).await;
    mount_page(&server, "/local", "").await;

    let config = CrawlerConfig::new().with_downloaders(2).with_request_timeout(5);
    let crawler = WebCrawler::new(HttpDownloader::new(&config)?, &config)?;

    let root = format!("{}/page", server.uri());
    let result = crawler.download_restricted(&root, 2, ["127.0.0.1"]).await?;

    assert_eq!(result.downloaded().len(), 2);
    assert!(result.errors().is_empty());
    assert!(result.is_downloaded(&format!("{}/local", server.uri())));

    crawler.close().await;
    Ok(())
}
