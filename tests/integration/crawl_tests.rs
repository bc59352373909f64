//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use polite_crawler::config::Config;
use polite_crawler::crawler::{Dispatcher, ErrorKind};
use polite_crawler::graph::load_graph;
use polite_crawler::images::content_address;
use polite_crawler::output::{GraphStatistics, StopReason};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir` with no politeness delay
fn create_test_config(dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler.min_delay_ms = 0;
    config.crawler.jitter_ms = 0;
    config.crawler.request_timeout_secs = 5;
    config.output.data_path = dir.path().join("data.json").display().to_string();
    config.output.image_dir = dir.path().join("images").display().to_string();
    config.output.flush_interval_ms = 10;
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_repeated_links_counted_and_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /\n"),
    )
    .await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>P</title></head><body>
            <a href="/q">Q</a>
            <a href="/q#again">Q again</a>
            <a href="/r">R</a>
        </body></html>"#,
        1,
    )
    .await;
    mount_page(&server, "/q", r#"<html><body><a href="/">Home</a></body></html>"#, 1).await;
    mount_page(&server, "/r", "<html><body>R</body></html>", 1).await;

    let mut dispatcher = Dispatcher::new(create_test_config(&dir)).unwrap();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    let p = format!("{}/", base);
    let q = format!("{}/q", base);
    let r = format!("{}/r", base);
    let graph = dispatcher.graph();

    assert_eq!(graph.edge(&p, &q).unwrap().access_count, 2);
    assert_eq!(graph.edge(&p, &r).unwrap().access_count, 1);
    assert_eq!(graph.page(&p).unwrap().access_count, 3);
    assert!(graph.edge(&p, &q).unwrap().parents.contains(&p));

    // Q links back to the seed; the edge is recorded but P is not refetched
    assert_eq!(graph.edge(&q, &p).unwrap().access_count, 1);
    assert!(graph.page(&q).unwrap().parents.contains(&p));
    assert!(graph.page(&p).unwrap().parents.is_empty());

    assert_eq!(summary.pages_fetched, 3);
    assert_eq!(summary.stop_reason, StopReason::Exhausted);
}

#[tokio::test]
async fn test_missing_robots_allows_crawling() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_robots(&server, ResponseTemplate::new(404)).await;
    mount_page(&server, "/", r#"<a href="/admin/panel">Admin</a>"#, 1).await;
    mount_page(&server, "/admin/panel", "<p>ok</p>", 1).await;

    let mut dispatcher = Dispatcher::new(create_test_config(&dir)).unwrap();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.robots_denied, 0);
    // An unavailable robots.txt is not an error
    assert_eq!(summary.total_errors(), 0);
}

#[tokio::test]
async fn test_disallowed_page_not_fetched_but_edge_recorded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_robots(
        &server,
        ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
    )
    .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private/secret">Secret</a><a href="/public">Public</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/private/secret", "<p>secret</p>", 0).await;
    mount_page(&server, "/public", "<p>public</p>", 1).await;

    let mut dispatcher = Dispatcher::new(create_test_config(&dir)).unwrap();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    let p = format!("{}/", base);
    let secret = format!("{}/private/secret", base);
    assert!(dispatcher.graph().edge(&p, &secret).is_some());
    assert!(dispatcher.graph().page(&secret).is_none());
    assert_eq!(summary.robots_denied, 1);
    assert_eq!(summary.pages_fetched, 2);
}

#[tokio::test]
async fn test_shared_image_downloaded_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let image_bytes = vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4];

    mount_page(
        &server,
        "/",
        r#"<img src="/logo.png"><a href="/about">About</a><img src="logo.png">"#,
        1,
    )
    .await;
    mount_page(&server, "/about", r#"<img src="/logo.png">"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(image_bytes.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&dir);
    let image_dir = config.output.image_dir.clone();
    let mut dispatcher = Dispatcher::new(config).unwrap();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    let image_url = format!("{}/logo.png", base);
    let expected = Path::new(&image_dir).join(content_address(&image_url));

    let files: Vec<_> = std::fs::read_dir(&image_dir).unwrap().collect();
    assert_eq!(files.len(), 1);
    assert_eq!(std::fs::read(&expected).unwrap(), image_bytes);

    let graph = dispatcher.graph();
    for page in [format!("{}/", base), format!("{}/about", base)] {
        assert_eq!(
            graph.page(&page).unwrap().images.get(&image_url),
            Some(&expected)
        );
    }
    assert_eq!(summary.images_downloaded, 1);
    assert_eq!(dispatcher.images().len(), 1);
}

#[tokio::test]
async fn test_failed_image_leaves_no_file() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<img src="/broken.png">"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/broken.png"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&dir);
    let image_dir = config.output.image_dir.clone();
    let mut dispatcher = Dispatcher::new(config).unwrap();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.image_failures, 1);
    assert_eq!(summary.errors.get(&ErrorKind::Transport), Some(&1));
    assert!(dispatcher
        .graph()
        .page(&format!("{}/", base))
        .map_or(true, |page| page.images.is_empty()));
    let leftover = std::fs::read_dir(&image_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_failed_fetch_does_not_abort_crawl() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<a href="/gone">Gone</a><a href="mailto:me@example.com">Mail</a><a href="/ok">Ok</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<p>fine</p>", 1).await;

    let mut dispatcher = Dispatcher::new(create_test_config(&dir)).unwrap();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.errors.get(&ErrorKind::Transport), Some(&1));
    assert_eq!(summary.errors.get(&ErrorKind::Parse), Some(&1));
}

#[tokio::test]
async fn test_non_html_page_recorded_but_not_parsed() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<a href="/report.pdf">Report</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"%PDF-1.4 <a href=\"/hidden\">".to_vec(),
            "application/pdf",
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/hidden", "<p>hidden</p>", 0).await;

    let mut dispatcher = Dispatcher::new(create_test_config(&dir)).unwrap();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.pages_skipped, 1);
    assert!(dispatcher
        .graph()
        .edge(&format!("{}/", base), &format!("{}/report.pdf", base))
        .is_some());
}

#[tokio::test]
async fn test_max_depth_limit() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<a href="/a">A</a>"#, 1).await;
    mount_page(&server, "/a", r#"<a href="/b">B</a>"#, 1).await;
    mount_page(&server, "/b", "<p>too deep</p>", 0).await;

    let mut config = create_test_config(&dir);
    config.limits.max_depth = Some(1);
    let mut dispatcher = Dispatcher::new(config).unwrap();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.pages_fetched, 2);
    assert_eq!(summary.limit_skips, 1);
    // The edge to the skipped page is still part of the graph
    assert!(dispatcher
        .graph()
        .edge(&format!("{}/a", base), &format!("{}/b", base))
        .is_some());
}

#[tokio::test]
async fn test_max_pages_limit() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#, 1).await;
    mount_page(&server, "/a", "<p>a</p>", 0).await;
    mount_page(&server, "/b", "<p>b</p>", 0).await;

    let mut config = create_test_config(&dir);
    config.limits.max_pages = Some(1);
    let mut dispatcher = Dispatcher::new(config).unwrap();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.limit_skips, 2);
    assert_eq!(dispatcher.frontier().visited_count(), 1);
}

#[tokio::test]
async fn test_deadline_stops_crawl_and_flushes() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&dir);
    config.limits.deadline_secs = Some(1);
    let data_path = config.output.data_path.clone();
    let mut dispatcher = Dispatcher::new(config).unwrap();

    let started = std::time::Instant::now();
    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.stop_reason, StopReason::Deadline);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(summary.pages_fetched, 0);
    assert!(Path::new(&data_path).exists());
}

/// Serves every request with the headers and the first part of a large image,
/// then stalls without finishing the body
async fn start_stalling_image_server() -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png\r\nContent-Length: 100000\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                let _ = socket.write_all(&[0u8; 5000]).await;
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_deadline_removes_partial_image() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let image_host = start_stalling_image_server().await;
    let image_url = format!("{}/stall.png", image_host);

    mount_page(
        &server,
        "/",
        &format!(r#"<html><body><img src="{}"></body></html>"#, image_url),
        1,
    )
    .await;

    let mut config = create_test_config(&dir);
    config.limits.deadline_secs = Some(2);
    let data_path = config.output.data_path.clone();
    let image_dir = dir.path().join("images");
    let mut dispatcher = Dispatcher::new(config).unwrap();

    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.stop_reason, StopReason::Deadline);
    assert_eq!(summary.pages_fetched, 1);
    assert_eq!(summary.images_downloaded, 0);
    assert!(!image_dir.join(content_address(&image_url)).exists());
    let leftovers = std::fs::read_dir(&image_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
    assert!(Path::new(&data_path).exists());
}

#[tokio::test]
async fn test_download_cap_serializes_images() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><body>
            <img src="/one.png"><img src="/two.png"><img src="/three.png">
        </body></html>"#,
        1,
    )
    .await;
    for image in ["/one.png", "/two.png", "/three.png"] {
        Mock::given(method("GET"))
            .and(path(image))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![0x89u8, b'P', b'N', b'G'])
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&dir);
    config.crawler.max_concurrent_downloads = 1;
    let mut dispatcher = Dispatcher::new(config).unwrap();

    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.images_downloaded, 3);
    // One download at a time: the three delays add up
    assert!(
        summary.elapsed >= Duration::from_millis(900),
        "downloads overlapped: finished in {:?}",
        summary.elapsed
    );
}

#[tokio::test]
async fn test_fetch_cap_serializes_pages() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/a">A</a><a href="/b">B</a><a href="/c">C</a></body></html>"#,
        1,
    )
    .await;
    for page in ["/a", "/b", "/c"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html("<p>leaf</p>").set_delay(Duration::from_millis(300)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&dir);
    config.crawler.max_concurrent_fetches = 1;
    let mut dispatcher = Dispatcher::new(config).unwrap();

    let summary = dispatcher.run(&format!("{}/", base)).await.unwrap();

    assert_eq!(summary.pages_fetched, 4);
    assert!(
        summary.elapsed >= Duration::from_millis(900),
        "fetches overlapped: finished in {:?}",
        summary.elapsed
    );
}

#[tokio::test]
async fn test_persisted_graph_round_trip() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();

    mount_page(
        &server,
        "/",
        r#"<a href="/a">A</a><a href="/a">A</a><img src="/i.gif">"#,
        1,
    )
    .await;
    mount_page(&server, "/a", r#"<a href="/">Home</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/i.gif"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"GIF89a".to_vec()))
        .mount(&server)
        .await;

    let config = create_test_config(&dir);
    let data_path = config.output.data_path.clone();
    let mut dispatcher = Dispatcher::new(config).unwrap();
    dispatcher.run(&format!("{}/", base)).await.unwrap();

    let loaded = load_graph(Path::new(&data_path)).unwrap();
    assert_eq!(&loaded, dispatcher.graph());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&data_path).unwrap()).unwrap();
    let seed = &raw[format!("{}/", base)];
    assert_eq!(seed["numberOfAccesses"], 2);
    assert_eq!(seed["children"][format!("{}/a", base)]["numberOfAccesses"], 2);
    assert_eq!(
        raw[format!("{}/a", base)]["parents"][format!("{}/", base)],
        serde_json::Value::Bool(true)
    );
    assert!(seed["dateRetrieved"].is_string());
    assert!(seed["images"][format!("{}/i.gif", base)].is_string());
    assert!(!Path::new(&format!("{}.tmp", data_path)).exists());

    let stats = GraphStatistics::from_graph(&loaded);
    assert_eq!(stats.pages, 2);
    assert_eq!(stats.edges, 2);
    assert_eq!(stats.edge_accesses, 3);
    assert_eq!(stats.distinct_images, 1);
}
