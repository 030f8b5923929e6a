use axum::{http::header, response::Redirect, routing::get, Router};
use std::net::SocketAddr;
use std::path::Path;

const PAGE_HTML: &str = r#"
<html><body>
  <nav>
    <a href="/about">About</a>
    <a href="/tags/rust#top">Rust</a>
    <a href="https://other.site/a">Elsewhere</a>
  </nav>
  <main>
    <a href="/about">About us</a>
    <a href="https://other.site/a">Again</a>
    <a href="https://other.site/a">And again</a>
    <a href="mailto:me@blog.example.io">mail</a>
  </main>
</body></html>
"#;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn linkhunter(args: &[&str], store: &Path) -> std::process::Output {
    let bin = assert_cmd::cargo::cargo_bin!("linkhunter");
    std::process::Command::new(bin)
        .args(args)
        .env_remove("LINKHUNTER_ENV_FILE")
        .env("LINKHUNTER_STORE_DIR", store)
        .output()
        .expect("run linkhunter")
}

fn json_of(out: &std::process::Output) -> serde_json::Value {
    assert!(
        out.status.success(),
        "linkhunter failed: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("parse json")
}

#[test]
fn scan_html_file_counts_stores_and_exports() {
    let tmp = tempfile::tempdir().unwrap();
    let html = tmp.path().join("page.html");
    std::fs::write(&html, PAGE_HTML).unwrap();
    let store = tmp.path().join("store");
    let html_s = html.display().to_string();

    let v = json_of(&linkhunter(
        &[
            "scan",
            "--html-file",
            &html_s,
            "--base-url",
            "https://blog.example.io/post/1",
            "--order",
            "count",
        ],
        &store,
    ));
    assert_eq!(v["kind"].as_str(), Some("scan"));
    assert_eq!(v["source"].as_str(), Some("file"));
    assert_eq!(v["saved"].as_bool(), Some(true));
    assert_eq!(v["total_links"].as_u64(), Some(7));
    assert_eq!(v["unique_links"].as_u64(), Some(4));
    assert_eq!(v["rows"][0]["url"].as_str(), Some("https://other.site/a"));
    assert_eq!(v["rows"][0]["count"].as_u64(), Some(3));
    assert_eq!(v["rows"][1]["url"].as_str(), Some("https://blog.example.io/about"));
    assert_eq!(v["rows"][2]["url"].as_str(), Some("https://blog.example.io/tags/rust#top"));
    assert_eq!(v["rows"][3]["url"].as_str(), Some("mailto:me@blog.example.io"));

    let h = json_of(&linkhunter(&["history"], &store));
    let pages = h["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["page_url"].as_str(), Some("https://blog.example.io/post/1"));
    assert_eq!(pages[0]["links"].as_u64(), Some(7));
    assert_eq!(pages[0]["unique_links"].as_u64(), Some(4));

    let csv = tmp.path().join("out").join("external.csv");
    let csv_s = csv.display().to_string();
    let out = linkhunter(
        &[
            "export",
            "--page",
            "https://blog.example.io/post/1",
            "--scope",
            "external",
            "--out",
            &csv_s,
        ],
        &store,
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let got = std::fs::read_to_string(&csv).unwrap();
    assert_eq!(
        got,
        "URL,Count\n\"https://other.site/a\",3\n\"mailto:me@blog.example.io\",1"
    );
}

#[test]
fn scan_same_domain_with_tfidf_and_no_save() {
    let tmp = tempfile::tempdir().unwrap();
    let html = tmp.path().join("page.html");
    std::fs::write(&html, PAGE_HTML).unwrap();
    let store = tmp.path().join("store");
    let html_s = html.display().to_string();

    let v = json_of(&linkhunter(
        &[
            "scan",
            "--html-file",
            &html_s,
            "--base-url",
            "https://blog.example.io/post/1",
            "--scope",
            "same-domain",
            "--tfidf",
            "--order",
            "first-seen",
            "--no-save",
        ],
        &store,
    ));
    assert_eq!(v["saved"].as_bool(), Some(false));
    assert_eq!(v["options"]["scope"].as_str(), Some("same-domain"));
    assert_eq!(v["total_links"].as_u64(), Some(3));
    // `tags`/`rust` appear once, `about` twice: the single link is more distinctive.
    assert_eq!(v["rows"][0]["url"].as_str(), Some("https://blog.example.io/tags/rust#top"));
    assert_eq!(v["rows"][1]["count"].as_u64(), Some(2));

    let h = json_of(&linkhunter(&["history"], &store));
    assert_eq!(h["pages"].as_array().map(|a| a.len()), Some(0));
}

#[test]
fn export_of_unknown_page_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let out = linkhunter(
        &["export", "--page", "https://never.scanned/"],
        &tmp.path().join("store"),
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no stored scan"));
}

#[test]
fn unknown_scope_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let html = tmp.path().join("page.html");
    std::fs::write(&html, PAGE_HTML).unwrap();
    let html_s = html.display().to_string();
    let out = linkhunter(
        &["scan", "--html-file", &html_s, "--scope", "sideways", "--no-save"],
        &tmp.path().join("store"),
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown --scope"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scan_fetches_page_over_http() {
    let app = Router::new().route(
        "/post/1",
        get(|| async { ([(header::CONTENT_TYPE, "text/html")], PAGE_HTML) }),
    );
    let addr = serve(app).await;
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path().join("store");
    let page = format!("http://{addr}/post/1");

    let out = linkhunter(&["scan", "--url", &page, "--output", "text"], &store);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(s.starts_with(&format!("{page} links=7 unique=4")), "got: {s}");
    assert!(s.contains(&format!("2\thttp://{addr}/about")));
    assert!(s.contains("3\thttps://other.site/a"));

    let h = json_of(&linkhunter(&["history"], &store));
    assert_eq!(h["pages"][0]["page_url"].as_str(), Some(page.as_str()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn scan_scopes_and_stores_by_the_redirected_page() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let landing = format!("http://localhost:{port}/post/1");
    let target = landing.clone();
    let app = Router::new()
        .route(
            "/start",
            get(move || {
                let target = target.clone();
                async move { Redirect::temporary(&target) }
            }),
        )
        .route(
            "/post/1",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "text/html")],
                    r#"<a href="/about">a</a><a href="/tags/rust">r</a><a href="https://other.site/a">o</a>"#,
                )
            }),
        );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path().join("store");
    let start = format!("http://127.0.0.1:{port}/start");

    let v = json_of(&linkhunter(
        &["scan", "--url", &start, "--scope", "same-domain"],
        &store,
    ));
    assert_eq!(v["requested_url"].as_str(), Some(start.as_str()));
    assert_eq!(v["page_url"].as_str(), Some(landing.as_str()));
    assert_eq!(v["total_links"].as_u64(), Some(2));
    assert_eq!(
        v["rows"][0]["url"].as_str(),
        Some(format!("http://localhost:{port}/about").as_str())
    );

    let h = json_of(&linkhunter(&["history"], &store));
    assert_eq!(h["pages"][0]["page_url"].as_str(), Some(landing.as_str()));
}
