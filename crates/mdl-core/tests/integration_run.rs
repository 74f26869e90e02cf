//! Integration test: a whole manifest run against a local HTTP server using
//! the libcurl fetcher.

mod common;

use common::http_server::{self, Route};
use mdl_core::fetch::{CurlFetcher, FetchOptions};
use mdl_core::session::{self, SessionOptions};
use std::time::Duration;
use tempfile::tempdir;

fn fast_fetcher() -> CurlFetcher {
    let mut opts = FetchOptions::default();
    opts.connect_timeout = Duration::from_secs(5);
    opts.timeout = Duration::from_secs(20);
    CurlFetcher::new(opts)
}

#[tokio::test(flavor = "multi_thread")]
async fn manifest_run_mirrors_files_and_classifies_responses() {
    let payload: Vec<u8> = (0u8..=255).cycle().take(48 * 1024).collect();
    let authority = http_server::start(vec![
        ("/files/data.bin", Route::file(&payload)),
        ("/files/a%20b.txt", Route::file(b"spaced")),
        ("/index.html", Route::html("<html><body>hi</body></html>")),
        ("/broken", Route::status("500 Internal Server Error")),
    ]);

    let work = tempdir().unwrap();
    let out = work.path().join("out");
    std::fs::create_dir(&out).unwrap();
    let manifest = work.path().join("urls.txt");
    std::fs::write(
        &manifest,
        format!(
            "# test batch\n\
             {a}/files/data.bin\n\
             http://{a}/files/a%20b.txt\n\
             \n\
             {a}/index.html\n\
             {a}/missing.bin\n\
             {a}/broken\n",
            a = authority
        ),
    )
    .unwrap();

    let opts = SessionOptions {
        concurrency_limit: 2,
        progress: None,
    };
    let summary = session::start(&manifest, &out, fast_fetcher(), opts)
        .await
        .expect("session");

    assert_eq!(summary.total, 5);
    assert_eq!(summary.downloaded, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 2);

    let host_dir = out.join("127_0_0_1");
    assert_eq!(std::fs::read(host_dir.join("files/data.bin")).unwrap(), payload);
    assert_eq!(std::fs::read(host_dir.join("files/a b.txt")).unwrap(), b"spaced");
    assert!(!host_dir.join("index.html").exists());
    assert!(!host_dir.join("missing.bin").exists());
    let leftovers: Vec<_> = std::fs::read_dir(host_dir.join("files"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);

    assert!(summary
        .failures
        .iter()
        .any(|f| f.starts_with("服务器错误 404 (Not Found): ")));
    assert!(summary
        .failures
        .iter()
        .any(|f| f.starts_with("服务器错误 500 (Internal Server Error): ")));

    let log = std::fs::read_to_string(summary.log_path.unwrap()).unwrap();
    assert!(log.contains("[跳过] 非文件内容 (HTML 页面): text/html; charset=utf-8"));
    assert_eq!(log.matches("--- 所有下载任务已完成 ---").count(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn rerun_skips_everything_already_downloaded() {
    let authority = http_server::start(vec![("/one.bin", Route::file(b"1"))]);
    let work = tempdir().unwrap();
    let manifest = work.path().join("urls.txt");
    std::fs::write(&manifest, format!("{}/one.bin\n", authority)).unwrap();

    let first = session::start(&manifest, work.path(), fast_fetcher(), SessionOptions::default())
        .await
        .unwrap();
    assert_eq!(first.downloaded, 1);

    let second = session::start(&manifest, work.path(), fast_fetcher(), SessionOptions::default())
        .await
        .unwrap();
    assert_eq!(second.skipped, 1);
    assert!(second.failures.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_a_task_failure() {
    let work = tempdir().unwrap();
    let manifest = work.path().join("urls.txt");
    std::fs::write(&manifest, "http://127.0.0.1:9/nothing.bin\n").unwrap();

    let summary = session::start(&manifest, work.path(), fast_fetcher(), SessionOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);
    assert!(summary.failures[0].starts_with("[下载失败]: http://127.0.0.1:9/nothing.bin"));
}
