//! Against a real Chrome. Run with `cargo test --features cdp -- --ignored`.
#![cfg(feature = "cdp")]

use rfaria::driver::cdp::{CdpDriver, CdpOptions};
use rfaria::protocols::Protocol;
use rfaria::reader::ScreenReader;
use rfaria::tap::{Console, TapWriter};
use rfaria::tree::{roles, SearchPredicate};
use rfaria::{RunContext, Timing};

const PAGE: &str = r#"<!doctype html>
<html><head><title>Fixture</title></head>
<body>
  <h1>Sandwich</h1>
  <div role="checkbox" tabindex="0" aria-checked="false" id="lettuce">Lettuce</div>
  <script>
    const box = document.getElementById('lettuce');
    const flip = () => box.setAttribute('aria-checked',
      box.getAttribute('aria-checked') === 'true' ? 'false' : 'true');
    box.addEventListener('click', flip);
    box.addEventListener('keydown', (e) => {
      if (e.key === ' ') { e.preventDefault(); flip(); }
    });
  </script>
</body></html>"#;

/// Serve the fixture page until the test process exits
fn serve() -> String {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]).unwrap();
            let _ = request.respond(tiny_http::Response::from_string(PAGE).with_header(header));
        }
    });
    format!("http://{}/", addr)
}

#[tokio::test(flavor = "multi_thread")]
#[ignore]
async fn checkbox_protocol_in_chrome() {
    let url = serve();
    let driver = CdpDriver::launch(CdpOptions::default()).await.unwrap();
    let reader = ScreenReader::new(driver, Timing::default()).with_console(Console::memory());
    reader.set_page_url(&url).await.unwrap();

    assert_eq!(reader.get_page_title().await.unwrap().as_deref(), Some("Fixture"));
    let heading = reader
        .find_in_page(&SearchPredicate::new(roles::HEADING, "Sandwich"))
        .await
        .unwrap();
    assert!(!heading.is_empty());

    let mut tap = TapWriter::new(Console::memory());
    Protocol::Checkbox {
        label: "Lettuce".into(),
    }
    .validate(&reader, &mut tap, &RunContext::default())
    .await
    .unwrap();
    assert!(tap.summary().all_passed());
}
