//! Dispatcher tests against scripted backends.

mod common;

use futures::StreamExt;

use common::{stub_dispatcher, StubBackend};
use llm_relay::{Error, Generation, Mode, Provider};

#[tokio::test]
async fn test_local_selector_calls_only_local() {
    let local = StubBackend::new("from local", &["a", "b"]);
    let hosted = StubBackend::new("from hosted", &["x"]);
    let dispatcher = stub_dispatcher("local", &local, &hosted);

    assert_eq!(dispatcher.generate().await.unwrap(), "from local");
    let fragments: Vec<_> = dispatcher.generate_stream().await.unwrap().collect().await;

    assert_eq!(fragments.len(), 2);
    assert_eq!(local.calls(), 2);
    assert_eq!(hosted.calls(), 0);
}

#[tokio::test]
async fn test_hosted_selector_calls_only_hosted() {
    let local = StubBackend::new("from local", &["a"]);
    let hosted = StubBackend::new("from hosted", &["x"]);
    let dispatcher = stub_dispatcher("hosted", &local, &hosted);

    match dispatcher.dispatch(Mode::Once).await.unwrap() {
        Generation::Text(text) => assert_eq!(text, "from hosted"),
        Generation::Stream(_) => panic!("expected text"),
    }
    match dispatcher.dispatch(Mode::Stream).await.unwrap() {
        Generation::Stream(stream) => {
            let fragments: Vec<String> = stream.map(Result::unwrap).collect().await;
            assert_eq!(fragments, vec!["x"]);
        }
        Generation::Text(_) => panic!("expected stream"),
    }

    assert_eq!(hosted.calls(), 2);
    assert_eq!(local.calls(), 0);
}

#[tokio::test]
async fn test_unknown_provider_touches_no_backend() {
    let local = StubBackend::new("l", &[]);
    let hosted = StubBackend::new("h", &[]);
    let dispatcher = stub_dispatcher("azure", &local, &hosted);

    let err = dispatcher.generate().await.unwrap_err();
    assert!(matches!(err, Error::UnknownProvider(ref p) if p == "azure"));
    assert!(err.is_client_error());

    let err = dispatcher.generate_stream().await.err().unwrap();
    assert!(matches!(err, Error::UnknownProvider(_)));

    assert_eq!(local.calls(), 0);
    assert_eq!(hosted.calls(), 0);
}

#[tokio::test]
async fn test_backend_failure_is_tagged_with_provider() {
    let local = StubBackend::failing("daemon not running");
    let hosted = StubBackend::failing("rate limited");

    let err = stub_dispatcher("local", &local, &hosted)
        .generate()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Backend { provider: Provider::Local, .. }));
    assert_eq!(
        err.to_string(),
        "local backend error: API error (503): daemon not running"
    );

    let err = stub_dispatcher("hosted", &local, &hosted)
        .generate_stream()
        .await
        .err()
        .unwrap();
    assert!(matches!(err, Error::Backend { provider: Provider::Hosted, .. }));
    assert!(err.to_string().starts_with("hosted backend error:"));
}

#[tokio::test]
async fn test_mid_stream_failure_is_tagged() {
    let local = StubBackend::with_fragments(vec![
        Ok("first".to_string()),
        Err("connection reset".to_string()),
    ]);
    let hosted = StubBackend::new("", &[]);
    let dispatcher = stub_dispatcher("local", &local, &hosted);

    let items: Vec<_> = dispatcher.generate_stream().await.unwrap().collect().await;
    assert_eq!(items[0].as_ref().unwrap(), "first");
    assert_eq!(
        items[1].as_ref().unwrap_err().to_string(),
        "local backend error: Streaming error: connection reset"
    );
}

#[tokio::test]
async fn test_generate_is_repeatable() {
    let local = StubBackend::new("same every time", &[]);
    let hosted = StubBackend::new("", &[]);
    let dispatcher = stub_dispatcher("local", &local, &hosted);

    let first = dispatcher.generate().await.unwrap();
    let second = dispatcher.generate().await.unwrap();
    assert_eq!(first, second);
}
