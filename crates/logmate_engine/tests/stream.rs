use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use logmate_core::{StreamEvent, TaskId, TaskStatus};
use logmate_engine::{system_clock, Reconciler, StatusStream, StreamError, StreamPump};
use pretty_assertions::assert_eq;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

const CHUNK: &str = r#"{"task_id":"t1","event":"CHUNK","fileName":"a.log","chunkIndex":2,"totalChunks":5,"processedCount":40,"totalLines":100}"#;
const COMPLETE: &str = r#"{"task_id":"t1","event":"COMPLETE","fileName":"a.log","result":{"lineCount":100}}"#;
const NO_TASK_ID: &str = r#"{"event":"CHUNK","processedCount":1,"totalLines":2}"#;

/// One-shot websocket server: sends `frames`, closes, then drains until the
/// client hangs up.
async fn serve(frames: Vec<Message>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(socket).await.unwrap();
        for frame in frames {
            ws.send(frame).await.unwrap();
        }
        let _ = ws.close(None).await;
        while let Some(Ok(_)) = ws.next().await {}
    });
    Url::parse(&format!("ws://{addr}/ws/logstatus/")).unwrap()
}

/// Sends `frames`, closes and drops the socket without waiting for the reply.
async fn serve_and_hang_up(frames: Vec<Message>) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(socket).await.unwrap();
        for frame in frames {
            ws.send(frame).await.unwrap();
        }
        let _ = ws.close(None).await;
    });
    Url::parse(&format!("ws://{addr}/ws/logstatus/")).unwrap()
}

/// Keeps the connection open until the client closes it.
async fn serve_until_client_closes() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(socket).await.unwrap();
        ws.send(Message::Text(CHUNK.to_string())).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });
    Url::parse(&format!("ws://{addr}/ws/logstatus/")).unwrap()
}

fn mixed_frames() -> Vec<Message> {
    vec![
        Message::Text(CHUNK.to_string()),
        Message::Text(NO_TASK_ID.to_string()),
        Message::Text("not json".to_string()),
        Message::Binary(vec![1, 2, 3]),
        Message::Text(COMPLETE.to_string()),
    ]
}

#[tokio::test]
async fn next_event_skips_malformed_and_non_text_frames() {
    let url = serve(mixed_frames()).await;
    let mut stream = StatusStream::open(&url).await.unwrap();
    assert_eq!(stream.url(), &url);

    let first = stream.next_event().await.unwrap();
    assert_eq!(first.task_id(), &TaskId::new("t1"));
    assert!(matches!(first, StreamEvent::Chunk(ref p) if p.processed_count == 40));

    let second = stream.next_event().await.unwrap();
    assert!(matches!(second, StreamEvent::Complete { .. }));

    assert!(stream.next_event().await.is_none());
    stream.close().await.unwrap();
}

#[tokio::test]
async fn pump_feeds_reconciler_until_server_closes() {
    let url = serve(mixed_frames()).await;
    let reconciler = Reconciler::spawn(system_clock());
    let handle = reconciler.handle();
    handle.register(TaskId::new("t1"), "a.log").unwrap();

    let stream = StatusStream::open(&url).await.unwrap();
    let pump = StreamPump::spawn(stream, handle.clone());

    let record = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(record) = handle.task(TaskId::new("t1")).await.unwrap() {
                if record.is_complete() {
                    return record;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("task never completed");

    assert_eq!(record.status, TaskStatus::Complete);
    assert_eq!(record.progress, 100.0);
    assert_eq!(record.processed_count, 40);
    assert!(record.result.is_some());

    assert_eq!(pump.stop().await.unwrap(), 2);

    let state = reconciler.shutdown().await.unwrap();
    assert_eq!(state.tasks().len(), 1);
}

#[tokio::test]
async fn open_fails_when_nothing_listens() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("ws://{addr}/ws/logstatus/")).unwrap();
    let err = StatusStream::open(&url).await.err().unwrap();
    assert!(matches!(err, StreamError::Connect(_)));
}

#[tokio::test]
async fn close_after_server_close_is_clean() {
    let url = serve(vec![Message::Text(CHUNK.to_string())]).await;
    let mut stream = StatusStream::open(&url).await.unwrap();

    assert!(stream.next_event().await.is_some());
    assert!(stream.next_event().await.is_none());
    // Reading past the end stays at the end.
    assert!(stream.next_event().await.is_none());
    stream.close().await.unwrap();
}

#[tokio::test]
async fn close_after_server_hung_up_is_clean() {
    let url = serve_and_hang_up(vec![Message::Text(CHUNK.to_string())]).await;
    let reconciler = Reconciler::spawn(system_clock());
    let stream = StatusStream::open(&url).await.unwrap();
    let pump = StreamPump::spawn(stream, reconciler.handle());

    tokio::time::timeout(Duration::from_secs(5), async {
        while !pump.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("pump never observed the close");

    assert_eq!(pump.stop().await.unwrap(), 1);
    reconciler.shutdown().await.unwrap();
}

#[tokio::test]
async fn client_initiated_close_is_clean() {
    let url = serve_until_client_closes().await;
    let reconciler = Reconciler::spawn(system_clock());
    let handle = reconciler.handle();
    let stream = StatusStream::open(&url).await.unwrap();
    let pump = StreamPump::spawn(stream, handle.clone());

    tokio::time::timeout(Duration::from_secs(5), async {
        while handle.task(TaskId::new("t1")).await.unwrap().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("chunk never arrived");

    assert!(!pump.is_finished());
    assert_eq!(pump.stop().await.unwrap(), 1);
    reconciler.shutdown().await.unwrap();
}
