//! Replays two interleaved HTTP/2 streams through one session and prints the requests a
//! downstream worker reassembles from the delivery queue.

use std::sync::Arc;

use http_body_util::BodyExt;
use micro_h2::assembler::RequestAssembler;
use micro_h2::protocol::{StreamConfig, StreamError, StreamId, StreamState};
use micro_h2::queue::SegmentQueue;
use micro_h2::session::Session;
use micro_h2::stream::Stream;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::TRACE).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = StreamConfig::default().with_segment_capacity(64).with_request_version(http::Version::HTTP_11);
    let session = Session::with_config(1, Arc::new(SegmentQueue::new()), config);

    let workers: Vec<_> = [1, 3]
        .into_iter()
        .map(|stream_id: StreamId| {
            let queue = session.queue_handle();
            tokio::spawn(async move { (stream_id, RequestAssembler::new(&queue, stream_id).assemble().await) })
        })
        .collect();

    if let Err(e) = replay(&session) {
        error!(cause = %e, "replay failed");
        session.queue().close();
    }

    for worker in workers {
        match worker.await {
            Ok((stream_id, Ok(request))) => {
                let (parts, body) = request.into_parts();
                let body = body.collect().await.map(|collected| collected.to_bytes()).unwrap_or_default();
                info!(stream_id, method = %parts.method, uri = %parts.uri, headers = ?parts.headers, body_len = body.len(), "request assembled");
            }
            Ok((stream_id, Err(e))) => error!(stream_id, cause = %e, "failed to assemble request"),
            Err(e) => error!(cause = %e, "worker panicked"),
        }
    }
}

fn replay(session: &Session) -> Result<(), StreamError> {
    let mut get = Stream::new(1, session);
    let mut post = Stream::new(3, session);
    get.set_state_observer(|stream_id: StreamId, old: StreamState, new: StreamState| {
        info!(stream_id, %old, %new, "state change");
    });

    get.add_header(b":method", b"GET")?;
    get.add_header(b":scheme", b"https")?;
    get.add_header(b":path", b"/index.html")?;
    get.add_header(b":authority", b"example.com")?;

    post.add_header(b":method", b"POST")?;
    post.add_header(b":path", b"/api/items")?;
    post.add_header(b":authority", b"example.com")?;
    post.add_header(b"content-type", b"application/json")?;

    get.add_header(b"accept", b"text/html")?;
    get.add_header(b"user-agent", b"replay/0.1")?;
    get.end_headers()?;
    get.close_input()?;

    post.end_headers()?;
    post.add_data(br#"{"name":"first item","tags":["a","b","c"],"note":"spans more than one segment"}"#)?;
    post.close_input()?;

    get.close_output();
    post.close_output();
    Ok(())
}
