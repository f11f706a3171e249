use std::path::Path;
use std::time::Duration;

use crate::adapter::inbound::cli::output;
use crate::adapter::outbound::binance::WsFeedStream;
use crate::error::{ConnectionError, Result};
use crate::infrastructure::bootstrap;
use crate::infrastructure::config::settings::Config;
use crate::port::{FeedEvent, FeedMessage, FeedStream, SignedRequest};

/// Open the signed feed once, wait for the subscribe ack, then disconnect.
pub async fn execute_connection<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let config = Config::load(config_path.as_ref())?;
    let request = bootstrap::build_signer(&config).sign_now(&config.feed.ws_url, &config.feed.topic)?;

    output::section("Connection Check");
    output::field("WebSocket", &config.feed.ws_url);
    output::field("Topic", &config.feed.topic);

    let pb = output::spinner("Connecting and subscribing...");
    let mut stream = WsFeedStream::new();
    match handshake(
        &mut stream,
        &request,
        &config.feed.topic,
        config.feed.connect_timeout(),
    )
    .await
    {
        Ok(detail) => {
            output::spinner_success(&pb, &format!("Subscribed ({detail})"));
        }
        Err(e) => {
            output::spinner_fail(&pb, "Handshake failed");
            let _ = stream.close().await;
            return Err(e);
        }
    }

    stream.close().await?;
    output::success("Connection check passed");
    Ok(())
}

/// Connect, subscribe and wait for a positive ack within `timeout`.
///
/// Returns the ack detail. The stream is left open on success.
pub async fn handshake<S: FeedStream>(
    stream: &mut S,
    request: &SignedRequest,
    topic: &str,
    timeout: Duration,
) -> Result<String> {
    let attempt = async {
        stream.connect(request).await?;
        stream.subscribe(topic).await?;
        wait_for_ack(stream, topic).await
    };

    match tokio::time::timeout(timeout, attempt).await {
        Ok(result) => result,
        Err(_) => Err(ConnectionError::Timeout {
            secs: timeout.as_secs(),
        }
        .into()),
    }
}

async fn wait_for_ack<S: FeedStream>(stream: &mut S, topic: &str) -> Result<String> {
    loop {
        match stream.next_event().await {
            Some(FeedEvent::Message(FeedMessage::SubscribeAck { ok: true, detail })) => {
                return Ok(detail);
            }
            Some(FeedEvent::Message(FeedMessage::SubscribeAck { ok: false, detail })) => {
                return Err(ConnectionError::SubscribeRejected {
                    topic: topic.to_string(),
                    detail,
                }
                .into());
            }
            Some(FeedEvent::Closed { code, reason }) => {
                return Err(ConnectionError::ClosedDuringHandshake(format!(
                    "code {code:?}: {reason}"
                ))
                .into());
            }
            Some(FeedEvent::Error(e)) => return Err(ConnectionError::Transport(e).into()),
            None => {
                return Err(ConnectionError::ClosedDuringHandshake("stream ended".into()).into())
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testkit::feed::ScriptedFeed;

    fn request() -> SignedRequest {
        SignedRequest {
            url: "wss://feed.test/sapi/wss?signature=00".to_string(),
            api_key: "key".to_string(),
        }
    }

    #[tokio::test]
    async fn positive_ack_completes_handshake() {
        let mut feed = ScriptedFeed::new();
        let probe = feed.probe();

        let detail = handshake(&mut feed, &request(), "com_announcement_en", Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(detail, "SUCCESS");
        assert_eq!(probe.connects(), 1);
        assert_eq!(probe.subscribes(), 1);
    }

    #[tokio::test]
    async fn rejected_ack_is_reported() {
        let mut feed = ScriptedFeed::new().with_acks(vec![Some(FeedEvent::Message(
            FeedMessage::SubscribeAck {
                ok: false,
                detail: "invalid topic".to_string(),
            },
        ))]);

        let result = handshake(&mut feed, &request(), "bogus", Duration::from_secs(5)).await;

        assert!(matches!(
            result,
            Err(Error::Connection(ConnectionError::SubscribeRejected { ref detail, .. }))
                if detail == "invalid topic"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_ack_times_out() {
        let mut feed = ScriptedFeed::new().with_acks(vec![None]);

        let result = handshake(&mut feed, &request(), "com_announcement_en", Duration::from_secs(15)).await;

        assert!(matches!(
            result,
            Err(Error::Connection(ConnectionError::Timeout { secs: 15 }))
        ));
    }

    #[tokio::test]
    async fn connect_failure_propagates() {
        let mut feed = ScriptedFeed::new().with_connect_results(vec![Err(
            ConnectionError::Transport("refused".to_string()).into(),
        )]);

        let result = handshake(&mut feed, &request(), "com_announcement_en", Duration::from_secs(5)).await;

        assert!(matches!(
            result,
            Err(Error::Connection(ConnectionError::Transport(_)))
        ));
    }
}
