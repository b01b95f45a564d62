use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use snafu::{IntoError, ResultExt};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        handshake::client::Request,
        http::HeaderValue,
    },
};
use tracing::{debug, info, warn};

use crate::feed::{
    ConnectSnafu, EncodeSubscriptionSnafu, FeedError, FeedHandler, InvalidRequestSnafu,
    TransportSnafu,
};

/// Public stream endpoint used when nothing else is configured.
pub const DEFAULT_WS_URL: &str = "wss://stream.binance.com:9443/ws";

const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Websocket client for a single kline stream connection.
pub struct FeedClient {
    url: String,
    api_key: Option<SecretString>,
}

impl FeedClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: None,
        }
    }

    /// Sends the key as the `X-MBX-APIKEY` handshake header. An empty key is ignored.
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = (!api_key.expose_secret().is_empty()).then_some(api_key);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn request(&self) -> Result<Request, FeedError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| {
                InvalidRequestSnafu {
                    url: self.url.clone(),
                    message: e.to_string(),
                }
                .build()
            })?;

        if let Some(key) = &self.api_key {
            let value = HeaderValue::from_str(key.expose_secret()).map_err(|_| {
                InvalidRequestSnafu {
                    url: self.url.clone(),
                    message: format!("{API_KEY_HEADER} contains invalid characters"),
                }
                .build()
            })?;
            request.headers_mut().insert(API_KEY_HEADER, value);
        }
        Ok(request)
    }

    /// Connects, subscribes, and pumps messages into `handler` until the
    /// connection ends.
    ///
    /// A clean close (remote close frame or end of stream) returns `Ok`. Any
    /// failure is passed to [`FeedHandler::on_error`] before being returned.
    pub async fn run<H: FeedHandler>(&self, handler: &mut H) -> Result<(), FeedError> {
        let result = self.session(handler).await;
        if let Err(error) = &result {
            handler.on_error(error);
        }
        result
    }

    async fn session<H: FeedHandler>(&self, handler: &mut H) -> Result<(), FeedError> {
        let request = self.request()?;

        info!(url = %self.url, "connecting to feed");
        let (mut ws, response) = connect_async(request).await.context(ConnectSnafu {
            url: self.url.clone(),
        })?;
        debug!(status = %response.status(), "websocket handshake complete");

        let subscription = handler.on_connect();
        let payload = subscription.to_json().context(EncodeSubscriptionSnafu)?;
        ws.send(Message::Text(payload)).await.context(TransportSnafu)?;

        while let Some(frame) = ws.next().await {
            match frame {
                Ok(Message::Text(text)) => handler.on_message(&text),
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => handler.on_message(text),
                    Err(_) => warn!(len = bytes.len(), "dropping non UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    let reason = frame.map(|f| f.reason.to_string());
                    handler.on_close(reason.as_deref());
                    return Ok(());
                }
                // Pongs for server pings are queued by tungstenite and flushed on the next read.
                Ok(_) => {}
                Err(source) => return Err(TransportSnafu.into_error(source)),
            }
        }

        handler.on_close(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_becomes_handshake_header() {
        let client = FeedClient::new(DEFAULT_WS_URL).with_api_key(SecretString::new("abc123".into()));
        let request = client.request().unwrap();
        assert_eq!(request.headers()[API_KEY_HEADER], "abc123");
        assert_eq!(request.uri().host(), Some("stream.binance.com"));
    }

    #[test]
    fn empty_api_key_sends_no_header() {
        let client = FeedClient::new(DEFAULT_WS_URL).with_api_key(SecretString::new("".into()));
        let request = client.request().unwrap();
        assert!(request.headers().get(API_KEY_HEADER).is_none());
    }

    #[test]
    fn bad_url_is_an_invalid_request() {
        let client = FeedClient::new("not a url");
        assert!(matches!(
            client.request(),
            Err(FeedError::InvalidRequest { .. })
        ));
    }

    #[test]
    fn header_with_newline_is_rejected() {
        let client = FeedClient::new(DEFAULT_WS_URL).with_api_key(SecretString::new("a\nb".into()));
        assert!(matches!(
            client.request(),
            Err(FeedError::InvalidRequest { .. })
        ));
    }
}
