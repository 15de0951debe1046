use crate::errors::Result;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use url::Url;

pub const MEXC_WS_ENDPOINT: &str = "wss://contract.mexc.com/edge";

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Serialize)]
struct SubscribeParam<'a> {
    symbol: &'a str,
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    param: Option<SubscribeParam<'a>>,
}

/// `{"method":"sub.ticker","param":{"symbol":"BTC_USDT"}}`
pub fn subscribe_message(symbol: &str) -> Result<Message> {
    let req = Request {
        method: "sub.ticker",
        param: Some(SubscribeParam { symbol }),
    };
    Ok(Message::Text(serde_json::to_string(&req)?))
}

/// `{"method":"ping"}`
pub fn ping_message() -> Result<Message> {
    let req = Request {
        method: "ping",
        param: None,
    };
    Ok(Message::Text(serde_json::to_string(&req)?))
}

/// Prices arrive either as JSON numbers or as numeric strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Num {
    Float(f64),
    Text(String),
}

impl Num {
    fn value(&self) -> Option<f64> {
        match self {
            Num::Float(v) => Some(*v),
            Num::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TickerData {
    symbol: Option<String>,
    bid1: Option<Num>,
    ask1: Option<Num>,
}

#[derive(Debug, Deserialize)]
struct TickerMsg {
    data: TickerData,
}

/// A validated top-of-book tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticker {
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
}

/// Parse one complete inbound message. Anything that is not a ticker with a
/// symbol and strictly positive bid/ask (pongs, acks, garbage) yields `None`.
pub fn parse_ticker(payload: &str) -> Option<Ticker> {
    let msg: TickerMsg = serde_json::from_str(payload).ok()?;
    let symbol = msg.data.symbol?.trim().to_string();
    if symbol.is_empty() {
        return None;
    }
    let bid = msg.data.bid1?.value()?;
    let ask = msg.data.ask1?.value()?;
    if !(crate::models::is_positive(bid) && crate::models::is_positive(ask)) {
        return None;
    }
    Some(Ticker { symbol, bid, ask })
}

/// Open the websocket. Does not subscribe.
pub async fn connect(endpoint: &str) -> Result<WsStream> {
    let url = Url::parse(endpoint)?;
    let (ws_stream, _resp) = connect_async(url).await?;
    Ok(ws_stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_envelope_shape() {
        let Message::Text(txt) = subscribe_message("BTC_USDT").unwrap() else {
            panic!("expected text frame");
        };
        let v: serde_json::Value = serde_json::from_str(&txt).unwrap();
        assert_eq!(v["method"], "sub.ticker");
        assert_eq!(v["param"]["symbol"], "BTC_USDT");
    }

    #[test]
    fn ping_envelope_has_no_param() {
        let Message::Text(txt) = ping_message().unwrap() else {
            panic!("expected text frame");
        };
        assert_eq!(txt, r#"{"method":"ping"}"#);
    }

    #[test]
    fn parses_numeric_and_string_prices() {
        let raw = r#"{"channel":"push.ticker","data":{"symbol":"BTC_USDT","bid1":100.5,"ask1":"101.25"},"ts":1}"#;
        let t = parse_ticker(raw).expect("ticker");
        assert_eq!(t.symbol, "BTC_USDT");
        assert_eq!(t.bid, 100.5);
        assert_eq!(t.ask, 101.25);
    }

    #[test]
    fn drops_malformed_frames() {
        // pong: data is a number
        assert!(parse_ticker(r#"{"channel":"pong","data":1700000000}"#).is_none());
        // missing ask
        assert!(parse_ticker(r#"{"data":{"symbol":"BTC_USDT","bid1":1}}"#).is_none());
        // non numeric
        assert!(parse_ticker(r#"{"data":{"symbol":"BTC_USDT","bid1":"x","ask1":1}}"#).is_none());
        // blank symbol
        assert!(parse_ticker(r#"{"data":{"symbol":"  ","bid1":1,"ask1":2}}"#).is_none());
        // non positive
        assert!(parse_ticker(r#"{"data":{"symbol":"BTC_USDT","bid1":0,"ask1":2}}"#).is_none());
        assert!(parse_ticker("not json").is_none());
    }
}
