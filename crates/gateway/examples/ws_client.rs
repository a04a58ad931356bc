//! Minimal subscribe-stream client for manual testing.
//!
//! Connects to a running watcher, sends one criteria array and prints every
//! push until the stream closes.

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::{connect_async, tungstenite::Message};

#[tokio::main]
async fn main() {
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "5000".to_string());
    let url = format!("ws://{host}:{port}/appointments/ws");

    println!("connecting to {url}");
    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect failed");

    let start = chrono::Local::now().naive_local() + chrono::Duration::weeks(1);
    let end = start + chrono::Duration::weeks(1);
    let criteria = json!([{
        "user_type": "PRIVATE",
        "control_type": "REGULAR",
        "vehicle_type": "car",
        "organism": "snct",
        "site": "esch_sur_alzette",
        "start_date": start.format("%Y-%m-%dT%H:%M:%S").to_string(),
        "end_date": end.format("%Y-%m-%dT%H:%M:%S").to_string(),
    }]);

    ws.send(Message::text(criteria.to_string()))
        .await
        .expect("send failed");
    println!("criteria sent, waiting for pushes");

    while let Some(msg) = ws.next().await {
        match msg {
            Ok(Message::Text(text)) => println!("<- {text}"),
            Ok(Message::Close(_)) => {
                println!("server closed the stream");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                println!("websocket error: {err}");
                break;
            }
        }
    }
}
