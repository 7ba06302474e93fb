//! End-to-End-Tests ueber echte WebSocket-Verbindungen

use std::net::SocketAddr;
use std::time::Duration;

use chatroom_protocol::{umschlag_dekodieren, Umschlag};
use chatroom_server::{config::ServerConfig, Server};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestServer {
    adresse: SocketAddr,
    _stopp: oneshot::Sender<()>,
    _verzeichnis: tempfile::TempDir,
}

async fn server_starten(anpassen: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let verzeichnis = tempfile::tempdir().unwrap();
    let mut config = ServerConfig::default();
    config.netzwerk.bind_adresse = "127.0.0.1".into();
    config.netzwerk.port = 0;
    config.http.statisches_verzeichnis = verzeichnis.path().to_string_lossy().into_owned();
    anpassen(&mut config);

    let gebunden = Server::neu(config).binden().await.expect("Server muss binden");
    let adresse = gebunden.lokale_adresse().unwrap();
    let (stopp, stopp_rx) = oneshot::channel::<()>();
    tokio::spawn(gebunden.ausfuehren(async move {
        let _ = stopp_rx.await;
    }));

    TestServer {
        adresse,
        _stopp: stopp,
        _verzeichnis: verzeichnis,
    }
}

async fn verbinden(server: &TestServer) -> Client {
    let (client, _) = connect_async(format!("ws://{}/chat", server.adresse))
        .await
        .expect("WebSocket-Handshake fehlgeschlagen");
    client
}

async fn senden(client: &mut Client, event: &str, data: &str) {
    client
        .send(Message::text(json!({ "event": event, "data": data }).to_string()))
        .await
        .expect("Senden fehlgeschlagen");
}

async fn naechstes_event(client: &mut Client) -> Umschlag {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("Zeitlimit beim Warten auf ein Event")
            .expect("Verbindung unerwartet beendet")
            .expect("Lesefehler");
        if let Message::Text(text) = frame {
            return umschlag_dekodieren(text.as_str()).expect("Server muss gueltige Events senden");
        }
    }
}

#[tokio::test]
async fn kompletter_chat_ablauf() {
    let server = server_starten(|_| {}).await;

    let mut alice = verbinden(&server).await;
    senden(&mut alice, "add user", "alice").await;
    let login = naechstes_event(&mut alice).await;
    assert_eq!(login.event, "login");
    assert_eq!(login.data.anzahl, Some(1));

    let mut bob = verbinden(&server).await;
    senden(&mut bob, "add user", "bob").await;
    let login = naechstes_event(&mut bob).await;
    assert_eq!(login.data.anzahl, Some(2));

    let beigetreten = naechstes_event(&mut alice).await;
    assert_eq!(beigetreten.event, "user joined");
    assert_eq!(beigetreten.data.benutzername.as_deref(), Some("bob"));
    assert_eq!(beigetreten.data.anzahl, Some(2));

    senden(&mut alice, "new message", "hi").await;
    let nachricht = naechstes_event(&mut bob).await;
    assert_eq!(nachricht.event, "new message");
    assert_eq!(nachricht.data.benutzername.as_deref(), Some("alice"));
    assert_eq!(nachricht.data.nachricht.as_deref(), Some("hi"));

    alice.close(None).await.unwrap();
    let verlassen = naechstes_event(&mut bob).await;
    assert_eq!(verlassen.event, "user left");
    assert_eq!(verlassen.data.benutzername.as_deref(), Some("alice"));
    assert_eq!(verlassen.data.anzahl, Some(1));
}

#[tokio::test]
async fn kaputter_frame_trennt_nur_den_absender() {
    let server = server_starten(|_| {}).await;

    let mut alice = verbinden(&server).await;
    senden(&mut alice, "add user", "alice").await;
    naechstes_event(&mut alice).await;
    let mut bob = verbinden(&server).await;
    senden(&mut bob, "add user", "bob").await;
    naechstes_event(&mut bob).await;
    naechstes_event(&mut alice).await;

    alice.send(Message::text("das ist kein json")).await.unwrap();

    let verlassen = naechstes_event(&mut bob).await;
    assert_eq!(verlassen.event, "user left");
    assert_eq!(verlassen.data.anzahl, Some(1));
}

#[tokio::test]
async fn voller_raum_lehnt_ab() {
    let server = server_starten(|config| config.server.max_clients = 1).await;

    let mut erster = verbinden(&server).await;
    // Login-Antwort stellt sicher, dass die Session registriert ist
    senden(&mut erster, "add user", "erster").await;
    naechstes_event(&mut erster).await;

    match connect_async(format!("ws://{}/chat", server.adresse)).await {
        Err(tungstenite::Error::Http(antwort)) => assert_eq!(antwort.status(), 503),
        Err(e) => panic!("unerwarteter Fehler: {e}"),
        Ok(_) => panic!("zweite Verbindung haette abgelehnt werden muessen"),
    }
}

#[tokio::test]
async fn belegter_port_ist_fehler() {
    let belegt = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = belegt.local_addr().unwrap().port();

    let mut config = ServerConfig::default();
    config.netzwerk.bind_adresse = "127.0.0.1".into();
    config.netzwerk.port = port;

    assert!(Server::neu(config).binden().await.is_err());
}
