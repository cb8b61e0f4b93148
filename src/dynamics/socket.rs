//! Talks to an IDS running in another process.
//!
//! The protocol is newline-delimited JSON over TCP. On connect, the server sends one
//! greeting line and creates a fresh simulator for that connection. After that every
//! request line gets exactly one response line.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};

use super::{Dynamics, DynamicsFactory, MarkovState};
use crate::env::base::{EnvError, Result};

pub const DEFAULT_ADDR: &str = "127.0.0.1:65432";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ServerMessage {
    pub info: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    Step { action: [f64; 3] },
    MarkovState,
    Seed { seed: u64 },
    Close,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Response {
    #[serde(default)]
    pub reward: Option<f64>,
    #[serde(default)]
    pub state: Option<MarkovState>,
    #[serde(default)]
    pub error: Option<String>,
}

pub struct SocketDynamics {
    runtime: Runtime,
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    timeout: Duration,
    greeting: ServerMessage,
    closed: bool,
}

impl SocketDynamics {
    pub fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_TIMEOUT)
    }

    pub fn connect_with_timeout(addr: &str, timeout: Duration) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let (reader, writer, greeting) = runtime
            .block_on(async { with_timeout(timeout, Self::handshake(addr)).await })
            .map_err(|e| EnvError::Init(format!("could not reach IDS at {addr}: {e}")))?;

        tracing::debug!(addr, info = %greeting.info, "connected to IDS");

        Ok(Self {
            runtime,
            reader,
            writer,
            timeout,
            greeting,
            closed: false,
        })
    }

    async fn handshake(
        addr: &str,
    ) -> Result<(BufReader<OwnedReadHalf>, OwnedWriteHalf, ServerMessage)> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let line = read_response_line(&mut reader).await?;
        let greeting: ServerMessage = serde_json::from_str(&line)?;

        Ok((reader, write_half, greeting))
    }

    /// The greeting the server sent on connect.
    pub fn greeting(&self) -> &ServerMessage {
        &self.greeting
    }

    fn request(&mut self, req: &Request) -> Result<Response> {
        if self.closed {
            return Err(EnvError::Protocol("connection to IDS is closed".into()));
        }

        let mut line = serde_json::to_string(req)?;
        line.push('\n');
        tracing::trace!(request = line.trim_end(), "-> IDS");

        let Self {
            runtime,
            reader,
            writer,
            timeout,
            closed,
            ..
        } = self;

        let reply = match runtime.block_on(with_timeout(*timeout, async {
            writer.write_all(line.as_bytes()).await?;
            read_response_line(reader).await
        })) {
            Ok(reply) => reply,
            Err(e) => {
                // a late reply would otherwise answer the next request
                *closed = true;
                return Err(e);
            }
        };
        tracing::trace!(response = reply.trim_end(), "<- IDS");

        let response: Response = serde_json::from_str(&reply)?;

        match response.error {
            Some(err) => Err(EnvError::Simulator(err)),
            None => Ok(response),
        }
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(EnvError::Protocol(format!(
            "no answer from IDS within {timeout:?}"
        ))),
    }
}

async fn read_response_line(reader: &mut BufReader<OwnedReadHalf>) -> Result<String> {
    let mut buffer = String::new();

    if reader.read_line(&mut buffer).await? == 0 {
        return Err(EnvError::Protocol("IDS closed the connection".into()));
    }

    Ok(buffer)
}

impl Dynamics for SocketDynamics {
    fn step(&mut self, action: [f64; 3]) -> Result<f64> {
        self.request(&Request::Step { action })?
            .reward
            .ok_or_else(|| EnvError::Protocol("step response without reward".into()))
    }

    fn markov_state(&mut self) -> Result<MarkovState> {
        self.request(&Request::MarkovState)?
            .state
            .ok_or_else(|| EnvError::Protocol("markov_state response without state".into()))
    }

    fn seed(&mut self, seed: u64) -> Result<()> {
        self.request(&Request::Seed { seed }).map(|_| ())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }

        if let Err(e) = self.request(&Request::Close) {
            tracing::debug!(error = %e, "IDS did not acknowledge close");
        }
        self.closed = true;
    }
}

/// Opens one connection, and so one simulator, per `create`.
#[derive(Debug, Clone)]
pub struct SocketDynamicsFactory {
    pub addr: String,
    pub timeout: Duration,
}

impl SocketDynamicsFactory {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SocketDynamicsFactory {
    fn default() -> Self {
        Self::new(DEFAULT_ADDR)
    }
}

impl DynamicsFactory for SocketDynamicsFactory {
    type Output = SocketDynamics;

    fn create(&mut self) -> Result<SocketDynamics> {
        SocketDynamics::connect_with_timeout(&self.addr, self.timeout)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::collections::HashMap;
    use std::thread::JoinHandle;
    use std::time::Duration;

    use assert_approx_eq::assert_approx_eq;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    use crate::{
        dynamics::{Dynamics, DynamicsFactory},
        env::{base::EnvError, names::FIELDS},
    };

    use super::{Request, SocketDynamics, SocketDynamicsFactory};

    /// A fake IDS server. Serves `connections` clients one after another. Each
    /// client gets its own step counter. The reward is minus the action sum.
    pub(crate) fn spawn_fake_ids(connections: usize) -> (String, JoinHandle<Vec<Request>>) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            rt.block_on(async move {
                let listener = TcpListener::from_std(listener).unwrap();
                let mut seen = Vec::new();

                for conn in 0..connections {
                    let (stream, _) = listener.accept().await.unwrap();
                    let (read_half, mut write_half) = stream.into_split();
                    let mut reader = BufReader::new(read_half);

                    let greeting = json!({"info": "IDS ready", "data": {"conn": conn.to_string()}});
                    write_half
                        .write_all((greeting.to_string() + "\n").as_bytes())
                        .await
                        .unwrap();

                    let mut steps = 0;
                    let mut line = String::new();
                    loop {
                        line.clear();
                        if reader.read_line(&mut line).await.unwrap() == 0 {
                            break;
                        }

                        let req: Request = match serde_json::from_str(&line) {
                            Ok(r) => r,
                            Err(_) => {
                                let reply = json!({"error": "bad request"});
                                write_half
                                    .write_all((reply.to_string() + "\n").as_bytes())
                                    .await
                                    .unwrap();
                                continue;
                            }
                        };

                        let reply = match &req {
                            Request::Step { action } => {
                                steps += 1;
                                json!({"reward": -(action[0] + action[1] + action[2])})
                            }
                            Request::MarkovState => {
                                let mut state: HashMap<String, f64> = FIELDS
                                    .iter()
                                    .enumerate()
                                    .map(|(i, f)| (f.short.to_string(), i as f64))
                                    .collect();
                                state.insert("p".to_string(), steps as f64);
                                json!({ "state": state })
                            }
                            Request::Seed { seed } if *seed == 0 => {
                                json!({"error": "seed must be positive"})
                            }
                            Request::Seed { .. } | Request::Close => json!({}),
                        };

                        let done = req == Request::Close;
                        seen.push(req);
                        write_half
                            .write_all((reply.to_string() + "\n").as_bytes())
                            .await
                            .unwrap();
                        if done {
                            break;
                        }
                    }
                }

                seen
            })
        });

        (addr, handle)
    }

    /// Serves a single client and answers its n-th request with `replies[n]`,
    /// sent after the given delay. Returns how many requests arrived.
    fn spawn_scripted_ids(replies: Vec<(Duration, &'static str)>) -> (String, JoinHandle<usize>) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            rt.block_on(async move {
                let listener = TcpListener::from_std(listener).unwrap();
                let (stream, _) = listener.accept().await.unwrap();
                let (read_half, mut write_half) = stream.into_split();
                let mut reader = BufReader::new(read_half);

                let _ = write_half
                    .write_all(b"{\"info\": \"IDS ready\", \"data\": {}}\n")
                    .await;

                let mut received = 0;
                let mut line = String::new();
                for (delay, reply) in replies {
                    line.clear();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        break;
                    }
                    received += 1;

                    tokio::time::sleep(delay).await;
                    let _ = write_half.write_all(format!("{reply}\n").as_bytes()).await;
                }

                received
            })
        });

        (addr, handle)
    }

    #[test]
    fn test_request_wire_format() {
        let step = serde_json::to_value(Request::Step {
            action: [0.1, 0.2, 0.3],
        })
        .unwrap();
        assert_eq!(step, json!({"cmd": "step", "action": [0.1, 0.2, 0.3]}));

        let state = serde_json::to_value(Request::MarkovState).unwrap();
        assert_eq!(state, json!({"cmd": "markov_state"}));

        let seed = serde_json::to_value(Request::Seed { seed: 7 }).unwrap();
        assert_eq!(seed, json!({"cmd": "seed", "seed": 7}));
    }

    #[test]
    fn test_step_and_state_over_socket() {
        let (addr, server) = spawn_fake_ids(1);

        let mut ids = SocketDynamics::connect(&addr).unwrap();
        assert_eq!(ids.greeting().info, "IDS ready");

        let reward = ids.step([0.1, 0.2, 0.3]).unwrap();
        assert_approx_eq!(reward, -0.6);
        ids.step([0.0, 0.0, 0.0]).unwrap();

        let state = ids.markov_state().unwrap();
        assert_approx_eq!(state["p"], 2.0);
        assert_eq!(state.len(), FIELDS.len());

        ids.seed(5).unwrap();
        match ids.seed(0) {
            Err(EnvError::Simulator(msg)) => assert_eq!(msg, "seed must be positive"),
            other => panic!("expected simulator error, got {other:?}"),
        }

        ids.close();
        assert!(matches!(ids.step([0.0; 3]), Err(EnvError::Protocol(_))));

        let seen = server.join().unwrap();
        assert_eq!(seen.len(), 6);
        assert_eq!(seen.last(), Some(&Request::Close));
    }

    #[test]
    fn test_factory_opens_fresh_simulators() {
        let (addr, server) = spawn_fake_ids(2);
        let mut factory = SocketDynamicsFactory::new(addr).with_timeout(Duration::from_secs(5));

        let mut first = factory.create().unwrap();
        first.step([1.0, 1.0, 1.0]).unwrap();
        assert_approx_eq!(first.markov_state().unwrap()["p"], 1.0);
        first.close();

        let mut second = factory.create().unwrap();
        assert_eq!(second.greeting().data["conn"], "1");
        assert_approx_eq!(second.markov_state().unwrap()["p"], 0.0);
        second.close();

        server.join().unwrap();
    }

    #[test]
    fn test_connect_refused_is_init_error() {
        // bind then drop to get a port nobody listens on
        let addr = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().to_string()
        };

        let res = SocketDynamics::connect_with_timeout(&addr, Duration::from_secs(2));
        assert!(matches!(res, Err(EnvError::Init(_))));
    }

    #[test]
    fn test_missing_reply_fields_are_protocol_errors() {
        let (addr, server) = spawn_scripted_ids(vec![
            (Duration::ZERO, "{}"),
            (Duration::ZERO, r#"{"reward": -1.0}"#),
        ]);
        let mut ids = SocketDynamics::connect(&addr).unwrap();

        match ids.step([0.0; 3]) {
            Err(EnvError::Protocol(msg)) => assert!(msg.contains("reward")),
            other => panic!("expected protocol error, got {other:?}"),
        }
        match ids.markov_state() {
            Err(EnvError::Protocol(msg)) => assert!(msg.contains("state")),
            other => panic!("expected protocol error, got {other:?}"),
        }

        drop(ids);
        assert_eq!(server.join().unwrap(), 2);
    }

    #[test]
    fn test_malformed_reply_is_serialization_error() {
        let (addr, server) = spawn_scripted_ids(vec![
            (Duration::ZERO, "not json"),
            (Duration::ZERO, r#"{"reward": -2.5}"#),
        ]);
        let mut ids = SocketDynamics::connect(&addr).unwrap();

        assert!(matches!(
            ids.step([0.0; 3]),
            Err(EnvError::Serialization(_))
        ));
        // the bad line was consumed whole, so the stream is still in step
        assert_approx_eq!(ids.step([0.0; 3]).unwrap(), -2.5);

        drop(ids);
        assert_eq!(server.join().unwrap(), 2);
    }

    #[test]
    fn test_timeout_closes_connection() {
        let (addr, server) = spawn_scripted_ids(vec![
            (Duration::from_millis(400), r#"{"reward": -111.0}"#),
            (Duration::ZERO, r#"{"reward": -222.0}"#),
        ]);
        let mut ids =
            SocketDynamics::connect_with_timeout(&addr, Duration::from_millis(150)).unwrap();

        match ids.step([0.1; 3]) {
            Err(EnvError::Protocol(msg)) => assert!(msg.contains("no answer")),
            other => panic!("expected timeout, got {other:?}"),
        }

        // the late reply to the first step must never be taken as this one's
        std::thread::sleep(Duration::from_millis(400));
        assert!(matches!(ids.step([0.2; 3]), Err(EnvError::Protocol(_))));
        assert!(matches!(ids.markov_state(), Err(EnvError::Protocol(_))));

        drop(ids);
        assert_eq!(server.join().unwrap(), 1);
    }
}
