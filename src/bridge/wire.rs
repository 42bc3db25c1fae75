use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use super::{Cat, MediatedPair, MediationRequest, RuntimeError, RuntimeResult, SimRuntime};
use crate::logging::{LogLevel, Logger, TARGET_BRIDGE, emit, json_kv, json_str};

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

struct LineIo {
    lines: Lines<BufReader<BoxedReader>>,
    writer: BoxedWriter,
}

/// Newline-delimited JSON client for a runtime living on the other end of a
/// byte stream (a child process, a socket, an in-memory pipe).
///
/// Each call writes one `{"id","method","params"}` line and waits for the
/// matching `{"id","result"}` or `{"id","error"}` line. Calls are serialised:
/// only one request is in flight at a time.
pub struct LineClient {
    io: Mutex<LineIo>,
    next_id: AtomicU64,
    logger: Option<Logger>,
    _child: Option<Child>,
}

impl LineClient {
    pub fn connect<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        Self {
            io: Mutex::new(LineIo {
                lines: BufReader::new(reader).lines(),
                writer: Box::new(writer),
            }),
            next_id: AtomicU64::new(1),
            logger: None,
            _child: None,
        }
    }

    /// Launch `command` and talk to it over its stdin/stdout. The child is
    /// killed when the client is dropped.
    pub fn spawn(command: &[String]) -> RuntimeResult<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| RuntimeError::Transport("no runtime command configured".into()))?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| RuntimeError::Transport(format!("failed to start {program}: {err}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RuntimeError::Transport("runtime stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RuntimeError::Transport("runtime stdout unavailable".into()))?;

        let mut client = Self::connect(stdout, stdin);
        client._child = Some(child);
        Ok(client)
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    async fn call<T>(&self, method: &str, params: Value) -> RuntimeResult<T>
    where
        T: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&WireRequest { id, method, params })
            .map_err(|err| RuntimeError::Protocol(err.to_string()))?;
        line.push('\n');

        let mut io = self.io.lock().await;
        emit(
            self.logger.as_ref(),
            LogLevel::Debug,
            TARGET_BRIDGE,
            "request_sent",
            [json_str("method", method), json_kv("id", id)],
        );
        io.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|err| RuntimeError::Transport(err.to_string()))?;
        io.writer
            .flush()
            .await
            .map_err(|err| RuntimeError::Transport(err.to_string()))?;

        let response = loop {
            let next = io
                .lines
                .next_line()
                .await
                .map_err(|err| RuntimeError::Transport(err.to_string()))?;
            match next {
                Some(raw) if raw.trim().is_empty() => continue,
                Some(raw) => {
                    break serde_json::from_str::<WireResponse>(&raw)
                        .map_err(|err| RuntimeError::Protocol(format!("bad response: {err}")))?;
                }
                None => return Err(RuntimeError::Closed),
            }
        };
        drop(io);

        if response.id != id {
            return Err(RuntimeError::Protocol(format!(
                "expected response {id}, got {}",
                response.id
            )));
        }
        if let Some(message) = response.error {
            emit(
                self.logger.as_ref(),
                LogLevel::Warn,
                TARGET_BRIDGE,
                "request_rejected",
                [json_str("method", method), json_str("error", message.clone())],
            );
            return Err(RuntimeError::Rejected(message));
        }
        serde_json::from_value(response.result)
            .map_err(|err| RuntimeError::Protocol(format!("{method}: {err}")))
    }
}

#[async_trait]
impl SimRuntime for LineClient {
    async fn get_possible_mediators(&self) -> RuntimeResult<Vec<Cat>> {
        self.call("getPossibleMediators", Value::Null).await
    }

    async fn get_possible_mediated(&self) -> RuntimeResult<Vec<Cat>> {
        self.call("getPossibleMediated", Value::Null).await
    }

    async fn get_mediated_pairs(&self) -> RuntimeResult<Vec<MediatedPair>> {
        self.call("getMediatedPairs", Value::Null).await
    }

    async fn mediate(&self, request: MediationRequest) -> RuntimeResult<String> {
        let params =
            serde_json::to_value(&request).map_err(|err| RuntimeError::Protocol(err.to_string()))?;
        self.call("mediate", params).await
    }

    async fn get_settings(&self) -> RuntimeResult<BTreeMap<String, bool>> {
        self.call("getSettings", Value::Null).await
    }

    async fn set_settings(&self, settings: BTreeMap<String, bool>) -> RuntimeResult<()> {
        let _: Value = self.call("setSettings", json!(settings)).await?;
        Ok(())
    }
}
