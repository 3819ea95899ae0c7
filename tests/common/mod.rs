//! In-process stand-in for the remote transposition service.

#![allow(dead_code)]

use std::io;

use tokio::io::{duplex, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

use transpose_client::numeric::NumericKind;
use transpose_client::protocol::{Phase, PhaseSet, TypeTag};

/// Large enough that no test frame is ever split by the pipe.
pub const PIPE_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    pub phase_set: PhaseSet,
    pub type_tag: TypeTag,
    /// How many get_status calls report Running before Completed.
    pub polls_before_done: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            phase_set: PhaseSet::Standard,
            type_tag: TypeTag::Width,
            polls_before_done: 0,
        }
    }
}

struct Job {
    width: usize,
    dimension: usize,
    data: Vec<u8>,
    started: bool,
    polls: usize,
}

impl Job {
    fn transposed(&self) -> Vec<u8> {
        let (n, w) = (self.dimension, self.width);
        let mut out = vec![0u8; self.data.len()];
        for row in 0..n {
            for col in 0..n {
                let from = (row * n + col) * w;
                let to = (col * n + row) * w;
                out[to..to + w].copy_from_slice(&self.data[from..from + w]);
            }
        }
        out
    }
}

/// Spawn a service on one end of an in-memory pipe and return the other end.
pub fn spawn_service(config: ServiceConfig) -> (DuplexStream, JoinHandle<io::Result<()>>) {
    let (client, server) = duplex(PIPE_CAPACITY);
    let task = tokio::spawn(serve(server, config));
    (client, task)
}

fn error_reply(message: &str) -> Vec<u8> {
    let mut reply = vec![1];
    reply.extend_from_slice(message.as_bytes());
    reply
}

fn phase_byte(config: &ServiceConfig, phase: Phase) -> u8 {
    config
        .phase_set
        .encode(phase)
        .unwrap_or_else(|| config.phase_set.encode(Phase::NoData).unwrap_or(0))
}

/// Answer requests until the client hangs up.
pub async fn serve<S>(mut stream: S, config: ServiceConfig) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut jobs: Vec<Job> = Vec::new();

    loop {
        let opcode = match stream.read_u8().await {
            Ok(op) => op,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        };

        let reply = match opcode {
            0 => {
                let tag = stream.read_u8().await?;
                let dimension = stream.read_u32_le().await? as usize;
                let width = match config.type_tag {
                    TypeTag::Width => tag as usize,
                    TypeTag::Code => NumericKind::from_code(tag)
                        .map(NumericKind::width)
                        .unwrap_or(1),
                };
                let mut data = vec![0u8; dimension * dimension * width];
                stream.read_exact(&mut data).await?;

                jobs.push(Job {
                    width,
                    dimension,
                    data,
                    started: false,
                    polls: 0,
                });
                vec![0, (jobs.len() - 1) as u8]
            }
            1 => {
                let index = stream.read_u8().await? as usize;
                let _threads = stream.read_u8().await?;
                match jobs.get_mut(index) {
                    Some(job) => {
                        job.started = true;
                        vec![0]
                    }
                    None => error_reply("Matrix index out of range"),
                }
            }
            2 => {
                let index = stream.read_u8().await? as usize;
                match jobs.get_mut(index) {
                    None => error_reply("Matrix index out of range"),
                    Some(job) if !job.started => vec![0, phase_byte(&config, Phase::Ready)],
                    Some(job) if job.polls < config.polls_before_done => {
                        job.polls += 1;
                        vec![0, phase_byte(&config, Phase::Running)]
                    }
                    Some(job) => {
                        let mut reply = vec![0, phase_byte(&config, Phase::Completed)];
                        reply.extend_from_slice(&job.transposed());
                        reply
                    }
                }
            }
            other => error_reply(&format!("Unknown command {}", other)),
        };

        stream.write_all(&reply).await?;
        stream.flush().await?;
    }
}
