//! # Usage Module
//!
//! Runs `ccusage` and deserializes its block report.

use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::models::BlocksResponse;

pub const DEFAULT_COMMAND: &str = "ccusage";

/// Arguments requesting live, active-only, machine readable blocks.
pub const CCUSAGE_ARGS: [&str; 4] = ["blocks", "--live", "--json", "--active"];

#[derive(Debug, Error)]
pub enum FetchError {
    /// The command could not be started at all (missing binary, permissions)
    #[error("failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran but reported failure
    #[error("{program} exited with {status}: {stderr}")]
    Status {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Output was not a ccusage block report
    #[error("failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FetchError {
    pub fn is_parse(&self) -> bool {
        matches!(self, FetchError::Parse(_))
    }
}

/// Something that produces a fresh block report on demand.
pub trait UsageSource {
    fn fetch(&self) -> impl Future<Output = Result<BlocksResponse, FetchError>> + Send;
}

pub fn parse_blocks(bytes: &[u8]) -> Result<BlocksResponse, FetchError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// The `ccusage` CLI, spawned once per fetch.
#[derive(Debug, Clone)]
pub struct CcusageCommand {
    program: String,
}

impl CcusageCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CcusageCommand {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

impl UsageSource for CcusageCommand {
    // No timeout: a hung ccusage stalls the caller until it exits.
    async fn fetch(&self) -> Result<BlocksResponse, FetchError> {
        debug!(program = %self.program, "running ccusage");
        let output = Command::new(&self.program)
            .args(CCUSAGE_ARGS)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| FetchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(FetchError::Status {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let response = parse_blocks(&output.stdout)?;
        debug!(blocks = response.blocks.len(), "ccusage report parsed");
        Ok(response)
    }
}
