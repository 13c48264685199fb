//! Python Execution Capability
//!
//! Runs model-written code in a subprocess. The code is dedented, written to
//! a scratch file and executed by the configured interpreter under a hard
//! wall-clock timeout. Every outcome, including the timeout, is reported as
//! observation text so the loop can continue.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sdk::CapabilityInput;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{Capability, InputSchema, ParamType};

pub const TIMEOUT_MESSAGE: &str = "Error: Code execution timed out.";

#[derive(Debug, Clone)]
pub struct PythonTool {
    interpreter: String,
    timeout: Duration,
}

impl PythonTool {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }

    /// Run a snippet and return the observation text
    pub async fn run(&self, code: &str) -> Result<String> {
        let code = dedent(code);

        let mut script = tempfile::Builder::new()
            .prefix("stride-")
            .suffix(".py")
            .tempfile()
            .context("Failed to create scratch file")?;
        script
            .write_all(code.as_bytes())
            .context("Failed to write scratch file")?;
        script.flush().context("Failed to flush scratch file")?;

        info!("Running code with {} ({} bytes)", self.interpreter, code.len());

        let child = Command::new(&self.interpreter)
            .arg(script.path())
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Failed to start {}: {}", self.interpreter, e);
                return Ok(format!("Error: failed to start {}: {}", self.interpreter, e));
            }
            Err(_) => {
                warn!("Code execution timed out after {:?}", self.timeout);
                return Ok(TIMEOUT_MESSAGE.to_string());
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            debug!("Code exited with {}", output.status);
            return Ok(format!("Error:\n{}", stderr));
        }

        Ok(stdout.trim().to_string())
    }
}

#[async_trait]
impl Capability for PythonTool {
    fn name(&self) -> &str {
        "run_python"
    }

    fn description(&self) -> &str {
        "Execute Python code and return stdout or error output. Use this to test solution logic."
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::object().required("code", ParamType::String)
    }

    async fn invoke(&self, input: CapabilityInput) -> Result<String> {
        let code = input.param_str("code")?;
        self.run(code).await
    }
}

/// Remove the whitespace prefix common to every non-blank line
pub fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(|acc, prefix| common_prefix(acc, prefix));

    let Some(margin) = margin.filter(|m| !m.is_empty()) else {
        return text.to_string();
    };

    let mut out: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            out.push("");
        } else {
            out.push(line.strip_prefix(margin).unwrap_or(line));
        }
    }

    let mut joined = out.join("\n");
    if text.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map(|((i, c), _)| i + c.len_utf8())
        .unwrap_or(0);
    &a[..len]
}
