//! External conformance-checking engine.
//!
//! Optimal alignments are not computed here: a separately distributed jar
//! writes them to disk, and this module runs it as a blocking step that
//! must finish before any trace is repaired.

use std::path::{PathBuf, MAIN_SEPARATOR};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::domain::{AlignError, Result};
use crate::obs::{emit_tool_finished, emit_tool_started};

// ---------------------------------------------------------------------------
// Engine trait
// ---------------------------------------------------------------------------

/// Backend that produces the alignment-info and case-fitness files.
#[async_trait]
pub trait AlignmentEngine: Send + Sync {
    /// Run the engine to completion.
    async fn compute_alignments(&self) -> Result<ToolRun>;
}

/// Captured result of a successful engine run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolRun {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Jar configuration
// ---------------------------------------------------------------------------

/// How to invoke the conformance jar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToolConfig {
    /// Launcher executable.
    pub program: String,

    /// Path to the conformance-checking jar.
    pub jar_path: PathBuf,

    /// Directory the jar writes its output files into.
    pub output_dir: PathBuf,

    /// Log file name; its stem names both the `.xes` log and `.bpmn` model.
    pub log_file: String,

    /// Seconds before the run is abandoned (0 = wait forever).
    pub timeout_secs: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            jar_path: PathBuf::from("external_tools/proconformance/ProConformance2.jar"),
            output_dir: PathBuf::from("output"),
            log_file: String::new(),
            timeout_secs: 3600,
        }
    }
}

impl ToolConfig {
    /// `log_file` up to its first `.`.
    pub fn file_stem(&self) -> &str {
        self.log_file.split('.').next().unwrap_or_default()
    }

    /// Arguments passed to `program`.
    pub fn args(&self) -> Vec<String> {
        let stem = self.file_stem();
        vec![
            "-jar".to_string(),
            self.jar_path.display().to_string(),
            format!("{}{}", self.output_dir.display(), MAIN_SEPARATOR),
            format!("{stem}.xes"),
            format!("{stem}.bpmn"),
            "true".to_string(),
        ]
    }

    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(AlignError::Config("tool.program must not be empty".to_string()));
        }
        if self.jar_path.as_os_str().is_empty() {
            return Err(AlignError::Config("tool.jar_path must not be empty".to_string()));
        }
        if self.file_stem().is_empty() {
            return Err(AlignError::Config("tool.log_file must name a log".to_string()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Subprocess engine
// ---------------------------------------------------------------------------

/// Runs the conformance jar as a child process.
pub struct JarConformanceChecker {
    config: ToolConfig,
}

impl JarConformanceChecker {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AlignmentEngine for JarConformanceChecker {
    async fn compute_alignments(&self) -> Result<ToolRun> {
        self.config.validate()?;
        let args = self.config.args();
        emit_tool_started(&self.config.program, &args);
        let start = Instant::now();

        let child = Command::new(&self.config.program)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = if self.config.timeout_secs > 0 {
            tokio::time::timeout(
                Duration::from_secs(self.config.timeout_secs),
                child.wait_with_output(),
            )
            .await
            .map_err(|_| AlignError::ToolTimeout {
                secs: self.config.timeout_secs,
            })??
        } else {
            child.wait_with_output().await?
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        emit_tool_finished(exit_code, duration_ms);

        if !output.status.success() {
            return Err(AlignError::ToolFailed {
                exit_code,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(ToolRun {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr,
            duration_ms,
        })
    }
}
