//! Bridge to the external betting-analysis agent.
//!
//! The agent is a separate process (a Python script by default). We pass the
//! query on the command line and read one JSON object from the last line of
//! stdout; stderr carries progress output and is only logged.

use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::{Config, AGENT_DEEP_TIMEOUT_SECS, AGENT_KILL_GRACE_SECS, AGENT_QUICK_TIMEOUT_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    #[default]
    Quick,
    Deep,
}

impl std::fmt::Display for AnalysisDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisDepth::Quick => write!(f, "quick"),
            AnalysisDepth::Deep => write!(f, "deep"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent process error: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("agent did not finish within {0:?}")]
    Timeout(Duration),

    #[error("agent exited with status {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("agent produced no output")]
    NoOutput,

    #[error("unparseable agent output '{line}': {source}")]
    Parse {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("agent reported: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait AgentBridge: Send + Sync {
    async fn submit(&self, query: &str, depth: AnalysisDepth) -> Result<Recommendation, AgentError>;
}

/// Shape of the agent's JSON line. Either `recommendation` or `error` is set.
#[derive(Debug, Deserialize)]
struct AgentOutput {
    #[serde(default)]
    recommendation: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Runs `<program> <script> --query <q> --depth <d>` per request.
pub struct SubprocessAgent {
    program: String,
    script: String,
    quick_budget: Duration,
    deep_budget: Duration,
}

impl SubprocessAgent {
    pub fn new(program: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            script: script.into(),
            quick_budget: Duration::from_secs(AGENT_QUICK_TIMEOUT_SECS),
            deep_budget: Duration::from_secs(AGENT_DEEP_TIMEOUT_SECS),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.agent_python.clone(), cfg.agent_script.clone())
    }

    #[cfg(test)]
    pub fn with_budgets(mut self, quick: Duration, deep: Duration) -> Self {
        self.quick_budget = quick;
        self.deep_budget = deep;
        self
    }

    fn budget(&self, depth: AnalysisDepth) -> Duration {
        match depth {
            AnalysisDepth::Quick => self.quick_budget,
            AnalysisDepth::Deep => self.deep_budget,
        }
    }
}

#[async_trait]
impl AgentBridge for SubprocessAgent {
    async fn submit(&self, query: &str, depth: AnalysisDepth) -> Result<Recommendation, AgentError> {
        let budget = self.budget(depth);
        info!(script = %self.script, depth = %depth, budget_s = budget.as_secs(), "Calling betting agent");

        let mut child = Command::new(&self.program)
            .arg(&self.script)
            .arg("--query")
            .arg(query)
            .arg("--depth")
            .arg(depth.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(AgentError::Spawn)?;
        let (Some(mut out_pipe), Some(mut err_pipe)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(AgentError::NoOutput);
        };

        let waited = tokio::time::timeout(budget, async {
            let (out, err, status) = tokio::join!(
                read_all(&mut out_pipe),
                read_all(&mut err_pipe),
                child.wait(),
            );
            Ok::<_, std::io::Error>(Output { stdout: out?, stderr: err?, status: status? })
        })
        .await;

        let output = match waited {
            Ok(res) => res.map_err(AgentError::Spawn)?,
            Err(_) => {
                warn!(depth = %depth, "betting agent timed out after {budget:?}");
                stop(&mut child).await;
                return Err(AgentError::Timeout(budget));
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            debug!(target: "betting_agent", "{}", line);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(json_line) = stdout.lines().rev().find(|l| !l.trim().is_empty()) else {
            if !output.status.success() {
                return Err(AgentError::Exit {
                    code: output.status.code(),
                    stderr: stderr.trim().to_string(),
                });
            }
            return Err(AgentError::NoOutput);
        };

        let parsed: AgentOutput = match serde_json::from_str(json_line.trim()) {
            Ok(p) => p,
            Err(_) if !output.status.success() => {
                return Err(AgentError::Exit {
                    code: output.status.code(),
                    stderr: stderr.trim().to_string(),
                })
            }
            Err(source) => {
                return Err(AgentError::Parse {
                    line: json_line.to_string(),
                    source,
                })
            }
        };

        parse_recommendation(parsed)
    }
}

fn parse_recommendation(out: AgentOutput) -> Result<Recommendation, AgentError> {
    if let Some(err) = out.error {
        return Err(AgentError::Rejected(err));
    }
    let recommendation = out.recommendation.ok_or(AgentError::NoOutput)?;
    Ok(Recommendation {
        recommendation,
        confidence: out.confidence,
        reasoning: out.reasoning,
    })
}

async fn read_all<R: AsyncRead + Unpin>(reader: &mut R) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// SIGTERM, then SIGKILL if the agent is still running after the grace period.
async fn stop(child: &mut Child) {
    if let Some(pid) = child.id() {
        let sent = Command::new("kill")
            .arg("-TERM")
            .arg(pid.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        if let Err(e) = sent {
            warn!(pid, "could not send SIGTERM to betting agent: {e}");
        }
    }
    if tokio::time::timeout(Duration::from_secs(AGENT_KILL_GRACE_SECS), child.wait())
        .await
        .is_err()
    {
        if let Err(e) = child.kill().await {
            warn!("could not kill betting agent: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn script(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("odds-agent-{}-{name}.sh", std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    fn agent(path: &PathBuf) -> SubprocessAgent {
        SubprocessAgent::new("sh", path.to_string_lossy().to_string())
    }

    #[tokio::test]
    async fn parses_last_json_line() {
        let path = script(
            "ok",
            "echo 'warming up'\necho '{\"recommendation\":\"BOS -5.5\",\"confidence\":0.62}'\n",
        );
        let rec = agent(&path).submit("best spread tonight", AnalysisDepth::Quick).await.unwrap();
        assert_eq!(rec.recommendation, "BOS -5.5");
        assert_eq!(rec.confidence, Some(0.62));
        assert!(rec.reasoning.is_none());
    }

    #[tokio::test]
    async fn receives_query_and_depth_arguments() {
        let path = script("args", "printf '{\"recommendation\":\"%s|%s\"}\\n' \"$2\" \"$4\"\n");
        let rec = agent(&path).submit("lakers total", AnalysisDepth::Deep).await.unwrap();
        assert_eq!(rec.recommendation, "lakers total|deep");
    }

    #[tokio::test]
    async fn agent_error_field_is_rejected() {
        let path = script("err", "echo '{\"error\":\"no games found\"}'\n");
        let err = agent(&path).submit("x", AnalysisDepth::Quick).await.unwrap_err();
        assert!(matches!(err, AgentError::Rejected(msg) if msg == "no games found"));
    }

    #[tokio::test]
    async fn nonzero_exit_without_json() {
        let path = script("exit", "echo 'boom' >&2\nexit 3\n");
        let err = agent(&path).submit("x", AnalysisDepth::Quick).await.unwrap_err();
        match err {
            AgentError::Exit { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "boom");
            }
            other => panic!("expected Exit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_output_is_parse_error() {
        let path = script("garbage", "echo 'not json'\n");
        let err = agent(&path).submit("x", AnalysisDepth::Quick).await.unwrap_err();
        assert!(matches!(err, AgentError::Parse { .. }));
    }

    #[tokio::test]
    async fn slow_agent_times_out() {
        let path = script("slow", "sleep 5\necho '{\"recommendation\":\"late\"}'\n");
        let agent = agent(&path).with_budgets(Duration::from_millis(200), Duration::from_secs(1));
        let started = std::time::Instant::now();
        let err = agent.submit("x", AnalysisDepth::Quick).await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout(d) if d == Duration::from_millis(200)));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let agent = SubprocessAgent::new("/nonexistent/python-for-tests", "agent.py");
        let err = agent.submit("x", AnalysisDepth::Quick).await.unwrap_err();
        assert!(matches!(err, AgentError::Spawn(_)));
    }
}
