//! Execution modules bound to manifest skills.
//!
//! A manifest names its module with the `module` field.  The loader resolves
//! that reference against a [`ModuleTable`] of in-process handlers first, and
//! otherwise treats it as a script file inside the skill directory, run by a
//! [`ScriptModule`].

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use skillroute_core::error::{Result, SkillError};
use skillroute_core::{Phase, SkillContext, SkillGuard, SkillIO, SkillOutput};
use tokio::io::AsyncWriteExt;

/// Default wall-clock limit for one script invocation.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(60);

/// The behavior half of a manifest skill: `execute` plus an optional guard.
#[async_trait]
pub trait SkillModule: Send + Sync {
    async fn execute(&self, io: &SkillIO, ctx: &SkillContext) -> Result<SkillOutput>;

    fn guard(&self) -> Option<&dyn SkillGuard> {
        None
    }
}

// ---------------------------------------------------------------------------
// Module table
// ---------------------------------------------------------------------------

/// In-process modules, keyed by the reference a manifest uses.
#[derive(Clone, Default)]
pub struct ModuleTable {
    modules: HashMap<String, Arc<dyn SkillModule>>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module, replacing any previous one under the same name.
    pub fn insert(&mut self, name: impl Into<String>, module: Arc<dyn SkillModule>) {
        let name = name.into();
        if self.modules.insert(name.clone(), module).is_some() {
            tracing::debug!(module = %name, "replaced skill module");
        }
    }

    pub fn with(mut self, name: impl Into<String>, module: Arc<dyn SkillModule>) -> Self {
        self.insert(name, module);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn SkillModule>> {
        self.modules.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ModuleTable").field("modules", &names).finish()
    }
}

// ---------------------------------------------------------------------------
// Script modules
// ---------------------------------------------------------------------------

/// Interpreters a script module can be run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptInterpreter {
    /// `.sh`, `.bash`
    Shell,
    /// `.py`
    Python,
    /// `.js`, `.mjs`
    JavaScript,
    /// `.ts`, `.mts`
    TypeScript,
}

impl ScriptInterpreter {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "sh" | "bash" => Some(Self::Shell),
            "py" => Some(Self::Python),
            "js" | "mjs" => Some(Self::JavaScript),
            "ts" | "mts" => Some(Self::TypeScript),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn command(&self) -> &'static str {
        match self {
            Self::Shell => "bash",
            Self::Python => "python3",
            Self::JavaScript => "node",
            Self::TypeScript => "deno",
        }
    }

    /// Arguments placed before the script path.
    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Self::Shell | Self::Python | Self::JavaScript => &[],
            Self::TypeScript => &["run", "--allow-all"],
        }
    }
}

/// A module backed by a script file.
///
/// Each call spawns the interpreter and writes one JSON line to its stdin:
///
/// ```json
/// { "phase": "execute", "io": { "input": "..." }, "ctx": { "locale": "en" } }
/// ```
///
/// For `execute`, stdout is parsed as a [`SkillOutput`] when it is a JSON
/// object with a `result` key, as a bare result when it is any other JSON
/// value, and taken as plain text otherwise.  A non-zero exit fails the call.
///
/// When the manifest sets `guard = true` the script is also invoked with
/// `"phase": "guard"`; a non-zero exit rejects the request with stderr as the
/// reason.
#[derive(Debug, Clone)]
pub struct ScriptModule {
    path: PathBuf,
    interpreter: ScriptInterpreter,
    guard_enabled: bool,
    timeout: Duration,
}

/// Raw result of one script invocation.
struct ScriptRun {
    success: bool,
    code: i32,
    stdout: String,
    stderr: String,
}

impl ScriptModule {
    pub fn new(path: impl Into<PathBuf>, interpreter: ScriptInterpreter) -> Self {
        Self {
            path: path.into(),
            interpreter,
            guard_enabled: false,
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }

    /// Build a module for `path`, inferring the interpreter from its
    /// extension.
    pub fn for_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let interpreter = ScriptInterpreter::from_path(&path)?;
        Some(Self::new(path, interpreter))
    }

    pub fn with_guard(mut self, enabled: bool) -> Self {
        self.guard_enabled = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn interpreter(&self) -> ScriptInterpreter {
        self.interpreter
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    async fn invoke(&self, phase: &str, io: &SkillIO, ctx: &SkillContext) -> Result<ScriptRun> {
        tracing::debug!(
            script = %self.path.display(),
            interpreter = self.interpreter.command(),
            phase,
            "executing skill script"
        );

        let payload = json!({
            "phase": phase,
            "io": io,
            "ctx": ctx.to_json(),
        });
        let mut line = serde_json::to_vec(&payload)?;
        line.push(b'\n');

        // Scripts run from their own directory, so the path must not be
        // relative to ours.
        let script = std::path::absolute(&self.path)?;

        let mut cmd = tokio::process::Command::new(self.interpreter.command());
        cmd.args(self.interpreter.args())
            .arg(&script)
            .env("SKILLROUTE_PHASE", phase)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = script.parent() {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            SkillError::Failed(format!("failed to spawn script `{}`: {e}", self.file_name()))
        })?;

        // Feed stdin while waiting so that neither side can block the other,
        // and keep both under the deadline.  Dropping the timed-out future
        // kills the child.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A script may exit without reading its input.
                if let Err(e) = stdin.write_all(&line).await {
                    tracing::debug!(error = %e, "script closed stdin early");
                }
            }
        };
        let run = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                tracing::warn!(
                    script = %self.path.display(),
                    phase,
                    timeout = ?self.timeout,
                    "skill script timed out"
                );
                SkillError::Timeout {
                    phase: if phase == "guard" { Phase::Guard } else { Phase::Execute },
                    after: self.timeout,
                }
            })??;

        Ok(ScriptRun {
            success: output.status.success(),
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        })
    }
}

#[async_trait]
impl SkillModule for ScriptModule {
    async fn execute(&self, io: &SkillIO, ctx: &SkillContext) -> Result<SkillOutput> {
        let run = self.invoke("execute", io, ctx).await?;
        if !run.success {
            let detail = if run.stderr.is_empty() { &run.stdout } else { &run.stderr };
            return Err(SkillError::Failed(format!(
                "script `{}` exited with code {}: {detail}",
                self.file_name(),
                run.code
            )));
        }
        Ok(parse_script_output(&run.stdout))
    }

    fn guard(&self) -> Option<&dyn SkillGuard> {
        if self.guard_enabled { Some(self) } else { None }
    }
}

#[async_trait]
impl SkillGuard for ScriptModule {
    async fn check(&self, io: &SkillIO, ctx: &SkillContext) -> Result<()> {
        let run = self.invoke("guard", io, ctx).await?;
        if run.success {
            return Ok(());
        }
        let reason = if run.stderr.is_empty() {
            format!("guard script exited with code {}", run.code)
        } else {
            run.stderr
        };
        Err(SkillError::Rejected(reason))
    }
}

/// Interpret script stdout as an output envelope, a bare JSON result, or
/// text.
fn parse_script_output(stdout: &str) -> SkillOutput {
    match serde_json::from_str::<Value>(stdout) {
        Ok(value) if value.get("result").is_some() => serde_json::from_value(value.clone())
            .unwrap_or_else(|e| {
                tracing::debug!(error = %e, "script output is not an envelope, using it as result");
                SkillOutput::new(value)
            }),
        Ok(value) => SkillOutput::new(value),
        Err(_) => SkillOutput::new(stdout),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl SkillModule for Echo {
        async fn execute(&self, io: &SkillIO, _ctx: &SkillContext) -> Result<SkillOutput> {
            Ok(SkillOutput::new(io.input.clone()))
        }
    }

    #[test]
    fn interpreter_from_extension() {
        assert_eq!(ScriptInterpreter::from_extension("sh"), Some(ScriptInterpreter::Shell));
        assert_eq!(ScriptInterpreter::from_extension("mjs"), Some(ScriptInterpreter::JavaScript));
        assert_eq!(ScriptInterpreter::from_extension("rb"), None);
        assert_eq!(
            ScriptInterpreter::from_path(Path::new("run.py")),
            Some(ScriptInterpreter::Python)
        );
        assert_eq!(ScriptInterpreter::TypeScript.args(), &["run", "--allow-all"]);
    }

    #[tokio::test]
    async fn module_table_lookup() {
        let table = ModuleTable::new().with("echo", Arc::new(Echo));
        assert!(table.contains("echo"));
        assert_eq!(table.len(), 1);
        assert!(table.get("missing").is_none());

        let module = table.get("echo").unwrap();
        assert!(module.guard().is_none());
        let out = module
            .execute(&SkillIO::new("hi"), &SkillContext::new())
            .await
            .unwrap();
        assert_eq!(out.result, "hi");
    }

    #[test]
    fn parse_envelope_output() {
        let out = parse_script_output(r#"{"result": {"ok": true}, "meta": {"k": 1}}"#);
        assert_eq!(out.result["ok"], true);
        assert_eq!(out.meta["k"], 1);
    }

    #[test]
    fn parse_bare_json_and_text_output() {
        assert_eq!(parse_script_output("[1, 2]").result, json!([1, 2]));
        assert_eq!(parse_script_output("hello there").result, "hello there");
    }

    #[test]
    fn guard_only_when_enabled() {
        let module = ScriptModule::new("run.sh", ScriptInterpreter::Shell);
        assert!(SkillModule::guard(&module).is_none());
        assert!(SkillModule::guard(&module.with_guard(true)).is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn script_execute_and_guard() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("run.sh");
        std::fs::write(
            &script,
            r#"read -r line
if [ "$SKILLROUTE_PHASE" = "guard" ]; then
  case "$line" in
    *blocked*) echo "blocked input" >&2; exit 3 ;;
  esac
  exit 0
fi
echo '{"result": "done", "meta": {"via": "script"}}'
"#,
        )
        .unwrap();

        let module = ScriptModule::for_path(&script).unwrap().with_guard(true);
        let ctx = SkillContext::new();

        let out = module.execute(&SkillIO::new("go"), &ctx).await.unwrap();
        assert_eq!(out.result, "done");
        assert_eq!(out.meta["via"], "script");

        let guard = SkillModule::guard(&module).unwrap();
        assert!(guard.check(&SkillIO::new("fine"), &ctx).await.is_ok());
        let err = guard.check(&SkillIO::new("blocked"), &ctx).await.unwrap_err();
        assert!(matches!(err, SkillError::Rejected(ref r) if r == "blocked input"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn script_failure_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("fail.sh");
        std::fs::write(&script, "echo boom >&2\nexit 2\n").unwrap();

        let module = ScriptModule::for_path(&script).unwrap();
        let err = module
            .execute(&SkillIO::new("x"), &SkillContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::Failed(ref m) if m.contains("code 2") && m.contains("boom")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn timeout_covers_scripts_that_ignore_large_input() {
        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("hang.sh");
        std::fs::write(&script, "sleep 30\n").unwrap();

        let module = ScriptModule::for_path(&script)
            .unwrap()
            .with_timeout(Duration::from_millis(200));
        // Far larger than a pipe buffer, so the write alone would block.
        let io = SkillIO::new("x".repeat(1024 * 1024));

        let started = std::time::Instant::now();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            module.execute(&io, &SkillContext::new()),
        )
        .await
        .expect("script deadline must bound the whole call");

        let err = result.unwrap_err();
        assert!(matches!(
            err,
            SkillError::Timeout { phase: Phase::Execute, after } if after == Duration::from_millis(200)
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
