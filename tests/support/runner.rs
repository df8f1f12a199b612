use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bookfetch_core::process::{CommandOutput, ProcessError, ProcessRunner};

use super::epub::{CLEAN_CSS, write_epub};

/// How the scripted import tool behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportBehavior {
    #[default]
    Succeed,
    Fail,
    Panic,
    Missing,
}

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub detached: bool,
}

impl Call {
    /// Program file name, without directories.
    pub fn name(&self) -> &str {
        Path::new(&self.program)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.program)
    }

    pub fn is(&self, name: &str, first_arg: Option<&str>) -> bool {
        self.name() == name && first_arg.is_none_or(|a| self.args.first().map(String::as_str) == Some(a))
    }
}

/// Scripted stand-in for every external program the pipeline calls.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    pub desktop_running: bool,
    pub server_pids: Vec<u32>,
    pub import: ImportBehavior,
    pub convert_fails: bool,
    pub start_fails: bool,
    pub(crate) calls: Mutex<Vec<Call>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, name: &str, first_arg: Option<&str>) -> usize {
        self.calls().iter().filter(|c| c.is(name, first_arg)).count()
    }

    /// Index of the first matching call, if any.
    pub fn position(&self, name: &str, first_arg: Option<&str>) -> Option<usize> {
        self.calls().iter().position(|c| c.is(name, first_arg))
    }

    /// Index of the last matching call, if any.
    pub fn last_position(&self, name: &str, first_arg: Option<&str>) -> Option<usize> {
        self.calls().iter().rposition(|c| c.is(name, first_arg))
    }

    /// Whether the service was launched (detached).
    pub fn started(&self) -> bool {
        self.calls().iter().any(|c| c.detached)
    }

    fn record(&self, program: &str, args: &[String], detached: bool) -> Call {
        let call = Call {
            program: program.to_string(),
            args: args.to_vec(),
            detached,
        };
        self.calls.lock().expect("calls lock").push(call.clone());
        call
    }
}

fn exit(code: i32, stdout: impl Into<String>) -> CommandOutput {
    CommandOutput::with_code(code, stdout)
}

fn checked(program: &str, output: CommandOutput, check: bool) -> Result<CommandOutput, ProcessError> {
    if check && !output.success() {
        return Err(ProcessError::non_zero_exit(program, output.code, &output.stderr));
    }
    Ok(output)
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        check: bool,
    ) -> Result<CommandOutput, ProcessError> {
        let call = self.record(program, args, false);
        let output = match (call.name(), args.first().map(String::as_str)) {
            ("pgrep", Some("-x")) => exit(if self.desktop_running { 0 } else { 1 }, ""),
            ("pgrep", Some("-f")) => {
                let pids: Vec<String> = self.server_pids.iter().map(u32::to_string).collect();
                let code = if pids.is_empty() { 1 } else { 0 };
                exit(code, pids.join("\n"))
            }
            ("kill", _) => exit(0, ""),
            ("calibredb", _) => match self.import {
                ImportBehavior::Succeed => exit(0, "Added book ids: 1"),
                ImportBehavior::Fail => CommandOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: "database is locked".to_string(),
                },
                ImportBehavior::Panic => panic!("import tool crashed"),
                ImportBehavior::Missing => return Err(ProcessError::not_found(program)),
            },
            ("ebook-convert", _) => {
                if self.convert_fails {
                    CommandOutput {
                        code: Some(2),
                        stdout: String::new(),
                        stderr: "conversion error".to_string(),
                    }
                } else {
                    let output = PathBuf::from(&args[1]);
                    write_epub(&output, "Converted", "Converter", Some(CLEAN_CSS));
                    exit(0, "Output saved")
                }
            }
            _ => return Err(ProcessError::not_found(program)),
        };
        checked(program, output, check)
    }

    async fn spawn_detached(&self, program: &str, args: &[String]) -> Result<(), ProcessError> {
        self.record(program, args, true);
        if self.start_fails {
            return Err(ProcessError::not_found(program));
        }
        Ok(())
    }
}
