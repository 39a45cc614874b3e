//! Test utilities: a scripted fake of the remote shell.
//!
//! Rules pair a command substring with a queue of canned outputs; the last
//! output of a queue repeats, which makes poll loops easy to script.

pub mod shell {
    use std::collections::VecDeque;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::remote::{CommandOutput, RemoteShell};

    /// Shorthand for a canned [`CommandOutput`].
    pub fn out(exit_code: i32, stdout: &[&str]) -> CommandOutput {
        CommandOutput {
            exit_code,
            stdout: stdout.iter().map(|s| s.to_string()).collect(),
            stderr: Vec::new(),
        }
    }

    struct Rule {
        pattern: String,
        outputs: VecDeque<CommandOutput>,
    }

    /// Fake remote shell answering commands from a fixed script.
    ///
    /// The first rule whose pattern is a substring of the command wins, so
    /// register more specific patterns first. Commands with no matching
    /// rule panic: the test forgot to script them.
    #[derive(Default)]
    pub struct ScriptedShell {
        rules: Mutex<Vec<Rule>>,
        commands: Mutex<Vec<String>>,
        uploads: Mutex<Vec<(PathBuf, String)>>,
    }

    impl ScriptedShell {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer every command containing `pattern` with `output`.
        pub fn on(self, pattern: &str, output: CommandOutput) -> Self {
            self.on_seq(pattern, vec![output])
        }

        /// Answer commands containing `pattern` with `outputs` in order,
        /// repeating the last one.
        pub fn on_seq(self, pattern: &str, outputs: Vec<CommandOutput>) -> Self {
            assert!(!outputs.is_empty(), "scripted rule needs at least one output");
            self.rules.lock().unwrap().push(Rule {
                pattern: pattern.to_string(),
                outputs: outputs.into(),
            });
            self
        }

        /// Every command executed so far, in order.
        pub fn commands(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }

        /// Every upload performed so far, in order.
        pub fn uploads(&self) -> Vec<(PathBuf, String)> {
            self.uploads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteShell for ScriptedShell {
        async fn execute(&self, cmd: &str) -> anyhow::Result<CommandOutput> {
            self.commands.lock().unwrap().push(cmd.to_string());
            let mut rules = self.rules.lock().unwrap();
            for rule in rules.iter_mut() {
                if cmd.contains(&rule.pattern) {
                    let output = if rule.outputs.len() > 1 {
                        rule.outputs.pop_front().unwrap()
                    } else {
                        rule.outputs.front().unwrap().clone()
                    };
                    return Ok(output);
                }
            }
            panic!("no scripted response for command: {cmd}");
        }

        async fn upload(&self, local: &Path, remote: &str) -> anyhow::Result<()> {
            self.uploads
                .lock()
                .unwrap()
                .push((local.to_path_buf(), remote.to_string()));
            Ok(())
        }
    }
}
