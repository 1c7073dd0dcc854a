//! Synchronous shell commands used by the libc and linker probes.

use std::process::{Command, Stdio};

/// Runs a shell command and returns its trimmed stdout.
///
/// `None` means "no result": the command could not be spawned, its output was
/// not UTF-8, or it wrote anything to stderr.
pub trait CommandRunner {
    fn run(&self, cmd: &str) -> Option<String>;
}

impl<F> CommandRunner for F
where
    F: Fn(&str) -> Option<String>,
{
    fn run(&self, cmd: &str) -> Option<String> {
        self(cmd)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, cmd: &str) -> Option<String> {
        run_shell_command(cmd)
    }
}

/// Quote `arg` as a single word for the shell [`run_shell_command`] uses.
pub fn shell_quote(arg: &str) -> String {
    if cfg!(windows) {
        format!("\"{}\"", arg.replace('"', "\"\""))
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

pub fn run_shell_command(cmd: &str) -> Option<String> {
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C");
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c");
        c
    };

    let output = match command
        .arg(cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            log::debug!("failed to spawn `{cmd}`: {e}");
            return None;
        }
    };

    if !output.stderr.is_empty() {
        log::debug!(
            "`{cmd}` wrote to stderr: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn stdout_is_trimmed() {
        assert_eq!(run_shell_command("echo '  hello  '").as_deref(), Some("hello"));
    }

    #[test]
    fn stderr_output_means_no_result() {
        assert_eq!(run_shell_command("echo oops 1>&2"), None);
    }

    #[test]
    fn quoted_argument_stays_one_word() {
        let arg = "/opt/my site/it's here";
        assert_eq!(shell_quote(arg), "'/opt/my site/it'\\''s here'");
        let echoed = run_shell_command(&format!("printf '%s|' {}", shell_quote(arg)));
        assert_eq!(echoed.as_deref(), Some("/opt/my site/it's here|"));
    }

    #[test]
    fn closures_are_runners() {
        let runner = |cmd: &str| Some(cmd.to_uppercase());
        assert_eq!(runner.run("ldd").as_deref(), Some("LDD"));
    }
}
