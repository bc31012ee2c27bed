//! Answers insight prompts by piping them through an external program.

use std::{
    env,
    io::{ErrorKind, Write},
    process::{Command, Stdio},
};

use tally_config::InsightsConfig;
use tally_core::{GenerationError, TextGenerator};

/// Environment variable through which the configured model name is passed on.
pub const MODEL_ENV: &str = "TALLY_INSIGHTS_MODEL";

/// Runs `command args...`, writes the prompt to its stdin and takes stdout as
/// the answer. The API key is forwarded in the variable it was read from.
#[derive(Debug, Clone)]
pub struct ExternalCommandGenerator {
    command: Option<String>,
    args: Vec<String>,
    api_key_env: String,
    api_key: String,
    model: String,
}

impl ExternalCommandGenerator {
    /// `None` when the API key variable is unset or empty.
    pub fn from_env(config: &InsightsConfig) -> Option<Self> {
        let api_key = env::var(&config.api_key_env)
            .ok()
            .filter(|value| !value.trim().is_empty())?;
        Some(Self {
            command: config.command.clone(),
            args: config.args.clone(),
            api_key_env: config.api_key_env.clone(),
            api_key,
            model: config.model.clone(),
        })
    }
}

impl TextGenerator for ExternalCommandGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let Some(program) = self.command.as_deref() else {
            return Err(GenerationError::Backend(
                "no insights command configured; set `insights.command`".into(),
            ));
        };
        tracing::debug!(program, model = %self.model, "spawning insights command");

        let mut child = Command::new(program)
            .args(&self.args)
            .env(&self.api_key_env, &self.api_key)
            .env(MODEL_ENV, &self.model)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // a command may answer without reading its input
            if let Err(err) = stdin.write_all(prompt.as_bytes()) {
                if err.kind() != ErrorKind::BrokenPipe {
                    return Err(err.into());
                }
            }
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GenerationError::Backend(format!(
                "`{}` exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn generator(command: &str, args: &[&str]) -> ExternalCommandGenerator {
        ExternalCommandGenerator {
            command: Some(command.to_string()),
            args: args.iter().map(|arg| arg.to_string()).collect(),
            api_key_env: "TALLY_TEST_KEY".into(),
            api_key: "secret".into(),
            model: "test-model".into(),
        }
    }

    #[test]
    fn prompt_is_piped_through_the_command() {
        let answer = generator("cat", &[]).generate("hello\nworld").unwrap();
        assert_eq!(answer, "hello\nworld");
    }

    #[test]
    fn key_and_model_reach_the_child_environment() {
        let script = "printf '%s %s' \"$TALLY_TEST_KEY\" \"$TALLY_INSIGHTS_MODEL\"";
        let answer = generator("sh", &["-c", script]).generate("ignored").unwrap();
        assert_eq!(answer, "secret test-model");
    }

    #[test]
    fn failing_command_reports_its_status() {
        let err = generator("sh", &["-c", "echo boom >&2; exit 3"])
            .generate("prompt")
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn missing_command_is_a_backend_error() {
        let mut generator = generator("cat", &[]);
        generator.command = None;
        let err = generator.generate("prompt").unwrap_err();
        assert!(matches!(err, GenerationError::Backend(_)));
    }
}
