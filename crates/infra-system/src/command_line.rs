// Validator command line parsing and placeholder substitution

use fencecheck_core::domain::RunError;
use fencecheck_core::port::process_runner::INPUT_PLACEHOLDER;
use std::ffi::OsString;
use std::path::Path;

/// A validator command split into argv using shell quoting rules
///
/// No expansion, globbing or pipes: every token reaches the process as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    argv: Vec<String>,
}

impl CommandLine {
    pub fn parse(command_line: &str) -> Result<Self, RunError> {
        let argv = shell_words::split(command_line)
            .map_err(|e| RunError::InvalidCommand(format!("{}: {}", command_line, e)))?;
        if argv.is_empty() {
            return Err(RunError::InvalidCommand("empty command line".to_string()));
        }
        Ok(Self { argv })
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// True when a token is exactly the input placeholder
    pub fn uses_input_file(&self) -> bool {
        self.argv.iter().any(|token| token == INPUT_PLACEHOLDER)
    }

    /// Arguments after the program, with every placeholder token replaced
    pub fn args_with_input_file(&self, path: &Path) -> Vec<OsString> {
        self.argv[1..]
            .iter()
            .map(|token| {
                if token == INPUT_PLACEHOLDER {
                    path.as_os_str().to_os_string()
                } else {
                    OsString::from(token)
                }
            })
            .collect()
    }

    /// Program with the placeholder replaced, if the program itself is one
    pub fn program_with_input_file(&self, path: &Path) -> OsString {
        if self.argv[0] == INPUT_PLACEHOLDER {
            path.as_os_str().to_os_string()
        } else {
            OsString::from(&self.argv[0])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting_respected() {
        let cmd = CommandLine::parse(r#"sh -c 'echo "a b"; exit 1' $<"#).unwrap();
        assert_eq!(
            cmd.argv(),
            &["sh", "-c", r#"echo "a b"; exit 1"#, "$<"]
        );
        assert!(cmd.uses_input_file());
    }

    #[test]
    fn test_placeholder_must_be_whole_token() {
        let cmd = CommandLine::parse("cat --file=$< '$<x'").unwrap();
        assert!(!cmd.uses_input_file());
    }

    #[test]
    fn test_every_placeholder_substituted() {
        let cmd = CommandLine::parse("diff $< $<").unwrap();
        let args = cmd.args_with_input_file(Path::new("/tmp/in.txt"));
        assert_eq!(args, vec![OsString::from("/tmp/in.txt"), OsString::from("/tmp/in.txt")]);
        assert_eq!(cmd.program_with_input_file(Path::new("/tmp/in.txt")), OsString::from("diff"));
    }

    #[test]
    fn test_invalid_command_lines() {
        assert!(matches!(
            CommandLine::parse("   "),
            Err(RunError::InvalidCommand(_))
        ));
        assert!(matches!(
            CommandLine::parse("echo 'unterminated"),
            Err(RunError::InvalidCommand(_))
        ));
    }
}
