//! Interactive loop and one-shot execution
//!
//! Both modes run commands through the same dispatcher. Interactively every
//! error is printed as a single `ERR:` line and the loop goes on; a one-shot
//! command returns its error to the caller.

mod editor;

pub use editor::{SessionSnapshot, ShellHelper, Terminal};

use s3c_core::tokenizer::tokenize_with;
use s3c_core::{EnvironmentManager, Error, LineSource, Result, Session};

use crate::commands::{Context, Flow, dispatch};
use crate::output::Formatter;

/// `{bucket@target}prefix> ` inside a bucket, `{target}> ` at root
pub fn prompt(formatter: &Formatter, session: &Session) -> String {
    let key = &session.target().key;
    match session.bucket() {
        Some(bucket) => {
            let mut prompt = formatter.target(&format!("{{{bucket}@{key}}}"));
            if !session.prefix().is_empty() {
                prompt.push_str(&formatter.prefix(session.prefix()));
            }
            prompt.push_str("> ");
            prompt
        }
        None => format!("{}> ", formatter.target(&format!("{{{key}}}"))),
    }
}

/// Read and run commands until `exit`, `q` or end of input
///
/// `snapshot` receives the session before every prompt so completion sees
/// the current location.
pub async fn run(
    session: &mut Session,
    input: &mut dyn LineSource,
    formatter: &Formatter,
    environments: &EnvironmentManager,
    snapshot: &SessionSnapshot,
) -> Result<()> {
    loop {
        snapshot.publish(session);
        let line = match input.read_line(&prompt(formatter, session)) {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(()),
            // Ctrl-C drops the current line
            Err(Error::Aborted(_)) => continue,
            Err(err) => return Err(err),
        };
        if line.trim().is_empty() {
            continue;
        }
        input.add_history(&line);

        let argv = match tokenize_with(&line, input) {
            Ok(argv) => argv,
            Err(Error::Aborted(_)) => continue,
            Err(err) => {
                formatter.error(&err.to_string());
                continue;
            }
        };

        let mut ctx = Context {
            session: &mut *session,
            input: &mut *input,
            formatter,
            environments,
        };
        match dispatch(&mut ctx, &argv).await {
            Ok(Flow::Exit) => return Ok(()),
            Ok(Flow::Continue) => {}
            Err(err) => {
                tracing::debug!(error = ?err, "command failed");
                formatter.error(&err.to_string());
            }
        }
    }
}

/// Run a single command given on the process command line
pub async fn execute_once(
    session: &mut Session,
    argv: &[String],
    input: &mut dyn LineSource,
    formatter: &Formatter,
    environments: &EnvironmentManager,
) -> Result<()> {
    let mut ctx = Context {
        session,
        input,
        formatter,
        environments,
    };
    dispatch(&mut ctx, argv).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3c_core::ConnectionTarget;
    use s3c_core::input::ScriptedInput;
    use s3c_core::memory::MemoryStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn session(store: MemoryStore) -> Session {
        let target = ConnectionTarget::new("local", "localhost:9000", false, "ak", "sk");
        Session::new(target, Arc::new(store))
    }

    #[tokio::test]
    async fn test_prompt_follows_location() {
        let formatter = Formatter::buffered();
        let mut session = session(MemoryStore::new().with_object("data", "a/b/c", "x"));
        assert_eq!(prompt(&formatter, &session), "{local}> ");

        session.enter_bucket("data").await.unwrap();
        assert_eq!(prompt(&formatter, &session), "{data@local}> ");

        session.change_directory("a").await.unwrap();
        session.change_directory("b").await.unwrap();
        assert_eq!(prompt(&formatter, &session), "{data@local}a/b/> ");
    }

    #[tokio::test]
    async fn test_loop_reports_errors_and_continues() {
        let dir = TempDir::new().unwrap();
        let environments = EnvironmentManager::in_config_dir(dir.path());
        let formatter = Formatter::buffered();
        let mut session = session(MemoryStore::new().with_object("data", "notes.txt", "hello"));
        let mut input = ScriptedInput::new([
            "",
            "enter nope",
            "enter data",
            "cat 'notes.txt'",
            "q",
            "ls",
        ]);

        run(
            &mut session,
            &mut input,
            &formatter,
            &environments,
            &SessionSnapshot::default(),
        )
        .await
        .unwrap();

        assert_eq!(
            formatter.captured(),
            "ERR: bucket \"nope\" does not exist\nhello\n"
        );
        assert_eq!(input.remaining(), 1);
        assert_eq!(input.prompts[4], "{data@local}> ");
    }

    #[tokio::test]
    async fn test_loop_ends_at_end_of_input() {
        let dir = TempDir::new().unwrap();
        let environments = EnvironmentManager::in_config_dir(dir.path());
        let formatter = Formatter::buffered();
        let mut session = session(MemoryStore::new());
        let mut input = ScriptedInput::new(["bogus", "cat \"open"]);

        run(
            &mut session,
            &mut input,
            &formatter,
            &environments,
            &SessionSnapshot::default(),
        )
        .await
        .unwrap();

        let output = formatter.captured();
        assert!(output.starts_with("ERR: unknown command \"bogus\""));
        assert!(output.contains("ERR: unterminated quote"));
    }

    #[tokio::test]
    async fn test_execute_once_returns_error() {
        let dir = TempDir::new().unwrap();
        let environments = EnvironmentManager::in_config_dir(dir.path());
        let formatter = Formatter::buffered();
        let mut session = session(MemoryStore::new());
        let mut input = ScriptedInput::default();

        let err = execute_once(
            &mut session,
            &["leave".to_string()],
            &mut input,
            &formatter,
            &environments,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));
    }
}
