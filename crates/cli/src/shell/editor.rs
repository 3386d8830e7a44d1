//! Line editor integration
//!
//! [`Terminal`] reads lines through rustyline and keeps the history file.
//! [`ShellHelper`] completes verbs and arguments from the declared argument
//! kinds, querying the store through the session published before each
//! prompt.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use console::Style;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};
use s3c_core::completion::{Candidate, candidates, matching};
use s3c_core::tokenizer::Tokenizer;
use s3c_core::{ArgKind, Error, LineSource, Result, Session};
use tokio::runtime::Handle;

use crate::commands::{find_verb, verb_names};

/// Latest session state, shared between the loop and the completer
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot(Arc<Mutex<Option<Session>>>);

impl SessionSnapshot {
    pub fn publish(&self, session: &Session) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(session.clone());
        }
    }

    fn current(&self) -> Option<Session> {
        self.0.lock().ok().and_then(|slot| slot.clone())
    }
}

/// What the word under the cursor completes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Verb,
    Arg(ArgKind),
}

/// The line left of the cursor, split for completion
#[derive(Debug, PartialEq, Eq)]
struct Request {
    /// Byte offset where the word under the cursor starts
    start: usize,
    tokens: Vec<String>,
    partial: String,
}

impl Request {
    fn parse(line: &str) -> Self {
        let mut tokenizer = Tokenizer::new();
        tokenizer.feed(line);
        Self {
            start: tokenizer.pending_start().unwrap_or(line.len()),
            tokens: tokenizer.tokens().to_vec(),
            partial: tokenizer.pending().to_string(),
        }
    }

    fn slot(&self) -> Option<Slot> {
        match self.tokens.split_first() {
            None => Some(Slot::Verb),
            Some((verb, args)) => find_verb(verb)?.arg_kind(args.len()).map(Slot::Arg),
        }
    }
}

/// Remaining usage of a verb once its name and a space have been typed
fn usage_hint(line: &str) -> Option<String> {
    let request = Request::parse(line);
    if request.tokens.len() != 1 || !request.partial.is_empty() || !line.ends_with(' ') {
        return None;
    }
    let verb = find_verb(&request.tokens[0])?;
    let rest = verb.usage.strip_prefix(verb.name)?.trim_start();
    (!rest.is_empty()).then(|| rest.to_string())
}

/// Escape characters the tokenizer would otherwise interpret
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ' ' | '\\' | '\'' | '"') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_pair(candidate: Candidate) -> Pair {
    let mut replacement = escape(&candidate.value);
    if candidate.terminal {
        replacement.push(' ');
    }
    Pair {
        display: candidate.display,
        replacement,
    }
}

/// rustyline helper providing completion and usage hints
pub struct ShellHelper {
    snapshot: SessionSnapshot,
    runtime: Handle,
    colors: bool,
}

impl ShellHelper {
    /// `runtime` must belong to a multi-threaded runtime
    pub fn new(snapshot: SessionSnapshot, runtime: Handle, colors: bool) -> Self {
        Self {
            snapshot,
            runtime,
            colors,
        }
    }

    fn completions(&self, line: &str) -> (usize, Vec<Pair>) {
        let request = Request::parse(line);
        let found = match request.slot() {
            None => Vec::new(),
            Some(Slot::Verb) => {
                let verbs: Vec<&str> = verb_names().collect();
                matching(&verbs, &request.partial)
            }
            Some(Slot::Arg(kind)) => self.fetch(kind, &request.partial),
        };
        (request.start, found.into_iter().map(to_pair).collect())
    }

    fn fetch(&self, kind: ArgKind, partial: &str) -> Vec<Candidate> {
        let Some(session) = self.snapshot.current() else {
            return Vec::new();
        };
        let lookup = candidates(&session, kind, partial);
        match tokio::task::block_in_place(|| self.runtime.block_on(lookup)) {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(error = %err, "completion lookup failed");
                Vec::new()
            }
        }
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.completions(&line[..pos]))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() {
            return None;
        }
        usage_hint(line)
    }
}

impl Highlighter for ShellHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        if self.colors {
            Cow::Owned(Style::new().dim().force_styling(true).apply_to(hint).to_string())
        } else {
            Cow::Borrowed(hint)
        }
    }
}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

/// Interactive line source backed by rustyline
pub struct Terminal {
    editor: Editor<ShellHelper, DefaultHistory>,
    history_file: Option<PathBuf>,
}

impl Terminal {
    /// Create the editor, loading `history_file` when given
    pub fn new(helper: ShellHelper, history_file: Option<PathBuf>) -> Result<Self> {
        let mut editor = Editor::new().map_err(editor_error)?;
        editor.set_helper(Some(helper));
        if let Some(path) = &history_file {
            if let Err(err) = editor.load_history(path) {
                tracing::debug!("no history loaded from {}: {err}", path.display());
            }
        }
        Ok(Self {
            editor,
            history_file,
        })
    }

    fn save_history(&mut self) {
        let Some(path) = &self.history_file else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                tracing::warn!("cannot create {}: {err}", parent.display());
                return;
            }
        }
        if let Err(err) = self.editor.save_history(path) {
            tracing::warn!("failed to save history to {}: {err}", path.display());
        }
    }
}

impl LineSource for Terminal {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            Err(ReadlineError::Interrupted) => Err(Error::Aborted("interrupted".into())),
            Err(err) => Err(editor_error(err)),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            tracing::debug!("history entry dropped: {err}");
        }
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        self.save_history();
    }
}

fn editor_error(err: ReadlineError) -> Error {
    Error::Io(std::io::Error::other(err.to_string()))
}
