//! Shell verbs and their dispatch
//!
//! Every verb is declared once in [`VERBS`] with its argument labels and kinds,
//! the number of required arguments and whether a bucket must be entered.
//! The declaration drives argument checking, `help` and completion. All checks
//! run before a handler starts, so no verb touches the store with bad input.

use s3c_core::{ArgKind, BatchResult, EnvironmentManager, Error, LineSource, Result, Session};

use crate::output::Formatter;

mod cat;
mod cp;
mod dl;
mod find;
mod help;
mod list;
mod ls;
mod mb;
mod mv;
mod nav;
mod rb;
mod rm;
mod touch;
mod ul;

/// One positional argument of a verb
#[derive(Debug, Clone, Copy)]
pub struct Arg {
    pub label: &'static str,
    pub kind: ArgKind,
}

const fn arg(label: &'static str, kind: ArgKind) -> Arg {
    Arg { label, kind }
}

const REMOTE_ANY: ArgKind = ArgKind::Remote { files: true };
const REMOTE_DIR: ArgKind = ArgKind::Remote { files: false };

/// Handler selected by a verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Exit,
    Help,
    Enter,
    Leave,
    Cd,
    Ls,
    Rm,
    Dl,
    Ul,
    Mv,
    Cp,
    Touch,
    Cat,
    Find,
    List,
    MkBucket,
    RmBucket,
}

/// Declaration of a shell verb
#[derive(Debug)]
pub struct Verb {
    pub name: &'static str,
    pub action: Action,
    /// Usage shown by `help`
    pub usage: &'static str,
    pub summary: &'static str,
    pub args: &'static [Arg],
    /// Number of leading arguments that must be present
    pub required: usize,
    pub requires_bucket: bool,
}

impl Verb {
    /// Kind of the argument at `index`, if the verb takes that many
    pub fn arg_kind(&self, index: usize) -> Option<ArgKind> {
        self.args.get(index).map(|a| a.kind)
    }
}

/// All shell verbs in help order
pub static VERBS: &[Verb] = &[
    Verb {
        name: "exit",
        action: Action::Exit,
        usage: "exit",
        summary: "exit application",
        args: &[],
        required: 0,
        requires_bucket: false,
    },
    Verb {
        name: "q",
        action: Action::Exit,
        usage: "q",
        summary: "same as exit",
        args: &[],
        required: 0,
        requires_bucket: false,
    },
    Verb {
        name: "help",
        action: Action::Help,
        usage: "help",
        summary: "show this help",
        args: &[],
        required: 0,
        requires_bucket: false,
    },
    Verb {
        name: "enter",
        action: Action::Enter,
        usage: "enter {name}",
        summary: "enter bucket with given name",
        args: &[arg("bucket name", ArgKind::Bucket)],
        required: 1,
        requires_bucket: false,
    },
    Verb {
        name: "leave",
        action: Action::Leave,
        usage: "leave",
        summary: "leave current bucket",
        args: &[],
        required: 0,
        requires_bucket: true,
    },
    Verb {
        name: "cd",
        action: Action::Cd,
        usage: "cd {dir}",
        summary: "enter named directory or \"..\" for parent dir",
        args: &[arg("dir name", REMOTE_DIR)],
        required: 1,
        requires_bucket: false,
    },
    Verb {
        name: "ls",
        action: Action::Ls,
        usage: "ls [dir]",
        summary: "list objects in current bucket and path",
        args: &[arg("dir name", REMOTE_DIR)],
        required: 0,
        requires_bucket: false,
    },
    Verb {
        name: "rm",
        action: Action::Rm,
        usage: "rm {name}",
        summary: "remove object. Use \"-r\" flag to remove all prefixed objects recursively",
        args: &[arg("object name", REMOTE_ANY), arg("arg", ArgKind::OneOf(&["-r"]))],
        required: 1,
        requires_bucket: true,
    },
    Verb {
        name: "dl",
        action: Action::Dl,
        usage: "dl {src} {dst}",
        summary: "download a remote object {src} and write to local file {dst}",
        args: &[arg("source", REMOTE_ANY), arg("destination", ArgKind::Local)],
        required: 2,
        requires_bucket: true,
    },
    Verb {
        name: "ul",
        action: Action::Ul,
        usage: "ul {src} {dst}",
        summary: "upload local file {src} to remote object {dst}",
        args: &[arg("source", ArgKind::Local), arg("destination", REMOTE_ANY)],
        required: 2,
        requires_bucket: true,
    },
    Verb {
        name: "mv",
        action: Action::Mv,
        usage: "mv {src} {dst}",
        summary: "copies a remote object {src} to new key {dst} and deletes {src}",
        args: &[arg("source", REMOTE_ANY), arg("destination", REMOTE_ANY)],
        required: 2,
        requires_bucket: true,
    },
    Verb {
        name: "cp",
        action: Action::Cp,
        usage: "cp {src} {dst}",
        summary: "copies a remote object {src} to new key {dst}",
        args: &[arg("source", REMOTE_ANY), arg("destination", REMOTE_ANY)],
        required: 2,
        requires_bucket: true,
    },
    Verb {
        name: "touch",
        action: Action::Touch,
        usage: "touch {name}",
        summary: "creates an empty object with key {name}",
        args: &[arg("object name", REMOTE_ANY)],
        required: 1,
        requires_bucket: true,
    },
    Verb {
        name: "cat",
        action: Action::Cat,
        usage: "cat {name}",
        summary: "print content of object {name}",
        args: &[arg("object name", REMOTE_ANY)],
        required: 1,
        requires_bucket: true,
    },
    Verb {
        name: "find",
        action: Action::Find,
        usage: "find {needle}",
        summary: "list all objects with given {needle} in last part of object key",
        args: &[arg("needle", ArgKind::Free), arg("prefix", REMOTE_DIR)],
        required: 1,
        requires_bucket: true,
    },
    Verb {
        name: "list",
        action: Action::List,
        usage: "list {type}",
        summary: "list items of any type in [bucket, env]",
        args: &[arg("list type", ArgKind::OneOf(&["bucket", "buckets", "env"]))],
        required: 1,
        requires_bucket: false,
    },
    Verb {
        name: "mkbucket",
        action: Action::MkBucket,
        usage: "mkbucket {name}",
        summary: "create new bucket with given name",
        args: &[arg("bucket name", ArgKind::Free)],
        required: 1,
        requires_bucket: false,
    },
    Verb {
        name: "rmbucket",
        action: Action::RmBucket,
        usage: "rmbucket {name}",
        summary: "delete bucket with given name",
        args: &[arg("bucket name", ArgKind::Bucket)],
        required: 1,
        requires_bucket: false,
    },
];

/// Look up a verb by name
pub fn find_verb(name: &str) -> Option<&'static Verb> {
    VERBS.iter().find(|verb| verb.name == name)
}

/// Names of all verbs, for completion at the first position
pub fn verb_names() -> impl Iterator<Item = &'static str> {
    VERBS.iter().map(|verb| verb.name)
}

/// Validate bucket requirement and argument count
pub fn check_args(verb: &Verb, args: &[String], session: &Session) -> Result<()> {
    if verb.requires_bucket && session.bucket().is_none() {
        return Err(Error::PreconditionFailed(
            "No bucket entered yet. Please list all available buckets via \"list bucket\" and then enter a bucket using \"enter {name}\"".into(),
        ));
    }
    if args.len() < verb.required {
        return Err(Error::Argument(format!(
            "missing parameter {}",
            verb.args[args.len()].label
        )));
    }
    if args.len() > verb.args.len() {
        return Err(Error::Argument("too many arguments".into()));
    }
    Ok(())
}

/// What the loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Everything a verb handler may use
pub struct Context<'a> {
    pub session: &'a mut Session,
    pub input: &'a mut dyn LineSource,
    pub formatter: &'a Formatter,
    pub environments: &'a EnvironmentManager,
}

/// Run one tokenized command
pub async fn dispatch(ctx: &mut Context<'_>, argv: &[String]) -> Result<Flow> {
    let Some((name, args)) = argv.split_first() else {
        return Ok(Flow::Continue);
    };
    let verb = find_verb(name).ok_or_else(|| {
        Error::Argument(format!(
            "unknown command {name:?}. Use \"help\" to show a list of available commands"
        ))
    })?;
    check_args(verb, args, ctx.session)?;
    tracing::debug!(verb = verb.name, ?args, "dispatch");

    match verb.action {
        Action::Exit => return Ok(Flow::Exit),
        Action::Help => help::execute(ctx),
        Action::Enter => nav::enter(ctx, args).await?,
        Action::Leave => nav::leave(ctx)?,
        Action::Cd => nav::cd(ctx, args).await?,
        Action::Ls => ls::execute(ctx, args).await?,
        Action::Rm => rm::execute(ctx, args).await?,
        Action::Dl => dl::execute(ctx, args).await?,
        Action::Ul => ul::execute(ctx, args).await?,
        Action::Mv => mv::execute(ctx, args).await?,
        Action::Cp => cp::execute(ctx, args).await?,
        Action::Touch => touch::execute(ctx, args).await?,
        Action::Cat => cat::execute(ctx, args).await?,
        Action::Find => find::execute(ctx, args).await?,
        Action::List => list::execute(ctx, args).await?,
        Action::MkBucket => mb::execute(ctx, args).await?,
        Action::RmBucket => rb::execute(ctx, args).await?,
    }
    Ok(Flow::Continue)
}

/// Print the outcome of a batch and turn its failure into the command's error
fn report_batch(formatter: &Formatter, result: BatchResult) -> Result<()> {
    if result.is_partial() {
        formatter.warning(&format!(
            "Stopped after {} before an error; processed objects were not restored",
            result.summary()
        ));
    }
    let result = result.into_result()?;
    if result.count() == 0 {
        formatter.println("Directory is empty");
    } else {
        formatter.println(&format!("Completed: {}", result.summary()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use s3c_core::ConnectionTarget;
    use s3c_core::memory::MemoryStore;
    use std::sync::Arc;

    fn session() -> Session {
        let target = ConnectionTarget::new("test", "localhost:9000", false, "ak", "sk");
        Session::new(target, Arc::new(MemoryStore::new()))
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_verb_table_consistency() {
        for verb in VERBS {
            assert!(verb.required <= verb.args.len(), "{}", verb.name);
        }
        assert!(find_verb("rmbucket").is_some());
        assert!(find_verb("rmdir").is_none());
    }

    #[test]
    fn test_check_args_labels() {
        let session = session();
        let mkbucket = find_verb("mkbucket").unwrap();
        let err = check_args(mkbucket, &[], &session).unwrap_err();
        assert_eq!(err.to_string(), "missing parameter bucket name");

        let err = check_args(mkbucket, &args(&["a", "b"]), &session).unwrap_err();
        assert_eq!(err.to_string(), "too many arguments");
    }

    #[test]
    fn test_check_args_requires_bucket_first() {
        let session = session();
        let cp = find_verb("cp").unwrap();
        let err = check_args(cp, &[], &session).unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));
    }
}
