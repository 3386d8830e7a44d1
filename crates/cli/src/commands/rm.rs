//! rm command - Remove an object or a whole directory
//!
//! A directory is only removed with the explicit `-r` flag; every key below
//! it is then deleted one at a time.

use s3c_core::batch::{self, Delete, Silent};
use s3c_core::path::{dir_prefix, normalize_key};
use s3c_core::{Error, ObjectInfo, Result, Stat};

use super::{Context, report_batch};
use crate::output::BatchProgress;

const RECURSIVE: &str = "-r";

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let name = &args[0];
    let recursive = match args.get(1).map(String::as_str) {
        None => false,
        Some(RECURSIVE) => true,
        Some(other) => {
            return Err(Error::Argument(format!(
                "unknown argument {other:?}. Use \"-r\" to delete a directory"
            )));
        }
    };
    if normalize_key(name).is_empty() {
        return Err(Error::Argument("object name must not be empty".into()));
    }

    let session = &*ctx.session;
    let bucket = session.require_bucket()?;
    let key = session.resolve(normalize_key(name));
    let store = session.store();
    let delete = Delete::new(store, bucket);

    match session.stat(name).await? {
        Stat::File { size } => {
            batch::apply_one(ObjectInfo::file(key, size), &delete, &mut Silent)
                .await
                .into_result()?;
            ctx.formatter
                .println(&format!("Object {name:?} has been deleted"));
            Ok(())
        }
        Stat::Directory if !recursive => Err(Error::PreconditionFailed(format!(
            "Please use \"rm {name} -r\" when deleting a directory"
        ))),
        Stat::Directory => {
            let mut progress = BatchProgress::new(ctx.formatter, "deleted");
            let result =
                batch::apply_recursive(store, bucket, &dir_prefix(&key), &delete, &mut progress)
                    .await;
            progress.finish();
            report_batch(ctx.formatter, result)
        }
        Stat::Absent => Err(Error::NotFound(format!("Object {name:?} does not exist"))),
    }
}
