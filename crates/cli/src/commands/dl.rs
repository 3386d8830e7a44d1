//! dl command - Download an object or a directory to the local filesystem

use s3c_core::batch::{self, Download, Silent};
use s3c_core::path::{dir_prefix, normalize_key};
use s3c_core::{Error, ObjectInfo, Result, Stat};

use super::{Context, report_batch};
use crate::output::BatchProgress;

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let (src, dst) = (&args[0], &args[1]);
    let session = &*ctx.session;
    let bucket = session.require_bucket()?;
    let store = session.store();
    let key = session.resolve(normalize_key(src));

    match session.stat(src).await? {
        Stat::File { size } => {
            ctx.formatter.println(&format!("Source Object: {key}"));
            let download = Download::new(store, bucket, key.as_str(), dst);
            let result =
                batch::apply_one(ObjectInfo::file(key.as_str(), size), &download, &mut Silent)
                    .await;
            report_batch(ctx.formatter, result)
        }
        Stat::Directory => {
            ctx.formatter.println(&format!("Source directory: {key}"));
            let from = dir_prefix(&key);
            let download = Download::new(store, bucket, from.as_str(), dst);
            let mut progress = BatchProgress::new(ctx.formatter, "downloaded");
            let result =
                batch::apply_recursive(store, bucket, &from, &download, &mut progress).await;
            progress.finish();
            report_batch(ctx.formatter, result)
        }
        Stat::Absent => Err(Error::NotFound(format!("Object {src:?} does not exist"))),
    }
}
