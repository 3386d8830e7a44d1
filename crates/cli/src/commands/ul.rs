//! ul command - Upload a local file or directory tree
//!
//! A single file lands on the destination key, or inside it when the
//! destination is an existing directory. A directory is uploaded file by file
//! below `<dst>/`, keeping relative paths.

use std::path::Path;

use futures::StreamExt;
use s3c_core::batch::{self, Silent, Upload, local_files};
use s3c_core::path::{dir_prefix, normalize_key};
use s3c_core::{Error, Result};

use super::{Context, report_batch};
use crate::output::BatchProgress;

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let (src, dst) = (Path::new(&args[0]), &args[1]);
    let session = &*ctx.session;
    let bucket = session.require_bucket()?;
    let upload = Upload::new(session.store(), bucket);
    let mut key = session.resolve(normalize_key(dst));

    if src.is_dir() {
        ctx.formatter
            .println(&format!("Upload local directory to: {key}"));
        let files = local_files(src, &key).await?;
        let mut progress = BatchProgress::new(ctx.formatter, "uploaded");
        let items = futures::stream::iter(files.into_iter().map(Ok)).boxed();
        let result = batch::run(items, &upload, &mut progress).await;
        progress.finish();
        return report_batch(ctx.formatter, result);
    }

    if session.stat(dst).await?.is_dir() {
        let name = src
            .file_name()
            .ok_or_else(|| Error::Argument(format!("{:?} has no file name", args[0])))?;
        key = format!("{}{}", dir_prefix(&key), name.to_string_lossy());
    }
    let mut files = local_files(src, &key).await?;
    let Some(file) = files.pop() else {
        return Err(Error::NotFound(format!("local file {:?} not found", args[0])));
    };

    ctx.formatter
        .println(&format!("Upload local file to: {}", file.key));
    let result = batch::apply_one(file, &upload, &mut Silent).await;
    report_batch(ctx.formatter, result)
}
