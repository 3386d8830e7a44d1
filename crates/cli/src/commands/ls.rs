//! ls command - List the current directory
//!
//! Lists buckets at root, otherwise the objects and directories directly
//! below the current prefix or below a named directory.

use futures::TryStreamExt;
use s3c_core::path::{dir_prefix, normalize_key};
use s3c_core::{Error, ObjectInfo, Result, Stat};

use super::{Context, list};
use crate::output::Formatter;
use crate::output::listing::{found_header, object_rows};

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let Some(bucket) = ctx.session.bucket().map(str::to_string) else {
        ctx.formatter
            .println("No bucket entered yet. Listing buckets instead");
        return list::buckets(ctx).await;
    };

    let prefix = match args.first() {
        Some(dir) => directory_prefix(ctx, dir).await?,
        None => ctx.session.prefix().to_string(),
    };

    let mut entries: Vec<ObjectInfo> = ctx
        .session
        .store()
        .list_objects(&bucket, &prefix, false)
        .try_collect()
        .await?;
    // the marker of the listed directory itself
    entries.retain(|entry| entry.key != prefix);
    print_objects(ctx.formatter, &entries, &prefix, &|name| name.to_string());
    Ok(())
}

/// Full prefix of a directory argument, which must name a directory
pub(super) async fn directory_prefix(ctx: &Context<'_>, dir: &str) -> Result<String> {
    match ctx.session.stat(dir).await? {
        Stat::Directory => Ok(dir_prefix(&ctx.session.resolve(normalize_key(dir)))),
        Stat::File { .. } => Err(Error::NotADirectory(format!("{dir:?} is a file"))),
        Stat::Absent => Err(Error::NotFound(format!("directory {dir:?} not found"))),
    }
}

/// Print a listing with its header
pub(super) fn print_objects(
    formatter: &Formatter,
    entries: &[ObjectInfo],
    prefix: &str,
    decorate: &dyn Fn(&str) -> String,
) {
    if entries.is_empty() {
        formatter.println("No objects found.");
        return;
    }
    formatter.println(&found_header(entries.len(), "object", "objects"));
    for row in object_rows(entries, prefix, decorate) {
        formatter.println(&row);
    }
}
