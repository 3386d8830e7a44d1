//! find command - Search object names below a directory
//!
//! Walks the whole tree below the current prefix (or a named directory) and
//! keeps objects whose last path segment contains the needle, ignoring ASCII
//! case. Matches are highlighted in the output.

use futures::TryStreamExt;
use s3c_core::{ObjectInfo, Result};

use super::Context;
use super::ls::{directory_prefix, print_objects};
use crate::output::listing::highlight_matches;

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let bucket = ctx.session.require_bucket()?.to_string();
    let needle = args[0].to_ascii_lowercase();
    let prefix = match args.get(1) {
        Some(dir) => directory_prefix(ctx, dir).await?,
        None => ctx.session.prefix().to_string(),
    };

    let matches: Vec<ObjectInfo> = ctx
        .session
        .store()
        .list_objects(&bucket, &prefix, true)
        .try_filter(|entry| {
            let hit = entry.key != prefix
                && entry.name().to_ascii_lowercase().contains(&needle);
            futures::future::ready(hit)
        })
        .try_collect()
        .await?;

    let formatter = ctx.formatter;
    let mark = |text: &str| formatter.highlight(text);
    let decorate = |name: &str| match name.trim_end_matches('/').rfind('/') {
        Some(pos) => format!(
            "{}{}",
            &name[..=pos],
            highlight_matches(&name[pos + 1..], &needle, &mark)
        ),
        None => highlight_matches(name, &needle, &mark),
    };
    print_objects(formatter, &matches, &prefix, &decorate);
    Ok(())
}
