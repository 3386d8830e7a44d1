//! rmbucket command - Delete a bucket with all its objects
//!
//! Deletion is gated by two confirmations: the bucket name typed again, then
//! the word `DELETE`. Nothing is mutated unless both match exactly.

use s3c_core::batch::{self, Delete};
use s3c_core::{Error, LineSource, Result};

use super::Context;
use crate::output::{BatchProgress, Formatter};

const CONFIRM_WORD: &str = "DELETE";
const ANSWER_PROMPT: &str = "> ";

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let bucket = &args[0];
    if !ctx.session.store().bucket_exists(bucket).await? {
        return Err(Error::NotFound(format!("bucket {bucket:?} does not exist")));
    }

    banner(ctx.formatter, "WARNING: POSSIBLE LOSS OF DATA");
    ctx.formatter
        .println(&format!("You are about to delete bucket {bucket:?}."));
    ctx.formatter
        .println("All data stored in this bucket will be lost and cannot be restored!");
    ctx.formatter
        .println("Please confirm deletion by entering the bucket name below:");
    if answer(ctx.input)? != *bucket {
        ctx.formatter.println("Input mismatch. Bucket was NOT deleted");
        return Err(Error::Aborted("bucket name did not match".into()));
    }

    banner(ctx.formatter, "WARNING: THIS CAN NOT BE UNDONE");
    ctx.formatter.println(&format!(
        "Are you sure? Please enter {CONFIRM_WORD} to finally delete the bucket:"
    ));
    if answer(ctx.input)? != CONFIRM_WORD {
        ctx.formatter.println("Abort. Bucket was NOT deleted");
        return Err(Error::Aborted(format!("{CONFIRM_WORD} was not confirmed")));
    }

    let store = ctx.session.store();
    let mut progress = BatchProgress::new(ctx.formatter, "deleted");
    let result =
        batch::apply_recursive(store, bucket, "", &Delete::new(store, bucket), &mut progress).await;
    progress.finish();
    if result.is_partial() {
        ctx.formatter.warning(&format!(
            "Stopped after deleting {}; the bucket was NOT deleted",
            result.summary()
        ));
    }
    result.into_result()?;

    store.delete_bucket(bucket).await?;
    tracing::debug!(bucket, "bucket deleted");
    ctx.formatter
        .success(&format!("Bucket {bucket:?} has been deleted"));
    ctx.session.forget_bucket(bucket);
    Ok(())
}

fn banner(formatter: &Formatter, title: &str) {
    let inner = format!("###  {title}  ###");
    let frame = "#".repeat(inner.len());
    formatter.warning(&frame);
    formatter.warning(&inner);
    formatter.warning(&frame);
}

fn answer(input: &mut dyn LineSource) -> Result<String> {
    input
        .read_line(ANSWER_PROMPT)?
        .ok_or_else(|| Error::Aborted("unexpected end of input".into()))
}
