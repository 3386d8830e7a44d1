//! mkbucket command - Create a bucket
//!
//! At root the new bucket is entered right away.

use s3c_core::Result;

use super::Context;

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let bucket = &args[0];
    ctx.session.store().create_bucket(bucket).await?;
    ctx.formatter.success(&format!("bucket {bucket:?} created"));

    if ctx.session.bucket().is_none() {
        ctx.session.enter_bucket(bucket).await?;
    }
    Ok(())
}
