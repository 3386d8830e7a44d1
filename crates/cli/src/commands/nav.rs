//! Navigation commands - enter, leave and cd
//!
//! These are the only commands that move the session between buckets and
//! directories.

use s3c_core::Result;

use super::Context;

pub async fn enter(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    ctx.session.enter_bucket(&args[0]).await
}

pub fn leave(ctx: &mut Context<'_>) -> Result<()> {
    ctx.session.leave_bucket()
}

pub async fn cd(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let name = &args[0];
    if ctx.session.bucket().is_none() {
        ctx.formatter.println(&format!(
            "No bucket entered yet. Entering bucket {name:?} instead"
        ));
    }
    let navigation = ctx.session.change_directory(name).await?;
    tracing::debug!(?navigation, prefix = ctx.session.prefix(), "changed directory");
    Ok(())
}
