//! touch command - Create an empty object
//!
//! A name ending in `/` creates a directory marker.

use s3c_core::{Error, Result};

use super::Context;

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let name = &args[0];
    let session = &*ctx.session;
    let bucket = session.require_bucket()?;

    if session.stat(name).await?.exists() {
        return Err(Error::Conflict(format!("Object {name:?} already exists")));
    }
    session
        .store()
        .put_object(bucket, &session.resolve(name), Vec::new(), None)
        .await?;
    ctx.formatter.println("Object has been created");
    Ok(())
}
