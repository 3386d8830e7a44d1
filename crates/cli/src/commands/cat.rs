//! cat command - Print the content of an object

use s3c_core::path::normalize_key;
use s3c_core::{Error, Result, Stat};

use super::Context;

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    let name = &args[0];
    let session = &*ctx.session;
    let bucket = session.require_bucket()?;

    match session.stat(name).await? {
        Stat::File { .. } => {}
        Stat::Directory => return Err(Error::IsADirectory(format!("{name:?} is a directory"))),
        Stat::Absent => return Err(Error::NotFound(format!("File {name:?} not found"))),
    }

    let data = session
        .store()
        .get_object(bucket, &session.resolve(normalize_key(name)))
        .await?;
    ctx.formatter.println(&String::from_utf8_lossy(&data));
    Ok(())
}
