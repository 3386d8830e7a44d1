//! mv command - Move an object or a directory within the current bucket
//!
//! Object stores cannot rename, so every object is copied and its source is
//! deleted right after its own copy succeeded.

use s3c_core::Result;

use super::Context;
use super::cp::transfer;

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    transfer(ctx, &args[0], &args[1], true).await
}
