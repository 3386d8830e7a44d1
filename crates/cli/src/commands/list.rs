//! list command - List buckets or saved environments

use comfy_table::{Table, presets};
use s3c_core::{ConnectionTarget, Error, Result};

use super::Context;
use crate::output::listing::{bucket_row, found_header};

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    match args[0].as_str() {
        "bucket" | "buckets" => buckets(ctx).await,
        "env" => environments(ctx),
        other => Err(Error::Argument(format!(
            "unknown list type {other:?}. Possible parameters are \"bucket\" and \"env\""
        ))),
    }
}

/// Print all buckets of the connected store
pub(super) async fn buckets(ctx: &mut Context<'_>) -> Result<()> {
    let buckets = ctx.session.store().list_buckets().await?;
    if buckets.is_empty() {
        ctx.formatter
            .println("No buckets found. Use \"mkbucket {name}\" to create one");
        return Ok(());
    }

    ctx.formatter
        .println(&found_header(buckets.len(), "bucket", "buckets"));
    for bucket in &buckets {
        ctx.formatter.println(&bucket_row(bucket));
    }
    Ok(())
}

fn environments(ctx: &mut Context<'_>) -> Result<()> {
    let targets = ctx.environments.list()?;
    if targets.is_empty() {
        ctx.formatter
            .println("No environments found. Use \"-e {name}\" to create one");
        return Ok(());
    }
    ctx.formatter.println(&environment_table(&targets));
    Ok(())
}

fn environment_table(targets: &[ConnectionTarget]) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_header(vec!["Name", "Endpoint", "Secure", "Default bucket"]);
    for target in targets {
        table.add_row(vec![
            target.key.clone(),
            target.endpoint.clone(),
            if target.secure { "yes" } else { "no" }.to_string(),
            target.default_bucket().unwrap_or("-").to_string(),
        ]);
    }
    table.to_string()
}
