//! help command - List the available verbs

use super::{Context, VERBS};

pub fn execute(ctx: &mut Context<'_>) {
    ctx.formatter.println("Available commands:");
    for verb in VERBS {
        ctx.formatter
            .println(&format!("  {:<16} -  {}", verb.usage, verb.summary));
    }
}
