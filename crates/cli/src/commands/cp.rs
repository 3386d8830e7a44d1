//! cp command - Copy an object or a directory within the current bucket

use s3c_core::batch::{self, CopyPrefix, Silent};
use s3c_core::path::{dir_prefix, normalize_key};
use s3c_core::{Error, ObjectInfo, Result, Stat};

use super::{Context, report_batch};
use crate::output::BatchProgress;

pub async fn execute(ctx: &mut Context<'_>, args: &[String]) -> Result<()> {
    transfer(ctx, &args[0], &args[1], false).await
}

/// Copy `src` to `dst`, deleting each source object after its copy when `moving`
///
/// A file copied onto an existing directory keeps its name inside it.
pub(super) async fn transfer(
    ctx: &mut Context<'_>,
    src: &str,
    dst: &str,
    moving: bool,
) -> Result<()> {
    let session = &*ctx.session;
    let bucket = session.require_bucket()?;
    let store = session.store();
    let src_key = session.resolve(normalize_key(src));
    let mut dst_key = session.resolve(normalize_key(dst));

    match session.stat(src).await? {
        Stat::File { size } => {
            if session.stat(dst).await?.is_dir() {
                let name = src_key.rsplit('/').next().unwrap_or(&src_key);
                dst_key = format!("{}{name}", dir_prefix(&dst_key));
            }
            if dst_key == src_key {
                return Err(Error::Argument(format!(
                    "{src:?} and {dst:?} are the same object"
                )));
            }

            let transform = with_mode(CopyPrefix::new(store, bucket, &src_key, &dst_key), moving);
            batch::apply_one(ObjectInfo::file(src_key.as_str(), size), &transform, &mut Silent)
                .await
                .into_result()?;
            ctx.formatter.println(if moving {
                "Object has been moved"
            } else {
                "Object has been copied"
            });
            Ok(())
        }
        Stat::Directory => {
            let from = dir_prefix(&src_key);
            let to = dir_prefix(&dst_key);
            if to.starts_with(&from) {
                return Err(Error::Argument(format!(
                    "cannot copy directory {src:?} into itself"
                )));
            }

            let transform = with_mode(CopyPrefix::new(store, bucket, from.as_str(), to), moving);
            let mut progress =
                BatchProgress::new(ctx.formatter, if moving { "moved" } else { "copied" });
            let result =
                batch::apply_recursive(store, bucket, &from, &transform, &mut progress).await;
            progress.finish();
            report_batch(ctx.formatter, result)
        }
        Stat::Absent => Err(Error::NotFound(format!("Object {src:?} does not exist"))),
    }
}

fn with_mode(transform: CopyPrefix<'_>, moving: bool) -> CopyPrefix<'_> {
    if moving { transform.moving() } else { transform }
}
