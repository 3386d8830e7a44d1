//! aws-sdk-s3 backed object store
//!
//! Listings are paged lazily through continuation tokens; SDK failures are
//! classified into the shell's error kinds with the request that caused them.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use futures::{StreamExt, TryStreamExt};

use s3c_core::{ConnectionTarget, Error, ObjectInfo, ObjectStore, ObjectStream, Result};

use crate::multipart::{self, MULTIPART_THRESHOLD};

/// S3 client wrapper
#[derive(Clone)]
pub struct S3Client {
    inner: aws_sdk_s3::Client,
}

impl S3Client {
    /// Create a new S3 client for a connection target
    pub async fn new(target: &ConnectionTarget) -> Result<Self> {
        let endpoint = target.endpoint_url()?;

        let credentials = aws_credential_types::Credentials::new(
            target.access_key.clone(),
            target.secret_key.clone(),
            None, // session token
            None, // expiry
            "s3client-static-credentials",
        );

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(aws_config::Region::new(target.region.clone()))
            .endpoint_url(endpoint.as_str().trim_end_matches('/'))
            .load()
            .await;

        // Path-style addressing works with every S3-compatible server
        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        tracing::debug!(endpoint = %endpoint, target = %target.key, "created S3 client");

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
        })
    }
}

/// Map an SDK failure onto the shell's error kinds
///
/// `what` names the bucket or object the request was about.
fn classify<E, R>(err: SdkError<E, R>, what: &str) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.code() {
        Some("NoSuchKey" | "NoSuchBucket" | "NotFound") => {
            Error::NotFound(format!("{what} does not exist"))
        }
        Some("BucketAlreadyExists" | "BucketAlreadyOwnedByYou") => {
            Error::Conflict(format!("{what} already exists"))
        }
        _ => Error::store(format!("request for {what} failed"), DisplayErrorContext(&err)),
    }
}

/// Merge the directories and objects of one listing page in key order
fn merge_page(mut dirs: Vec<ObjectInfo>, objects: Vec<ObjectInfo>) -> Vec<ObjectInfo> {
    dirs.extend(objects);
    dirs.sort_by(|a, b| a.key.cmp(&b.key));
    dirs
}

async fn list_page(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    prefix: &str,
    recursive: bool,
    token: Option<String>,
) -> Result<(Vec<ObjectInfo>, Option<String>)> {
    let mut request = client.list_objects_v2().bucket(bucket).prefix(prefix);
    if !recursive {
        request = request.delimiter("/");
    }
    if let Some(token) = token {
        request = request.continuation_token(token);
    }

    let response = request
        .send()
        .await
        .map_err(|e| classify(e, &format!("bucket {bucket:?}")))?;

    let dirs = response
        .common_prefixes()
        .iter()
        .filter_map(|p| p.prefix())
        .map(ObjectInfo::dir)
        .collect();
    let objects = response
        .contents()
        .iter()
        .map(|o| ObjectInfo::file(o.key().unwrap_or_default(), o.size().unwrap_or(0).max(0) as u64))
        .collect();

    let next = if response.is_truncated().unwrap_or(false) {
        response.next_continuation_token().map(str::to_string)
    } else {
        None
    };

    tracing::debug!(bucket, prefix, recursive, more = next.is_some(), "listed page");
    Ok((merge_page(dirs, objects), next))
}

impl S3Client {
    /// Upload every part of `path` and complete the upload
    async fn send_parts(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        size: u64,
        upload_id: &str,
    ) -> Result<()> {
        let what = format!("object {key:?}");
        let mut completed = Vec::new();

        for part in multipart::plan(size) {
            let body = ByteStream::read_from()
                .path(path)
                .offset(part.offset)
                .length(Length::Exact(part.length))
                .build()
                .await
                .map_err(|e| Error::store(format!("failed to read {}", path.display()), e))?;

            let output = self
                .inner
                .upload_part()
                .bucket(bucket)
                .key(key)
                .upload_id(upload_id)
                .part_number(part.number)
                .body(body)
                .send()
                .await
                .map_err(|e| classify(e, &what))?;
            tracing::debug!(key, part = part.number, length = part.length, "uploaded part");

            completed.push(
                CompletedPart::builder()
                    .part_number(part.number)
                    .set_e_tag(output.e_tag().map(str::to_string))
                    .build(),
            );
        }

        self.inner
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(completed))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| classify(e, &what))?;
        Ok(())
    }
}

/// `x-amz-copy-source` value: the bucket and the percent-encoded key
///
/// Each key segment is encoded on its own so separators stay literal.
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded: Vec<_> = key.split('/').map(urlencoding::encode).collect();
    format!("{bucket}/{}", encoded.join("/"))
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn list_buckets(&self) -> Result<Vec<String>> {
        let response = self
            .inner
            .list_buckets()
            .send()
            .await
            .map_err(|e| classify(e, "bucket list"))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.inner.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => match classify(e, &format!("bucket {bucket:?}")) {
                Error::NotFound(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        tracing::debug!(bucket, "create bucket");
        self.inner
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(e, &format!("bucket {bucket:?}")))?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        tracing::debug!(bucket, "delete bucket");
        self.inner
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(e, &format!("bucket {bucket:?}")))?;
        Ok(())
    }

    fn list_objects(&self, bucket: &str, prefix: &str, recursive: bool) -> ObjectStream {
        let client = self.inner.clone();
        let bucket = bucket.to_string();
        let prefix = prefix.to_string();

        // State is the continuation token of the next page; `None` ends the stream
        let pages = futures::stream::try_unfold(Some(None), move |state: Option<Option<String>>| {
            let client = client.clone();
            let bucket = bucket.clone();
            let prefix = prefix.clone();
            async move {
                match state {
                    None => Ok(None),
                    Some(token) => list_page(&client, &bucket, &prefix, recursive, token)
                        .await
                        .map(|(items, next)| Some((items, next.map(Some)))),
                }
            }
        });

        pages
            .map_ok(|items| futures::stream::iter(items.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        tracing::debug!(bucket, key, "get object");
        let what = format!("object {key:?}");
        let response = self
            .inner
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &what))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::store(format!("failed to read {what}"), e))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<u64> {
        tracing::debug!(bucket, key, size = data.len(), "put object");
        let size = data.len() as u64;
        let body = ByteStream::from(data);

        self.inner
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(e, &format!("object {key:?}")))?;

        Ok(size)
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: Option<String>,
    ) -> Result<u64> {
        let size = tokio::fs::metadata(path).await?.len();
        tracing::debug!(bucket, key, size, path = %path.display(), "upload file");

        if size <= MULTIPART_THRESHOLD {
            let body = ByteStream::from_path(path)
                .await
                .map_err(|e| Error::store(format!("failed to read {}", path.display()), e))?;
            self.inner
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(body)
                .set_content_type(content_type)
                .send()
                .await
                .map_err(|e| classify(e, &format!("object {key:?}")))?;
            return Ok(size);
        }

        let upload_id = self
            .inner
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .set_content_type(content_type)
            .send()
            .await
            .map_err(|e| classify(e, &format!("object {key:?}")))?
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| Error::Store(format!("no upload id returned for {key:?}")))?;

        if let Err(err) = self.send_parts(bucket, key, path, size, &upload_id).await {
            if let Err(abort) = self
                .inner
                .abort_multipart_upload()
                .bucket(bucket)
                .key(key)
                .upload_id(&upload_id)
                .send()
                .await
            {
                tracing::warn!(
                    key,
                    upload_id = %upload_id,
                    error = %DisplayErrorContext(&abort),
                    "failed to abort multipart upload"
                );
            }
            return Err(err);
        }
        Ok(size)
    }

    async fn copy_object(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()> {
        tracing::debug!(bucket, src_key, dst_key, "copy object");
        let copy_source = copy_source(bucket, src_key);

        self.inner
            .copy_object()
            .copy_source(&copy_source)
            .bucket(bucket)
            .key(dst_key)
            .send()
            .await
            .map_err(|e| classify(e, &format!("object {src_key:?}")))?;

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        tracing::debug!(bucket, key, "delete object");
        self.inner
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(e, &format!("object {key:?}")))?;

        Ok(())
    }
}
