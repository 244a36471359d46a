//! Body collection shared by the periscope services

use bytes::Bytes;
use http_body::Body;
use http_body_util::BodyExt;

/// Buffers every data frame of `body`; trailers are dropped.
///
/// Takes the body by value, so pass `response.body_mut()` to keep the response.
pub async fn body_to_bytes<B>(body: B) -> Result<Bytes, B::Error>
where
    B: Body,
{
    let collected = body.collect().await?;
    Ok(collected.to_bytes())
}
