//! Post form submissions, either urlencoded or multipart with an image file.

use actix_multipart::Multipart;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, dev::Payload, error, web};
use futures::TryStreamExt;
use futures::future::LocalBoxFuture;

use folio_core::domain::ImageUpload;
use folio_shared::dto::PostForm;

/// Upper bound for a whole multipart body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Text fields of a post form plus the uploaded image, if any.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub form: PostForm,
    pub image: Option<ImageUpload>,
}

impl FromRequest for PostSubmission {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if req.content_type().starts_with("multipart/") {
            let multipart = Multipart::new(req.headers(), payload.take());
            return Box::pin(read_multipart(multipart));
        }

        let form = web::Form::<PostForm>::from_request(req, payload);
        Box::pin(async move {
            Ok(PostSubmission {
                form: form.await?.into_inner(),
                image: None,
            })
        })
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<PostSubmission, Error> {
    let mut submission = PostSubmission::default();
    let mut received = 0;

    while let Some(mut field) = multipart.try_next().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            received += chunk.len();
            if received > MAX_UPLOAD_BYTES {
                tracing::debug!(received, "Rejecting oversized post submission");
                return Err(error::ErrorPayloadTooLarge("Upload too large"));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "text" => submission.form.text = String::from_utf8_lossy(&data).into_owned(),
            "group" => submission.form.group = Some(String::from_utf8_lossy(&data).into_owned()),
            // An empty file input still arrives as a part, with no file name.
            "image" => {
                submission.image = file_name
                    .filter(|n| !n.trim().is_empty())
                    .map(|n| ImageUpload::new(n, data));
            }
            other => tracing::debug!(field = other, "Ignoring unknown post form field"),
        }
    }

    Ok(submission)
}
