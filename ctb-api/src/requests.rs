//! One builder per endpoint. Builders only describe the call; dispatching,
//! credentials and URL resolution happen in `AuthenticatedDispatcher`.

use bytes::Bytes;
use ctb_transport::{Authorization, BinaryPart, HttpMethod, Request};

use crate::dto::{NewCreation, UploadDestination};
use crate::extension::UploadExtension;

/// `aborted_with` value telling the backend the user cancelled the upload.
pub const ABORTED_BY_USER: &str = "user";

/// File name and form field of the payload in the storage post.
pub const UPLOAD_FILE_NAME: &str = "creationFile";
pub const UPLOAD_FILE_FIELD: &str = "file";

pub fn new_creation(creation: &NewCreation) -> Request {
    let creator_ids = (!creation.creator_ids.is_empty()).then(|| creation.creator_ids.join(","));

    Request::post("/creations")
        .with_authorization(Authorization::UserLevel)
        .with_optional_field("name", creation.name.as_deref())
        .with_optional_field("creator_ids", creator_ids)
        .with_optional_field("created_at_month", creation.created_at_month.map(|m| m.to_string()))
        .with_optional_field("created_at_year", creation.created_at_year.map(|y| y.to_string()))
        .with_optional_field("reflection_text", creation.reflection_text.as_deref())
        .with_optional_field("reflection_video_url", creation.reflection_video_url.as_deref())
}

pub fn get_creation(creation_id: &str) -> Request {
    Request::get(format!("/creations/{creation_id}")).with_authorization(Authorization::UserLevel)
}

/// Asks the backend for a one-time `UploadDestination`.
pub fn creation_upload(creation_id: &str, extension: UploadExtension) -> Request {
    Request::post(format!("/creations/{creation_id}/uploads"))
        .with_authorization(Authorization::UserLevel)
        .with_field("extension", extension.as_str())
}

/// Multipart post of the payload straight to storage. The destination's
/// credentials go first, then `Content-Type`, then the file.
pub fn upload_payload(destination: &UploadDestination, data: Bytes) -> Request {
    let mut request = Request::absolute(HttpMethod::Post, destination.post_url.as_str())
        .without_default_headers()
        .with_field("name", UPLOAD_FILE_NAME);

    for (name, value) in &destination.post_credentials {
        request = request.with_field(name.as_str(), value.as_str());
    }

    request
        .with_field("Content-Type", destination.content_type.as_str())
        .with_binary(BinaryPart {
            field: UPLOAD_FILE_FIELD.to_string(),
            file_name: UPLOAD_FILE_NAME.to_string(),
            content_type: destination.content_type.clone(),
            data,
        })
}

/// Closes the upload slot. `aborted_with` is `None` on success, the storage
/// response body on failure, or `ABORTED_BY_USER`.
pub fn upload_finished(ping_url: &str, aborted_with: Option<&str>) -> Request {
    Request::absolute(HttpMethod::Put, ping_url)
        .with_authorization(Authorization::UserLevel)
        .with_optional_field("aborted_with", aborted_with)
}

pub fn gallery_submission(gallery_id: &str, creation_id: &str) -> Request {
    Request::post("/gallery_submissions")
        .with_authorization(Authorization::UserLevel)
        .with_field("gallery_id", gallery_id)
        .with_field("creation_id", creation_id)
}

/// Plain GET of a source file on any host.
pub fn download(url: &str) -> Request {
    Request::absolute(HttpMethod::Get, url).without_default_headers()
}

pub fn landing_urls() -> Request {
    Request::get("/landing_urls").with_authorization(Authorization::AppLevel)
}

pub fn logged_in_user() -> Request {
    Request::get("/users/me").with_authorization(Authorization::UserLevel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn new_creation_omits_absent_fields() {
        let request = new_creation(&NewCreation::default());
        assert!(request.fields.is_empty());

        let request = new_creation(
            &NewCreation::default()
                .with_name("Rocket")
                .with_creator_ids(["u1", "u2"])
                .with_creation_date(2016, 5),
        );
        assert_eq!(request.field("name"), Some("Rocket"));
        assert_eq!(request.field("creator_ids"), Some("u1,u2"));
        assert_eq!(request.field("created_at_year"), Some("2016"));
        assert_eq!(request.field("created_at_month"), Some("5"));
        assert_eq!(request.field("reflection_text"), None);
    }

    #[test]
    fn payload_upload_orders_credentials_before_file() {
        let destination = UploadDestination {
            content_type: "image/png".to_string(),
            ping_url: "https://api/ping".to_string(),
            post_url: "https://bucket.s3.amazonaws.com/".to_string(),
            post_credentials: BTreeMap::from([
                ("key".to_string(), "uploads/1.png".to_string()),
                ("policy".to_string(), "cG9saWN5".to_string()),
            ]),
        };

        let request = upload_payload(&destination, Bytes::from_static(b"png"));

        let names: Vec<&str> = request.fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["name", "key", "policy", "Content-Type"]);
        assert_eq!(request.authorization, Authorization::None);
        assert!(request.without_default_headers);
        let part = request.binary.unwrap();
        assert_eq!(part.file_name, UPLOAD_FILE_NAME);
        assert_eq!(part.content_type, "image/png");
    }

    #[test]
    fn upload_finished_carries_abort_reason_only_when_given() {
        assert!(upload_finished("https://api/ping", None).fields.is_empty());
        assert_eq!(
            upload_finished("https://api/ping", Some(ABORTED_BY_USER)).field("aborted_with"),
            Some("user")
        );
    }
}
