use ctb_core::{Fields, JsonParser, ParsingResult};
use serde_json::Value;

use crate::dto::{CreationDto, CreationImageUrls, LandingUrlDto, UploadDestination, UserDto};

#[derive(Debug, Clone, Copy, Default)]
pub struct CreationParser;

impl JsonParser for CreationParser {
    type Output = CreationDto;

    fn type_name(&self) -> &'static str {
        "Creation"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<CreationDto> {
        let mut root = Fields::new(value);
        let mut attributes = root.child("attributes");

        let creation = CreationDto {
            id: root.string("id"),
            kind: root.string("type"),
            name: attributes.string("name"),
            approved: attributes.boolean("approved"),
            approval_status: attributes.string("approval_status"),
            image_status: attributes.int("image_status"),
            bubbles_count: attributes.int("bubbles_count"),
            comments_count: attributes.int("comments_count"),
            views_count: attributes.int("views_count"),
            last_bubbled_at: attributes.string("last_bubbled_at"),
            last_commented_at: attributes.string("last_commented_at"),
            last_submitted_at: attributes.string("last_submitted_at"),
            short_url: attributes.string("short_url"),
            created_at: attributes.string("created_at"),
            created_at_age: attributes.string("created_at_age"),
            images: attributes.read_optional(&CreationImageUrlsParser, "image"),
        };

        root.absorb(attributes);
        root.finish(creation)
    }

    fn fallback(&self) -> CreationDto {
        CreationDto::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CreationImageUrlsParser;

impl JsonParser for CreationImageUrlsParser {
    type Output = CreationImageUrls;

    fn type_name(&self) -> &'static str {
        "CreationImageUrls"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<CreationImageUrls> {
        let mut links = Fields::new(value).child("links");
        let urls = CreationImageUrls {
            original: links.string("original"),
            full_view: links.string("full_view"),
            list_view: links.string("list_view"),
            list_view_retina: links.string("list_view_retina"),
            matrix_view: links.string("matrix_view"),
            matrix_view_retina: links.string("matrix_view_retina"),
            gallery_mobile: links.string("gallery_mobile"),
            explore_mobile: links.string("explore_mobile"),
            share: links.string("share"),
        };
        links.finish(urls)
    }

    fn fallback(&self) -> CreationImageUrls {
        CreationImageUrls::default()
    }
}

/// Reads the destination from the resource's `attributes`; all four
/// attributes are required.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadDestinationParser;

impl JsonParser for UploadDestinationParser {
    type Output = UploadDestination;

    fn type_name(&self) -> &'static str {
        "UploadDestination"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<UploadDestination> {
        let mut attributes = Fields::new(value).child("attributes");
        let destination = UploadDestination {
            content_type: attributes.required_string("content_type"),
            ping_url: attributes.required_string("ping_url"),
            post_url: attributes.required_string("post_url"),
            post_credentials: attributes.dictionary("post_credentials", true),
        };
        attributes.finish(destination)
    }

    fn fallback(&self) -> UploadDestination {
        UploadDestination::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LandingUrlParser;

impl JsonParser for LandingUrlParser {
    type Output = LandingUrlDto;

    fn type_name(&self) -> &'static str {
        "LandingUrl"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<LandingUrlDto> {
        let mut root = Fields::new(value);
        let mut attributes = root.child("attributes");
        let landing_url = LandingUrlDto {
            id: root.string("id"),
            kind: root.string("type"),
            url: attributes.required_string("url"),
        };
        root.absorb(attributes);
        root.finish(landing_url)
    }

    fn fallback(&self) -> LandingUrlDto {
        LandingUrlDto::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UserParser;

impl JsonParser for UserParser {
    type Output = UserDto;

    fn type_name(&self) -> &'static str {
        "User"
    }

    fn can_parse(&self, value: &Value) -> bool {
        value.is_object()
    }

    fn parse_value(&self, value: &Value) -> ParsingResult<UserDto> {
        let mut root = Fields::new(value);
        let mut attributes = root.child("attributes");

        let user = UserDto {
            id: root.string("id"),
            kind: root.string("type"),
            username: attributes.string("username"),
            display_name: attributes.string("display_name"),
            list_name: attributes.string("list_name"),
            name: attributes.string("name"),
            role: attributes.string("role"),
            age: attributes.string("age"),
            gender: attributes.string("gender"),
            country_code: attributes.string("country_code"),
            country_name: attributes.string("country_name"),
            avatar_url: attributes.string("avatar_url"),
            short_url: attributes.string("short_url"),
            added_bubbles_count: attributes.int("added_bubbles_count"),
            activities_count: attributes.int("activities_count"),
            bubbles_count: attributes.int("bubbles_count"),
            creations_count: attributes.int("creations_count"),
            comments_count: attributes.int("comments_count"),
            creators_count: attributes.int("creators_count"),
            galleries_count: attributes.int("galleries_count"),
            managers_count: attributes.int("managers_count"),
            last_bubbled_at: attributes.string("last_bubbled_at"),
            last_commented_at: attributes.string("last_commented_at"),
            signed_up_as_instructor: attributes.boolean("signed_up_as_instructor"),
            what_do_you_teach: attributes.string("what_do_you_teach"),
            interests: attributes.string("interests"),
            home_schooling: attributes.boolean("home_schooling"),
        };

        root.absorb(attributes);
        root.finish(user)
    }

    fn fallback(&self) -> UserDto {
        UserDto::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctb_core::ArrayParser;

    const CREATION: &str = r#"{
        "data": {
            "id": "AbCd1234",
            "type": "creations",
            "attributes": {
                "name": "Rocket",
                "approved": true,
                "approval_status": "approved",
                "image_status": 2,
                "bubbles_count": 3,
                "views_count": 10,
                "short_url": "https://ctbl.es/c/AbCd1234",
                "created_at": "2016-05-01T10:00:00Z",
                "image": { "links": { "original": "https://cdn/o.png", "share": "https://cdn/s.png" } }
            }
        }
    }"#;

    #[test]
    fn decodes_creation_with_nested_image_links() {
        let creation = CreationParser.parse_str(CREATION, Some("data"), true).unwrap();

        assert_eq!(creation.id, "AbCd1234");
        assert_eq!(creation.kind, "creations");
        assert_eq!(creation.name, "Rocket");
        assert!(creation.approved);
        assert_eq!(creation.views_count, 10);
        assert_eq!(creation.comments_count, 0);
        let images = creation.images.unwrap();
        assert_eq!(images.original, "https://cdn/o.png");
        assert_eq!(images.full_view, "");
    }

    #[test]
    fn creation_errors_accumulate_across_levels() {
        let body = r#"{"data":{"id":7,"attributes":{"name":[],"views_count":"ten","image":{"links":{"share":false}}}}}"#;
        let errors = CreationParser.parse_str(body, Some("data"), true).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn upload_destination_requires_every_attribute() {
        let body = r#"{"data":{"attributes":{"content_type":"image/png","post_credentials":{"key":"uploads/1.png"}}}}"#;
        let errors = UploadDestinationParser
            .parse_str(body, Some("data"), true)
            .unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn decodes_landing_url_list() {
        let body = r#"{"data":[
            {"id":"ctb-about_us","type":"landing_urls","attributes":{"url":"https://www.creatubbles.com/about_us"}},
            {"id":"ctb-terms","type":"landing_urls","attributes":{"url":"https://www.creatubbles.com/terms"}}
        ]}"#;
        let urls = ArrayParser::new(LandingUrlParser)
            .parse_str(body, Some("data"), true)
            .unwrap();

        assert_eq!(urls.len(), 2);
        assert_eq!(urls[1].id, "ctb-terms");
        assert_eq!(urls[1].url, "https://www.creatubbles.com/terms");
    }

    #[test]
    fn decodes_user() {
        let body = r#"{"data":{"id":"u1","type":"users","attributes":{"username":"artkid","creations_count":12,"home_schooling":true}}}"#;
        let user = UserParser.parse_str(body, Some("data"), true).unwrap();

        assert_eq!(user.username, "artkid");
        assert_eq!(user.creations_count, 12);
        assert!(user.home_schooling);
    }
}
