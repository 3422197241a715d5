//! Key casing stage: camelCase in the client, snake_case on the wire.
//!
//! Only object keys are renamed, recursively through nested objects and
//! arrays. Scalars, `null`, text and empty bodies pass through untouched, as
//! do headers and query strings.

use serde_json::{Map, Value};

use super::{ApiRequest, ApiResponse, Body, RequestStage, StageError};

/// Renames outgoing JSON keys to snake_case and incoming keys to camelCase.
#[derive(Debug, Default, Clone, Copy)]
pub struct CaseConversionStage;

impl RequestStage for CaseConversionStage {
    fn on_request(&self, request: &mut ApiRequest) -> Result<(), StageError> {
        if let Body::Json(value) = &mut request.body {
            *value = to_snake_keys(std::mem::take(value));
        }
        Ok(())
    }

    fn on_response(&self, response: &mut ApiResponse) -> Result<(), StageError> {
        if let Body::Json(value) = &mut response.body {
            *value = to_camel_keys(std::mem::take(value));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "CaseConversionStage"
    }
}

/// Recursively rename every object key to snake_case.
pub fn to_snake_keys(value: Value) -> Value {
    rename_keys(value, &snake_case)
}

/// Recursively rename every object key to camelCase.
pub fn to_camel_keys(value: Value) -> Value {
    rename_keys(value, &camel_case)
}

fn rename_keys(value: Value, rename: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, child) in map {
                out.insert(rename(&key), rename_keys(child, rename));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|v| rename_keys(v, rename)).collect())
        }
        other => other,
    }
}

/// Insert `_` before each ASCII uppercase letter and lowercase it.
///
/// `firstName` → `first_name`. Keys without uppercase letters are unchanged.
pub fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Drop each `_` followed by an ASCII lowercase letter and uppercase the letter.
///
/// `first_name` → `firstName`. Other underscores are kept as-is.
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_'
            && let Some(&next) = chars.peek()
            && next.is_ascii_lowercase()
        {
            out.push(next.to_ascii_uppercase());
            chars.next();
            continue;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use http::{Method, StatusCode};
    use serde_json::json;
    use url::Url;

    use super::*;

    #[test]
    fn snake_case_keys() {
        assert_eq!(snake_case("firstName"), "first_name");
        assert_eq!(snake_case("isSuperuser"), "is_superuser");
        assert_eq!(snake_case("groupID"), "group_i_d");
        assert_eq!(snake_case("already_snake"), "already_snake");
        assert_eq!(snake_case("FirstName"), "_first_name");
    }

    #[test]
    fn camel_case_keys() {
        assert_eq!(camel_case("first_name"), "firstName");
        assert_eq!(camel_case("link_django"), "linkDjango");
        assert_eq!(camel_case("alreadyCamel"), "alreadyCamel");
        assert_eq!(camel_case("field_1"), "field_1");
        assert_eq!(camel_case("trailing_"), "trailing_");
        assert_eq!(camel_case("double__under"), "double_Under");
        assert_eq!(camel_case("_private"), "Private");
    }

    #[test]
    fn outgoing_transform_is_idempotent() {
        let once = to_snake_keys(json!({ "firstName": 1 }));
        assert_eq!(once, json!({ "first_name": 1 }));
        assert_eq!(to_snake_keys(once.clone()), once);
    }

    #[test]
    fn incoming_transform_is_idempotent() {
        let once = to_camel_keys(json!({ "last_name": 1 }));
        assert_eq!(once, json!({ "lastName": 1 }));
        assert_eq!(to_camel_keys(once.clone()), once);
    }

    #[test]
    fn round_trip_restores_structure() {
        let original = json!({ "firstName": 1, "nested": { "lastName": 2 } });
        let wire = to_snake_keys(original.clone());
        assert_eq!(wire, json!({ "first_name": 1, "nested": { "last_name": 2 } }));
        assert_eq!(to_camel_keys(wire), original);
    }

    #[test]
    fn arrays_are_recursed_and_values_untouched() {
        let value = json!({
            "groupGoals": [
                { "goalId": 1, "dueDate": null, "notes": "keepThisValue" },
                [ { "innerKey": true } ],
                "plainString",
                3
            ]
        });
        assert_eq!(
            to_snake_keys(value),
            json!({
                "group_goals": [
                    { "goal_id": 1, "due_date": null, "notes": "keepThisValue" },
                    [ { "inner_key": true } ],
                    "plainString",
                    3
                ]
            })
        );
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(to_snake_keys(json!(null)), json!(null));
        assert_eq!(to_snake_keys(json!("camelCase")), json!("camelCase"));
        assert_eq!(to_camel_keys(json!(42)), json!(42));
    }

    #[test]
    fn stage_transforms_bodies_only() {
        let stage = CaseConversionStage;
        let url = Url::parse("http://localhost/api/v1/groups/?orderBy=groupName").unwrap();
        let mut request = ApiRequest::new(Method::POST, url.clone())
            .with_json(json!({ "groupName": "A" }));
        request
            .headers
            .insert("X-Custom-Header", "camelValue".parse().unwrap());

        stage.on_request(&mut request).unwrap();
        assert_eq!(request.body, Body::Json(json!({ "group_name": "A" })));
        assert_eq!(request.url, url);
        assert_eq!(request.headers["X-Custom-Header"], "camelValue");

        let mut response = ApiResponse {
            status: StatusCode::BAD_REQUEST,
            headers: Default::default(),
            body: Body::Json(json!({ "group_name": ["required"] })),
        };
        stage.on_response(&mut response).unwrap();
        assert_eq!(response.body, Body::Json(json!({ "groupName": ["required"] })));
    }

    #[test]
    fn stage_leaves_text_and_empty_bodies() {
        let stage = CaseConversionStage;
        let mut response = ApiResponse {
            status: StatusCode::OK,
            headers: Default::default(),
            body: Body::Text("snake_case text".into()),
        };
        stage.on_response(&mut response).unwrap();
        assert_eq!(response.body, Body::Text("snake_case text".into()));

        response.body = Body::Empty;
        stage.on_response(&mut response).unwrap();
        assert_eq!(response.body, Body::Empty);
    }
}
