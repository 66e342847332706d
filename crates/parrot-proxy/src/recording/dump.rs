//! Renderers for `/dumpToLog`.

use crate::model::{
    Body, BodyContent, Cookie, HttpRequest, HttpResponse, KeyToMultiValue, MatchType,
    NottableString,
};
use base64::Engine;
use serde_json::json;
use std::fmt::Write;
use std::str::FromStr;

/// Output format selected by the `type` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    /// Java client code that recreates the exchange as an expectation.
    Java,
    #[default]
    Json,
}

impl FromStr for DumpFormat {
    type Err = std::convert::Infallible;

    /// Only `java` selects Java; anything else is JSON.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("java") {
            DumpFormat::Java
        } else {
            DumpFormat::Json
        })
    }
}

pub fn render(format: DumpFormat, request: &HttpRequest, response: &HttpResponse) -> String {
    match format {
        DumpFormat::Java => render_java(request, response),
        DumpFormat::Json => render_json(request, response),
    }
}

pub fn render_json(request: &HttpRequest, response: &HttpResponse) -> String {
    let entry = json!({ "httpRequest": request, "httpResponse": response });
    serde_json::to_string_pretty(&entry).unwrap_or_else(|_| entry.to_string())
}

const INDENT: &str = "        ";

pub fn render_java(request: &HttpRequest, response: &HttpResponse) -> String {
    let mut out = String::from("new MockServerClient(\"localhost\", 1080)\n");
    out.push_str(INDENT);
    out.push_str(".when(\n");
    java_request(&mut out, request, 2);
    out.push_str(",\n");
    line(&mut out, 2, "Times.once()");
    out.push('\n');
    out.push_str(INDENT);
    out.push_str(")\n");
    out.push_str(INDENT);
    out.push_str(".respond(\n");
    java_response(&mut out, response, 2);
    out.push('\n');
    out.push_str(INDENT);
    out.push_str(");");
    out
}

fn line(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(text);
}

fn java_request(out: &mut String, request: &HttpRequest, depth: usize) {
    line(out, depth, "request()");
    if !request.method.is_unset() {
        call(out, depth + 1, "withMethod", &nottable(&request.method));
    }
    if !request.path.is_unset() {
        call(out, depth + 1, "withPath", &nottable(&request.path));
    }
    entries(
        out,
        depth + 1,
        "withQueryStringParameters",
        "Parameter",
        &request.query_string_parameters,
    );
    entries(out, depth + 1, "withHeaders", "Header", &request.headers);
    cookies(out, depth + 1, &request.cookies);
    if let Some(secure) = request.secure {
        call(out, depth + 1, "withSecure", &secure.to_string());
    }
    if let Some(keep_alive) = request.keep_alive {
        call(out, depth + 1, "withKeepAlive", &keep_alive.to_string());
    }
    if let Some(body) = &request.body {
        call(out, depth + 1, "withBody", &java_body(body));
    }
}

fn java_response(out: &mut String, response: &HttpResponse, depth: usize) {
    line(out, depth, "response()");
    call(out, depth + 1, "withStatusCode", &response.status().to_string());
    entries(out, depth + 1, "withHeaders", "Header", &response.headers);
    cookies(out, depth + 1, &response.cookies);
    if let Some(body) = &response.body {
        call(out, depth + 1, "withBody", &java_body(body));
    }
}

fn call(out: &mut String, depth: usize, method: &str, argument: &str) {
    out.push('\n');
    line(out, depth, &format!(".{method}({argument})"));
}

fn entries(out: &mut String, depth: usize, method: &str, class: &str, entries: &[KeyToMultiValue]) {
    if entries.is_empty() {
        return;
    }
    let rendered: Vec<String> = entries
        .iter()
        .map(|entry| {
            let mut arguments = vec![nottable(&entry.name)];
            arguments.extend(entry.values.iter().map(nottable));
            format!("new {class}({})", arguments.join(", "))
        })
        .collect();
    list_call(out, depth, method, &rendered);
}

fn cookies(out: &mut String, depth: usize, cookies: &[Cookie]) {
    if cookies.is_empty() {
        return;
    }
    let rendered: Vec<String> = cookies
        .iter()
        .map(|cookie| {
            format!(
                "new Cookie({}, {})",
                nottable(&cookie.name),
                nottable(&cookie.value)
            )
        })
        .collect();
    list_call(out, depth, "withCookies", &rendered);
}

fn list_call(out: &mut String, depth: usize, method: &str, items: &[String]) {
    out.push('\n');
    line(out, depth, &format!(".{method}(\n"));
    for (index, item) in items.iter().enumerate() {
        line(out, depth + 1, item);
        if index + 1 < items.len() {
            out.push(',');
        }
        out.push('\n');
    }
    line(out, depth, ")");
}

fn java_body(body: &Body) -> String {
    let rendered = match body.content() {
        BodyContent::String { value, .. } => format!("new StringBody({})", java_string(value)),
        BodyContent::Binary(bytes) => format!(
            "new BinaryBody(DatatypeConverter.parseBase64Binary({}))",
            java_string(&base64::engine::general_purpose::STANDARD.encode(bytes))
        ),
        BodyContent::Json { value, match_type } => match match_type {
            MatchType::Strict => format!("new JsonBody({}, MatchType.STRICT)", java_string(value)),
            MatchType::OnlyMatchingFields => format!("new JsonBody({})", java_string(value)),
        },
        BodyContent::JsonSchema(value) => format!("new JsonSchemaBody({})", java_string(value)),
        BodyContent::Xml(value) => format!("new XmlBody({})", java_string(value)),
        BodyContent::XPath(value) => format!("new XPathBody({})", java_string(value)),
        BodyContent::Regex(value) => format!("new RegexBody({})", java_string(value)),
        BodyContent::Parameters(parameters) => {
            let rendered: Vec<String> = parameters
                .iter()
                .map(|parameter| {
                    let mut arguments = vec![nottable(&parameter.name)];
                    arguments.extend(parameter.values.iter().map(nottable));
                    format!("new Parameter({})", arguments.join(", "))
                })
                .collect();
            format!("new ParameterBody({})", rendered.join(", "))
        }
    };
    if body.is_not() {
        format!("Not.not({rendered})")
    } else {
        rendered
    }
}

fn nottable(value: &NottableString) -> String {
    let literal = java_string(value.value().unwrap_or(""));
    if value.is_not() {
        format!("not({literal})")
    } else {
        literal
    }
}

fn java_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange() -> (HttpRequest, HttpResponse) {
        let request = HttpRequest::new()
            .with_method("POST")
            .with_path("/orders")
            .with_header("Host", "example.com")
            .with_cookie("session", "abc")
            .with_body(Body::json(r#"{"id": 1}"#));
        let response = HttpResponse::new()
            .with_status_code(201)
            .with_header("Location", "/orders/1")
            .with_body(Body::string("created \"ok\""));
        (request, response)
    }

    #[test]
    fn test_format_from_query_value() {
        assert_eq!("java".parse::<DumpFormat>().unwrap(), DumpFormat::Java);
        assert_eq!("JAVA".parse::<DumpFormat>().unwrap(), DumpFormat::Java);
        assert_eq!("json".parse::<DumpFormat>().unwrap(), DumpFormat::Json);
        assert_eq!("xml".parse::<DumpFormat>().unwrap(), DumpFormat::Json);
    }

    #[test]
    fn test_render_json() {
        let (request, response) = exchange();
        let rendered = render(DumpFormat::Json, &request, &response);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["httpRequest"]["path"], "/orders");
        assert_eq!(value["httpResponse"]["statusCode"], 201);
    }

    #[test]
    fn test_render_java() {
        let (request, response) = exchange();
        let rendered = render(DumpFormat::Java, &request, &response);
        assert!(rendered.starts_with("new MockServerClient(\"localhost\", 1080)"));
        assert!(rendered.contains(".withMethod(\"POST\")"));
        assert!(rendered.contains(".withPath(\"/orders\")"));
        assert!(rendered.contains("new Header(\"Host\", \"example.com\")"));
        assert!(rendered.contains("new Cookie(\"session\", \"abc\")"));
        assert!(rendered.contains(r#"new JsonBody("{\"id\": 1}")"#));
        assert!(rendered.contains(".withStatusCode(201)"));
        assert!(rendered.contains(r#"new StringBody("created \"ok\"")"#));
        assert!(rendered.ends_with(");"));
    }

    #[test]
    fn test_render_java_negation() {
        let request = HttpRequest::new()
            .with_path(NottableString::not("/health"))
            .with_body(Body::regex("a.*").negated());
        let rendered = render_java(&request, &HttpResponse::not_found());
        assert!(rendered.contains(".withPath(not(\"/health\"))"));
        assert!(rendered.contains("Not.not(new RegexBody(\"a.*\"))"));
        assert!(rendered.contains(".withStatusCode(404)"));
    }

    #[test]
    fn test_java_string_escaping() {
        assert_eq!(java_string("a\"b\\c\nd"), r#""a\"b\\c\nd""#);
    }
}
