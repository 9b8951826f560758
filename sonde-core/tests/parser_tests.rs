// Tests for the static API description parsers

use serde_json::{Value, json};
use sonde_core::DocumentFormat;
use sonde_core::parsers::{
    openapi_to_endpoints, parse_api_blueprint, parse_har, parse_openapi, parse_postman,
    parse_raml, parse_wsdl,
};
use sonde_scanner::{AuthKind, EndpointKind, Source};

fn keys(endpoints: &[sonde_scanner::Endpoint]) -> Vec<String> {
    endpoints.iter().map(|ep| ep.dedup_key()).collect()
}

// ============================================================================
// OpenAPI Tests
// ============================================================================

#[test]
fn test_openapi_single_post_operation() {
    let doc = json!({"paths": {"/items": {"post": {
        "operationId": "createItem",
        "responses": {"201": {}}
    }}}});

    let result = parse_openapi(&doc);
    assert_eq!(result.source, Source::Openapi);
    assert_eq!(result.endpoints.len(), 1);

    let ep = &result.endpoints[0];
    assert_eq!(ep.method, "POST");
    assert_eq!(ep.name, "createItem");
    assert_eq!(ep.group, "items");
    assert_eq!(ep.checks.status, 201);
    assert!(ep.body.is_none());
}

#[test]
fn test_openapi_counts_method_pairs_only() {
    let doc = json!({"paths": {
        "/users": {
            "parameters": [{"name": "tenant", "in": "header"}],
            "summary": "Users",
            "x-internal": {"get": {}},
            "get": {"responses": {"200": {}}},
            "post": {}
        },
        "/users/{id}": {
            "get": {},
            "delete": {}
        },
        "/broken": "not a mapping"
    }});

    let endpoints = openapi_to_endpoints(&doc);
    assert_eq!(endpoints.len(), 4);
    assert_eq!(
        keys(&endpoints),
        vec!["GET:/users", "POST:/users", "GET:/users/{id}", "DELETE:/users/{id}"]
    );
    assert_eq!(endpoints[2].name, "GET_users_id");
}

#[test]
fn test_openapi_paths_are_normalized_before_dedup() {
    let doc = json!({"paths": {
        "/items/{id}": {"get": {"operationId": "getItem"}},
        "/items//{id}": {"get": {"operationId": "getItemAgain"}},
        "orders": {"post": {}}
    }});

    let endpoints = openapi_to_endpoints(&doc);
    assert_eq!(keys(&endpoints), vec!["GET:/items/{id}", "POST:/orders"]);
    assert_eq!(endpoints[0].name, "getItem");
    assert_eq!(endpoints[1].group, "orders");
}

#[test]
fn test_openapi_group_defaults_to_api() {
    let doc = json!({"paths": {"/{tenant}": {"get": {}}, "/": {"get": {}}}});
    let endpoints = openapi_to_endpoints(&doc);
    assert!(endpoints.iter().all(|ep| ep.group == "api"));
}

#[test]
fn test_openapi_first_2xx_in_document_order() {
    let doc: Value = serde_json::from_str(
        r#"{"paths": {"/jobs": {"post": {"responses": {"400": {}, "202": {}, "201": {}}}}}}"#,
    )
    .unwrap();
    let endpoints = openapi_to_endpoints(&doc);
    assert_eq!(endpoints[0].checks.status, 202);
}

#[test]
fn test_openapi_request_body_stub_with_ref() {
    let doc = json!({
        "openapi": "3.0.0",
        "paths": {"/pets": {"post": {
            "requestBody": {"content": {"application/json": {
                "schema": {"$ref": "#/components/schemas/Pet"}
            }}}
        }}},
        "components": {
            "schemas": {"Pet": {
                "type": "object",
                "properties": {
                    "name": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}},
                    "born": {"type": "string", "format": "date"}
                }
            }},
            "securitySchemes": {"bearerAuth": {"type": "http", "scheme": "bearer"}}
        }
    });

    let result = parse_openapi(&doc);
    assert_eq!(
        result.endpoints[0].body,
        Some(json!({"name": "", "tags": [""], "born": "2024-01-01"}))
    );
    let auth = result.auth.unwrap();
    assert_eq!(auth.kind, AuthKind::Bearer);
    assert_eq!(auth.header, "Authorization");
}

#[test]
fn test_openapi_without_paths() {
    let result = parse_openapi(&json!({"swagger": "2.0"}));
    assert!(result.endpoints.is_empty());
    assert!(!result.is_failed());
}

// ============================================================================
// Postman Tests
// ============================================================================

#[test]
fn test_postman_empty_collection() {
    let result = parse_postman(&json!({"item": []}));
    assert_eq!(result.source, Source::Postman);
    assert!(result.endpoints.is_empty());
}

#[test]
fn test_postman_folder_names_group() {
    let collection = json!({"item": [
        {"name": "Billing", "item": [
            {"name": "List invoices", "request": {
                "method": "GET",
                "url": {"raw": "{{base}}/invoices", "path": ["invoices"]}
            }},
            {"name": "Nested", "item": [
                {"name": "Pay", "request": {
                    "method": "post",
                    "url": "https://billing.test/invoices/pay",
                    "body": {"mode": "raw", "raw": "{\"amount\": 10}"}
                }}
            ]}
        ]},
        {"name": "Ping", "request": {"method": "GET", "url": "{{base}}/ping"}}
    ]});

    let result = parse_postman(&collection);
    assert_eq!(result.endpoints.len(), 3);

    let list = &result.endpoints[0];
    assert_eq!(list.group, "Billing");
    assert_eq!(list.name, "List_invoices");
    assert_eq!(list.path, "/invoices");

    let pay = &result.endpoints[1];
    assert_eq!(pay.group, "Nested");
    assert_eq!(pay.method, "POST");
    assert_eq!(pay.path, "/invoices/pay");
    assert_eq!(pay.body, Some(json!({"amount": 10})));

    assert_eq!(result.endpoints[2].group, "default");
}

#[test]
fn test_postman_graphql_request() {
    let collection = json!({"item": [{"name": "Get user", "request": {
        "method": "POST",
        "url": {"path": ["graphql"]},
        "body": {"mode": "graphql", "graphql": {
            "query": "query { user(id: $id) { name } }",
            "variables": "{\"id\": \"42\"}"
        }}
    }}]});

    let result = parse_postman(&collection);
    let ep = &result.endpoints[0];
    assert_eq!(ep.kind, EndpointKind::Graphql);
    assert_eq!(ep.path, "/graphql");
    assert_eq!(ep.query.as_deref(), Some("query { user(id: $id) { name } }"));
    assert_eq!(ep.variables.as_ref().unwrap()["id"], "42");
    assert_eq!(ep.checks.no_graphql_errors, Some(true));
    assert_eq!(ep.checks.has_data, Some(true));
}

#[test]
fn test_postman_bad_variables_and_raw_body() {
    let collection = json!({"item": [
        {"name": "q", "request": {"body": {"mode": "graphql", "graphql": {
            "query": "{ me }", "variables": "{oops"
        }}, "url": "{{base}}/gql"}},
        {"name": "r", "request": {"method": "PUT", "url": "{{base}}/x",
            "body": {"mode": "raw", "raw": "plain text"}}}
    ]});

    let result = parse_postman(&collection);
    assert!(result.endpoints[0].variables.as_ref().unwrap().is_empty());
    assert!(result.endpoints[1].body.is_none());
}

#[test]
fn test_postman_duplicate_requests_keep_first() {
    let collection = json!({"item": [
        {"name": "first", "request": {"method": "GET", "url": "{{base}}/a"}},
        {"name": "second", "request": {"method": "GET", "url": "{{base}}/a"}}
    ]});
    let result = parse_postman(&collection);
    assert_eq!(result.endpoints.len(), 1);
    assert_eq!(result.endpoints[0].name, "first");
}

// ============================================================================
// HAR Tests
// ============================================================================

#[test]
fn test_har_dedups_by_method_and_path() {
    let har = json!({"log": {"entries": [
        {"request": {"method": "GET", "url": "https://shop.test/api/cart?x=1"}},
        {"request": {"method": "GET", "url": "https://shop.test/api/cart?x=2"}},
        {"request": {"method": "POST", "url": "https://shop.test/api/cart",
            "postData": {"mimeType": "application/json", "text": "{\"sku\": \"A1\"}"}}},
        {"request": {"method": "POST", "url": "https://shop.test/login",
            "postData": {"text": "user=a&pass=b"}}}
    ]}});

    let result = parse_har(&har);
    assert_eq!(result.source, Source::Har);
    assert_eq!(
        keys(&result.endpoints),
        vec!["GET:/api/cart", "POST:/api/cart", "POST:/login"]
    );
    assert_eq!(result.endpoints[1].body, Some(json!({"sku": "A1"})));
    assert_eq!(result.endpoints[2].body, Some(json!("user=a&pass=b")));
    assert_eq!(result.endpoints[2].group, "login");
    assert_eq!(result.endpoints[0].name, "GET_api_cart");
}

// ============================================================================
// WSDL Tests
// ============================================================================

const STOCK_WSDL: &str = r#"<?xml version="1.0"?>
<wsdl:definitions name="StockQuote"
    xmlns:wsdl="http://schemas.xmlsoap.org/wsdl/"
    xmlns:soap="http://schemas.xmlsoap.org/wsdl/soap/">
  <wsdl:portType name="StockQuotePortType">
    <wsdl:operation name="GetLastTradePrice"/>
    <wsdl:operation name="GetHistory"/>
  </wsdl:portType>
  <wsdl:service name="StockQuoteService">
    <wsdl:port name="StockQuotePort" binding="tns:StockQuoteBinding">
      <soap:address location="http://example.com/services/stockquote"/>
    </wsdl:port>
  </wsdl:service>
</wsdl:definitions>"#;

#[test]
fn test_wsdl_operations() {
    let result = parse_wsdl(STOCK_WSDL);
    assert_eq!(result.source, Source::Wsdl);
    assert_eq!(result.endpoints.len(), 2);

    let ep = &result.endpoints[0];
    assert_eq!(ep.method, "POST");
    assert_eq!(ep.path, "/services/stockquote");
    assert_eq!(ep.group, "StockQuoteService");
    assert_eq!(ep.name, "GetLastTradePrice");

    let body = ep.body.as_ref().and_then(Value::as_str).unwrap();
    assert!(body.contains(
        r#"<GetLastTradePrice xmlns="StockQuoteService"></GetLastTradePrice>"#
    ));
    assert_eq!(result.endpoints[1].name, "GetHistory");
}

#[test]
fn test_wsdl_malformed_xml() {
    let result = parse_wsdl("<definitions><portType>");
    assert!(result.is_failed());
    assert!(result.endpoints.is_empty());
}

// ============================================================================
// API Blueprint Tests
// ============================================================================

const NOTES_APIB: &str = "FORMAT: 1A\n\
# Notes API\n\
\n\
# Group Notes\n\
\n\
## Notes Collection [GET /notes]\n\
\n\
### Create a Note [POST /notes]\n\
\n\
### PUT /notes/archive\n\
\n\
# Group Health Checks\n\
\n\
## Root [GET /{version}]\n\
\n\
### GET /notes\n";

#[test]
fn test_api_blueprint_resources_and_actions() {
    let result = parse_api_blueprint(NOTES_APIB);
    assert_eq!(result.source, Source::ApiBlueprint);
    assert_eq!(
        keys(&result.endpoints),
        vec!["GET:/notes", "GET:/{version}", "PUT:/notes/archive"]
    );
    assert_eq!(result.endpoints[0].group, "notes");
    assert_eq!(result.endpoints[1].group, "health_checks");
}

#[test]
fn test_api_blueprint_bracket_action_is_not_a_resource_heading() {
    // "### Name [POST /x]" matches neither shape: resources are '#' or '##'
    let result = parse_api_blueprint(NOTES_APIB);
    assert!(!keys(&result.endpoints).contains(&"POST:/notes".to_string()));
}

#[test]
fn test_api_blueprint_paths_are_normalized() {
    let doc = "# Catalog\n\n## Products [GET /products//featured]\n\n### GET /products/featured?page=2\n";
    let result = parse_api_blueprint(doc);
    assert_eq!(keys(&result.endpoints), vec!["GET:/products/featured"]);
    assert_eq!(result.endpoints[0].group, "products");
}

// ============================================================================
// RAML Tests
// ============================================================================

const BOOKS_RAML: &str = r#"#%RAML 1.0
title: Books
/books:
  get:
    description: list
  post:
    body:
      application/json:
        example: |
          {"title": "Dune"}
  /{bookId}:
    get:
    delete:
/authors:
  displayName: Authors
  get:
"#;

#[cfg(feature = "raml")]
#[test]
fn test_raml_nested_resources() {
    let result = parse_raml(BOOKS_RAML);
    assert_eq!(result.source, Source::Raml);
    assert_eq!(
        keys(&result.endpoints),
        vec![
            "GET:/books",
            "POST:/books",
            "GET:/books/{bookId}",
            "DELETE:/books/{bookId}",
            "GET:/authors"
        ]
    );
    assert_eq!(result.endpoints[1].body, Some(json!({"title": "Dune"})));
    assert_eq!(result.endpoints[2].group, "books");
}

#[cfg(feature = "raml")]
#[test]
fn test_raml_malformed_yaml() {
    let result = parse_raml("/books:\n  get: [unclosed");
    assert!(result.is_failed());
    assert!(result.endpoints.is_empty());
}

#[cfg(not(feature = "raml"))]
#[test]
fn test_raml_without_yaml_support() {
    let result = parse_raml(BOOKS_RAML);
    assert_eq!(result.error.as_deref(), Some("serde_yaml not installed"));
}

// ============================================================================
// DocumentFormat Tests
// ============================================================================

#[test]
fn test_document_format_dispatch() {
    let result = DocumentFormat::OpenApi
        .parse(r#"{"paths": {"/a": {"get": {}}, "/b": {"put": {}}}}"#);
    assert_eq!(result.source, Source::Openapi);
    assert_eq!(keys(&result.endpoints), vec!["GET:/a", "PUT:/b"]);

    let result = DocumentFormat::from_str("apib")
        .unwrap()
        .parse("## Items [GET /items]\n");
    assert_eq!(result.source, Source::ApiBlueprint);
    assert_eq!(result.endpoints.len(), 1);
}

#[test]
fn test_document_format_invalid_json() {
    let result = DocumentFormat::Postman.parse("not json");
    assert_eq!(result.source, Source::Postman);
    assert!(result.error.unwrap().starts_with("invalid JSON"));
}
