//! Integration tests for repository and server operations

mod support;

use std::sync::Arc;

use futures::TryStreamExt;
use graphdb_core::{
    ParsedContent, ParserRegistry, QueryResult, RawParser, RepositoryClient, ServerClient,
};
use graphdb_domain::{
    ClientConfig, GetStatementsPayload, GraphDbError, HttpMethod, QueryPayload,
    RepositoryClientConfig, RequestBody, ServerClientConfig, Term,
};
use support::{url, Reply, ScriptedNetwork, REPO_A};

const SERVER: &str = "http://a:7200";

fn client(network: &ScriptedNetwork) -> RepositoryClient {
    let config = RepositoryClientConfig::new([REPO_A])
        .with_client(ClientConfig::default().with_header("X-Client", "tests"));
    RepositoryClient::new(&config, network.factory()).expect("client should build")
}

fn select_json(rows: &str) -> String {
    format!(r#"{{"head":{{"vars":[]}},"results":{{"bindings":[{rows}]}}}}"#)
}

#[tokio::test]
async fn query_posts_form_and_parses_results() {
    let network = ScriptedNetwork::new();
    network.on(
        REPO_A,
        Reply::ok(select_json(r#"{"s":{"type":"uri","value":"urn:a"}}"#))
            .with_header("Content-Type", "application/sparql-results+json; charset=utf-8"),
    );
    let client = client(&network);

    let result = client.query(&QueryPayload::new("SELECT ?s WHERE { ?s ?p ?o }")).await.unwrap();

    let Some(ParsedContent::Bindings(rows)) = result.parsed() else {
        panic!("expected bindings, got {result:?}");
    };
    assert_eq!(rows[0]["s"], Term::iri("urn:a"));

    let request = &network.requests()[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.header("accept"), Some("application/sparql-results+json"));
    assert_eq!(request.header("x-client"), Some("tests"));
    let Some(RequestBody::Form(form)) = &request.body else {
        panic!("expected a form body");
    };
    assert_eq!(form[0], ("query".to_string(), "SELECT ?s WHERE { ?s ?p ?o }".to_string()));
}

#[tokio::test]
async fn invalid_payloads_fail_before_any_request() {
    let network = ScriptedNetwork::new();
    let client = client(&network);

    assert!(matches!(
        client.query(&QueryPayload::new("   ")).await,
        Err(GraphDbError::InvalidInput(_))
    ));
    assert!(matches!(client.add_quads(&[]).await, Err(GraphDbError::InvalidInput(_))));
    assert!(matches!(
        client.add_data("", None, None).await,
        Err(GraphDbError::InvalidInput(_))
    ));
    assert!(matches!(
        client.add("\"literal\"", "urn:p", "urn:o", None).await,
        Err(GraphDbError::InvalidInput(_))
    ));
    assert_eq!(network.count(), 0);
}

#[tokio::test]
async fn statements_read_with_pattern_and_contexts() {
    let network = ScriptedNetwork::new();
    network.on(
        &url(REPO_A, "statements"),
        Reply::ok("<urn:s> <urn:p> <urn:o> .\n").with_header("Content-Type", "application/n-quads"),
    );
    let client = client(&network);
    let payload = GetStatementsPayload {
        subject: Some("<urn:s>".into()),
        contexts: vec!["urn:g1".into(), "null".into()],
        ..Default::default()
    };

    let result = client.get(&payload).await.unwrap();

    assert!(matches!(
        result,
        QueryResult::Text { ref content_type, .. } if content_type == "application/n-quads"
    ));
    let request = &network.requests()[0];
    assert_eq!(request.param("subj"), Some("<urn:s>"));
    assert_eq!(
        request.params.pairs(),
        vec![
            ("context".to_string(), "<urn:g1>".to_string()),
            ("context".to_string(), "null".to_string()),
            ("subj".to_string(), "<urn:s>".to_string()),
        ]
    );
    assert_eq!(request.header("accept"), Some("application/n-quads"));
}

#[tokio::test]
async fn streaming_parser_returns_byte_stream() {
    let network = ScriptedNetwork::new();
    network.on(REPO_A, Reply::ok("s,p\nurn:a,urn:b\n").with_header("Content-Type", "text/csv"));
    let client = client(&network)
        .with_parsers(
            ParserRegistry::with_defaults().with_parser(Arc::new(RawParser::streaming("text/csv"))),
        );

    let result = client
        .query(&QueryPayload::new("SELECT * {}").with_response_type("text/csv"))
        .await
        .unwrap();

    let stream = result.into_stream().expect("streamed result");
    let chunks: Vec<Vec<u8>> = stream.try_collect().await.unwrap();
    assert_eq!(chunks.concat(), b"s,p\nurn:a,urn:b\n");
}

#[tokio::test]
async fn add_serializes_quad_into_named_graph() {
    let network = ScriptedNetwork::new();
    network.on(&url(REPO_A, "statements"), Reply::status(204));
    let client = client(&network);

    client.add("urn:s", "urn:p", "\"hello\"@en", Some("<urn:g>")).await.unwrap();

    let request = &network.requests()[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.header("content-type"), Some("application/n-quads"));
    assert_eq!(
        request.body,
        Some(RequestBody::Text("<urn:s> <urn:p> \"hello\"@en <urn:g> .\n".into()))
    );
}

#[tokio::test]
async fn upload_retries_with_the_same_buffered_body() {
    let network = ScriptedNetwork::new();
    network.on(&url(REPO_A, "statements"), Reply::status(503));
    network.on(&url(REPO_A, "statements"), Reply::status(204));
    let client = client(&network);

    client
        .upload(
            b"@prefix ex: <urn:> .".to_vec(),
            Some("text/turtle"),
            Some("urn:g"),
            Some("urn:base"),
        )
        .await
        .unwrap();

    let requests = network.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].body, requests[1].body);
    assert_eq!(requests[1].param("context"), Some("<urn:g>"));
    assert_eq!(requests[1].param("baseURI"), Some("urn:base"));
    assert_eq!(requests[1].header("content-type"), Some("text/turtle"));
}

#[tokio::test]
async fn overwrite_and_delete_use_put_and_delete() {
    let network = ScriptedNetwork::new();
    network.always(&url(REPO_A, "statements"), Reply::status(204));
    let client = client(&network);

    client.overwrite(b"<urn:s> <urn:p> <urn:o> .".to_vec(), None, None, None).await.unwrap();
    client.delete_statements(Some("urn:s"), None, Some("plain"), None).await.unwrap();
    client.delete_all().await.unwrap();

    let requests = network.requests();
    assert_eq!(requests[0].method, HttpMethod::Put);
    assert_eq!(requests[1].method, HttpMethod::Delete);
    assert_eq!(requests[1].param("subj"), Some("<urn:s>"));
    assert_eq!(requests[1].param("obj"), Some("\"plain\""));
    assert!(requests[2].params.is_empty());
}

#[tokio::test]
async fn namespaces_round_trip() {
    let network = ScriptedNetwork::new();
    network.on(
        &url(REPO_A, "namespaces"),
        Reply::ok(select_json(
            r#"{"prefix":{"type":"literal","value":"ex"},"namespace":{"type":"literal","value":"http://example.org/"}}"#,
        )),
    );
    network.on(&url(REPO_A, "namespaces/ex"), Reply::ok("http://example.org/\n"));
    network.on(&url(REPO_A, "namespaces/ex"), Reply::status(204));
    let client = client(&network);

    let namespaces = client.get_namespaces().await.unwrap();
    assert_eq!(namespaces.len(), 1);
    assert_eq!(namespaces[0].prefix, "ex");
    assert_eq!(client.get_namespace("ex").await.unwrap().as_deref(), Some("http://example.org/"));
    client.save_namespace("ex", "http://example.org/").await.unwrap();
    assert_eq!(client.get_namespace("missing").await.unwrap(), None);

    assert!(matches!(client.delete_namespace(" ").await, Err(GraphDbError::InvalidInput(_))));
}

#[tokio::test]
async fn contexts_are_listed_as_terms() {
    let network = ScriptedNetwork::new();
    network.on(
        &url(REPO_A, "contexts"),
        Reply::ok(select_json(
            r#"{"contextID":{"type":"uri","value":"urn:g1"}},{"contextID":{"type":"bnode","value":"b0"}}"#,
        )),
    );
    let client = client(&network);

    let contexts = client.get_contexts().await.unwrap();

    assert_eq!(contexts, vec![Term::iri("urn:g1"), Term::blank("b0")]);
}

#[tokio::test]
async fn server_lists_and_deletes_repositories() {
    let network = ScriptedNetwork::new();
    network.always(
        &url(SERVER, "repositories"),
        Reply::ok(select_json(
            r#"{"id":{"type":"literal","value":"test"}},{"id":{"type":"literal","value":"other"}}"#,
        )),
    );
    network.on(&url(SERVER, "repositories/other"), Reply::status(204));
    network.on(&url(SERVER, "protocol"), Reply::ok("12\n"));
    let server = ServerClient::new(&ServerClientConfig::new(SERVER), network.factory()).unwrap();

    assert_eq!(server.get_repository_ids().await.unwrap(), vec!["test", "other"]);
    assert!(server.has_repository("test").await.unwrap());
    assert!(!server.has_repository("missing").await.unwrap());
    server.delete_repository("other").await.unwrap();
    assert_eq!(server.get_protocol_version().await.unwrap(), "12");

    let deleted = network.requests_to(&url(SERVER, "repositories/other"));
    assert_eq!(deleted[0].method, HttpMethod::Delete);
}
