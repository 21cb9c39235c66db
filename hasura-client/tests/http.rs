use hasura_client::AggregateOptions;
use hasura_client::BatchSelect;
use hasura_client::Client;
use hasura_client::ClientError;
use hasura_client::Configuration;
use hasura_client::Fields;
use hasura_client::OrderBy;
use hasura_client::SelectOptions;
use hasura_client::Where;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use url::Url;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

hasura_client::entity! {
    pub struct Author = "authors" {
        id: scalar,
        name: scalar,
        articles: [Article],
    }
}

hasura_client::entity! {
    pub struct Article = "articles" {
        id: scalar,
        title: scalar,
        rating: scalar,
        metadata: opaque,
        author: Author,
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct ArticleRow {
    id: i64,
    title: String,
    author: AuthorRow,
}

#[derive(Debug, Deserialize, PartialEq)]
struct AuthorRow {
    name: String,
}

async fn client(mock_server: &MockServer) -> Client {
    let configuration = Configuration::builder()
        .host(Url::parse(&format!("{}/v1/graphql", mock_server.uri())).unwrap())
        .custom_header("x-hasura-admin-secret", "s3cr3t")
        .build();
    Client::new(configuration).unwrap()
}

#[tokio::test]
async fn select_round_trip() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/graphql"))
        .and(header("content-type", "application/json"))
        .and(header("x-hasura-admin-secret", "s3cr3t"))
        .and(body_json(json!({
            "query": "query($limit: Int) { articles(limit: $limit, where: { rating: { _gte: 4 } }, order_by: { rating: desc }) { id title author { name } } }",
            "variables": { "limit": 2 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "articles": [
                    { "id": 1, "title": "Ownership", "author": { "name": "Ada" } },
                    { "id": 2, "title": "Borrowing", "author": { "name": "Grace" } }
                ]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = SelectOptions::builder()
        .limit(2u64)
        .filter(Where::from_json(json!({ "rating": { "_gte": 4 } })).unwrap())
        .order_by(OrderBy::new().desc("rating"))
        .build();
    let rows: Vec<ArticleRow> = client(&mock_server)
        .await
        .select(
            &hasura_client::fields![Article; "id", "title", "author.name"],
            &options,
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[1],
        ArticleRow {
            id: 2,
            title: "Borrowing".to_string(),
            author: AuthorRow {
                name: "Grace".to_string()
            }
        }
    );
}

#[tokio::test]
async fn runtime_paths_and_opaque_fields() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({
            "query": "query { articles_by_pk(id: 7) { id metadata } }"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "articles_by_pk": { "id": 7, "metadata": { "tags": ["rust"], "draft": false } }
            }
        })))
        .mount(&mock_server)
        .await;

    let fields = Fields::<Article>::parse(["id", "metadata"]).unwrap();
    let row: Option<Value> = client(&mock_server)
        .await
        .select_by_pk(&hasura_client::pk!(Article, "id", 7), &fields)
        .await
        .unwrap();
    insta::assert_json_snapshot!(row, @r#"
    {
      "id": 7,
      "metadata": {
        "tags": [
          "rust"
        ],
        "draft": false
      }
    }
    "#);

    assert!(Fields::<Article>::parse(["metadata.tags"]).is_err());
    assert!(Fields::<Article>::parse(["author.articles.author.articles.id"]).is_err());
}

#[tokio::test]
async fn batch_uses_one_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "query_key_0": [{ "id": 1 }],
                "query_key_1": [{ "name": "Ada" }, { "name": "Grace" }]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let results: Vec<Vec<Value>> = client(&mock_server)
        .await
        .select_batch(&[
            BatchSelect::new(
                &hasura_client::fields![Article; "id"],
                SelectOptions::default(),
            ),
            BatchSelect::new(
                &hasura_client::fields![Author; "name"],
                SelectOptions::builder().offset(1u64).build(),
            ),
        ])
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], vec![json!({ "id": 1 })]);
    assert_eq!(results[1].len(), 2);

    let received = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["variables"], json!({ "query_key_1_offset": 1 }));
}

#[tokio::test]
async fn backend_errors_with_200() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{
                "message": "field 'nope' not found in type: 'articles_aggregate'",
                "extensions": { "code": "validation-failed" }
            }]
        })))
        .mount(&mock_server)
        .await;

    let error = client(&mock_server)
        .await
        .aggregate::<Article>(&AggregateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, ClientError::Backend { .. }));
    assert_eq!(
        error.to_string(),
        "backend rejected the operation on 'articles_aggregate': [validation-failed] field 'nope' not found in type: 'articles_aggregate'"
    );
}

#[tokio::test]
async fn http_failures_are_transport_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let error = client(&mock_server)
        .await
        .aggregate::<Article>(&AggregateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, ClientError::Transport(_)), "{error}");
}

#[tokio::test]
async fn undecodable_bodies_are_transport_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&mock_server)
        .await;

    let error = client(&mock_server)
        .await
        .aggregate::<Article>(&AggregateOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, ClientError::Transport(_)), "{error}");
}
