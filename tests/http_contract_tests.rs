use meal_planner::api_connection::{
    ApiConnectionError, ChatCompletion, ImageGeneration, ImageSearch, OpenAiProvider,
    SpoonacularProvider,
};
use meal_planner::error::StoreError;
use meal_planner::recipe_store::{HttpRecipeStore, RecipeStore};
use meal_planner::recommender::RecipeRecord;
use reqwest::Client;
use serde_json::Value;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};

#[derive(Debug)]
struct RecordedRequest {
    method: String,
    target: String,
    authorization: Option<String>,
    body: String,
}

impl RecordedRequest {
    fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

/// Answers one connection per reply, in order, then hands back what it saw.
fn serve(replies: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<RecordedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let handle = thread::spawn(move || {
        replies
            .into_iter()
            .map(|(status, body)| {
                let (stream, _) = listener.accept().unwrap();
                answer(stream, status, body)
            })
            .collect()
    });
    (base_url, handle)
}

fn answer(mut stream: TcpStream, status: u16, body: &str) -> RecordedRequest {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();

    let mut content_length = 0;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap();
            } else if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.trim().to_string());
            }
        }
    }
    let mut request_body = vec![0; content_length];
    reader.read_exact(&mut request_body).unwrap();

    let response = format!(
        "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).unwrap();
    stream.flush().unwrap();

    let mut parts = request_line.split_whitespace();
    RecordedRequest {
        method: parts.next().unwrap_or_default().to_string(),
        target: parts.next().unwrap_or_default().to_string(),
        authorization,
        body: String::from_utf8(request_body).unwrap(),
    }
}

fn client() -> Client {
    Client::builder().no_proxy().build().unwrap()
}

fn openai(base_url: &str) -> OpenAiProvider {
    OpenAiProvider::new(
        "sk-test".to_string(),
        base_url.to_string(),
        "gpt-3.5-turbo".to_string(),
        client(),
    )
}

fn spoonacular(base_url: &str) -> SpoonacularProvider {
    SpoonacularProvider::new("spoon-key".to_string(), base_url.to_string(), client())
}

fn piccata() -> RecipeRecord {
    RecipeRecord {
        name: "Chicken Piccata".to_string(),
        description: "Tangy lemon caper dish".to_string(),
        ingredients: "chicken, lemon, capers".to_string(),
        image: "default_img.jpg".to_string(),
    }
}

#[tokio::test]
async fn test_chat_completion_returns_first_choice() {
    let (base_url, server) = serve(vec![(
        200,
        r#"{"id":"c1","model":"gpt-3.5-turbo","choices":[{"index":0,"message":{"role":"assistant","content":"  Chicken Piccata \n"},"finish_reason":"stop"}]}"#,
    )]);

    let reply = openai(&base_url)
        .complete("You are a chef.", "Name a dish.", 300, 0.7)
        .await
        .unwrap();
    assert_eq!(reply, "Chicken Piccata");

    let requests = server.join().unwrap();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].target, "/v1/chat/completions");
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer sk-test"));
    let body = requests[0].json();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["max_tokens"], 300);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "Name a dish.");
}

#[tokio::test]
async fn test_chat_completion_error_status_keeps_body() {
    let (base_url, server) = serve(vec![(429, r#"{"error":{"message":"Rate limit reached"}}"#)]);

    let result = openai(&base_url).complete("sys", "user", 10, 0.5).await;
    match result {
        Err(ApiConnectionError::ApiError { status, error_body }) => {
            assert_eq!(status.as_u16(), 429);
            assert!(error_body.contains("Rate limit reached"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
    server.join().unwrap();
}

#[tokio::test]
async fn test_chat_completion_malformed_json_is_a_provider_error() {
    let (base_url, server) = serve(vec![(200, "<html>gateway</html>")]);

    let result = openai(&base_url).complete("sys", "user", 10, 0.5).await;
    assert!(matches!(result, Err(ApiConnectionError::SerializationError(_))));
    server.join().unwrap();
}

#[tokio::test]
async fn test_chat_completion_without_choices_is_empty() {
    let (base_url, server) = serve(vec![(200, r#"{"choices":[]}"#)]);

    let result = openai(&base_url).complete("sys", "user", 10, 0.5).await;
    assert!(matches!(result, Err(ApiConnectionError::EmptyResponse(_))));
    server.join().unwrap();
}

#[tokio::test]
async fn test_search_drops_results_without_image() {
    let (base_url, server) = serve(vec![(
        200,
        r#"{"results":[{"id":1,"title":"No image"},{"id":2,"title":"Blank","image":""},{"id":3,"title":"Pasta","image":"https://img/pasta.jpg"}],"totalResults":3}"#,
    )]);

    let hits = spoonacular(&base_url).search("pasta").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Pasta");
    assert_eq!(hits[0].image_url, "https://img/pasta.jpg");

    let requests = server.join().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(
        requests[0].target,
        "/recipes/complexSearch?query=pasta&number=1&apiKey=spoon-key"
    );
}

#[tokio::test]
async fn test_search_with_no_results_is_not_an_error() {
    let (base_url, server) = serve(vec![(200, r#"{"results":[],"totalResults":0}"#)]);

    assert!(spoonacular(&base_url).search("zzz").await.unwrap().is_empty());
    server.join().unwrap();
}

#[tokio::test]
async fn test_search_error_status_is_a_provider_error() {
    let (base_url, server) = serve(vec![(402, r#"{"status":"failure","message":"quota"}"#)]);

    let result = spoonacular(&base_url).search("pasta").await;
    assert!(matches!(
        result,
        Err(ApiConnectionError::ApiError { status, .. }) if status.as_u16() == 402
    ));
    server.join().unwrap();
}

#[tokio::test]
async fn test_generate_image_returns_url() {
    let (base_url, server) = serve(vec![(
        200,
        r#"{"created":1700000000,"data":[{"url":"https://gen/piccata.png"}]}"#,
    )]);

    let url = openai(&base_url)
        .generate_image("A delicious and appetizing image of Chicken Piccata", "512x512")
        .await
        .unwrap();
    assert_eq!(url, "https://gen/piccata.png");

    let requests = server.join().unwrap();
    assert_eq!(requests[0].target, "/v1/images/generations");
    let body = requests[0].json();
    assert_eq!(body["n"], 1);
    assert_eq!(body["size"], "512x512");
    assert_eq!(
        body["prompt"],
        "A delicious and appetizing image of Chicken Piccata"
    );
}

#[tokio::test]
async fn test_generate_image_without_url_is_empty_response() {
    let (base_url, server) = serve(vec![(
        200,
        r#"{"created":1700000000,"data":[{"revised_prompt":"a plate"}]}"#,
    )]);

    let result = openai(&base_url).generate_image("prompt", "512x512").await;
    assert!(matches!(result, Err(ApiConnectionError::EmptyResponse(_))));
    server.join().unwrap();
}

#[tokio::test]
async fn test_store_lists_newest_first() {
    let (base_url, server) = serve(vec![(
        200,
        r#"[{"id":1,"name":"Dal","description":"Lentils","ingredients":"lentils","image":"a.jpg"},
            {"id":3,"name":"Pho","description":"Soup","ingredients":"noodles","image":"b.jpg"},
            {"id":2,"name":"Taco","description":"Crunchy","ingredients":"beef","image":"c.jpg"}]"#,
    )]);

    let store = HttpRecipeStore::new(base_url, client());
    let ids: Vec<u64> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|recipe| recipe.id)
        .collect();
    assert_eq!(ids, vec![3, 2, 1]);

    let requests = server.join().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].target, "/recipes");
}

#[tokio::test]
async fn test_store_error_message_is_extracted() {
    let (base_url, server) = serve(vec![(500, r#"{"error":"Database unavailable"}"#)]);

    let result = HttpRecipeStore::new(base_url, client()).list().await;
    match result {
        Err(StoreError::Api { status, body }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(body, "Database unavailable");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
    server.join().unwrap();
}

#[tokio::test]
async fn test_store_create_uses_echoed_id() {
    let (base_url, server) = serve(vec![(
        201,
        r#"{"id":9,"name":"Chicken Piccata","description":"Tangy lemon caper dish","ingredients":"chicken, lemon, capers","image":"default_img.jpg"}"#,
    )]);

    let id = HttpRecipeStore::new(base_url, client())
        .create(&piccata())
        .await
        .unwrap();
    assert_eq!(id, Some(9));

    let requests = server.join().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].target, "/addRecipe");
    assert_eq!(requests[0].json()["name"], "Chicken Piccata");
}

#[tokio::test]
async fn test_store_create_without_id_in_reply_still_succeeds() {
    let (base_url, server) = serve(vec![
        (201, r#"{"message":"Recipe added successfully"}"#),
        (
            200,
            r#"[{"id":4,"name":"Dal","description":"Lentils","ingredients":"lentils","image":"a.jpg"},
                {"id":5,"name":"Chicken Piccata","description":"Tangy lemon caper dish","ingredients":"chicken, lemon, capers","image":"default_img.jpg"}]"#,
        ),
    ]);

    let id = HttpRecipeStore::new(base_url, client())
        .create(&piccata())
        .await
        .unwrap();
    assert_eq!(id, Some(5));

    // Exactly one write; the second request only looks the row up.
    let requests = server.join().unwrap();
    let methods: Vec<&str> = requests.iter().map(|r| r.method.as_str()).collect();
    assert_eq!(methods, vec!["POST", "GET"]);
}

#[tokio::test]
async fn test_store_create_is_ok_when_id_cannot_be_found() {
    let (base_url, server) = serve(vec![
        (201, "Created"),
        (500, r#"{"error":"Database unavailable"}"#),
    ]);

    let result = HttpRecipeStore::new(base_url, client())
        .create(&piccata())
        .await;
    assert!(matches!(result, Ok(None)));
    assert_eq!(server.join().unwrap().len(), 2);
}

#[tokio::test]
async fn test_store_create_rejected_by_backend() {
    let (base_url, server) = serve(vec![(400, r#"{"error":"Missing required fields"}"#)]);

    let result = HttpRecipeStore::new(base_url, client())
        .create(&piccata())
        .await;
    assert!(matches!(
        result,
        Err(StoreError::Api { ref body, .. }) if body == "Missing required fields"
    ));
    server.join().unwrap();
}

#[tokio::test]
async fn test_store_delete() {
    let (base_url, server) = serve(vec![
        (200, r#"{"message":"Recipe deleted"}"#),
        (404, r#"{"error":"Recipe not found"}"#),
    ]);

    let store = HttpRecipeStore::new(base_url, client());
    store.delete(7).await.unwrap();
    assert!(matches!(store.delete(7).await, Err(StoreError::NotFound(7))));

    let requests = server.join().unwrap();
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].target, "/deleteRecipe/7");
}
