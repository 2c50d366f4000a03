use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::io::AsyncWrite;

use tool_rpc::core::dispatcher::AppState;
use tool_rpc::core::error::{ServerError, ToolError};
use tool_rpc::core::registry::ToolRegistry;
use tool_rpc::core::schema::{Arguments, Signature, str_arg};
use tool_rpc::core::server::serve_lines;
use tool_rpc::core::utils::Config;
use tool_rpc::tools;

fn state() -> AppState {
    AppState {
        server_name: "gsc-server".into(),
        server_version: "1.0.0".into(),
    }
}

fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(
        "echo",
        "Echo the text back.",
        Signature::new().arg::<String>("text"),
        |args: Arguments| async move { Ok::<_, ToolError>(str_arg(&args, "text")?.to_string()) },
    );
    registry.register(
        "slow",
        "Yields to the runtime a few times before answering.",
        Signature::new(),
        |_args: Arguments| async move {
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            Ok::<_, ToolError>("done".to_string())
        },
    );
    registry.register("explode", "", Signature::new(), |_args: Arguments| async move {
        if true {
            panic!("handler blew up");
        }
        Ok::<_, ToolError>(String::new())
    });
    registry
}

async fn run_with(registry: &ToolRegistry, input: &[u8]) -> Vec<String> {
    let mut output = Vec::new();
    serve_lines(registry, &state(), input, &mut output)
        .await
        .expect("serve");
    String::from_utf8(output)
        .expect("utf8 output")
        .lines()
        .map(str::to_string)
        .collect()
}

async fn run(input: &str) -> Vec<String> {
    run_with(&registry(), input.as_bytes()).await
}

fn parse(line: &str) -> Value {
    serde_json::from_str(line).expect("response line is JSON")
}

#[tokio::test]
async fn echo_scenario() {
    let lines = run(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"execute\",\"params\":{\"name\":\"echo\",\"parameters\":{\"text\":\"hi\"}}}\n",
    )
    .await;
    assert_eq!(lines, vec![r#"{"jsonrpc":"2.0","id":1,"result":{"content":"hi"}}"#]);
}

#[tokio::test]
async fn unknown_method_scenario() {
    let lines = run("{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"bogus\"}\n").await;
    assert_eq!(
        lines,
        vec![r#"{"jsonrpc":"2.0","id":2,"error":{"code":-32601,"message":"Method 'bogus' not found"}}"#]
    );
}

#[tokio::test]
async fn end_of_input_writes_nothing() {
    assert!(run("").await.is_empty());
}

#[tokio::test]
async fn blank_lines_are_skipped() {
    assert!(run("\n   \n\r\n").await.is_empty());
}

#[tokio::test]
async fn last_line_without_newline_is_served() {
    let lines = run("{\"id\":9,\"method\":\"resources/list\"}").await;
    assert_eq!(lines.len(), 1);
    assert_eq!(parse(&lines[0])["result"], json!({"resources": []}));
}

#[tokio::test]
async fn malformed_lines_do_not_stop_the_loop() {
    let lines = run(concat!(
        "this is not json\n",
        "{\"id\": 3}\n",
        "[1,2,3]\n",
        "{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"initialize\"}\n",
    ))
    .await;
    assert_eq!(lines.len(), 4);

    let first = parse(&lines[0]);
    assert_eq!(first["error"]["code"], json!(-32000));
    assert_eq!(first["id"], Value::Null);

    let second = parse(&lines[1]);
    assert_eq!(second["error"]["code"], json!(-32000));
    assert_eq!(second["id"], json!(3));

    assert_eq!(parse(&lines[2])["error"]["code"], json!(-32000));

    let fourth = parse(&lines[3]);
    assert_eq!(fourth["id"], json!(4));
    assert_eq!(fourth["result"]["serverInfo"]["name"], json!("gsc-server"));
}

#[tokio::test]
async fn invalid_utf8_is_answered() {
    let mut input = b"\xff\xfe{\n".to_vec();
    input.extend_from_slice(b"{\"id\":5,\"method\":\"resources/list\"}\n");
    let lines = run_with(&registry(), &input).await;
    assert_eq!(lines.len(), 2);
    assert_eq!(parse(&lines[0])["error"]["code"], json!(-32000));
    assert_eq!(parse(&lines[1])["id"], json!(5));
}

#[tokio::test]
async fn panicking_tool_does_not_stop_the_loop() {
    let lines = run(concat!(
        "{\"id\":1,\"method\":\"execute\",\"params\":{\"name\":\"explode\"}}\n",
        "{\"id\":2,\"method\":\"execute\",\"params\":{\"name\":\"echo\",\"parameters\":{\"text\":\"still here\"}}}\n",
    ))
    .await;
    assert_eq!(lines.len(), 2);

    let first = parse(&lines[0]);
    assert_eq!(first["error"]["code"], json!(-32000));
    assert_eq!(first["error"]["message"], json!("handler blew up"));
    assert_eq!(parse(&lines[1])["result"]["content"], json!("still here"));
}

#[tokio::test]
async fn unknown_tool_names_the_tool() {
    let lines = run("{\"id\":\"t\",\"method\":\"execute\",\"params\":{\"name\":\"list_properties\"}}\n").await;
    let response = parse(&lines[0]);
    assert_eq!(response["id"], json!("t"));
    assert_eq!(response["error"]["code"], json!(-32601));
    assert!(response["error"]["message"].as_str().unwrap().contains("list_properties"));
}

#[tokio::test]
async fn responses_keep_request_order() {
    let methods = ["execute-slow", "initialize", "getMetadata", "execute-echo", "resources/list", "bogus"];
    let mut input = String::new();
    for (id, method) in methods.iter().cycle().take(30).enumerate() {
        let request = match *method {
            "execute-slow" => json!({"id": id, "method": "execute", "params": {"name": "slow"}}),
            "execute-echo" => json!({"id": id, "method": "execute", "params": {"name": "echo", "parameters": {"text": id.to_string()}}}),
            other => json!({"id": id, "method": other}),
        };
        input.push_str(&request.to_string());
        input.push('\n');
    }

    let lines = run(&input).await;
    assert_eq!(lines.len(), 30);
    for (id, line) in lines.iter().enumerate() {
        let response = parse(line);
        assert_eq!(response["id"], json!(id));
        assert!(response.get("result").is_some() != response.get("error").is_some());
    }
}

#[tokio::test]
async fn metadata_of_registered_tools() {
    let registry = tools::initialize_tools(&Config::new());
    let lines = run_with(&registry, b"{\"id\":1,\"method\":\"getMetadata\"}\n").await;
    let response = parse(&lines[0]);
    let tools = response["result"]["tools"].as_array().unwrap();

    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["echo", "calc"]);
    for tool in tools {
        let properties = tool["parameters"]["properties"].as_object().unwrap();
        for required in tool["parameters"]["required"].as_array().unwrap() {
            assert!(properties.contains_key(required.as_str().unwrap()));
        }
    }
}

#[tokio::test]
async fn calc_through_the_loop() {
    let registry = tools::initialize_tools(&Config::new());
    let lines = run_with(
        &registry,
        b"{\"id\":1,\"method\":\"execute\",\"params\":{\"name\":\"calc\",\"parameters\":{\"a\":6,\"b\":7,\"operation\":\"multiply\"}}}\n\
          {\"id\":2,\"method\":\"execute\",\"params\":{\"name\":\"calc\",\"parameters\":{\"a\":1,\"b\":0,\"operation\":\"divide\"}}}\n",
    )
    .await;
    assert_eq!(parse(&lines[0])["result"]["content"], json!("42"));
    let second = parse(&lines[1]);
    assert_eq!(second["error"]["code"], json!(-32000));
    assert_eq!(second["error"]["message"], json!("division by zero"));
}

struct BrokenPipe;

impl AsyncWrite for BrokenPipe {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn closed_output_ends_the_loop_with_an_error() {
    let input: &[u8] = b"{\"id\":1,\"method\":\"initialize\"}\n";
    let result = serve_lines(&registry(), &state(), input, BrokenPipe).await;
    assert!(matches!(result, Err(ServerError::Io(e)) if e.kind() == io::ErrorKind::BrokenPipe));
}
