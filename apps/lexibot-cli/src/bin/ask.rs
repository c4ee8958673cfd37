//! Thin client shell: posts a question to the query service and renders the
//! answer plus the retrieved context chunks. Holds no state beyond the
//! current invocation; any network or backend failure is shown, not crashed
//! on.

use std::env;

use lexibot_core::config::Config;
use lexibot_service::{AskRequest, AskResponse, DEFAULT_TOP_K};

fn parse_args() -> (String, usize) {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut top_k = DEFAULT_TOP_K;
    let mut question_parts: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--top-k" | "-k" => {
                let value = args.get(i + 1).and_then(|v| v.parse::<usize>().ok());
                match value {
                    Some(v) => {
                        top_k = v.clamp(1, 10);
                        i += 1;
                    }
                    None => {
                        eprintln!("Error: --top-k requires a number between 1 and 10");
                        std::process::exit(2);
                    }
                }
            }
            other => question_parts.push(other.to_string()),
        }
        i += 1;
    }

    let question = question_parts.join(" ");
    if question.trim().is_empty() {
        eprintln!("Usage: lexibot-ask [--top-k N] \"<your legal question>\"");
        std::process::exit(2);
    }
    (question, top_k)
}

#[tokio::main]
async fn main() {
    let (question, top_k) = parse_args();
    let base_url: String = Config::load()
        .map(|c| c.get_or("server.base_url", "http://localhost:8000".to_string()))
        .unwrap_or_else(|_| "http://localhost:8000".to_string());

    let client = reqwest::Client::new();
    let request = AskRequest { query: question, top_k: top_k as i64 };

    let response = match client.post(format!("{base_url}/ask")).json(&request).send().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to reach the backend at {base_url}: {e}");
            std::process::exit(1);
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        eprintln!("Error from backend ({status}): {body}");
        std::process::exit(1);
    }

    let answer: AskResponse = match response.json().await {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Malformed response from backend: {e}");
            std::process::exit(1);
        }
    };

    println!("Answer\n------");
    println!("{}\n", answer.answer);
    println!("Retrieved context chunks");
    println!("------------------------");
    for (i, chunk) in answer.context.iter().enumerate() {
        println!("\nChunk {}\n{}", i + 1, chunk);
    }
}
