// Copyright (c) 2025, The Tally Authors
// MIT License
// All rights reserved.

//! Container health probe for the endpoint service: exits 0 when `/health`
//! answers with a 2xx status, 1 otherwise.

use std::process::exit;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(8080);
    let url = format!("http://localhost:{port}/health");

    let client = match reqwest::Client::builder().timeout(TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => {
            println!("{err}");
            exit(1);
        }
    };

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => println!("ok"),
        Ok(response) => {
            println!("{}", response.status());
            exit(1);
        }
        Err(err) => {
            println!("{err}");
            exit(1);
        }
    }
}
