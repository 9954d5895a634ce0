//! Add client - one call through a running binder.
//!
//! This example demonstrates:
//! - Building a client from `BINDER_ADDRESS` / `BINDER_PORT`
//! - Describing arguments with INPUT and OUTPUT descriptors
//! - Reading the OUTPUT slot after the call
//!
//! # Running
//!
//! ```sh
//! BINDER_ADDRESS=127.0.0.1 BINDER_PORT=7000 RUST_LOG=dynrpc_client=debug \
//!     cargo run --example add -- 3 4
//!
//! # ask the binder to shut down
//! BINDER_ADDRESS=127.0.0.1 BINDER_PORT=7000 cargo run --example add -- terminate
//! ```

use dynrpc_client::{ArgType, Client, ScalarType, Value};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = Client::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("terminate") {
        client.terminate().await?;
        println!("terminate sent");
        return Ok(());
    }

    let a: i32 = args.first().map(|s| s.parse::<i32>()).transpose()?.unwrap_or(3);
    let b: i32 = args.get(1).map(|s| s.parse::<i32>()).transpose()?.unwrap_or(4);

    let types = [
        ArgType::input(ScalarType::Int),
        ArgType::input(ScalarType::Int),
        ArgType::output(ScalarType::Int),
    ];
    let mut values = [Value::int(a), Value::int(b), Value::int(0)];

    if let Err(e) = client.call("Add", &types, &mut values).await {
        eprintln!("call failed with code {}: {}", e.code(), e);
        std::process::exit(1);
    }
    println!("{} + {} = {:?}", a, b, values[2].as_int());
    Ok(())
}
