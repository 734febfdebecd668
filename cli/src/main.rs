//! Shift demo - drives every conversion the adapter supports and prints the
//! outcome of each.
//!
//! ```text
//! shift-demo [config.toml]
//! ```
//!
//! The optional argument is a TOML file with the keys accepted by
//! [`ShiftConfig`]. Logs go to stderr, filtered by `RUST_LOG` (default
//! `info`); results go to stdout.

use std::{env, fs, time::Duration};

use anyhow::{Context, Result, anyhow};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use shift_core::{
    Continuation, Delivered, Eventual, Failure, Function, ShiftConfig, Shifting, Source, Trailing,
    call,
};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn load_config() -> Result<ShiftConfig> {
    let Some(path) = env::args().nth(1) else {
        return Ok(ShiftConfig::default());
    };
    let raw = fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
    let config = ShiftConfig::from_toml_str(&raw).with_context(|| format!("parsing {path}"))?;
    tracing::info!(%path, ?config, "Loaded config");
    Ok(config)
}

fn report(label: &str, result: &Result<String, Failure>) {
    match result {
        Ok(value) => println!("{label:<40} value: {value}"),
        Err(error) => println!("{label:<40} error: {error:#}"),
    }
}

/// Await a delivery that was made in eventual mode.
async fn settled(delivered: Delivered<String>) -> Result<String, Failure> {
    match delivered.into_eventual() {
        Some(eventual) => eventual.await,
        None => Err(anyhow!("expected an eventual delivery")),
    }
}

fn later(value: Result<String, Failure>) -> Eventual<String> {
    Eventual::new(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        value
    })
}

fn callback_source(value: Result<String, Failure>) -> Source<String> {
    Source::callback(move |cb: Continuation<String>| {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cb.settle(value);
        });
    })
}

async fn eventual_mode(config: ShiftConfig) -> Result<()> {
    let adapter = Shifting::eventual().with_config(config);

    let outcome = settled(adapter.from(callback_source(Ok("VALUE".into())))?).await;
    report("callback value -> eventual", &outcome);

    let outcome = settled(adapter.from(callback_source(Err(anyhow!("NOPE"))))?).await;
    report("callback error -> eventual", &outcome);

    let outcome = settled(adapter.from(Source::immediate(|| Ok("VALUE".to_string())))?).await;
    report("implicit value -> eventual", &outcome);

    Ok(())
}

async fn callback_mode(config: ShiftConfig) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let adapter = Shifting::with_callback(move |result: Result<String, Failure>| {
        let _ = tx.send(result);
    })
    .with_config(config);

    let sources = [
        ("eventual value -> callback", Source::from(later(Ok("VALUE".into())))),
        ("eventual error -> callback", Source::from(later(Err(anyhow!("NOPE"))))),
        ("implicit error -> callback", Source::immediate(|| Err(anyhow!("NOPE")))),
    ];
    for (label, source) in sources {
        let _ = adapter.from(source)?;
        let outcome = rx.recv().await.context("callback channel closed")?;
        report(label, &outcome);
    }

    Ok(())
}

async fn invocation(config: ShiftConfig) -> Result<()> {
    let join = Function::returning(2, |separator: Option<&String>, args: Vec<String>| {
        Ok(args.join(separator.map_or(" ", String::as_str)))
    });
    let outcome = settled(
        Shifting::eventual()
            .with_config(config)
            .apply((" + ".to_string(), join), ["left".to_string(), "right".to_string()])?,
    )
    .await;
    report("apply bound synchronous function", &outcome);

    let shout = Function::<(), String, String>::with_callback(1, |_, args, cb| {
        let loud = args.concat().to_uppercase();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            cb.resolve(loud);
        });
    });
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _ = call(
        shout,
        [
            Trailing::Arg("quiet".to_string()),
            Trailing::callback(move |result: Result<String, Failure>| {
                let _ = tx.send(result);
            }),
        ],
    )?;
    let outcome = rx.recv().await.context("callback channel closed")?;
    report("call callback-style function", &outcome);

    let unknown = Function::<(), String, String>::returning(3, |_, _| Ok(String::new()));
    match Shifting::eventual().apply(unknown, ["only".to_string()]) {
        Ok(_) => println!("{:<40} unexpectedly accepted", "apply with mismatched arity"),
        Err(error) => println!("{:<40} rejected: {error}", "apply with mismatched arity"),
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let config = load_config()?;

    eventual_mode(config).await?;
    callback_mode(config).await?;
    invocation(config).await?;

    tracing::info!("Demo finished");
    Ok(())
}
