//! # Example: safe_subscribe
//!
//! Attaching consumers through [`subscribe_safe`].
//!
//! Demonstrates how to:
//! - Route an attachment failure (returned or panicked) to the consumer.
//! - Keep exactly one terminal notification when a producer misbehaves.
//! - Drive a pull sequence as a producer and stop it by releasing the subscription.
//!
//! ## Run
//! ```bash
//! RUST_LOG=seqflow=debug cargo run --example safe_subscribe
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use seqflow::{
    Consumer, ConsumerRef, NopSubscription, ProducerFn, SequenceError, SequenceExt, SubscriptionRef,
    generate, subscribe_safe,
};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

/// Consumer that prints every notification.
struct Printer {
    name: &'static str,
    done: Notify,
}

impl Printer {
    fn arc(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            done: Notify::new(),
        })
    }
}

#[async_trait]
impl Consumer<u64> for Printer {
    async fn on_next(&self, value: u64) {
        println!("[{}] next {value}", self.name);
    }

    async fn on_error(&self, error: SequenceError) {
        println!("[{}] error ({}): {error}", self.name, error.as_label());
        self.done.notify_one();
    }

    async fn on_completed(&self) {
        println!("[{}] completed", self.name);
        self.done.notify_one();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. Attachment returns Err: delivered as on_error, caller gets a no-op subscription.
    let refused = ProducerFn::new("refused", |_c: ConsumerRef<u64>| async {
        Err::<SubscriptionRef, _>(SequenceError::subscribe("port closed"))
    });
    let printer = Printer::arc("refused");
    let sub = subscribe_safe(&refused, Arc::clone(&printer) as ConsumerRef<u64>).await;
    sub.release().await;

    // 2. Attachment panics: captured and delivered the same way.
    let panicky = ProducerFn::new("panicky", |_c: ConsumerRef<u64>| async {
        let broken = true;
        if broken {
            panic!("handshake state corrupted");
        }
        Ok::<SubscriptionRef, SequenceError>(NopSubscription::arc())
    });
    let printer = Printer::arc("panicky");
    subscribe_safe(&panicky, Arc::clone(&printer) as ConsumerRef<u64>).await;

    // 3. Producer notifies failure and also returns Err: only the first reaches the consumer.
    let double = ProducerFn::new("double", |c: ConsumerRef<u64>| async move {
        c.on_error(SequenceError::source("stream reset")).await;
        Err::<SubscriptionRef, _>(SequenceError::subscribe("stream reset"))
    });
    let printer = Printer::arc("double");
    subscribe_safe(&double, Arc::clone(&printer) as ConsumerRef<u64>).await;

    // 4. Pull sequence driven as a producer; runs to completion.
    let powers = generate(1u64, |x: &u64| *x <= 64, |x| x * 2, |x: &u64| *x).to_producer();
    let printer = Printer::arc("powers");
    let _sub = subscribe_safe(&powers, Arc::clone(&printer) as ConsumerRef<u64>).await;
    printer.done.notified().await;

    // 5. Endless sequence stopped by releasing the subscription.
    let ticks = generate(0u64, |_: &u64| true, |x| x + 1, |x: &u64| *x).to_producer();
    let printer = Printer::arc("ticks");
    let sub = subscribe_safe(&ticks, Arc::clone(&printer) as ConsumerRef<u64>).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    sub.release().await;
    println!("[ticks] released");

    Ok(())
}
