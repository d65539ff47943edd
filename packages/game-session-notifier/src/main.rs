use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::info;
use tracing_subscriber;

mod processor;

use aws_lambda_events::event::dynamodb::Event;
use processor::GameEventProcessor;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    info!("Game session notifier Lambda function starting");

    let processor = GameEventProcessor::new();
    run(service_fn(move |event: LambdaEvent<Event>| {
        let processor = processor.clone();
        async move {
            processor.process_event(event.payload);
            Ok::<(), Error>(())
        }
    }))
    .await
}
