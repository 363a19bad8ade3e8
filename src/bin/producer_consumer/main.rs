use clap::Parser;
use safe_queue::{CountdownLatch, ThreadSafeQueue};
use std::error::Error;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Options {
    /// values pushed by each producer
    #[clap(short, long)]
    #[clap(default_value_t = 10)]
    count: u64,

    /// pause after each push, in milliseconds
    #[clap(long)]
    #[clap(default_value_t = 100)]
    produce_interval_ms: u64,

    /// consumer back-off when the queue is empty, in milliseconds
    #[clap(long)]
    #[clap(default_value_t = 10)]
    poll_interval_ms: u64,

    #[clap(short, long)]
    #[clap(default_value_t = 1)]
    producers: u64,

    #[clap(long)]
    #[clap(default_value_t = 1)]
    consumers: u64,
}

fn produce(id: u64, options: &Options, queue: ThreadSafeQueue<u64>, start: CountdownLatch, done: CountdownLatch) {
    start.wait();
    let interval = Duration::from_millis(options.produce_interval_ms);
    let base = id * options.count;
    for i in 0..options.count {
        queue.push(base + i);
        thread::sleep(interval);
    }
    info!("producer {} finished after {} pushes", id, options.count);
    done.count_down();
}

// Polls with try_pop until every producer is done and nothing is left.
fn consume(id: u64, options: &Options, queue: ThreadSafeQueue<u64>, start: CountdownLatch, done: CountdownLatch) -> u64 {
    start.wait();
    let interval = Duration::from_millis(options.poll_interval_ms);
    let mut value = 0;
    let mut received = 0;
    loop {
        if queue.try_pop(&mut value) {
            println!("Got value {}", value);
            received += 1;
        } else if done.count() == 0 && queue.empty() {
            break;
        } else {
            thread::sleep(interval);
        }
    }
    info!("consumer {} received {}", id, received);
    received
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = Options::parse();
    info!("{:?}", options);

    let queue = ThreadSafeQueue::new();
    let start = CountdownLatch::new(1);
    let done = CountdownLatch::new(options.producers as usize);
    let begin = Instant::now();

    let received = thread::scope(|scope| {
        let options = &options;
        let producers: Vec<_> = (0..options.producers)
            .map(|id| {
                let (queue, start, done) = (queue.clone(), start.clone(), done.clone());
                scope.spawn(move || produce(id, options, queue, start, done))
            })
            .collect();

        let consumers: Vec<_> = (0..options.consumers)
            .map(|id| {
                let (queue, start, done) = (queue.clone(), start.clone(), done.clone());
                scope.spawn(move || consume(id, options, queue, start, done))
            })
            .collect();

        start.count_down();

        for producer in producers {
            if producer.join().is_err() {
                error!("producer panicked");
            }
        }

        let mut received = 0;
        for consumer in consumers {
            match consumer.join() {
                Ok(n) => received += n,
                Err(_) => error!("consumer panicked"),
            }
        }
        received
    });

    let expected = options.producers * options.count;
    info!("received {} of {} values in {:?}", received, expected, begin.elapsed());
    if received != expected {
        return Err(format!("lost values: received {} of {}", received, expected).into());
    }
    Ok(())
}
