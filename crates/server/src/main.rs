use blockkv_core::Config;
use clap::Parser;

/// A TCP server over an in-memory key-value store.
#[derive(Parser, Debug)]
#[command(name = "blockkv-server", about = "Demonstration server for blockkv-core")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:7878")]
    bind: String,

    /// Number of worker threads draining the request queue.
    #[arg(long, default_value_t = Config::default().thread_pool_size)]
    threads: usize,

    /// Maximum number of connections queued awaiting a worker.
    #[arg(long, default_value_t = Config::default().max_queue_size)]
    queue_capacity: usize,

    /// Number of hash table buckets.
    #[arg(long, default_value_t = Config::default().bucket_count)]
    buckets: usize,
}

fn main() -> anyhow::Result<()> {
    blockkv_log::init();
    let args = Args::parse();

    blockkv_server::install_sigint_handler();
    let config = Config { bucket_count: args.buckets, thread_pool_size: args.threads, max_queue_size: args.queue_capacity };
    blockkv_server::serve(&args.bind, config)
}
