//! Drain a shared work stream through a rate-limited processor.
//!
//! One hundred items are pushed onto the shared input; a processor category
//! pulls them at ~10 items per second, with the actual per-item work
//! happening on the processor's own thread so slow items never block the
//! scheduler's sampling loop. Run with:
//!
//! ```sh
//! cargo run --example poisson_queue_demo
//! ```

use std::thread;
use std::time::Duration;

use poisson_scheduler::PoissonQueue;

fn main() {
    env_logger::init();

    let queue: PoissonQueue<&str, i32> = PoissonQueue::new(1);

    // The rate is roughly how many items per second the processor should
    // receive; the capacity bounds how far it can run ahead of itself.
    queue.set_processor(
        "printer",
        |value| {
            println!("Processing {value}.");
            // Simulated work. This blocks only the processor's thread, not
            // the scheduler.
            thread::sleep(Duration::from_millis(100));
            true
        },
        10.0,
        10,
    );

    for item in 0..100 {
        queue.queue_item(item);
    }

    queue.start();

    // There is no single "all done" signal: a processor can die and hand
    // items back, so completion is a property of the whole composite. For a
    // demo, polling the shared input is enough.
    while !queue.is_empty() {
        thread::sleep(Duration::from_millis(100));
    }
    // Let the processor finish what it already holds.
    thread::sleep(Duration::from_secs(1));

    queue.scheduler().stop();
}
