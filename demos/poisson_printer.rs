//! Print labels at independent Poisson rates.
//!
//! Three categories fire at different average rates; each fire prints its
//! label, so the output stream is a visible merge of three independent
//! Poisson processes. Run with:
//!
//! ```sh
//! cargo run --example poisson_printer
//! ```

use std::io::Write;
use std::thread;
use std::time::Duration;

use poisson_scheduler::{Action, PoissonScheduler};

fn print_action(label: &'static str) -> Action {
    Action::sync(move || {
        print!("{label}");
        let _ = std::io::stdout().flush();
        true
    })
}

fn main() {
    env_logger::init();

    let scheduler = PoissonScheduler::new(2);
    for (label, rate) in [(".", 20.0), ("o", 5.0), ("O\n", 1.0)] {
        scheduler.set_action(label, print_action(label), true);
        scheduler.set_rate(label, rate);
    }

    scheduler.start();
    thread::sleep(Duration::from_secs(5));

    // Speed everything up fivefold for the last stretch.
    scheduler.set_scale(5.0);
    thread::sleep(Duration::from_secs(2));

    scheduler.stop();
    println!();
}
