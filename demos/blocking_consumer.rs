use dmxp_circular::{CircularBuffer, Reader};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let from_start = args.get(1).map(|s| s == "--from-start").unwrap_or(false);

    println!("Blocking Consumer: Attaching to ring dmxp_ring");

    let ring = CircularBuffer::<[u64; 4]>::attach_shared("dmxp_ring")?;
    let mut reader = if from_start {
        Reader::from_start(&ring)
    } else {
        Reader::from_latest(&ring)
    };

    println!(
        "Blocking Consumer: Waiting for messages from index {}...",
        reader.position()
    );

    loop {
        let [num, a, ..] = reader.next_blocking();
        println!("Received: #{} {:016x}... (skipped {})", num, a, reader.skipped());
    }
}
