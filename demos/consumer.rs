// In demos/consumer.rs
use dmxp_circular::{CircularBuffer, Reader};
use std::env;
use std::time::Duration;

type Entry = [u64; 4];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <expected_messages>", args[0]);
        std::process::exit(1);
    }

    let expected_messages: u64 = args[1].parse()?;

    println!("Consumer: Attaching to ring dmxp_ring...");
    let ring = match CircularBuffer::<Entry>::attach_shared("dmxp_ring") {
        Ok(ring) => {
            println!("Consumer: Found ring with {} slots", ring.capacity());
            ring
        }
        Err(e) => {
            eprintln!("Failed to attach: {}", e);
            return Ok(());
        }
    };

    // Poll the log from the beginning
    let mut reader = Reader::from_start(&ring);
    let mut received = 0u64;
    let start = std::time::Instant::now();
    let mut last_progress = start;

    println!("\n{:<10} Hash prefix", "Msg #");
    println!("{}", "=".repeat(80));

    while reader.position() < expected_messages {
        match reader.try_next() {
            Some([num, a, b, c]) => {
                println!("{:<10} {:016x}{:016x}{:016x}", num, a, b, c);
                received += 1;
                last_progress = std::time::Instant::now();

                // Show progress every 100 messages
                if received % 100 == 0 {
                    println!("--- Received {} messages ---", received);
                }
            }
            None => {
                if last_progress.elapsed() > Duration::from_secs(5) {
                    eprintln!("Timeout waiting for messages");
                    break;
                }
                std::thread::yield_now();
            }
        }
    }

    let elapsed = start.elapsed();
    println!("\n{}", "=".repeat(80));
    println!(
        "Consumer: Received {} messages in {:.2?} ({} lost to overwrites)",
        received,
        elapsed,
        reader.skipped()
    );
    println!(
        "Average: {:.2} messages/second",
        received as f64 / elapsed.as_secs_f64()
    );

    if received == expected_messages {
        println!("All messages received successfully");
    }

    Ok(())
}
