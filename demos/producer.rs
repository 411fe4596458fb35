// In demos/producer.rs
use dmxp_circular::{CircularBuffer, Notify};
use sha2::{Digest, Sha256};
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One entry: the message number followed by the first 24 bytes of its SHA-256 digest.
type Entry = [u64; 4];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <num_messages> [--auto-exit]", args[0]);
        std::process::exit(1);
    }

    let num_messages: u64 = args[1].parse()?;
    let auto_exit = args.get(2).map(|s| s == "--auto-exit").unwrap_or(false);

    println!("Producer: Precomputing {} hashes...", num_messages);

    // Precompute hashes
    let start_precompute = std::time::Instant::now();
    let mut entries: Vec<Entry> = Vec::with_capacity(num_messages as usize);

    for i in 0..num_messages {
        let digest = Sha256::digest(format!("message_{}", i).as_bytes());
        let mut entry = [i, 0, 0, 0];
        for (word, chunk) in entry[1..].iter_mut().zip(digest.chunks_exact(8)) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            *word = u64::from_be_bytes(bytes);
        }
        entries.push(entry);
    }

    println!(
        "Producer: Precomputed {} hashes in {:.2?}",
        num_messages,
        start_precompute.elapsed()
    );

    // Create the shared ring
    let ring = CircularBuffer::<Entry>::create_shared("dmxp_ring", 1024)?;

    let keep_alive = Arc::new(AtomicBool::new(true));
    let keep_alive_for_handler = Arc::clone(&keep_alive);

    // Handle Ctrl+C to clean up
    ctrlc::set_handler(move || {
        keep_alive_for_handler.store(false, Ordering::SeqCst);
    })?;

    println!(
        "Producer: Created ring ({} slots, {} bytes)",
        ring.capacity(),
        CircularBuffer::<Entry>::memory_footprint(ring.capacity())
    );

    // Publish; no back-pressure, slow consumers lose old entries
    let start_send = std::time::Instant::now();
    for entry in &entries {
        if !keep_alive.load(Ordering::Relaxed) {
            break;
        }
        let idx = ring.push(*entry, Notify::Wake);
        if (idx + 1) % 100 == 0 {
            println!("Sent {} messages", idx + 1);
        }
    }

    let send_time = start_send.elapsed();
    let sent = ring.size();
    println!("Producer: Sent {} messages in {:.2?}", sent, send_time);
    println!(
        "Producer: Throughput: {:.2} messages/sec",
        sent as f64 / send_time.as_secs_f64()
    );

    if auto_exit {
        println!("Producer: Auto-exit mode, waiting 2 seconds for consumer...");
        std::thread::sleep(std::time::Duration::from_secs(2));
    } else {
        println!("Press Ctrl+C to exit...");
        while keep_alive.load(Ordering::SeqCst) {
            std::thread::sleep(std::time::Duration::from_millis(100));
        }
    }

    println!("Producer: Shutting down");
    dmxp_circular::Core::unlink_shared_memory("dmxp_ring")?;
    Ok(())
}
