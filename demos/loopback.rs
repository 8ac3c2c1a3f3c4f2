//! Example demonstrating the timed read engine.
//!
//! Runs against a loopback `MockSerialPort` by default. Pass a device path
//! (with TX wired to RX) to run the same sequence on real hardware:
//!
//! ```bash
//! cargo run --example loopback -- /dev/ttyUSB0 115200
//! ```

use serial_timed_io::port::{LineSettings, MockSerialPort, SerialDevice};
use serial_timed_io::{SerialHandle, Timeout};
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Timed I/O Example ===\n");

    let mut args = std::env::args().skip(1);
    let device: Box<dyn SerialDevice> = match args.next() {
        Some(path) => {
            let baud = args.next().map(|b| b.parse()).transpose()?.unwrap_or(9600);
            println!("Using {} at {} baud", path, baud);
            Box::new(SerialHandle::open(&path, &LineSettings::new(baud))?.into_device())
        }
        None => {
            println!("Using loopback mock device");
            Box::new(MockSerialPort::loopback("LOOP0"))
        }
    };
    let mut handle = SerialHandle::new(device);
    handle.flush_input()?;

    // 1. Line read with an overall deadline
    handle.write_str("HELLO\n")?;
    let line = handle.read_line(b'\n', 32, Timeout::from_millis(500))?;
    println!("1. read_line -> {:?} {:?}", line.outcome, line.text());

    // 2. Block read that gets only part of what it asked for
    handle.write_bytes(b"1234")?;
    let mut block = [0u8; 10];
    let outcome = handle.read_bytes(&mut block, Timeout::from_millis(50), Duration::from_millis(1))?;
    println!(
        "2. read_bytes -> {:?} {:?}",
        outcome,
        String::from_utf8_lossy(&block[..outcome.count()])
    );

    // 3. Single byte with nothing pending
    let byte = handle.read_byte(Timeout::from_millis(20))?;
    println!("3. read_byte on idle line -> {:?}", byte);

    // 4. Modem lines
    handle.set_dtr(true)?;
    println!(
        "4. dtr={} rts={} cts={} dsr={}",
        handle.dtr()?,
        handle.rts()?,
        handle.cts()?,
        handle.dsr()?
    );

    handle.close();
    println!("\n=== Example complete ===");
    Ok(())
}
