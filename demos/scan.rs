use std::error::Error;

use qrkit::{Inversion, QRReader};

// Usage: cargo run --example scan -- <image>
fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1).ok_or("Expected an image path")?;
    let img = image::open(&path)?.to_luma8();

    // Also reads light symbols printed on dark backgrounds
    match QRReader::new().inversion(Inversion::AttemptBoth).read(&img) {
        Ok((meta, msg)) => {
            println!("Successfully decoded QR code from: {path}");
            println!("Decoded message: {msg}");
            println!("QR metadata: {meta:?}");
        }
        Err(err) => println!("No readable QR code in {path}: {err}"),
    }
    Ok(())
}
