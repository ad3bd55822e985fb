use std::error::Error;

use qrkit::{ECLevel, QRBuilder};

// Usage: cargo run --example generate -- <text> [out.png]
fn main() -> Result<(), Box<dyn Error>> {
    let mut args = std::env::args().skip(1);
    let data = args.next().unwrap_or_else(|| "Hello, World!".to_string());
    let out = args.next().unwrap_or_else(|| "qr.png".to_string());

    // Version and mask are chosen automatically
    let qr = QRBuilder::new(data.as_bytes()).ec_level(ECLevel::Q).build()?;
    println!("{}", qr.to_str());

    qr.to_image(8).save(&out)?;
    std::fs::write(format!("{out}.svg"), qr.to_svg("#000000", "#ffffff"))?;

    println!("{:?}", qr.metadata());
    println!("Saved {out} and {out}.svg");
    Ok(())
}
