//! Decode a hex-encoded AMF0 packet and print it
//!
//! Run with: cargo run --example decode_packet HEX [--version-prefix] [--lossy]
//!
//! Examples:
//!   cargo run --example decode_packet 00000001030001610101000009
//!   cargo run --example decode_packet 00030000000105 --version-prefix

use amf0_rs::{Amf0Value, DecoderConfig, PacketDecoder};

fn print_value(value: &Amf0Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Amf0Value::Object(props) | Amf0Value::EcmaArray(props) => {
            println!("{}{:?} {{", pad, value.marker());
            for (key, val) in props {
                println!("{}  {}:", pad, key);
                print_value(val, indent + 2);
            }
            println!("{}}}", pad);
        }
        Amf0Value::TypedObject {
            class_name,
            properties,
        } => {
            println!("{}TypedObject {} {{", pad, class_name);
            for (key, val) in properties {
                println!("{}  {}:", pad, key);
                print_value(val, indent + 2);
            }
            println!("{}}}", pad);
        }
        Amf0Value::StrictArray(elements) => {
            println!("{}[", pad);
            for elem in elements {
                print_value(elem, indent + 1);
            }
            println!("{}]", pad);
        }
        other => println!("{}{:?}", pad, other),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("amf0_rs=debug".parse()?),
        )
        .init();

    let mut config = DecoderConfig::default();
    let mut input = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--version-prefix" => config = config.version_prefix(true),
            "--lossy" => config = config.lossy_utf8(),
            _ => input = Some(arg),
        }
    }

    let Some(input) = input else {
        eprintln!("usage: decode_packet HEX [--version-prefix] [--lossy]");
        std::process::exit(2);
    };
    let digits: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let data = match hex::decode(digits) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("input is not valid hex: {}", e);
            std::process::exit(2);
        }
    };

    let packet = match PacketDecoder::with_config(config).decode(&data[..]) {
        Ok(packet) => packet,
        Err(e) => {
            tracing::error!(error = %e, "Failed to decode packet");
            std::process::exit(1);
        }
    };

    if !packet.version.is_empty() {
        println!("version: {:02x?}", &packet.version[..]);
    }
    for header in &packet.headers {
        println!(
            "header {} (must understand: {}):",
            header.name, header.must_understand
        );
        print_value(&header.value, 1);
    }
    for (i, message) in packet.messages.iter().enumerate() {
        println!("message {}:", i);
        print_value(message, 1);
    }

    Ok(())
}
